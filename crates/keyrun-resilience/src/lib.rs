// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Network resilience for keyrun: retrying HTTP client, proxy pool, and the
//! clock seam used for every timed wait.

pub mod client;
pub mod clock;
pub mod proxy;
pub mod retry;

pub use client::{ResilientClient, TOKEN_HEADER};
pub use clock::{Sleeper, TokioSleeper};
pub use proxy::{ProxyEndpoint, ProxyPool, ProxyScheme};
pub use retry::RetryPolicy;
