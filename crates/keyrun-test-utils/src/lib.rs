// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for keyrun integration tests.
//!
//! - [`RecordingSleeper`] - records backoff and cool-down delays without waiting
//! - [`MockService`] - wiremock stand-in for the remote service
//! - [`fixtures`] - private keys with known addresses

pub mod fixtures;
pub mod mock_service;
pub mod sleeper;

pub use fixtures::{test_keys, TEST_ACCOUNTS};
pub use mock_service::MockService;
pub use sleeper::RecordingSleeper;
