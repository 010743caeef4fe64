// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account automation for keyrun.
//!
//! [`AccountWorkflow`] walks one wallet through login, daily check-in,
//! content generation and a profile read. [`BatchScheduler`] fans that
//! workflow out over every loaded credential in bounded batches and repeats
//! the whole pass on a fixed interval until shutdown.

pub mod api;
pub mod outcome;
pub mod scheduler;
pub mod shutdown;
pub mod workflow;

pub use api::{Envelope, GenerationRequest, LoginRequest, Profile, ServiceApi};
pub use outcome::{
    AccountOutcome, AuthOutcome, CycleReport, TaskKind, TaskOutcome, TaskResult, classify,
};
pub use scheduler::{AccountRunner, BatchScheduler, SchedulePlan, partition};
pub use shutdown::install_signal_handler;
pub use workflow::AccountWorkflow;
