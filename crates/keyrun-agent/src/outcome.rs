// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-task, per-account, and per-cycle results.

use std::fmt;

use keyrun_core::KeyrunError;
use keyrun_wallet::Address;
use serde_json::Value;

use crate::api::{Envelope, Profile};

/// Message fragments the service uses for "nothing to do, already done".
const BENIGN_MARKERS: [&str; 7] = [
    "already",
    "today",
    "repeat",
    "duplicate",
    "limit reached",
    "已签到",
    "已完成",
];

/// The fixed task set run for every authenticated account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    CheckIn,
    GenerateContent,
}

impl TaskKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::CheckIn => "daily check-in",
            Self::GenerateContent => "content generation",
        }
    }

    /// Field of the success payload that carries the reward.
    fn reward_field(self) -> &'static str {
        match self {
            Self::CheckIn => "gPoints",
            Self::GenerateContent => "rewardVal",
        }
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a single task ended.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskOutcome {
    Success { reward: Option<f64> },
    /// The service refused because the task was already done; not an error.
    AlreadyDone { message: String },
    Failed { reason: String },
}

/// Translate a task response into a [`TaskOutcome`].
///
/// The service only signals "already done" through its message text, so a
/// rejection is benign when its message contains one of the known markers.
/// A rejection without any message is treated as benign too.
pub fn classify(kind: TaskKind, response: Result<Envelope, KeyrunError>) -> TaskOutcome {
    match response {
        Ok(envelope) if envelope.is_ok() => TaskOutcome::Success {
            reward: envelope.data.get(kind.reward_field()).and_then(as_number),
        },
        Ok(envelope) => match envelope.message {
            Some(message) if !message.trim().is_empty() => from_rejection(message),
            _ => TaskOutcome::AlreadyDone {
                message: "already completed".to_string(),
            },
        },
        Err(KeyrunError::Rejected { message, .. }) => from_rejection(message),
        Err(other) => TaskOutcome::Failed {
            reason: other.to_string(),
        },
    }
}

fn from_rejection(message: String) -> TaskOutcome {
    let lower = message.to_lowercase();
    if BENIGN_MARKERS.iter().any(|marker| lower.contains(marker)) {
        TaskOutcome::AlreadyDone { message }
    } else {
        TaskOutcome::Failed { reason: message }
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TaskResult {
    pub kind: TaskKind,
    pub outcome: TaskOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Authenticated,
    Failed(String),
}

/// Everything one workflow run produced for one account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountOutcome {
    /// Position in the secrets list (0-based), stable across skipped keys.
    pub index: usize,
    pub address: Address,
    pub egress_ip: Option<String>,
    pub auth: AuthOutcome,
    pub tasks: Vec<TaskResult>,
    /// `None` when authentication failed.
    pub profile: Option<Profile>,
}

impl AccountOutcome {
    /// An account that never got past authentication.
    pub fn auth_failed(
        index: usize,
        address: Address,
        egress_ip: Option<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            index,
            address,
            egress_ip,
            auth: AuthOutcome::Failed(reason.into()),
            tasks: Vec::new(),
            profile: None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth == AuthOutcome::Authenticated
    }

    /// Sum of the rewards of successful tasks.
    pub fn total_reward(&self) -> f64 {
        self.tasks
            .iter()
            .filter_map(|task| match task.outcome {
                TaskOutcome::Success { reward } => reward,
                _ => None,
            })
            .sum()
    }
}

/// Tallies over one pass through every account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub accounts: usize,
    pub authenticated: usize,
    pub tasks_succeeded: usize,
    pub tasks_already_done: usize,
    pub tasks_failed: usize,
}

impl CycleReport {
    pub fn record(&mut self, outcome: &AccountOutcome) {
        self.accounts += 1;
        if outcome.is_authenticated() {
            self.authenticated += 1;
        }
        for task in &outcome.tasks {
            match task.outcome {
                TaskOutcome::Success { .. } => self.tasks_succeeded += 1,
                TaskOutcome::AlreadyDone { .. } => self.tasks_already_done += 1,
                TaskOutcome::Failed { .. } => self.tasks_failed += 1,
            }
        }
    }
}
