// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! A [`Sleeper`] that returns immediately and remembers what it was asked to wait.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use keyrun_resilience::Sleeper;

/// Records every requested delay instead of waiting.
///
/// Clones share the same record, so a test can keep one handle and pass
/// another (as `Arc<dyn Sleeper>`) into the code under test.
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays requested so far, in order.
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().map(|d| d.clone()).unwrap_or_default()
    }

    /// How many times `duration` was requested.
    pub fn count_of(&self, duration: Duration) -> usize {
        self.delays().iter().filter(|d| **d == duration).count()
    }

    pub fn as_sleeper(&self) -> Arc<dyn Sleeper> {
        Arc::new(self.clone())
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut delays) = self.delays.lock() {
            delays.push(duration);
        }
        tokio::task::yield_now().await;
    }
}
