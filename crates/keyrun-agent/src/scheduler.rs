// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch scheduling over all credentials, repeated on a long interval.
//!
//! Credentials are split into consecutive batches of at most `concurrency`
//! accounts. The accounts of a batch run concurrently on the scheduler's own
//! task; the next batch starts only after every account of the current one
//! has finished, following a short cool-down.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use keyrun_config::KeyrunConfig;
use keyrun_core::KeyrunError;
use keyrun_resilience::{ProxyPool, Sleeper};
use keyrun_wallet::Credential;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::outcome::{AccountOutcome, CycleReport};
use crate::workflow::AccountWorkflow;

/// Processes one account. The seam between scheduling and the remote service.
#[async_trait]
pub trait AccountRunner: Send + Sync {
    async fn run_account(
        &self,
        index: usize,
        credential: &Credential,
        proxy: Option<&str>,
        prompts: &[String],
    ) -> AccountOutcome;
}

#[async_trait]
impl AccountRunner for AccountWorkflow {
    async fn run_account(
        &self,
        index: usize,
        credential: &Credential,
        proxy: Option<&str>,
        prompts: &[String],
    ) -> AccountOutcome {
        self.run(index, credential, proxy, prompts).await
    }
}

/// Split `0..len` into consecutive ranges of at most `size` items.
pub fn partition(len: usize, size: usize) -> Vec<Range<usize>> {
    let size = size.max(1);
    (0..len)
        .step_by(size)
        .map(|start| start..(start + size).min(len))
        .collect()
}

/// Timing and fan-out settings for [`BatchScheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulePlan {
    pub concurrency: usize,
    pub batch_cooldown: Duration,
    pub cycle_interval: Duration,
}

impl SchedulePlan {
    pub fn from_config(config: &KeyrunConfig) -> Self {
        Self {
            concurrency: config.scheduler.effective_concurrency(),
            batch_cooldown: config.scheduler.batch_cooldown(),
            cycle_interval: config.scheduler.cycle_interval(),
        }
    }
}

/// Drives every credential through an [`AccountRunner`], batch by batch.
pub struct BatchScheduler {
    runner: Arc<dyn AccountRunner>,
    credentials: Arc<[Credential]>,
    proxies: ProxyPool,
    prompts: Arc<[String]>,
    plan: SchedulePlan,
    sleeper: Arc<dyn Sleeper>,
}

impl BatchScheduler {
    /// `proxies` should already be empty when proxying is disabled.
    pub fn new(
        runner: Arc<dyn AccountRunner>,
        credentials: Vec<Credential>,
        proxies: ProxyPool,
        prompts: Vec<String>,
        plan: SchedulePlan,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self {
            runner,
            credentials: credentials.into(),
            proxies,
            prompts: prompts.into(),
            plan,
            sleeper,
        }
    }

    /// One pass over every credential.
    ///
    /// Fails before doing any work when there are no credentials or no
    /// prompts. Stops between batches once `cancel` fires.
    pub async fn run_cycle(&self, cancel: &CancellationToken) -> Result<CycleReport, KeyrunError> {
        if self.credentials.is_empty() {
            return Err(KeyrunError::Config("no private keys loaded".to_string()));
        }
        if self.prompts.is_empty() {
            return Err(KeyrunError::Config("no prompts loaded".to_string()));
        }

        let batches = partition(self.credentials.len(), self.plan.concurrency);
        info!(
            accounts = self.credentials.len(),
            batches = batches.len(),
            concurrency = self.plan.concurrency,
            proxies = self.proxies.len(),
            "starting cycle"
        );

        let mut report = CycleReport::default();
        let total = batches.len();
        for (number, batch) in batches.into_iter().enumerate() {
            if cancel.is_cancelled() {
                warn!(completed_batches = number, "cycle interrupted by shutdown");
                break;
            }

            for outcome in self.run_batch(batch).await {
                report.record(&outcome);
            }

            if number + 1 < total {
                info!(cooldown = ?self.plan.batch_cooldown, "waiting before next batch");
                tokio::select! {
                    _ = self.sleeper.sleep(self.plan.batch_cooldown) => {}
                    _ = cancel.cancelled() => {}
                }
            }
        }

        info!(
            accounts = report.accounts,
            authenticated = report.authenticated,
            succeeded = report.tasks_succeeded,
            already_done = report.tasks_already_done,
            failed = report.tasks_failed,
            "cycle finished"
        );
        Ok(report)
    }

    /// Run the accounts in `batch` concurrently, at most `concurrency` at a time.
    ///
    /// Accounts are numbered, and proxies assigned, by the credential's
    /// position in the secrets list rather than its slot among valid keys.
    async fn run_batch(&self, batch: Range<usize>) -> Vec<AccountOutcome> {
        stream::iter(&self.credentials[batch])
            .map(|credential| {
                let position = credential.position();
                let proxy = self.proxies.assign(position);
                self.runner
                    .run_account(position, credential, proxy, &self.prompts)
            })
            .buffer_unordered(self.plan.concurrency)
            .collect()
            .await
    }

    /// Repeat [`run_cycle`](Self::run_cycle) every `cycle_interval` until
    /// `cancel` fires.
    ///
    /// A cycle that fails on missing input is logged and retried on the next
    /// interval; any other error ends the loop and is returned.
    pub async fn run_forever(&self, cancel: CancellationToken) -> Result<(), KeyrunError> {
        loop {
            match self.run_cycle(&cancel).await {
                Ok(_) => {}
                Err(e @ KeyrunError::Config(_)) => error!(error = %e, "cycle skipped"),
                Err(e) => return Err(e),
            }

            if cancel.is_cancelled() {
                break;
            }
            info!(interval = ?self.plan.cycle_interval, "cycle complete, waiting for next");
            tokio::select! {
                _ = self.sleeper.sleep(self.plan.cycle_interval) => {}
                _ = cancel.cancelled() => break,
            }
        }

        info!("scheduler stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use keyrun_test_utils::{RecordingSleeper, TEST_ACCOUNTS};
    use proptest::prelude::*;
    use secrecy::SecretString;
    use tracing_test::traced_test;

    use super::*;
    use crate::outcome::AuthOutcome;

    const COOLDOWN: Duration = Duration::from_secs(5);
    const INTERVAL: Duration = Duration::from_secs(43_200);

    /// Records which account ran with which proxy and how many ran at once.
    #[derive(Default)]
    struct MockRunner {
        calls: Mutex<Vec<(usize, Option<String>)>>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
        fail_index: Option<usize>,
    }

    #[async_trait]
    impl AccountRunner for MockRunner {
        async fn run_account(
            &self,
            index: usize,
            credential: &Credential,
            proxy: Option<&str>,
            _prompts: &[String],
        ) -> AccountOutcome {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            self.calls
                .lock()
                .unwrap()
                .push((index, proxy.map(str::to_string)));
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            if self.fail_index == Some(index) {
                AccountOutcome::auth_failed(index, credential.address(), None, "boom")
            } else {
                AccountOutcome {
                    index,
                    address: credential.address(),
                    egress_ip: None,
                    auth: AuthOutcome::Authenticated,
                    tasks: vec![],
                    profile: None,
                }
            }
        }
    }

    fn credentials(n: usize) -> Vec<Credential> {
        let secrets: Vec<SecretString> = (0..n)
            .map(|i| SecretString::from(TEST_ACCOUNTS[i % TEST_ACCOUNTS.len()].0))
            .collect();
        Credential::load_all(&secrets)
    }

    fn scheduler(
        runner: Arc<MockRunner>,
        accounts: usize,
        concurrency: usize,
        proxies: ProxyPool,
        sleeper: &RecordingSleeper,
    ) -> BatchScheduler {
        BatchScheduler::new(
            runner,
            credentials(accounts),
            proxies,
            vec!["a prompt".to_string()],
            SchedulePlan {
                concurrency,
                batch_cooldown: COOLDOWN,
                cycle_interval: INTERVAL,
            },
            sleeper.as_sleeper(),
        )
    }

    #[test]
    fn partition_examples() {
        assert_eq!(partition(5, 2), vec![0..2, 2..4, 4..5]);
        assert_eq!(partition(4, 4), vec![0..4]);
        assert_eq!(partition(3, 10), vec![0..3]);
        assert!(partition(0, 3).is_empty());
        assert_eq!(partition(2, 0), vec![0..1, 1..2]);
    }

    proptest! {
        #[test]
        fn partition_covers_everything_in_order(len in 0usize..200, size in 1usize..=10) {
            let ranges = partition(len, size);
            prop_assert_eq!(ranges.len(), len.div_ceil(size));
            let flattened: Vec<usize> = ranges.iter().cloned().flatten().collect();
            prop_assert_eq!(flattened, (0..len).collect::<Vec<_>>());
            for range in &ranges {
                prop_assert!(!range.is_empty() && range.len() <= size);
            }
        }
    }

    #[tokio::test]
    async fn cycle_runs_every_account_in_bounded_batches() {
        let runner = Arc::new(MockRunner::default());
        let sleeper = RecordingSleeper::new();
        let scheduler = scheduler(runner.clone(), 7, 3, ProxyPool::default(), &sleeper);

        let report = scheduler.run_cycle(&CancellationToken::new()).await.unwrap();

        assert_eq!(report.accounts, 7);
        let mut indices: Vec<usize> = runner.calls.lock().unwrap().iter().map(|c| c.0).collect();
        indices.sort_unstable();
        assert_eq!(indices, (0..7).collect::<Vec<_>>());
        assert!(runner.max_in_flight.load(Ordering::SeqCst) <= 3);
        // Three batches, two cool-downs in between and none after the last.
        assert_eq!(sleeper.delays(), vec![COOLDOWN, COOLDOWN]);
    }

    #[tokio::test]
    async fn batches_do_not_overlap() {
        let runner = Arc::new(MockRunner::default());
        let sleeper = RecordingSleeper::new();
        let scheduler = scheduler(runner.clone(), 6, 2, ProxyPool::default(), &sleeper);

        scheduler.run_cycle(&CancellationToken::new()).await.unwrap();

        let calls = runner.calls.lock().unwrap();
        for (position, (index, _)) in calls.iter().enumerate() {
            // Accounts of batch k are all started before any of batch k+1.
            assert_eq!(index / 2, position / 2, "calls: {calls:?}");
        }
        assert!(runner.max_in_flight.load(Ordering::SeqCst) <= 2);
    }

    #[tokio::test]
    async fn proxies_are_assigned_round_robin() {
        let runner = Arc::new(MockRunner::default());
        let sleeper = RecordingSleeper::new();
        let pool = ProxyPool::new(vec!["http://p0:1".to_string(), "http://p1:1".to_string()]);
        let scheduler = scheduler(runner.clone(), 5, 5, pool, &sleeper);

        scheduler.run_cycle(&CancellationToken::new()).await.unwrap();

        let mut calls = runner.calls.lock().unwrap().clone();
        calls.sort();
        let proxies: Vec<_> = calls.into_iter().map(|(_, p)| p.unwrap()).collect();
        assert_eq!(
            proxies,
            vec!["http://p0:1", "http://p1:1", "http://p0:1", "http://p1:1", "http://p0:1"]
        );
    }

    #[tokio::test]
    async fn skipped_keys_keep_account_numbers_and_proxies() {
        let runner = Arc::new(MockRunner::default());
        let sleeper = RecordingSleeper::new();
        let secrets: Vec<SecretString> = [TEST_ACCOUNTS[0].0, "not-a-key", TEST_ACCOUNTS[1].0]
            .into_iter()
            .map(SecretString::from)
            .collect();
        let pool = ProxyPool::new(vec!["http://p0:1".to_string(), "http://p1:1".to_string()]);
        let scheduler = BatchScheduler::new(
            runner.clone(),
            Credential::load_all(&secrets),
            pool,
            vec!["a prompt".to_string()],
            SchedulePlan {
                concurrency: 2,
                batch_cooldown: COOLDOWN,
                cycle_interval: INTERVAL,
            },
            sleeper.as_sleeper(),
        );

        let report = scheduler.run_cycle(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.accounts, 2);

        let mut calls = runner.calls.lock().unwrap().clone();
        calls.sort();
        assert_eq!(
            calls,
            vec![
                (0, Some("http://p0:1".to_string())),
                (2, Some("http://p0:1".to_string())),
            ]
        );
        assert!(sleeper.delays().is_empty());
    }

    #[tokio::test]
    async fn failed_account_does_not_stop_siblings() {
        let runner = Arc::new(MockRunner {
            fail_index: Some(1),
            ..MockRunner::default()
        });
        let sleeper = RecordingSleeper::new();
        let scheduler = scheduler(runner.clone(), 3, 3, ProxyPool::default(), &sleeper);

        let report = scheduler.run_cycle(&CancellationToken::new()).await.unwrap();
        assert_eq!(report.accounts, 3);
        assert_eq!(report.authenticated, 2);
    }

    #[tokio::test]
    async fn missing_prompts_fail_the_cycle() {
        let runner = Arc::new(MockRunner::default());
        let sleeper = RecordingSleeper::new();
        let scheduler = BatchScheduler::new(
            runner.clone(),
            credentials(2),
            ProxyPool::default(),
            vec![],
            SchedulePlan {
                concurrency: 1,
                batch_cooldown: COOLDOWN,
                cycle_interval: INTERVAL,
            },
            sleeper.as_sleeper(),
        );

        let err = scheduler.run_cycle(&CancellationToken::new()).await.unwrap_err();
        assert!(matches!(err, KeyrunError::Config(_)));
        assert!(runner.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn cancelled_token_stops_before_next_batch() {
        let runner = Arc::new(MockRunner::default());
        let sleeper = RecordingSleeper::new();
        let scheduler = scheduler(runner.clone(), 4, 1, ProxyPool::default(), &sleeper);

        let cancel = CancellationToken::new();
        cancel.cancel();
        let report = scheduler.run_cycle(&cancel).await.unwrap();
        assert_eq!(report.accounts, 0);
    }

    /// Cancels the token on the first long wait, so `run_forever` ends after one cycle.
    struct CancellingSleeper {
        inner: RecordingSleeper,
        cancel: CancellationToken,
    }

    #[async_trait]
    impl Sleeper for CancellingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.inner.sleep(duration).await;
            if duration == INTERVAL {
                self.cancel.cancel();
                std::future::pending::<()>().await;
            }
        }
    }

    #[tokio::test]
    async fn run_forever_waits_the_cycle_interval_then_stops() {
        let runner = Arc::new(MockRunner::default());
        let recorder = RecordingSleeper::new();
        let cancel = CancellationToken::new();
        let sleeper = Arc::new(CancellingSleeper {
            inner: recorder.clone(),
            cancel: cancel.clone(),
        });
        let scheduler = BatchScheduler::new(
            runner.clone(),
            credentials(2),
            ProxyPool::default(),
            vec!["p".to_string()],
            SchedulePlan {
                concurrency: 1,
                batch_cooldown: COOLDOWN,
                cycle_interval: INTERVAL,
            },
            sleeper,
        );

        scheduler.run_forever(cancel).await.unwrap();

        assert_eq!(runner.calls.lock().unwrap().len(), 2);
        assert_eq!(recorder.delays(), vec![COOLDOWN, INTERVAL]);
    }

    #[tokio::test]
    #[traced_test]
    async fn run_forever_survives_a_skipped_cycle() {
        let runner = Arc::new(MockRunner::default());
        let recorder = RecordingSleeper::new();
        let cancel = CancellationToken::new();
        let sleeper = Arc::new(CancellingSleeper {
            inner: recorder.clone(),
            cancel: cancel.clone(),
        });
        let scheduler = BatchScheduler::new(
            runner,
            vec![],
            ProxyPool::default(),
            vec!["p".to_string()],
            SchedulePlan {
                concurrency: 1,
                batch_cooldown: COOLDOWN,
                cycle_interval: INTERVAL,
            },
            sleeper,
        );

        assert!(scheduler.run_forever(cancel).await.is_ok());
        assert_eq!(recorder.delays(), vec![INTERVAL]);
        assert!(logs_contain("cycle skipped"));
        assert!(logs_contain("no private keys loaded"));
    }
}
