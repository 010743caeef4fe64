// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `keyrun run` command implementation.

use std::sync::Arc;

use keyrun_agent::{AccountWorkflow, BatchScheduler, SchedulePlan, install_signal_handler};
use keyrun_config::KeyrunConfig;
use keyrun_core::KeyrunError;
use keyrun_resilience::{Sleeper, TokioSleeper};
use tracing::info;

use crate::startup;

/// Load keys, proxies, and prompts once, then run cycles until SIGINT/SIGTERM.
pub async fn run_agent(config: KeyrunConfig) -> Result<(), KeyrunError> {
    info!("starting keyrun");

    let credentials =
        startup::load_credentials(&config.files, keyrun_vault::get_vault_passphrase).await?;
    let proxies = startup::load_proxies(&config.files, config.scheduler.use_proxy).await?;
    let prompts = startup::load_prompts(&config.files.prompts_path).await?;

    let sleeper: Arc<dyn Sleeper> = Arc::new(TokioSleeper);
    let workflow = AccountWorkflow::new(&config, sleeper.clone());
    let plan = SchedulePlan::from_config(&config);
    info!(
        accounts = credentials.len(),
        concurrency = plan.concurrency,
        cycle_interval = ?plan.cycle_interval,
        "scheduler configured"
    );
    let scheduler = BatchScheduler::new(
        Arc::new(workflow),
        credentials,
        proxies,
        prompts,
        plan,
        sleeper,
    );

    let cancel = install_signal_handler();
    scheduler.run_forever(cancel).await?;

    info!("keyrun stopped");
    Ok(())
}
