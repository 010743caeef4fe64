// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! keyrun - vault-backed batch runner for wallet-authenticated account tasks.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod run;
mod startup;
mod vault;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keyrun_config::KeyrunConfig;
use keyrun_core::KeyrunError;
use tracing::error;

/// keyrun - vault-backed batch runner for wallet-authenticated account tasks.
#[derive(Parser, Debug)]
#[command(name = "keyrun", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the default locations.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every account on a fixed interval until interrupted.
    Run {
        /// Accounts processed at once (1-10).
        #[arg(long)]
        concurrency: Option<usize>,
        /// Connect directly even if a proxy list is present.
        #[arg(long)]
        no_proxy: bool,
    },
    /// Encrypt the plaintext secrets file into the vault.
    Encrypt {
        /// Overwrite an existing vault without asking.
        #[arg(long)]
        force: bool,
    },
    /// Decrypt the vault back into a plaintext secrets file.
    Decrypt {
        /// Write the secrets here instead of the configured secrets path.
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Inspect or remove the vault.
    Vault {
        #[command(subcommand)]
        action: VaultCommands,
    },
}

#[derive(Subcommand, Debug)]
enum VaultCommands {
    /// Show entry count and creation time.
    Status,
    /// Delete the vault file.
    Delete {
        /// Skip the confirmation prompt.
        #[arg(long, short)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => keyrun_config::load_and_validate_path(path),
        None => keyrun_config::load_and_validate(),
    };
    let mut config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            keyrun_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    apply_overrides(&mut config, &cli.command);
    init_tracing(&config.agent.log_level);

    if let Err(e) = dispatch(cli.command, config).await {
        error!(error = %e, "keyrun failed");
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn dispatch(command: Commands, config: KeyrunConfig) -> Result<(), KeyrunError> {
    match command {
        Commands::Run { .. } => run::run_agent(config).await,
        Commands::Encrypt { force } => vault::run_encrypt(&config.files, force).await,
        Commands::Decrypt { output } => vault::run_decrypt(&config.files, output.as_deref()).await,
        Commands::Vault { action } => match action {
            VaultCommands::Status => vault::run_status(&config.files).await,
            VaultCommands::Delete { yes } => vault::run_delete(&config.files, yes).await,
        },
    }
}

/// Command-line flags win over file and environment configuration.
fn apply_overrides(config: &mut KeyrunConfig, command: &Commands) {
    if let Commands::Run {
        concurrency,
        no_proxy,
    } = command
    {
        if let Some(concurrency) = concurrency {
            config.scheduler.concurrency = *concurrency;
        }
        if *no_proxy {
            config.scheduler.use_proxy = false;
        }
    }
}

/// Initializes the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("keyrun={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
