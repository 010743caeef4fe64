// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for keyrun.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Smallest accepted batch concurrency.
pub const MIN_CONCURRENCY: usize = 1;

/// Largest accepted batch concurrency.
pub const MAX_CONCURRENCY: usize = 10;

/// Top-level keyrun configuration.
///
/// Built once at startup and passed by reference into the scheduler; nothing
/// reads configuration from globals afterwards.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct KeyrunConfig {
    /// Process-level settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Locations of the secrets, vault, proxy, and prompt files.
    #[serde(default)]
    pub files: FilesConfig,

    /// Request timeout and retry policy.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Remote service endpoints and login parameters.
    #[serde(default)]
    pub api: ApiConfig,

    /// Batch and cycle scheduling.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

/// Process-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Paths of every file keyrun reads or writes. Relative paths resolve against
/// the working directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    /// Plaintext private keys, one per line.
    #[serde(default = "default_secrets_path")]
    pub secrets_path: PathBuf,

    /// Byte copy of the plaintext file written before it is removed.
    #[serde(default = "default_backup_path")]
    pub backup_path: PathBuf,

    /// Encrypted vault (JSON).
    #[serde(default = "default_vault_path")]
    pub vault_path: PathBuf,

    /// Outbound proxies, one URI per line. Optional.
    #[serde(default = "default_proxies_path")]
    pub proxies_path: PathBuf,

    /// Content-generation prompts, one per line. Required for a run cycle.
    #[serde(default = "default_prompts_path")]
    pub prompts_path: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            secrets_path: default_secrets_path(),
            backup_path: default_backup_path(),
            vault_path: default_vault_path(),
            proxies_path: default_proxies_path(),
            prompts_path: default_prompts_path(),
        }
    }
}

fn default_secrets_path() -> PathBuf {
    PathBuf::from("pk.txt")
}

fn default_backup_path() -> PathBuf {
    PathBuf::from("pk_backup.txt")
}

fn default_vault_path() -> PathBuf {
    PathBuf::from("pk_encrypted.txt")
}

fn default_proxies_path() -> PathBuf {
    PathBuf::from("proxy.txt")
}

fn default_prompts_path() -> PathBuf {
    PathBuf::from("prompt.txt")
}

/// Per-request timeout and retry policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NetworkConfig {
    /// Timeout for a single HTTP attempt, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Total attempts per request, including the first one.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    /// Factor applied to the delay after every retry.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.initial_backoff_ms)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_backoff_ms() -> u64 {
    2000
}

fn default_backoff_multiplier() -> f64 {
    1.5
}

/// What the login signature covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignPayload {
    /// Sign the server-issued nonce; the canonical message is sent alongside.
    #[default]
    Nonce,
    /// Sign the full canonical login message.
    Message,
}

/// Remote service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the service API, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Endpoint that echoes the caller's public IP as `{"ip": "..."}`.
    #[serde(default = "default_ip_echo_url")]
    pub ip_echo_url: String,

    /// Wallet name reported at login.
    #[serde(default = "default_wallet_name")]
    pub wallet_name: String,

    /// Optional invite code attached to login requests.
    #[serde(default)]
    pub invite_code: Option<String>,

    /// Which payload the login signature covers.
    #[serde(default)]
    pub sign_payload: SignPayload,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            ip_echo_url: default_ip_echo_url(),
            wallet_name: default_wallet_name(),
            invite_code: None,
            sign_payload: SignPayload::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.metagaia.io".to_string()
}

fn default_ip_echo_url() -> String {
    "https://api.ipify.org?format=json".to_string()
}

fn default_wallet_name() -> String {
    "metamask".to_string()
}

/// Batch and cycle scheduling configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Accounts processed concurrently per batch. Clamped to 1..=10.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Route accounts through the proxy list when one is available.
    #[serde(default = "default_use_proxy")]
    pub use_proxy: bool,

    /// Pause between consecutive batches, in seconds.
    #[serde(default = "default_batch_cooldown_secs")]
    pub batch_cooldown_secs: u64,

    /// Pause between full passes over all accounts, in seconds.
    #[serde(default = "default_cycle_interval_secs")]
    pub cycle_interval_secs: u64,
}

impl SchedulerConfig {
    /// Concurrency clamped into the accepted range.
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.clamp(MIN_CONCURRENCY, MAX_CONCURRENCY)
    }

    pub fn batch_cooldown(&self) -> Duration {
        Duration::from_secs(self.batch_cooldown_secs)
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_secs(self.cycle_interval_secs)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            use_proxy: default_use_proxy(),
            batch_cooldown_secs: default_batch_cooldown_secs(),
            cycle_interval_secs: default_cycle_interval_secs(),
        }
    }
}

fn default_concurrency() -> usize {
    1
}

fn default_use_proxy() -> bool {
    true
}

fn default_batch_cooldown_secs() -> u64 {
    5
}

fn default_cycle_interval_secs() -> u64 {
    12 * 60 * 60
}
