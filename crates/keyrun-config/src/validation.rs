// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Semantic checks that serde attributes cannot express.

use tracing::warn;

use crate::diagnostic::ConfigError;
use crate::model::{KeyrunConfig, MAX_CONCURRENCY, MIN_CONCURRENCY};

/// Validate a deserialized configuration.
///
/// Collects every problem instead of stopping at the first one. An
/// out-of-range concurrency is not an error: it is clamped and logged.
pub fn validate_config(config: &KeyrunConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut invalid = |message: String| errors.push(ConfigError::Validation { message });

    let files = &config.files;
    for (name, path) in [
        ("files.secrets_path", &files.secrets_path),
        ("files.backup_path", &files.backup_path),
        ("files.vault_path", &files.vault_path),
        ("files.proxies_path", &files.proxies_path),
        ("files.prompts_path", &files.prompts_path),
    ] {
        if path.as_os_str().is_empty() {
            invalid(format!("{name} must not be empty"));
        }
    }
    if files.secrets_path == files.vault_path {
        invalid("files.secrets_path and files.vault_path must differ".to_string());
    }
    if files.secrets_path == files.backup_path {
        invalid("files.secrets_path and files.backup_path must differ".to_string());
    }
    if files.vault_path == files.backup_path {
        invalid("files.vault_path and files.backup_path must differ".to_string());
    }

    let network = &config.network;
    if network.max_attempts == 0 {
        invalid("network.max_attempts must be at least 1".to_string());
    }
    if network.request_timeout_secs == 0 {
        invalid("network.request_timeout_secs must be at least 1".to_string());
    }
    if !network.backoff_multiplier.is_finite() || network.backoff_multiplier < 1.0 {
        invalid(format!(
            "network.backoff_multiplier must be a finite number >= 1.0, got {}",
            network.backoff_multiplier
        ));
    }

    let api = &config.api;
    for (name, url) in [("api.base_url", &api.base_url), ("api.ip_echo_url", &api.ip_echo_url)] {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            invalid(format!("{name} `{url}` must start with http:// or https://"));
        }
    }
    if api.base_url.ends_with('/') {
        invalid("api.base_url must not end with `/`".to_string());
    }
    if api.wallet_name.trim().is_empty() {
        invalid("api.wallet_name must not be empty".to_string());
    }

    let scheduler = &config.scheduler;
    if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&scheduler.concurrency) {
        warn!(
            requested = scheduler.concurrency,
            effective = scheduler.effective_concurrency(),
            "scheduler.concurrency out of range, clamping"
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
