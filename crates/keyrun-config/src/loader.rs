// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./keyrun.toml` > `~/.config/keyrun/keyrun.toml` > `/etc/keyrun/keyrun.toml`
//! with environment variable overrides via `KEYRUN_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::KeyrunConfig;

/// Name of the local and XDG config file.
pub const CONFIG_FILE_NAME: &str = "keyrun.toml";

/// System-wide config path.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/keyrun/keyrun.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/keyrun/keyrun.toml`
/// 3. `~/.config/keyrun/keyrun.toml`
/// 4. `./keyrun.toml`
/// 5. `KEYRUN_*` environment variables
pub fn load_config() -> Result<KeyrunConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no files, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<KeyrunConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyrunConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<KeyrunConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(KeyrunConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for the XDG hierarchy lookup.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(KeyrunConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("keyrun").join(CONFIG_FILE_NAME))
                .unwrap_or_default(),
        ))
        .merge(Toml::file(CONFIG_FILE_NAME))
        .merge(env_provider())
}

/// Environment provider mapping `KEYRUN_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys such as
/// `max_attempts` contain underscores: `KEYRUN_NETWORK_MAX_ATTEMPTS` must map
/// to `network.max_attempts`, not `network.max.attempts`.
fn env_provider() -> Env {
    // KEYRUN_VAULT_KEY carries the passphrase and is not a config key.
    Env::prefixed("KEYRUN_")
        .ignore(&["vault_key"])
        .map(|key| map_env_key(key.as_str()).into())
}

fn map_env_key(key: &str) -> String {
    const SECTIONS: [&str; 5] = ["agent", "files", "network", "api", "scheduler"];
    for section in SECTIONS {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
