// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Start-up loading of credentials, proxies, and prompts.
//!
//! Everything here runs once before the scheduler starts; the results are
//! shared read-only by every cycle.

use std::path::Path;

use keyrun_config::FilesConfig;
use keyrun_core::{KeyrunError, ListFilter, read_list_file};
use keyrun_resilience::ProxyPool;
use keyrun_vault::Vault;
use keyrun_wallet::Credential;
use secrecy::SecretString;
use tracing::{info, warn};

/// Raw secrets from the vault when one exists, otherwise from the plaintext file.
///
/// `passphrase` is only called when the vault has to be unlocked.
pub async fn load_secrets(
    files: &FilesConfig,
    passphrase: impl FnOnce() -> Result<SecretString, KeyrunError>,
) -> Result<Vec<SecretString>, KeyrunError> {
    let vault = Vault::from_config(files);
    if vault.exists() {
        info!(path = %vault.vault_path().display(), "unlocking vault");
        let secrets = vault.decrypt(&passphrase()?).await?;
        info!(count = secrets.len(), "keys decrypted from vault");
        return Ok(secrets);
    }

    match keyrun_vault::read_secrets(&files.secrets_path).await? {
        Some(secrets) => {
            warn!(
                path = %files.secrets_path.display(),
                "no vault found, reading plaintext keys; run `keyrun encrypt` to protect them"
            );
            Ok(secrets)
        }
        None => Err(KeyrunError::Config(format!(
            "neither a vault at {} nor a secrets file at {} exists",
            files.vault_path.display(),
            files.secrets_path.display()
        ))),
    }
}

/// Load and parse every usable credential. Fails when none survive parsing.
pub async fn load_credentials(
    files: &FilesConfig,
    passphrase: impl FnOnce() -> Result<SecretString, KeyrunError>,
) -> Result<Vec<Credential>, KeyrunError> {
    let secrets = load_secrets(files, passphrase).await?;
    let credentials = Credential::load_all(&secrets);
    if credentials.is_empty() {
        return Err(KeyrunError::Config("no valid private keys loaded".to_string()));
    }
    info!(
        loaded = credentials.len(),
        skipped = secrets.len() - credentials.len(),
        "credentials ready"
    );
    Ok(credentials)
}

/// The proxy pool, or an empty pool when proxying is disabled or no list exists.
pub async fn load_proxies(files: &FilesConfig, use_proxy: bool) -> Result<ProxyPool, KeyrunError> {
    if !use_proxy {
        info!("proxying disabled, connecting directly");
        return Ok(ProxyPool::default());
    }
    let pool = ProxyPool::load(&files.proxies_path).await?;
    if pool.is_empty() {
        info!(path = %files.proxies_path.display(), "no proxies configured, connecting directly");
    } else {
        info!(count = pool.len(), "proxies loaded");
    }
    Ok(pool)
}

/// Prompts for content generation. Missing or empty files yield an empty list.
pub async fn load_prompts(path: &Path) -> Result<Vec<String>, KeyrunError> {
    let prompts = read_list_file(path, ListFilter::NonBlank)
        .await?
        .unwrap_or_default();
    if prompts.is_empty() {
        warn!(path = %path.display(), "no prompts loaded; cycles will be skipped");
    } else {
        info!(count = prompts.len(), "prompts loaded");
    }
    Ok(prompts)
}

#[cfg(test)]
mod tests {
    use keyrun_test_utils::TEST_ACCOUNTS;
    use secrecy::ExposeSecret;

    use super::*;

    fn files_in(dir: &Path) -> FilesConfig {
        FilesConfig {
            secrets_path: dir.join("pk.txt"),
            backup_path: dir.join("pk_backup.txt"),
            vault_path: dir.join("pk_encrypted.txt"),
            proxies_path: dir.join("proxy.txt"),
            prompts_path: dir.join("prompt.txt"),
        }
    }

    fn no_passphrase() -> Result<SecretString, KeyrunError> {
        panic!("passphrase must not be requested without a vault")
    }

    #[tokio::test]
    async fn plaintext_file_is_used_without_vault() {
        let dir = tempfile::tempdir().unwrap();
        let files = files_in(dir.path());
        std::fs::write(
            &files.secrets_path,
            format!("# main wallets\n{}\n\nnot-a-key\n{}\n", TEST_ACCOUNTS[0].0, TEST_ACCOUNTS[1].0),
        )
        .unwrap();

        let credentials = load_credentials(&files, no_passphrase).await.unwrap();
        let addresses: Vec<String> = credentials.iter().map(|c| c.address().to_string()).collect();
        assert_eq!(addresses, vec![TEST_ACCOUNTS[0].1, TEST_ACCOUNTS[1].1]);
    }

    #[tokio::test]
    async fn vault_takes_precedence_over_plaintext() {
        let dir = tempfile::tempdir().unwrap();
        let files = files_in(dir.path());
        std::fs::write(&files.secrets_path, format!("{}\n", TEST_ACCOUNTS[2].0)).unwrap();
        let password = SecretString::from("abc123");
        Vault::from_config(&files).encrypt(&password).await.unwrap();
        // A stale plaintext file next to the vault is ignored.
        std::fs::write(&files.secrets_path, format!("{}\n", TEST_ACCOUNTS[0].0)).unwrap();

        let secrets = load_secrets(&files, || Ok(SecretString::from("abc123"))).await.unwrap();
        assert_eq!(secrets.len(), 1);
        assert_eq!(secrets[0].expose_secret(), TEST_ACCOUNTS[2].0);
    }

    #[tokio::test]
    async fn wrong_vault_passphrase_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let files = files_in(dir.path());
        std::fs::write(&files.secrets_path, format!("{}\n", TEST_ACCOUNTS[0].0)).unwrap();
        Vault::from_config(&files)
            .encrypt(&SecretString::from("abc123"))
            .await
            .unwrap();

        let err = load_secrets(&files, || Ok(SecretString::from("wrong")))
            .await
            .unwrap_err();
        assert!(matches!(err, KeyrunError::Crypto(_)));
    }

    #[tokio::test]
    async fn no_key_source_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_secrets(&files_in(dir.path()), no_passphrase)
            .await
            .unwrap_err();
        assert!(matches!(err, KeyrunError::Config(_)));
    }

    #[tokio::test]
    async fn only_invalid_keys_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let files = files_in(dir.path());
        std::fs::write(&files.secrets_path, "deadbeef\nzz\n").unwrap();
        let err = load_credentials(&files, no_passphrase).await.unwrap_err();
        assert!(matches!(err, KeyrunError::Config(_)));
    }

    #[tokio::test]
    async fn proxies_respect_the_switch() {
        let dir = tempfile::tempdir().unwrap();
        let files = files_in(dir.path());
        std::fs::write(&files.proxies_path, "http://10.0.0.1:8080\nsocks5://10.0.0.2:1080\n").unwrap();

        assert_eq!(load_proxies(&files, true).await.unwrap().len(), 2);
        assert!(load_proxies(&files, false).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_proxy_file_means_direct() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_proxies(&files_in(dir.path()), true).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn prompts_keep_order_and_skip_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prompt.txt");
        std::fs::write(&path, "a red fox\n\n  a blue whale  \n").unwrap();
        assert_eq!(load_prompts(&path).await.unwrap(), vec!["a red fox", "a blue whale"]);
        assert!(load_prompts(&dir.path().join("missing.txt")).await.unwrap().is_empty());
    }
}
