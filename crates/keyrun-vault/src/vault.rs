// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Vault lifecycle: encrypt the plaintext secrets file, decrypt, inspect, delete.
//!
//! A vault file holds one [`VaultRecord`]: a salt, an IV, and one hex
//! ciphertext per secret, all encrypted under the same PBKDF2-derived key.
//!
//! Known weakness: the IV is shared by every entry of a record, so equal
//! secrets produce equal ciphertexts and a common prefix of two secrets is
//! visible. The layout is kept as-is so existing vault files stay readable.

use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use keyrun_config::FilesConfig;
use keyrun_core::KeyrunError;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::crypto::{self, IV_LEN};
use crate::kdf::{self, SALT_LEN};
use crate::source;

/// On-disk vault contents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultRecord {
    /// Hex-encoded 16-byte PBKDF2 salt.
    pub salt: String,
    /// Hex-encoded 16-byte CBC IV, shared by all entries.
    pub iv: String,
    /// Hex-encoded ciphertexts, in the order of the source file.
    pub keys: Vec<String>,
    /// ISO-8601 creation time.
    pub timestamp: String,
}

/// Summary of an existing vault, readable without the password.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultStatus {
    pub entries: usize,
    pub created: String,
}

/// Owns the vault file and, during encryption, the plaintext source and its backup.
#[derive(Debug, Clone)]
pub struct Vault {
    vault_path: PathBuf,
    source_path: PathBuf,
    backup_path: PathBuf,
}

impl Vault {
    pub fn new(
        vault_path: impl Into<PathBuf>,
        source_path: impl Into<PathBuf>,
        backup_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            vault_path: vault_path.into(),
            source_path: source_path.into(),
            backup_path: backup_path.into(),
        }
    }

    pub fn from_config(files: &FilesConfig) -> Self {
        Self::new(&files.vault_path, &files.secrets_path, &files.backup_path)
    }

    pub fn vault_path(&self) -> &Path {
        &self.vault_path
    }

    pub fn source_path(&self) -> &Path {
        &self.source_path
    }

    pub fn backup_path(&self) -> &Path {
        &self.backup_path
    }

    /// Whether the vault file is present.
    pub fn exists(&self) -> bool {
        self.vault_path.is_file()
    }

    /// Encrypt the plaintext source into the vault file, then back up and
    /// remove the source.
    ///
    /// The source is left untouched unless the vault file was written first.
    /// Backup and removal are two separate steps: a crash between them leaves
    /// both the backup and the source on disk.
    pub async fn encrypt(&self, password: &SecretString) -> Result<VaultRecord, KeyrunError> {
        if self.vault_path == self.backup_path || self.vault_path == self.source_path {
            return Err(KeyrunError::Config(format!(
                "vault path {} must differ from the secrets and backup paths",
                self.vault_path.display()
            )));
        }
        let secrets = source::read_secrets(&self.source_path)
            .await?
            .ok_or_else(|| {
                KeyrunError::Config(format!(
                    "secrets file {} not found",
                    self.source_path.display()
                ))
            })?;
        if secrets.is_empty() {
            return Err(KeyrunError::Config(format!(
                "secrets file {} contains no keys",
                self.source_path.display()
            )));
        }

        let salt = kdf::generate_salt()?;
        let iv = crypto::generate_iv()?;
        let key = kdf::derive_key(password.expose_secret().as_bytes(), &salt);

        let record = VaultRecord {
            salt: hex::encode(salt),
            iv: hex::encode(iv),
            keys: secrets
                .iter()
                .map(|secret| {
                    hex::encode(crypto::encrypt(&key, &iv, secret.expose_secret().as_bytes()))
                })
                .collect(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let json = serde_json::to_string_pretty(&record)
            .map_err(|e| KeyrunError::Internal(format!("failed to serialize vault: {e}")))?;
        tokio::fs::write(&self.vault_path, json)
            .await
            .map_err(|e| KeyrunError::io(&self.vault_path, e))?;
        info!(
            entries = record.keys.len(),
            path = %self.vault_path.display(),
            "vault written"
        );

        tokio::fs::copy(&self.source_path, &self.backup_path)
            .await
            .map_err(|e| KeyrunError::io(&self.backup_path, e))?;
        tokio::fs::remove_file(&self.source_path)
            .await
            .map_err(|e| KeyrunError::io(&self.source_path, e))?;
        info!(
            backup = %self.backup_path.display(),
            "plaintext secrets backed up and removed"
        );

        Ok(record)
    }

    /// Decrypt every entry of the vault, in order.
    ///
    /// A wrong password and a corrupted entry both surface as
    /// [`KeyrunError::Crypto`]; so does a decrypted entry that is not UTF-8.
    pub async fn decrypt(&self, password: &SecretString) -> Result<Vec<SecretString>, KeyrunError> {
        let record = self.read_record().await?;
        let salt: [u8; SALT_LEN] = decode_fixed(&record.salt, "salt")?;
        let iv: [u8; IV_LEN] = decode_fixed(&record.iv, "iv")?;
        let key = kdf::derive_key(password.expose_secret().as_bytes(), &salt);

        let secrets = record
            .keys
            .iter()
            .enumerate()
            .map(|(index, entry)| -> Result<SecretString, KeyrunError> {
                let ciphertext = hex::decode(entry).map_err(|_| {
                    KeyrunError::Crypto(format!("vault entry {index} is not valid hex"))
                })?;
                let plaintext = crypto::decrypt(&key, &iv, &ciphertext)?;
                let text = std::str::from_utf8(&plaintext).map_err(|_| {
                    KeyrunError::Crypto(
                        "decryption failed: wrong password or corrupted vault".to_string(),
                    )
                })?;
                Ok(SecretString::from(text))
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(entries = secrets.len(), "vault decrypted");
        Ok(secrets)
    }

    /// Entry count and creation time, without decrypting anything.
    pub async fn status(&self) -> Result<Option<VaultStatus>, KeyrunError> {
        if !self.exists() {
            return Ok(None);
        }
        let record = self.read_record().await?;
        Ok(Some(VaultStatus {
            entries: record.keys.len(),
            created: record.timestamp,
        }))
    }

    /// Remove the vault file. Returns `false` when there was nothing to remove.
    pub async fn delete(&self) -> Result<bool, KeyrunError> {
        match tokio::fs::remove_file(&self.vault_path).await {
            Ok(()) => {
                info!(path = %self.vault_path.display(), "vault deleted");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.vault_path.display(), "no vault to delete");
                Ok(false)
            }
            Err(e) => Err(KeyrunError::io(&self.vault_path, e)),
        }
    }

    async fn read_record(&self) -> Result<VaultRecord, KeyrunError> {
        let content = match tokio::fs::read_to_string(&self.vault_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(KeyrunError::Config(format!(
                    "vault file {} not found",
                    self.vault_path.display()
                )));
            }
            Err(e) => return Err(KeyrunError::io(&self.vault_path, e)),
        };
        serde_json::from_str(&content)
            .map_err(|e| KeyrunError::Crypto(format!("malformed vault file: {e}")))
    }
}

fn decode_fixed<const N: usize>(value: &str, field: &str) -> Result<[u8; N], KeyrunError> {
    hex::decode(value)
        .ok()
        .and_then(|bytes| <[u8; N]>::try_from(bytes).ok())
        .ok_or_else(|| KeyrunError::Crypto(format!("vault {field} must be {N} hex-encoded bytes")))
}
