// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! secp256k1 account credentials resolved from vault secrets.

use k256::ecdsa::SigningKey;
use keyrun_core::KeyrunError;
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;
use zeroize::Zeroizing;

use crate::address::Address;
use crate::message::personal_message_hash;

/// A private key together with its derived address.
///
/// Built in memory at start-up and never persisted. `Debug` shows only the
/// address and position.
pub struct Credential {
    signing_key: SigningKey,
    address: Address,
    position: usize,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("address", &self.address)
            .field("position", &self.position)
            .field("signing_key", &"[REDACTED]")
            .finish()
    }
}

impl Credential {
    /// Parse a 64-hex-digit private key, with or without a `0x` prefix.
    ///
    /// Error messages never echo the secret.
    pub fn from_secret(secret: &SecretString) -> Result<Self, KeyrunError> {
        let raw = secret.expose_secret().trim();
        let digits = raw
            .strip_prefix("0x")
            .or_else(|| raw.strip_prefix("0X"))
            .unwrap_or(raw);
        if digits.len() != 64 {
            return Err(KeyrunError::Crypto(format!(
                "private key must be 64 hex digits, got {}",
                digits.len()
            )));
        }

        let mut bytes = Zeroizing::new([0u8; 32]);
        hex::decode_to_slice(digits, bytes.as_mut())
            .map_err(|_| KeyrunError::Crypto("private key is not valid hex".to_string()))?;
        let signing_key = SigningKey::from_slice(bytes.as_ref())
            .map_err(|_| KeyrunError::Crypto("private key is out of range".to_string()))?;
        let address = Address::from_verifying_key(signing_key.verifying_key());

        Ok(Self {
            signing_key,
            address,
            position: 0,
        })
    }

    /// Resolve every secret, skipping (and logging by position) the ones that
    /// are not valid private keys.
    ///
    /// Survivors keep their position in `secrets`, so account numbering and
    /// proxy assignment do not shift when an earlier entry is skipped.
    pub fn load_all(secrets: &[SecretString]) -> Vec<Self> {
        secrets
            .iter()
            .enumerate()
            .filter_map(|(index, secret)| match Self::from_secret(secret) {
                Ok(credential) => Some(Self {
                    position: index,
                    ..credential
                }),
                Err(e) => {
                    warn!(position = index + 1, error = %e, "skipping invalid private key");
                    None
                }
            })
            .collect()
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// 0-based position in the secrets list this credential was loaded from.
    pub fn position(&self) -> usize {
        self.position
    }

    /// EIP-191 `personal_sign` over `message`.
    ///
    /// Returns the 65-byte `r || s || v` signature as `0x`-prefixed hex, with
    /// `v` in the legacy 27/28 form.
    pub fn sign_personal(&self, message: &str) -> Result<String, KeyrunError> {
        let digest = personal_message_hash(message.as_bytes());
        let (signature, recovery_id) = self
            .signing_key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| KeyrunError::Crypto(format!("signing failed: {e}")))?;

        let mut bytes = [0u8; 65];
        bytes[..64].copy_from_slice(&signature.to_bytes());
        bytes[64] = 27 + recovery_id.to_byte();
        Ok(format!("0x{}", hex::encode(bytes)))
    }
}
