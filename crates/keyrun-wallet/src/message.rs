// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Login message construction and EIP-191 hashing.

use chrono::{DateTime, SecondsFormat, Utc};
use sha3::{Digest, Keccak256};

use crate::address::Address;

/// Keccak-256 of `"\x19Ethereum Signed Message:\n" + len(message) + message`.
pub fn personal_message_hash(message: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(b"\x19Ethereum Signed Message:\n");
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);
    hasher.finalize().into()
}

/// The canonical login message for one nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginMessage {
    pub address: Address,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
}

impl LoginMessage {
    pub fn new(address: Address, nonce: impl Into<String>) -> Self {
        Self {
            address,
            nonce: nonce.into(),
            issued_at: Utc::now(),
        }
    }

    /// Message text sent with the login request. The timestamp has
    /// millisecond precision and a `Z` suffix.
    pub fn text(&self) -> String {
        format!(
            "GaiAI Login\nAddress: {}\nNonce: {}\nTime: {}",
            self.address,
            self.nonce,
            self.issued_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}
