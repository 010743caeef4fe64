// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password-protected vault for keyrun private keys.
//!
//! The plaintext secrets file is encrypted entry by entry with AES-256-CBC
//! under a key derived from the passphrase via PBKDF2-HMAC-SHA256, and the
//! result is stored as a single JSON record.

pub mod crypto;
pub mod kdf;
pub mod prompt;
pub mod source;
pub mod vault;

pub use prompt::{confirm, get_vault_passphrase, get_vault_passphrase_with_confirm};
pub use source::{parse_secrets, read_secrets, write_secrets};
pub use vault::{Vault, VaultRecord, VaultStatus};
