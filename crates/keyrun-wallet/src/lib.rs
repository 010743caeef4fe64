// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Account credentials for keyrun.
//!
//! Each vault secret becomes a [`Credential`]: a secp256k1 signing key plus
//! the Keccak-derived address the remote service knows the account by.
//! Login messages are signed with EIP-191 `personal_sign`.

pub mod address;
pub mod keypair;
pub mod message;

pub use address::Address;
pub use keypair::Credential;
pub use message::{personal_message_hash, LoginMessage};
