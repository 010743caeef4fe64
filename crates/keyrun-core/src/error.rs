// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for keyrun.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type used across the vault, network, and scheduling layers.
#[derive(Debug, Error)]
pub enum KeyrunError {
    /// Missing or empty required input, or invalid settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// Vault encryption/decryption failures, including malformed vault files.
    ///
    /// A wrong password and a corrupted ciphertext are reported identically.
    #[error("crypto error: {0}")]
    Crypto(String),

    /// File system failure with the path that was being accessed.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Transport-level failure (connection, TLS, unexpected status) after retries.
    #[error("network error: {message}")]
    Network { message: String, status: Option<u16> },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// The remote service refused the request (400/404 or a non-zero envelope code).
    #[error("rejected by server: {message}")]
    Rejected { message: String, status: Option<u16> },

    /// Account authentication failed; remaining tasks for the account are skipped.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl KeyrunError {
    /// Build an [`KeyrunError::Io`] for `path`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// HTTP status attached to network or rejection errors, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } | Self::Rejected { status, .. } => *status,
            _ => None,
        }
    }
}
