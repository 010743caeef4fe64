// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plaintext secrets file: one secret per line, blank and `#` lines ignored.

use std::path::Path;

use keyrun_core::{parse_list, read_list_file, KeyrunError, ListFilter};
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

/// Parse secrets from file content.
pub fn parse_secrets(content: &str) -> Vec<SecretString> {
    parse_list(content, ListFilter::SkipComments)
        .into_iter()
        .map(SecretString::from)
        .collect()
}

/// Read secrets from `path`. `Ok(None)` when the file does not exist.
pub async fn read_secrets(path: &Path) -> Result<Option<Vec<SecretString>>, KeyrunError> {
    let lines = read_list_file(path, ListFilter::SkipComments).await?;
    Ok(lines.map(|lines| lines.into_iter().map(SecretString::from).collect()))
}

/// Write secrets to `path`, one per line, replacing any existing file.
pub async fn write_secrets(path: &Path, secrets: &[SecretString]) -> Result<(), KeyrunError> {
    let mut content = Zeroizing::new(String::new());
    for secret in secrets {
        content.push_str(secret.expose_secret());
        content.push('\n');
    }
    tokio::fs::write(path, content.as_bytes())
        .await
        .map_err(|e| KeyrunError::io(path, e))
}
