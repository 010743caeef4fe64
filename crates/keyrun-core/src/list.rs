// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Line-oriented list files (secrets, proxies, prompts).
//!
//! Every list file holds one entry per line. Lines are trimmed and blank lines
//! are dropped. The secrets file additionally treats lines starting with `#`
//! as comments.

use std::path::Path;

use tracing::debug;

use crate::KeyrunError;

/// Which lines of a list file are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListFilter {
    /// Drop blank lines only.
    NonBlank,
    /// Drop blank lines and lines starting with `#`.
    SkipComments,
}

/// Split `content` into trimmed entries according to `filter`.
pub fn parse_list(content: &str, filter: ListFilter) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| filter == ListFilter::NonBlank || !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Read a list file from disk.
///
/// Returns `Ok(None)` when the file does not exist so callers can decide
/// whether absence is fatal.
pub async fn read_list_file(
    path: &Path,
    filter: ListFilter,
) -> Result<Option<Vec<String>>, KeyrunError> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => {
            let entries = parse_list(&content, filter);
            debug!(path = %path.display(), count = entries.len(), "list file read");
            Ok(Some(entries))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(KeyrunError::io(path, e)),
    }
}
