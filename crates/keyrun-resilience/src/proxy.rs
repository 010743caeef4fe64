// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound proxy endpoints and round-robin assignment.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use keyrun_core::{parse_list, read_list_file, KeyrunError, ListFilter};

/// Supported proxy protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyScheme {
    Http,
    Https,
    Socks4,
    Socks5,
}

/// A parsed proxy URI.
#[derive(Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    scheme: ProxyScheme,
    uri: String,
}

impl ProxyEndpoint {
    pub fn scheme(&self) -> ProxyScheme {
        self.scheme
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// The URI with any `user:password@` section masked, for logging.
    pub fn redacted(&self) -> String {
        redact(&self.uri)
    }

    /// Build the reqwest proxy for this endpoint.
    pub fn to_reqwest(&self) -> Result<reqwest::Proxy, KeyrunError> {
        reqwest::Proxy::all(&self.uri).map_err(|e| {
            KeyrunError::Config(format!("proxy {} rejected: {e}", self.redacted()))
        })
    }
}

impl FromStr for ProxyEndpoint {
    type Err = KeyrunError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uri = s.trim();
        let (scheme, rest) = uri
            .split_once("://")
            .ok_or_else(|| KeyrunError::Config(format!("proxy {} has no scheme", redact(uri))))?;
        let scheme = match scheme.to_ascii_lowercase().as_str() {
            "http" => ProxyScheme::Http,
            "https" => ProxyScheme::Https,
            "socks4" => ProxyScheme::Socks4,
            "socks5" => ProxyScheme::Socks5,
            other => {
                return Err(KeyrunError::Config(format!(
                    "unsupported proxy scheme `{other}` in {}",
                    redact(uri)
                )));
            }
        };
        if rest.is_empty() {
            return Err(KeyrunError::Config(format!("proxy {} has no host", redact(uri))));
        }
        Ok(Self {
            scheme,
            uri: uri.to_string(),
        })
    }
}

impl fmt::Debug for ProxyEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyEndpoint")
            .field("scheme", &self.scheme)
            .field("uri", &self.redacted())
            .finish()
    }
}

fn redact(uri: &str) -> String {
    match (uri.split_once("://"), uri.rfind('@')) {
        (Some((scheme, _)), Some(at)) => format!("{scheme}://***@{}", &uri[at + 1..]),
        _ => uri.to_string(),
    }
}

/// Ordered, immutable proxy list shared by every account.
///
/// Entries are kept as written; parsing happens when a client is built so a
/// bad entry only affects the accounts it is assigned to.
#[derive(Debug, Clone, Default)]
pub struct ProxyPool {
    entries: Arc<[String]>,
}

impl ProxyPool {
    pub fn new(entries: Vec<String>) -> Self {
        Self {
            entries: entries.into(),
        }
    }

    pub fn parse(content: &str) -> Self {
        Self::new(parse_list(content, ListFilter::NonBlank))
    }

    /// Load the proxy list. A missing file yields an empty pool.
    pub async fn load(path: &Path) -> Result<Self, KeyrunError> {
        let entries = read_list_file(path, ListFilter::NonBlank).await?;
        Ok(Self::new(entries.unwrap_or_default()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Proxy for the account at `index`: `pool[index % len]`, or `None` when empty.
    pub fn assign(&self, index: usize) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        Some(self.entries[index % self.entries.len()].as_str())
    }
}
