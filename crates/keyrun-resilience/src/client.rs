// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client with bounded retries and per-account proxy selection.
//!
//! Every request goes through [`ResilientClient::execute`]. A 400 or 404
//! response is final; anything else that is not a 2xx JSON body (transport
//! error, timeout, other status, undecodable body) is retried with
//! exponential backoff until the policy runs out of attempts.

use std::sync::Arc;
use std::time::Duration;

use keyrun_config::NetworkConfig;
use keyrun_core::KeyrunError;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::Sleeper;
use crate::proxy::ProxyEndpoint;
use crate::retry::RetryPolicy;

/// Header carrying the session token on authenticated requests.
pub const TOKEN_HEADER: &str = "token";

/// Longest response excerpt kept in an error message.
const BODY_EXCERPT_LEN: usize = 200;

/// One account's HTTP client.
///
/// Built once per account so that all of its requests share a transport and
/// therefore the same proxy.
#[derive(Clone)]
pub struct ResilientClient {
    client: reqwest::Client,
    policy: RetryPolicy,
    timeout: Duration,
    sleeper: Arc<dyn Sleeper>,
    proxied: bool,
}

impl std::fmt::Debug for ResilientClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResilientClient")
            .field("policy", &self.policy)
            .field("timeout", &self.timeout)
            .field("proxied", &self.proxied)
            .finish()
    }
}

/// Outcome of a single attempt.
enum AttemptError {
    Terminal(KeyrunError),
    Retryable(KeyrunError),
}

impl ResilientClient {
    /// Build a client that sends `headers` with every request.
    ///
    /// A proxy that cannot be parsed or is rejected by reqwest is logged and
    /// the client connects directly instead.
    pub fn new(
        config: &NetworkConfig,
        proxy: Option<&str>,
        headers: HeaderMap,
        sleeper: Arc<dyn Sleeper>,
    ) -> Result<Self, KeyrunError> {
        let timeout = config.request_timeout();
        let base = || {
            reqwest::Client::builder()
                .default_headers(headers.clone())
                .timeout(timeout)
        };

        let proxied = proxy.and_then(|uri| {
            let endpoint = uri
                .parse::<ProxyEndpoint>()
                .and_then(|endpoint| endpoint.to_reqwest().map(|p| (endpoint, p)));
            match endpoint {
                Ok((endpoint, proxy)) => match base().proxy(proxy).build() {
                    Ok(client) => {
                        debug!(proxy = %endpoint.redacted(), "using proxy");
                        Some(client)
                    }
                    Err(e) => {
                        warn!(
                            proxy = %endpoint.redacted(),
                            error = %e,
                            "proxy transport failed to build, connecting directly"
                        );
                        None
                    }
                },
                Err(e) => {
                    warn!(error = %e, "invalid proxy, connecting directly");
                    None
                }
            }
        });

        let (client, proxied) = match proxied {
            Some(client) => (client, true),
            None => (
                base().build().map_err(|e| {
                    KeyrunError::Internal(format!("failed to build HTTP client: {e}"))
                })?,
                false,
            ),
        };

        Ok(Self {
            client,
            policy: RetryPolicy::from_config(config),
            timeout,
            sleeper,
            proxied,
        })
    }

    /// Whether requests go through a proxy.
    pub fn is_proxied(&self) -> bool {
        self.proxied
    }

    /// Send a request, retrying per the policy, and return the JSON body.
    ///
    /// Terminal failures come back as [`KeyrunError::Rejected`] carrying the
    /// server's `message` when it sent one. Exhausted retries come back as
    /// the last attempt's [`KeyrunError::Network`] or [`KeyrunError::Timeout`].
    pub async fn execute(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Value, KeyrunError> {
        let max_attempts = self.policy.max_attempts;
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.attempt(method.clone(), url, payload, token).await {
                Ok(body) => {
                    debug!(%url, attempt, "request succeeded");
                    return Ok(body);
                }
                Err(AttemptError::Terminal(err)) => {
                    warn!(%url, attempt, status = ?err.status(), error = %err, "request rejected");
                    return Err(err);
                }
                Err(AttemptError::Retryable(err)) => {
                    warn!(
                        %url,
                        attempt,
                        max_attempts,
                        status = ?err.status(),
                        error = %err,
                        "request failed"
                    );
                    last_error = Some(err);
                    if attempt < max_attempts {
                        self.sleeper.sleep(self.policy.delay_for(attempt)).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            KeyrunError::Internal(format!("no attempt was made for {url}"))
        }))
    }

    async fn attempt(
        &self,
        method: Method,
        url: &str,
        payload: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Value, AttemptError> {
        let mut request = self.client.request(method, url);
        if let Some(token) = token {
            let value = HeaderValue::from_str(token).map_err(|e| {
                AttemptError::Terminal(KeyrunError::Auth(format!("token is not a valid header: {e}")))
            })?;
            request = request.header(TOKEN_HEADER, value);
        }
        if let Some(payload) = payload {
            request = request.json(payload);
        }

        let response = request.send().await.map_err(|e| {
            AttemptError::Retryable(if e.is_timeout() {
                KeyrunError::Timeout {
                    duration: self.timeout,
                }
            } else {
                KeyrunError::Network {
                    message: format!("request failed: {e}"),
                    status: None,
                }
            })
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            AttemptError::Retryable(KeyrunError::Network {
                message: format!("failed to read response body: {e}"),
                status: Some(status.as_u16()),
            })
        })?;

        if matches!(status, StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND) {
            return Err(AttemptError::Terminal(KeyrunError::Rejected {
                message: server_message(&body).unwrap_or_else(|| format!("HTTP {status}")),
                status: Some(status.as_u16()),
            }));
        }

        if !status.is_success() {
            return Err(AttemptError::Retryable(KeyrunError::Network {
                message: server_message(&body)
                    .unwrap_or_else(|| format!("HTTP {status}: {}", excerpt(&body))),
                status: Some(status.as_u16()),
            }));
        }

        serde_json::from_str(&body).map_err(|e| {
            AttemptError::Retryable(KeyrunError::Network {
                message: format!("undecodable response body ({e}): {}", excerpt(&body)),
                status: Some(status.as_u16()),
            })
        })
    }
}

/// The `message` field of a JSON error body, if present.
fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

fn excerpt(body: &str) -> &str {
    match body.char_indices().nth(BODY_EXCERPT_LEN) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}
