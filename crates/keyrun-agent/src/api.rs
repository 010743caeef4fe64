// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed calls to the remote service.
//!
//! Every response body is a `{code, message, data}` envelope; `code == 0`
//! means success and anything else is an application-level rejection.

use keyrun_core::KeyrunError;
use keyrun_resilience::ResilientClient;
use keyrun_wallet::Address;
use rand::seq::SliceRandom;
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const NONCE_PATH: &str = "/api/v2/gaiai-login/wallet-nonce";
pub const LOGIN_PATH: &str = "/api/v2/gaiai-login/wallet";
pub const CHECKIN_PATH: &str = "/api/v1/gaiai-sign";
pub const CREATE_TASK_PATH: &str = "/api/v2/gaiai-ai/create-task";
pub const PROFILE_PATH: &str = "/api/v2/gaiai-user/profile";

/// Browser identities rotated per account.
pub const USER_AGENTS: [&str; 4] = [
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/134.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/15.0 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/105.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) Firefox/102.0",
];

const BROWSER_HEADERS: [(&str, &str); 14] = [
    ("accept", "application/json, text/plain, */*"),
    ("accept-language", "en-GB,en-US;q=0.9,en;q=0.8"),
    ("cache-control", "no-cache"),
    ("content-type", "application/json"),
    ("lang", "en-US"),
    ("origin", "https://www.gaiai.io"),
    ("pragma", "no-cache"),
    ("referer", "https://www.gaiai.io/"),
    ("sec-ch-ua", "\"Opera\";v=\"120\", \"Not-A.Brand\";v=\"8\", \"Chromium\";v=\"135\""),
    ("sec-ch-ua-mobile", "?0"),
    ("sec-ch-ua-platform", "\"Windows\""),
    ("sec-fetch-dest", "empty"),
    ("sec-fetch-mode", "cors"),
    ("sec-fetch-site", "cross-site"),
];

pub fn random_user_agent<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0])
}

/// Default headers for one account's client.
pub fn browser_headers(user_agent: &str) -> Result<HeaderMap, KeyrunError> {
    let mut headers = HeaderMap::with_capacity(BROWSER_HEADERS.len() + 1);
    for (name, value) in BROWSER_HEADERS {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    headers.insert(
        reqwest::header::USER_AGENT,
        HeaderValue::from_str(user_agent)
            .map_err(|e| KeyrunError::Config(format!("invalid user agent: {e}")))?,
    );
    Ok(headers)
}

/// The response wrapper used by every endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Envelope {
    #[serde(default = "missing_code")]
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
}

fn missing_code() -> i64 {
    -1
}

impl Envelope {
    pub fn is_ok(&self) -> bool {
        self.code == 0
    }

    /// Convert a non-zero code into [`KeyrunError::Rejected`].
    pub fn into_ok(self) -> Result<Value, KeyrunError> {
        if self.is_ok() {
            Ok(self.data)
        } else {
            Err(KeyrunError::Rejected {
                message: self
                    .message
                    .unwrap_or_else(|| format!("service returned code {}", self.code)),
                status: None,
            })
        }
    }
}

/// Login request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub address: String,
    pub signature: String,
    pub message: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invite_code: Option<String>,
}

/// One of the fixed output-dimension profiles for content generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectProfile {
    pub width: &'static str,
    pub height: &'static str,
    pub aspect_ratio: &'static str,
}

pub const ASPECT_PROFILES: [AspectProfile; 5] = [
    AspectProfile { width: "1024", height: "576", aspect_ratio: "4" },
    AspectProfile { width: "1024", height: "768", aspect_ratio: "2" },
    AspectProfile { width: "1024", height: "1024", aspect_ratio: "1" },
    AspectProfile { width: "768", height: "1024", aspect_ratio: "6" },
    AspectProfile { width: "576", height: "1024", aspect_ratio: "8" },
];

/// Content-generation task body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub prompt: String,
    pub width: &'static str,
    pub height: &'static str,
    pub aspect_ratio: &'static str,
}

impl GenerationRequest {
    /// Pick a random prompt and aspect profile. `None` when there are no prompts.
    pub fn random<R: Rng + ?Sized>(prompts: &[String], rng: &mut R) -> Option<Self> {
        let prompt = prompts.choose(rng)?;
        let aspect = ASPECT_PROFILES.choose(rng)?;
        Some(Self {
            kind: "1",
            prompt: prompt.clone(),
            width: aspect.width,
            height: aspect.height,
            aspect_ratio: aspect.aspect_ratio,
        })
    }
}

/// Account summary shown after the tasks ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    pub username: String,
    pub points: String,
}

impl Profile {
    /// Shown when the profile could not be fetched.
    pub fn placeholder() -> Self {
        Self {
            username: "unknown".to_string(),
            points: "-".to_string(),
        }
    }
}

/// Render a JSON scalar as text; nonces and points arrive as either strings or numbers.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// The remote service as seen by one account.
#[derive(Debug, Clone)]
pub struct ServiceApi {
    client: ResilientClient,
    base_url: String,
}

impl ServiceApi {
    pub fn new(client: ResilientClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn call(
        &self,
        method: Method,
        path: &str,
        payload: Option<&Value>,
        token: Option<&str>,
    ) -> Result<Envelope, KeyrunError> {
        let body = self.client.execute(method, &self.url(path), payload, token).await?;
        serde_json::from_value(body).map_err(|e| KeyrunError::Network {
            message: format!("unexpected response shape from {path}: {e}"),
            status: None,
        })
    }

    /// Login nonce for `address` (lowercase form).
    pub async fn fetch_nonce(&self, address: &Address) -> Result<String, KeyrunError> {
        let path = format!("{NONCE_PATH}?address={address}");
        let data = self.call(Method::GET, &path, None, None).await?.into_ok()?;
        data.get("nonce")
            .and_then(scalar_text)
            .ok_or_else(|| KeyrunError::Auth("nonce missing from response".to_string()))
    }

    /// Exchange a signed login message for a session token.
    pub async fn login(&self, request: &LoginRequest) -> Result<String, KeyrunError> {
        let payload = serde_json::to_value(request)
            .map_err(|e| KeyrunError::Internal(format!("failed to encode login request: {e}")))?;
        let data = self
            .call(Method::POST, LOGIN_PATH, Some(&payload), None)
            .await?
            .into_ok()?;
        data.get("token")
            .and_then(scalar_text)
            .ok_or_else(|| KeyrunError::Auth("token missing from response".to_string()))
    }

    pub async fn check_in(&self, token: &str) -> Result<Envelope, KeyrunError> {
        self.call(Method::POST, CHECKIN_PATH, Some(&json!({})), Some(token))
            .await
    }

    pub async fn create_task(
        &self,
        token: &str,
        request: &GenerationRequest,
    ) -> Result<Envelope, KeyrunError> {
        let payload = serde_json::to_value(request).map_err(|e| {
            KeyrunError::Internal(format!("failed to encode generation request: {e}"))
        })?;
        self.call(Method::POST, CREATE_TASK_PATH, Some(&payload), Some(token))
            .await
    }

    pub async fn profile(&self, token: &str) -> Result<Profile, KeyrunError> {
        let data = self
            .call(Method::GET, PROFILE_PATH, None, Some(token))
            .await?
            .into_ok()?;
        let placeholder = Profile::placeholder();
        Ok(Profile {
            username: data
                .get("username")
                .and_then(scalar_text)
                .unwrap_or(placeholder.username),
            points: data
                .get("gPoints")
                .and_then(scalar_text)
                .unwrap_or(placeholder.points),
        })
    }

    /// Public IP seen by `ip_echo_url` through this account's transport.
    pub async fn egress_ip(&self, ip_echo_url: &str) -> Result<String, KeyrunError> {
        let body = self.client.execute(Method::GET, ip_echo_url, None, None).await?;
        body.get("ip")
            .and_then(scalar_text)
            .ok_or_else(|| KeyrunError::Network {
                message: "IP echo response has no `ip` field".to_string(),
                status: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn envelope_defaults_to_failure_without_code() {
        let envelope: Envelope = serde_json::from_value(json!({"data": {"x": 1}})).unwrap();
        assert!(!envelope.is_ok());
        assert!(matches!(envelope.into_ok(), Err(KeyrunError::Rejected { .. })));
    }

    #[test]
    fn rejection_carries_server_message() {
        let envelope: Envelope =
            serde_json::from_value(json!({"code": 1001, "message": "already signed today"})).unwrap();
        match envelope.into_ok() {
            Err(KeyrunError::Rejected { message, .. }) => assert_eq!(message, "already signed today"),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn login_request_uses_wire_names() {
        let request = LoginRequest {
            address: "0xabc".to_string(),
            signature: "0xsig".to_string(),
            message: "GaiAI Login".to_string(),
            name: "metamask".to_string(),
            invite_code: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["name"], "metamask");
        assert!(value.get("inviteCode").is_none());

        let with_code = LoginRequest {
            invite_code: Some("Y9WH14".to_string()),
            ..request
        };
        assert_eq!(serde_json::to_value(&with_code).unwrap()["inviteCode"], "Y9WH14");
    }

    #[test]
    fn generation_request_picks_from_fixed_profiles() {
        let prompts = vec!["a lighthouse at dusk".to_string(), "a red fox".to_string()];
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let request = GenerationRequest::random(&prompts, &mut rng).unwrap();
            assert!(prompts.contains(&request.prompt));
            assert!(ASPECT_PROFILES.iter().any(|p| p.width == request.width
                && p.height == request.height
                && p.aspect_ratio == request.aspect_ratio));
        }
        assert!(GenerationRequest::random(&[], &mut rng).is_none());
    }

    #[test]
    fn generation_request_wire_format() {
        let request = GenerationRequest {
            kind: "1",
            prompt: "a red fox".to_string(),
            width: "768",
            height: "1024",
            aspect_ratio: "6",
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({"type": "1", "prompt": "a red fox", "width": "768", "height": "1024", "aspectRatio": "6"})
        );
    }

    #[test]
    fn browser_headers_include_user_agent() {
        let mut rng = StdRng::seed_from_u64(1);
        let ua = random_user_agent(&mut rng);
        let headers = browser_headers(ua).unwrap();
        assert_eq!(headers.get("user-agent").unwrap(), ua);
        assert_eq!(headers.get("origin").unwrap(), "https://www.gaiai.io");
        assert!(headers.get("accept-encoding").is_none());
    }

    #[test]
    fn scalars_render_as_text() {
        assert_eq!(scalar_text(&json!("abc")), Some("abc".to_string()));
        assert_eq!(scalar_text(&json!(42)), Some("42".to_string()));
        assert_eq!(scalar_text(&json!("")), None);
        assert_eq!(scalar_text(&json!(null)), None);
    }
}
