// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiremock stand-in for the remote service.
//!
//! Every endpoint answers with the `{code, message, data}` envelope. Helpers
//! mount the happy path; tests override individual endpoints by mounting a
//! more specific mock first.

use serde_json::{json, Value};
use wiremock::matchers::{header_exists, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const NONCE_PATH: &str = "/api/v2/gaiai-login/wallet-nonce";
pub const LOGIN_PATH: &str = "/api/v2/gaiai-login/wallet";
pub const CHECKIN_PATH: &str = "/api/v1/gaiai-sign";
pub const CREATE_TASK_PATH: &str = "/api/v2/gaiai-ai/create-task";
pub const PROFILE_PATH: &str = "/api/v2/gaiai-user/profile";
pub const IP_PATH: &str = "/ip";

/// A success envelope around `data`.
pub fn ok(data: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": 0, "message": "success", "data": data}))
}

/// A 200 response carrying an application-level rejection.
pub fn rejected(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"code": code, "message": message, "data": null}))
}

/// A mock remote service on a random local port.
pub struct MockService {
    server: MockServer,
}

impl MockService {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL to put in `api.base_url`.
    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// URL to put in `api.ip_echo_url`.
    pub fn ip_url(&self) -> String {
        format!("{}{IP_PATH}", self.server.uri())
    }

    pub fn server(&self) -> &MockServer {
        &self.server
    }

    /// Nonce for `address`.
    pub async fn mount_nonce(&self, address: &str, nonce: &str) {
        Mock::given(method("GET"))
            .and(path(NONCE_PATH))
            .and(query_param("address", address))
            .respond_with(ok(json!({"nonce": nonce})))
            .mount(&self.server)
            .await;
    }

    /// Any nonce request, for any address.
    pub async fn mount_any_nonce(&self, nonce: &str) {
        Mock::given(method("GET"))
            .and(path(NONCE_PATH))
            .respond_with(ok(json!({"nonce": nonce})))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_login(&self, token: &str) {
        Mock::given(method("POST"))
            .and(path(LOGIN_PATH))
            .respond_with(ok(json!({"token": token})))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_checkin(&self, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(CHECKIN_PATH))
            .and(header_exists("token"))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_create_task(&self, response: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(path(CREATE_TASK_PATH))
            .and(header_exists("token"))
            .respond_with(response)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_profile(&self, username: &str, points: i64) {
        Mock::given(method("GET"))
            .and(path(PROFILE_PATH))
            .and(header_exists("token"))
            .respond_with(ok(json!({"username": username, "gPoints": points})))
            .mount(&self.server)
            .await;
    }

    pub async fn mount_ip(&self, ip: &str) {
        Mock::given(method("GET"))
            .and(path(IP_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ip": ip})))
            .mount(&self.server)
            .await;
    }

    /// Every endpoint succeeds: nonce, login, check-in, task, profile, IP.
    pub async fn mount_happy_path(&self, token: &str) {
        self.mount_any_nonce("123456").await;
        self.mount_login(token).await;
        self.mount_checkin(ok(json!({"gPoints": 10}))).await;
        self.mount_create_task(ok(json!({"rewardVal": 5}))).await;
        self.mount_profile("tester", 100).await;
        self.mount_ip("203.0.113.7").await;
    }

    /// Requests received so far whose path equals `request_path`.
    pub async fn requests_to(&self, request_path: &str) -> Vec<wiremock::Request> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path() == request_path)
            .collect()
    }
}
