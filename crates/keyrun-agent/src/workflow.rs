// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One account's pass: look up the egress IP, log in, run the task set,
//! and fetch the profile summary.
//!
//! Only a failed login stops the pass early. Each task's failure is recorded
//! and the next task still runs.

use std::sync::Arc;

use keyrun_config::{ApiConfig, KeyrunConfig, NetworkConfig, SignPayload};
use keyrun_core::KeyrunError;
use keyrun_resilience::{ResilientClient, Sleeper};
use keyrun_wallet::{Credential, LoginMessage};
use tracing::{info, warn};

use crate::api::{self, GenerationRequest, LoginRequest, Profile, ServiceApi};
use crate::outcome::{classify, AccountOutcome, AuthOutcome, TaskKind, TaskOutcome, TaskResult};

/// Runs the per-account task sequence against the remote service.
#[derive(Clone)]
pub struct AccountWorkflow {
    network: NetworkConfig,
    api: ApiConfig,
    sleeper: Arc<dyn Sleeper>,
}

impl AccountWorkflow {
    pub fn new(config: &KeyrunConfig, sleeper: Arc<dyn Sleeper>) -> Self {
        Self {
            network: config.network.clone(),
            api: config.api.clone(),
            sleeper,
        }
    }

    /// Process the account at `index` (0-based), optionally through `proxy`.
    pub async fn run(
        &self,
        index: usize,
        credential: &Credential,
        proxy: Option<&str>,
        prompts: &[String],
    ) -> AccountOutcome {
        let account = index + 1;
        let address = credential.address();
        info!(account, address = %address.to_checksum(), proxied = proxy.is_some(), "processing account");

        let user_agent = api::random_user_agent(&mut rand::thread_rng());
        let service = match self.service(proxy, user_agent) {
            Ok(service) => service,
            Err(e) => {
                warn!(account, error = %e, "could not build HTTP client, skipping account");
                return AccountOutcome::auth_failed(index, address, None, e.to_string());
            }
        };

        let egress_ip = match service.egress_ip(&self.api.ip_echo_url).await {
            Ok(ip) => {
                info!(account, %ip, "egress IP");
                Some(ip)
            }
            Err(e) => {
                warn!(account, error = %e, "egress IP lookup failed");
                None
            }
        };

        let token = match self.authenticate(&service, credential).await {
            Ok(token) => token,
            Err(e) => {
                warn!(account, error = %e, "login failed, skipping account");
                return AccountOutcome::auth_failed(index, address, egress_ip, e.to_string());
            }
        };
        info!(account, "logged in");

        let mut tasks = Vec::with_capacity(2);

        let checkin = classify(TaskKind::CheckIn, service.check_in(&token).await);
        tasks.push(log_task(account, TaskKind::CheckIn, checkin));

        let generation = GenerationRequest::random(prompts, &mut rand::thread_rng());
        let generated = match generation {
            Some(request) => classify(
                TaskKind::GenerateContent,
                service.create_task(&token, &request).await,
            ),
            None => TaskOutcome::Failed {
                reason: "no prompts available".to_string(),
            },
        };
        tasks.push(log_task(account, TaskKind::GenerateContent, generated));

        let profile = service.profile(&token).await.unwrap_or_else(|e| {
            warn!(account, error = %e, "profile lookup failed");
            Profile::placeholder()
        });
        info!(
            account,
            username = %profile.username,
            points = %profile.points,
            "account finished"
        );

        AccountOutcome {
            index,
            address,
            egress_ip,
            auth: AuthOutcome::Authenticated,
            tasks,
            profile: Some(profile),
        }
    }

    fn service(&self, proxy: Option<&str>, user_agent: &str) -> Result<ServiceApi, KeyrunError> {
        let client = ResilientClient::new(
            &self.network,
            proxy,
            api::browser_headers(user_agent)?,
            self.sleeper.clone(),
        )?;
        Ok(ServiceApi::new(client, self.api.base_url.clone()))
    }

    /// Nonce, signature, login. Any failure becomes one [`KeyrunError::Auth`].
    async fn authenticate(
        &self,
        service: &ServiceApi,
        credential: &Credential,
    ) -> Result<String, KeyrunError> {
        let address = credential.address();
        let auth_error = |e: KeyrunError| match e {
            KeyrunError::Auth(_) => e,
            other => KeyrunError::Auth(other.to_string()),
        };

        let nonce = service.fetch_nonce(&address).await.map_err(auth_error)?;
        let message = LoginMessage::new(address, nonce.as_str()).text();
        let signed = match self.api.sign_payload {
            SignPayload::Nonce => nonce.as_str(),
            SignPayload::Message => message.as_str(),
        };
        let signature = credential.sign_personal(signed).map_err(auth_error)?;

        let request = LoginRequest {
            address: address.to_string(),
            signature,
            message,
            name: self.api.wallet_name.clone(),
            invite_code: self.api.invite_code.clone(),
        };
        service.login(&request).await.map_err(auth_error)
    }
}

fn log_task(account: usize, kind: TaskKind, outcome: TaskOutcome) -> TaskResult {
    match &outcome {
        TaskOutcome::Success { reward } => info!(account, task = %kind, reward = ?reward, "task completed"),
        TaskOutcome::AlreadyDone { message } => info!(account, task = %kind, %message, "task already done"),
        TaskOutcome::Failed { reason } => warn!(account, task = %kind, %reason, "task failed"),
    }
    TaskResult { kind, outcome }
}
