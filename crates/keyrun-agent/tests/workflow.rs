// SPDX-FileCopyrightText: 2026 Keyrun Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end account runs against a mock service.

use std::sync::Arc;
use std::time::Duration;

use keyrun_agent::{
    AccountWorkflow, AuthOutcome, BatchScheduler, SchedulePlan, TaskKind, TaskOutcome,
};
use keyrun_config::{KeyrunConfig, SignPayload};
use keyrun_resilience::ProxyPool;
use keyrun_test_utils::mock_service::{
    ok, rejected, CHECKIN_PATH, CREATE_TASK_PATH, IP_PATH, LOGIN_PATH, NONCE_PATH,
};
use keyrun_test_utils::{MockService, RecordingSleeper, TEST_ACCOUNTS};
use keyrun_wallet::Credential;
use secrecy::SecretString;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use wiremock::ResponseTemplate;

fn config_for(service: &MockService) -> KeyrunConfig {
    let mut config = KeyrunConfig::default();
    config.api.base_url = service.uri();
    config.api.ip_echo_url = service.ip_url();
    config.network.request_timeout_secs = 5;
    config
}

fn credential(n: usize) -> Credential {
    Credential::from_secret(&SecretString::from(TEST_ACCOUNTS[n].0)).unwrap()
}

fn prompts() -> Vec<String> {
    vec!["a lighthouse at dusk".to_string()]
}

#[tokio::test]
async fn happy_path_runs_every_task() {
    let service = MockService::start().await;
    service.mount_happy_path("session-token").await;
    let sleeper = RecordingSleeper::new();
    let workflow = AccountWorkflow::new(&config_for(&service), sleeper.as_sleeper());

    let outcome = workflow.run(0, &credential(0), None, &prompts()).await;

    assert_eq!(outcome.auth, AuthOutcome::Authenticated);
    assert_eq!(outcome.egress_ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(outcome.tasks.len(), 2);
    assert_eq!(outcome.tasks[0].kind, TaskKind::CheckIn);
    assert_eq!(outcome.tasks[0].outcome, TaskOutcome::Success { reward: Some(10.0) });
    assert_eq!(outcome.tasks[1].kind, TaskKind::GenerateContent);
    assert_eq!(outcome.tasks[1].outcome, TaskOutcome::Success { reward: Some(5.0) });
    assert_eq!(outcome.total_reward(), 15.0);
    let profile = outcome.profile.unwrap();
    assert_eq!(profile.username, "tester");
    assert_eq!(profile.points, "100");
    assert!(sleeper.delays().is_empty());
}

#[tokio::test]
async fn login_request_carries_signed_nonce() {
    let service = MockService::start().await;
    service.mount_happy_path("session-token").await;
    let workflow = AccountWorkflow::new(&config_for(&service), RecordingSleeper::new().as_sleeper());

    workflow.run(0, &credential(0), None, &prompts()).await;

    let nonce_requests = service.requests_to(NONCE_PATH).await;
    assert_eq!(nonce_requests.len(), 1);
    assert_eq!(
        nonce_requests[0].url.query(),
        Some(format!("address={}", TEST_ACCOUNTS[0].1).as_str())
    );

    let logins = service.requests_to(LOGIN_PATH).await;
    assert_eq!(logins.len(), 1);
    let body: Value = serde_json::from_slice(&logins[0].body).unwrap();
    assert_eq!(body["address"], TEST_ACCOUNTS[0].1);
    assert_eq!(body["name"], "metamask");
    assert!(body.get("inviteCode").is_none());
    let message = body["message"].as_str().unwrap();
    assert!(message.starts_with("GaiAI Login\nAddress: "));
    assert!(message.contains("Nonce: 123456"));
    let signature = body["signature"].as_str().unwrap();
    assert_eq!(signature.len(), 2 + 130);
    assert_eq!(signature, credential(0).sign_personal("123456").unwrap());

    let checkins = service.requests_to(CHECKIN_PATH).await;
    assert_eq!(
        checkins[0].headers.get("token").map(|v| v.to_str().unwrap()),
        Some("session-token")
    );
}

#[tokio::test]
async fn message_payload_signs_the_full_login_text() {
    let service = MockService::start().await;
    service.mount_happy_path("session-token").await;
    let mut config = config_for(&service);
    config.api.sign_payload = SignPayload::Message;
    config.api.invite_code = Some("FRIEND".to_string());
    let workflow = AccountWorkflow::new(&config, RecordingSleeper::new().as_sleeper());

    let outcome = workflow.run(0, &credential(1), None, &prompts()).await;
    assert!(outcome.is_authenticated());

    let logins = service.requests_to(LOGIN_PATH).await;
    let body: Value = serde_json::from_slice(&logins[0].body).unwrap();
    let message = body["message"].as_str().unwrap();
    assert_eq!(
        body["signature"].as_str().unwrap(),
        credential(1).sign_personal(message).unwrap()
    );
    assert_eq!(body["inviteCode"], "FRIEND");
}

#[tokio::test]
async fn nonce_rejection_skips_the_account() {
    let service = MockService::start().await;
    wiremock::Mock::given(wiremock::matchers::path(NONCE_PATH))
        .respond_with(rejected(1001, "invalid wallet address"))
        .mount(service.server())
        .await;
    service.mount_happy_path("never-used").await;
    let workflow = AccountWorkflow::new(&config_for(&service), RecordingSleeper::new().as_sleeper());

    let outcome = workflow.run(2, &credential(2), None, &prompts()).await;

    assert!(matches!(outcome.auth, AuthOutcome::Failed(ref reason) if reason.contains("invalid wallet address")));
    assert!(outcome.tasks.is_empty());
    assert!(outcome.profile.is_none());
    assert_eq!(outcome.index, 2);
    assert!(service.requests_to(LOGIN_PATH).await.is_empty());
    assert!(service.requests_to(CHECKIN_PATH).await.is_empty());
}

#[tokio::test]
async fn benign_checkin_and_failing_task_do_not_stop_the_account() {
    let service = MockService::start().await;
    service
        .mount_checkin(rejected(1, "Already signed in today"))
        .await;
    service
        .mount_create_task(ResponseTemplate::new(500))
        .await;
    service.mount_happy_path("session-token").await;
    let sleeper = RecordingSleeper::new();
    let workflow = AccountWorkflow::new(&config_for(&service), sleeper.as_sleeper());

    let outcome = workflow.run(0, &credential(0), None, &prompts()).await;

    assert!(matches!(
        outcome.tasks[0].outcome,
        TaskOutcome::AlreadyDone { ref message } if message == "Already signed in today"
    ));
    assert!(matches!(outcome.tasks[1].outcome, TaskOutcome::Failed { .. }));
    assert_eq!(service.requests_to(CREATE_TASK_PATH).await.len(), 3);
    assert_eq!(
        sleeper.delays(),
        vec![Duration::from_millis(2000), Duration::from_millis(3000)]
    );
    // Profile is still fetched after a failed task.
    assert_eq!(outcome.profile.unwrap().username, "tester");
}

#[tokio::test]
async fn failed_ip_lookup_is_not_fatal() {
    let service = MockService::start().await;
    wiremock::Mock::given(wiremock::matchers::path(IP_PATH))
        .respond_with(ResponseTemplate::new(503))
        .mount(service.server())
        .await;
    service.mount_happy_path("session-token").await;
    let sleeper = RecordingSleeper::new();
    let workflow = AccountWorkflow::new(&config_for(&service), sleeper.as_sleeper());

    let outcome = workflow.run(0, &credential(0), None, &prompts()).await;

    assert_eq!(outcome.egress_ip, None);
    assert!(outcome.is_authenticated());
    assert_eq!(sleeper.delays().len(), 2);
}

#[tokio::test]
async fn scheduler_drives_the_workflow_for_every_account() {
    let service = MockService::start().await;
    service
        .mount_create_task(ok(json!({"rewardVal": "2.5"})))
        .await;
    service.mount_happy_path("session-token").await;
    let config = config_for(&service);
    let sleeper = RecordingSleeper::new();
    let workflow = AccountWorkflow::new(&config, sleeper.as_sleeper());
    let secrets: Vec<SecretString> = TEST_ACCOUNTS
        .iter()
        .map(|(key, _)| SecretString::from(*key))
        .collect();
    let credentials = Credential::load_all(&secrets);

    let scheduler = BatchScheduler::new(
        Arc::new(workflow),
        credentials,
        ProxyPool::default(),
        prompts(),
        SchedulePlan {
            concurrency: 2,
            batch_cooldown: Duration::from_secs(5),
            cycle_interval: Duration::from_secs(43_200),
        },
        sleeper.as_sleeper(),
    );

    let report = scheduler.run_cycle(&CancellationToken::new()).await.unwrap();

    assert_eq!(report.accounts, 3);
    assert_eq!(report.authenticated, 3);
    assert_eq!(report.tasks_succeeded, 6);
    assert_eq!(service.requests_to(LOGIN_PATH).await.len(), 3);
    assert_eq!(sleeper.delays(), vec![Duration::from_secs(5)]);
}
