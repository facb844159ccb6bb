//! Webhook trigger integration tests
//!
//! The export endpoint is played by a wiremock server; every outcome of the
//! trigger is reported in the result and none of them raises.

use recruit_etl::retry::{BackoffSchedule, ChannelRetryPolicy, FailedDelivery};
use recruit_etl::webhook::{
    redrive_failed_triggers, TriggerOutcome, WebhookTriggerConfig, WebhookTriggerService,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const WEBHOOK_PATH: &str = "/api/v1/etl/webhook/application-submitted";

fn enabled_config(url: String) -> WebhookTriggerConfig {
    WebhookTriggerConfig::new(url)
        .with_timeout(Duration::from_millis(300))
        .with_storage_connection("endpoint=http://localhost:9000")
}

fn webhook_url(server: &MockServer) -> String {
    format!("{}{}", server.uri(), WEBHOOK_PATH)
}

/// A local address nothing listens on
fn unreachable_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{}{}", port, WEBHOOK_PATH)
}

// ============================================================================
// Outcome Classification
// ============================================================================

#[tokio::test]
async fn test_accepted_with_token_and_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .and(header("X-Webhook-Token", "s3cret"))
        .and(body_json(json!({"application_id": "A1", "last_watermark": "2025-10-17T08:30:00Z"})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let service = WebhookTriggerService::new(enabled_config(webhook_url(&server)).with_secret("s3cret")).unwrap();
    let result = service
        .trigger_application_submitted("A1", Some("2025-10-17T08:30:00Z"))
        .await;

    assert!(result.triggered);
    assert_eq!(result.outcome, TriggerOutcome::Accepted);
    assert_eq!(result.status_code, Some(202));
    assert_eq!(result.error, None);
}

#[tokio::test]
async fn test_unexpected_status_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (policy, mut failures) = ChannelRetryPolicy::new();
    let service = WebhookTriggerService::new(enabled_config(webhook_url(&server)))
        .unwrap()
        .with_retry_policy(Arc::new(policy));
    let result = service.trigger_application_submitted("A1", None).await;

    assert!(result.triggered);
    assert_eq!(result.outcome, TriggerOutcome::UnexpectedStatus);
    assert_eq!(result.status_code, Some(500));
    assert!(result.error.unwrap().contains("500"));

    // The endpoint was reached, nothing to retry
    assert!(failures.try_recv().is_err());
}

#[tokio::test]
async fn test_timeout_is_reported_and_handed_to_retry_policy() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_delay(Duration::from_secs(3)))
        .mount(&server)
        .await;

    let (policy, mut failures) = ChannelRetryPolicy::new();
    let service = WebhookTriggerService::new(enabled_config(webhook_url(&server)))
        .unwrap()
        .with_retry_policy(Arc::new(policy));
    let result = service.trigger_application_submitted("A1", None).await;

    assert!(!result.triggered);
    assert_eq!(result.outcome, TriggerOutcome::Timeout);
    assert_eq!(result.error.as_deref(), Some("Timeout"));

    match failures.try_recv().unwrap() {
        FailedDelivery::Trigger {
            application_id,
            outcome,
            ..
        } => {
            assert_eq!(application_id, "A1");
            assert_eq!(outcome, TriggerOutcome::Timeout);
        },
        other => panic!("unexpected failure {:?}", other),
    }
}

#[tokio::test]
async fn test_unreachable_endpoint_is_connection_error() {
    let service = WebhookTriggerService::new(enabled_config(unreachable_url())).unwrap();
    let result = service.trigger_application_submitted("A1", None).await;

    assert!(!result.triggered);
    assert_eq!(result.outcome, TriggerOutcome::ConnectionError);
    assert_eq!(result.error.as_deref(), Some("Erreur de connexion"));
}

#[tokio::test]
async fn test_disabled_without_storage_connection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&server)
        .await;

    let service = WebhookTriggerService::new(WebhookTriggerConfig::new(webhook_url(&server))).unwrap();
    let result = service.trigger_application_submitted("A1", None).await;

    assert!(!result.triggered);
    assert_eq!(result.outcome, TriggerOutcome::Disabled);
    assert_eq!(result.error.as_deref(), Some("Service désactivé"));
}

// ============================================================================
// Fire-and-forget
// ============================================================================

#[tokio::test]
async fn test_spawned_trigger_runs_detached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(WEBHOOK_PATH))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let service = WebhookTriggerService::new(enabled_config(webhook_url(&server))).unwrap();
    let handle = service.spawn_application_submitted("A1", None);

    let result = handle.await.unwrap();
    assert_eq!(result.outcome, TriggerOutcome::Accepted);
    assert_eq!(result.application_id, "A1");
}

#[tokio::test]
async fn test_redrive_delivers_after_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202).set_delay(Duration::from_secs(3)))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&server)
        .await;

    let (policy, failures) = ChannelRetryPolicy::new();
    let service = WebhookTriggerService::new(enabled_config(webhook_url(&server)))
        .unwrap()
        .with_retry_policy(Arc::new(policy));

    let redriver = WebhookTriggerService::new(enabled_config(webhook_url(&server))).unwrap();
    let schedule = BackoffSchedule::new(2, Duration::from_millis(10), None);
    let handle = redrive_failed_triggers(redriver, failures, schedule, 3);

    let result = service.trigger_application_submitted("A1", None).await;
    assert_eq!(result.outcome, TriggerOutcome::Timeout);

    // Dropping the only sender lets the re-drive loop finish
    drop(service);
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("re-drive should finish")
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
}
