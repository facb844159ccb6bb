//! Fire-and-forget notification of the export endpoint
//!
//! Called from the submission path once an application has been persisted.
//! The call is bounded by a short timeout and its outcome is only reported,
//! never raised: a failed trigger must not fail the submission.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use super::config::WebhookTriggerConfig;
use crate::retry::{FailedDelivery, NoRetry, RetryPolicy};

pub const WEBHOOK_TOKEN_HEADER: &str = "X-Webhook-Token";

pub const TIMEOUT_ERROR: &str = "Timeout";
pub const CONNECTION_ERROR: &str = "Erreur de connexion";
pub const DISABLED_ERROR: &str = "Service désactivé";

/// Body of the trigger call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    pub application_id: String,
    #[serde(default)]
    pub last_watermark: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerOutcome {
    /// The endpoint answered 202
    Accepted,
    /// The endpoint answered with any other status
    UnexpectedStatus,
    Timeout,
    ConnectionError,
    Unknown,
    /// No storage connection configured, nothing was sent
    Disabled,
}

/// Report of a single trigger call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerResult {
    pub application_id: String,
    /// The endpoint was reached
    pub triggered: bool,
    pub outcome: TriggerOutcome,
    pub status_code: Option<u16>,
    pub error: Option<String>,
}

impl TriggerResult {
    fn new(application_id: &str, outcome: TriggerOutcome) -> Self {
        Self {
            application_id: application_id.to_string(),
            triggered: matches!(outcome, TriggerOutcome::Accepted | TriggerOutcome::UnexpectedStatus),
            outcome,
            status_code: None,
            error: None,
        }
    }

    fn with_status(mut self, status: StatusCode) -> Self {
        self.status_code = Some(status.as_u16());
        self
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

#[derive(Clone)]
pub struct WebhookTriggerService {
    client: Client,
    config: WebhookTriggerConfig,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl WebhookTriggerService {
    pub fn new(config: WebhookTriggerConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            config,
            retry_policy: Arc::new(NoRetry),
        })
    }

    pub fn from_env() -> anyhow::Result<Self> {
        Self::new(WebhookTriggerConfig::from_env())
    }

    pub fn with_retry_policy(mut self, retry_policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn config(&self) -> &WebhookTriggerConfig {
        &self.config
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    /// Notify the export endpoint that an application was submitted
    #[instrument(skip(self), fields(url = %self.config.url))]
    pub async fn trigger_application_submitted(
        &self,
        application_id: &str,
        last_watermark: Option<&str>,
    ) -> TriggerResult {
        if !self.is_enabled() {
            warn!("ETL trigger disabled, no storage connection configured");
            return TriggerResult::new(application_id, TriggerOutcome::Disabled).with_error(DISABLED_ERROR);
        }

        let payload = WebhookPayload {
            application_id: application_id.to_string(),
            last_watermark: last_watermark.map(str::to_string),
        };
        let result = self.deliver(&payload).await;

        if !result.triggered {
            self.retry_policy
                .on_failure(FailedDelivery::Trigger {
                    application_id: payload.application_id,
                    last_watermark: payload.last_watermark,
                    outcome: result.outcome,
                    error: result.error.clone(),
                })
                .await;
        }

        result
    }

    /// Run the trigger on a detached task; the caller may drop the handle
    pub fn spawn_application_submitted(
        &self,
        application_id: impl Into<String>,
        last_watermark: Option<String>,
    ) -> JoinHandle<TriggerResult> {
        let service = self.clone();
        let application_id = application_id.into();

        tokio::spawn(async move {
            service
                .trigger_application_submitted(&application_id, last_watermark.as_deref())
                .await
        })
    }

    /// Send one request and classify the outcome, without notifying the
    /// retry policy
    pub(crate) async fn deliver(&self, payload: &WebhookPayload) -> TriggerResult {
        let application_id = payload.application_id.as_str();
        let mut request = self.client.post(&self.config.url).json(payload);
        if let Some(secret) = &self.config.secret {
            request = request.header(WEBHOOK_TOKEN_HEADER, secret);
        }

        match request.send().await {
            Ok(response) if response.status() == StatusCode::ACCEPTED => {
                info!(application_id, "ETL export accepted");
                TriggerResult::new(application_id, TriggerOutcome::Accepted).with_status(response.status())
            },
            Ok(response) => {
                let status = response.status();
                warn!(application_id, %status, "ETL endpoint answered with unexpected status");
                TriggerResult::new(application_id, TriggerOutcome::UnexpectedStatus)
                    .with_status(status)
                    .with_error(format!("Unexpected status {}", status.as_u16()))
            },
            Err(e) if e.is_timeout() => {
                warn!(application_id, timeout = ?self.config.timeout, "ETL trigger timed out");
                TriggerResult::new(application_id, TriggerOutcome::Timeout).with_error(TIMEOUT_ERROR)
            },
            Err(e) if e.is_connect() => {
                warn!(application_id, error = %e, "ETL endpoint unreachable");
                TriggerResult::new(application_id, TriggerOutcome::ConnectionError).with_error(CONNECTION_ERROR)
            },
            Err(e) => {
                warn!(application_id, error = %e, "ETL trigger failed");
                TriggerResult::new(application_id, TriggerOutcome::Unknown).with_error(e.to_string())
            },
        }
    }
}
