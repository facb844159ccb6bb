use std::env;
use std::fmt;
use std::time::Duration;

use crate::storage::config::STORAGE_CONNECTION_STRING_VAR;

// ============================================================================
// Webhook Trigger Constants
// ============================================================================

/// Route of the export endpoint, relative to the API base URL
pub const WEBHOOK_PATH: &str = "/api/v1/etl/webhook/application-submitted";

/// API base URL used when neither `ETL_WEBHOOK_URL` nor `API_BASE_URL` is set
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Upper bound on a single trigger call
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 5;

pub const WEBHOOK_URL_VAR: &str = "ETL_WEBHOOK_URL";
pub const WEBHOOK_SECRET_VAR: &str = "ETL_WEBHOOK_SECRET";
pub const WEBHOOK_TIMEOUT_VAR: &str = "ETL_WEBHOOK_TIMEOUT_SECS";
pub const API_BASE_URL_VAR: &str = "API_BASE_URL";

/// Settings of the submission-side trigger
#[derive(Clone)]
pub struct WebhookTriggerConfig {
    pub url: String,
    pub secret: Option<String>,
    pub timeout: Duration,
    /// The trigger is disabled unless a storage connection is configured
    pub storage_connection: Option<String>,
}

impl WebhookTriggerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            secret: None,
            timeout: Duration::from_secs(DEFAULT_WEBHOOK_TIMEOUT_SECS),
            storage_connection: None,
        }
    }

    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_storage_connection(mut self, connection: impl Into<String>) -> Self {
        self.storage_connection = Some(connection.into());
        self
    }

    /// Read the trigger settings from the environment.
    ///
    /// Unparseable timeouts fall back to the default.
    pub fn from_env() -> Self {
        let url = resolve_webhook_url(
            non_empty_var(WEBHOOK_URL_VAR).as_deref(),
            non_empty_var(API_BASE_URL_VAR).as_deref(),
        );
        let timeout_secs = env::var(WEBHOOK_TIMEOUT_VAR)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_WEBHOOK_TIMEOUT_SECS);

        Self {
            url,
            secret: non_empty_var(WEBHOOK_SECRET_VAR),
            timeout: Duration::from_secs(timeout_secs),
            storage_connection: non_empty_var(STORAGE_CONNECTION_STRING_VAR),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.storage_connection
            .as_deref()
            .is_some_and(|c| !c.trim().is_empty())
    }
}

impl fmt::Debug for WebhookTriggerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookTriggerConfig")
            .field("url", &self.url)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .field("storage_connection", &self.storage_connection.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Explicit URL, else the API base URL plus the webhook route, else the
/// local default
pub fn resolve_webhook_url(explicit: Option<&str>, api_base_url: Option<&str>) -> String {
    if let Some(url) = explicit {
        return url.to_string();
    }
    let base = api_base_url.unwrap_or(DEFAULT_API_BASE_URL);
    format!("{}{}", base.trim_end_matches('/'), WEBHOOK_PATH)
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}
