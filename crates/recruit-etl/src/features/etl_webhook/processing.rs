use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use tracing::{info, instrument, warn};

/// Default upper bound on the processing-function call
pub const DEFAULT_PROCESSING_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Serialize)]
struct ProcessingRequest<'a> {
    application_id: &'a str,
    container: &'a str,
    document_blob_paths: &'a [String],
}

/// Notifies the secondary processing function once documents have landed.
///
/// Best-effort: failures are logged and reported as `false`.
#[derive(Debug, Clone)]
pub struct ProcessingNotifier {
    client: Client,
    url: String,
}

impl ProcessingNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url: url.into() })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    #[instrument(skip(self, document_blob_paths), fields(url = %self.url, documents = document_blob_paths.len()))]
    pub async fn notify(&self, application_id: &str, container: &str, document_blob_paths: &[String]) -> bool {
        let request = ProcessingRequest {
            application_id,
            container,
            document_blob_paths,
        };

        match self.client.post(&self.url).json(&request).send().await {
            Ok(response) if response.status().is_success() => {
                info!(status = %response.status(), "Processing function notified");
                true
            },
            Ok(response) => {
                warn!(status = %response.status(), "Processing function rejected the notification");
                false
            },
            Err(e) => {
                warn!(error = %e, "Processing function unreachable");
                false
            },
        }
    }
}
