//! Export-application command
//!
//! Validates the webhook payload, loads the application snapshot, runs the
//! star-schema export and, when configured, notifies the processing function.

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::etl::{validate_segment, ExportError, ExportManifest, InvalidKeyError};
use crate::features::etl_webhook::EtlWebhookState;

/// Body of `POST /api/v1/etl/webhook/application-submitted`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportApplicationCommand {
    pub application_id: String,

    /// Opaque cursor from the submitter, logged only
    #[serde(default)]
    pub last_watermark: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportApplicationResponse {
    pub application_id: String,
    pub manifest: ExportManifest,
    pub processing_notified: bool,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportApplicationError {
    #[error("Invalid application id: {0}")]
    InvalidApplicationId(#[from] InvalidKeyError),

    #[error("Application '{0}' not found")]
    NotFound(String),

    #[error("Failed to load application: {0:#}")]
    Load(anyhow::Error),

    #[error("Export failed: {0}")]
    Export(#[from] ExportError),
}

impl ExportApplicationCommand {
    pub fn validate(&self) -> Result<(), ExportApplicationError> {
        validate_segment("application_id", &self.application_id)?;
        Ok(())
    }
}

#[instrument(
    skip(state, command),
    fields(application_id = %command.application_id, last_watermark = ?command.last_watermark)
)]
pub async fn handle(
    state: &EtlWebhookState,
    command: ExportApplicationCommand,
) -> Result<ExportApplicationResponse, ExportApplicationError> {
    command.validate()?;

    let snapshot = state
        .loader
        .load(&command.application_id)
        .await
        .map_err(ExportApplicationError::Load)?
        .ok_or_else(|| ExportApplicationError::NotFound(command.application_id.clone()))?;

    let manifest = state
        .exporter
        .export_star_schema(&snapshot.application, &snapshot.documents)
        .await?;

    let processing_notified = match &state.processing {
        Some(notifier) => {
            let blob_paths: Vec<String> = manifest.documents.iter().map(|d| d.blob_path.clone()).collect();
            notifier
                .notify(&command.application_id, state.exporter.container(), &blob_paths)
                .await
        },
        None => false,
    };

    info!(
        documents = manifest.documents.len(),
        total_size_bytes = manifest.total_size_bytes,
        processing_notified,
        "Application exported"
    );

    Ok(ExportApplicationResponse {
        application_id: command.application_id,
        manifest,
        processing_notified,
    })
}
