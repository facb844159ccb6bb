//! ETL webhook route
//!
//! - `POST /api/v1/etl/webhook/application-submitted` - Export one application

use crate::api::response::{ApiResponse, ErrorResponse};
use crate::etl::ExportError;
use crate::webhook::WEBHOOK_TOKEN_HEADER;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde_json::json;
use subtle::ConstantTimeEq;

use super::commands::{ExportApplicationCommand, ExportApplicationError};
use super::EtlWebhookState;

pub fn etl_webhook_routes() -> Router<EtlWebhookState> {
    Router::new().route("/webhook/application-submitted", post(application_submitted))
}

/// Export a submitted application
///
/// # Response
///
/// - `202 Accepted` - Export ran; body carries the manifest
/// - `400 Bad Request` - Malformed body or application id
/// - `401 Unauthorized` - Missing or wrong `X-Webhook-Token`
/// - `404 Not Found` - Unknown application
/// - `500 Internal Server Error` - Export aborted; body carries the partial manifest
#[tracing::instrument(skip_all)]
async fn application_submitted(
    State(state): State<EtlWebhookState>,
    headers: HeaderMap,
    body: Result<Json<ExportApplicationCommand>, JsonRejection>,
) -> Result<Response, EtlWebhookApiError> {
    authorize(&state, &headers)?;

    let Json(command) = body.map_err(|e| EtlWebhookApiError::MalformedBody(e.body_text()))?;
    let response = super::commands::export::handle(&state, command).await?;

    tracing::info!(
        application_id = %response.application_id,
        documents = response.manifest.documents.len(),
        "ETL webhook handled"
    );

    Ok((StatusCode::ACCEPTED, Json(ApiResponse::success(response))).into_response())
}

fn authorize(state: &EtlWebhookState, headers: &HeaderMap) -> Result<(), EtlWebhookApiError> {
    let Some(secret) = state.webhook_secret.as_deref() else {
        return Ok(());
    };

    let Some(provided) = headers.get(WEBHOOK_TOKEN_HEADER) else {
        return Err(EtlWebhookApiError::Unauthorized);
    };

    if tokens_match(provided.as_bytes(), secret.as_bytes()) {
        Ok(())
    } else {
        Err(EtlWebhookApiError::Unauthorized)
    }
}

/// Constant-time comparison; only the length leaks.
fn tokens_match(provided: &[u8], expected: &[u8]) -> bool {
    provided.len() == expected.len() && bool::from(provided.ct_eq(expected))
}

#[derive(Debug)]
enum EtlWebhookApiError {
    Unauthorized,
    MalformedBody(String),
    Export(ExportApplicationError),
}

impl From<ExportApplicationError> for EtlWebhookApiError {
    fn from(err: ExportApplicationError) -> Self {
        Self::Export(err)
    }
}

impl IntoResponse for EtlWebhookApiError {
    fn into_response(self) -> Response {
        match self {
            EtlWebhookApiError::Unauthorized => {
                tracing::warn!("Rejected ETL webhook call with invalid token");
                let error = ErrorResponse::new("UNAUTHORIZED", "Invalid webhook token");
                (StatusCode::UNAUTHORIZED, Json(error)).into_response()
            },
            EtlWebhookApiError::MalformedBody(message) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", message);
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            EtlWebhookApiError::Export(err @ ExportApplicationError::InvalidApplicationId(_)) => {
                let error = ErrorResponse::new("VALIDATION_ERROR", err.to_string());
                (StatusCode::BAD_REQUEST, Json(error)).into_response()
            },
            EtlWebhookApiError::Export(err @ ExportApplicationError::NotFound(_)) => {
                let error = ErrorResponse::new("NOT_FOUND", err.to_string());
                (StatusCode::NOT_FOUND, Json(error)).into_response()
            },
            EtlWebhookApiError::Export(ExportApplicationError::Load(err)) => {
                tracing::error!("Failed to load application: {:#}", err);
                let error = ErrorResponse::new("LOAD_ERROR", "The application could not be loaded");
                (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
            },
            EtlWebhookApiError::Export(ExportApplicationError::Export(err)) => export_failed(&err),
        }
    }
}

fn export_failed(err: &ExportError) -> Response {
    let manifest = err.partial_manifest().cloned().unwrap_or_default();
    let error = ErrorResponse::with_details("EXPORT_FAILED", err.to_string(), json!({ "manifest": manifest }));
    (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
}
