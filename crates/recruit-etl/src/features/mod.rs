//! Feature modules of the recruitment ETL API
//!
//! Each feature is a vertical slice with its own commands and routes.
//!
//! # Features
//!
//! - **etl_webhook**: Star-schema export of a submitted application, called by
//!   the submission system's trigger
//!
//! # Architecture
//!
//! Each feature module follows the structure:
//! - `commands/` - Write operations
//! - `routes.rs` - HTTP route definitions

pub mod etl_webhook;

use axum::Router;

pub use etl_webhook::EtlWebhookState;

/// Shared state for all feature routes
#[derive(Clone)]
pub struct FeatureState {
    pub etl: EtlWebhookState,
}

/// Creates the API router with all feature routes mounted
///
/// - `/etl` - ETL webhook
pub fn router(state: FeatureState) -> Router<()> {
    Router::new().nest("/etl", etl_webhook::etl_webhook_routes().with_state(state.etl))
}
