pub mod commands;
pub mod loader;
pub mod processing;
pub mod routes;

use std::sync::Arc;

use crate::etl::EtlExportService;

pub use commands::{ExportApplicationCommand, ExportApplicationError, ExportApplicationResponse};
pub use loader::{AggregateLoader, DirectoryAggregateLoader, InMemoryAggregateLoader};
pub use processing::ProcessingNotifier;
pub use routes::etl_webhook_routes;

/// State of the ETL webhook route
#[derive(Clone)]
pub struct EtlWebhookState {
    pub exporter: EtlExportService,
    pub loader: Arc<dyn AggregateLoader>,
    /// Expected `X-Webhook-Token`; no check when unset
    pub webhook_secret: Option<String>,
    pub processing: Option<ProcessingNotifier>,
}
