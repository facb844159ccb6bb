//! Recruitment ETL Library
//!
//! Real-time export of submitted job applications into a date-partitioned
//! star schema on S3-compatible object storage.
//!
//! # Overview
//!
//! - **Trigger**: [`webhook::WebhookTriggerService`] notifies the export
//!   endpoint right after a submission, fire-and-forget
//! - **Endpoint**: `POST /api/v1/etl/webhook/application-submitted` loads the
//!   application snapshot and runs the export
//! - **Export**: [`etl::EtlExportService`] writes the candidate and job-offer
//!   dimensions, the application fact and the raw documents
//! - **Storage**: [`storage::ObjectStore`] with an S3 implementation and an
//!   in-memory one for tests
//!
//! # Layout of the landing zone
//!
//! ```text
//! dimensions/dim_candidates/ingestion_date=YYYY-MM-DD/{candidate_id}.json
//! dimensions/dim_job_offers/ingestion_date=YYYY-MM-DD/{job_offer_id}.json
//! facts/fact_applications/ingestion_date=YYYY-MM-DD/{application_id}.json
//! documents/ingestion_date=YYYY-MM-DD/{application_id}/{document_type}_{file_name}
//! ```
//!
//! # Example
//!
//! ```no_run
//! use recruit_etl::etl::EtlExportService;
//! use recruit_etl::storage::{S3ObjectStore, StorageConfig};
//! use std::sync::Arc;
//!
//! # async fn run(snapshot: recruit_common::types::ApplicationSnapshot) -> anyhow::Result<()> {
//! let store = S3ObjectStore::new(StorageConfig::from_env()?).await?;
//! let exporter = EtlExportService::new(Arc::new(store), "raw");
//! let manifest = exporter
//!     .export_star_schema(&snapshot.application, &snapshot.documents)
//!     .await?;
//! println!("wrote {} bytes", manifest.total_size_bytes);
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod etl;
pub mod features;
pub mod middleware;
pub mod retry;
pub mod storage;
pub mod webhook;
