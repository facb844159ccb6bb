//! Export of one application into the star-schema landing zone
//!
//! Writes are ordered: candidate dimension, job-offer dimension, fact, then
//! each document. A failed structured write aborts the export; a failed
//! document write is logged and skipped.

use chrono::NaiveDate;
use recruit_common::types::{ApplicationAggregate, ApplicationDocument};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info, instrument, warn};

use super::manifest::{DocumentEntry, ExportManifest, WrittenRecord};
use super::paths::{self, EntityType, InvalidKeyError};
use super::star_schema;
use crate::retry::{FailedDelivery, NoRetry, RetryPolicy};
use crate::storage::{ObjectMetadata, ObjectStore, StorageWriteError};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Fatal export failures.
///
/// Variants raised after writes have started carry the manifest of what was
/// already written.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Invalid application aggregate: {0}")]
    InvalidAggregate(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(#[from] InvalidKeyError),

    #[error("Failed to serialize {table} record: {source}")]
    Serialization {
        table: &'static str,
        #[source]
        source: serde_json::Error,
        partial: Box<ExportManifest>,
    },

    #[error("Failed to write {table} record: {source}")]
    Storage {
        table: &'static str,
        #[source]
        source: StorageWriteError,
        partial: Box<ExportManifest>,
    },
}

impl ExportError {
    /// What was written before the export aborted
    pub fn partial_manifest(&self) -> Option<&ExportManifest> {
        match self {
            ExportError::Serialization { partial, .. } | ExportError::Storage { partial, .. } => Some(&**partial),
            ExportError::InvalidAggregate(_) | ExportError::InvalidKey(_) => None,
        }
    }
}

/// A document with a payload and a valid key
struct PlannedDocument<'a> {
    document: &'a ApplicationDocument,
    data: &'a [u8],
    key: String,
}

#[derive(Clone)]
pub struct EtlExportService {
    store: Arc<dyn ObjectStore>,
    container: String,
    retry_policy: Arc<dyn RetryPolicy>,
}

impl EtlExportService {
    pub fn new(store: Arc<dyn ObjectStore>, container: impl Into<String>) -> Self {
        Self {
            store,
            container: container.into(),
            retry_policy: Arc::new(NoRetry),
        }
    }

    pub fn with_retry_policy(mut self, retry_policy: Arc<dyn RetryPolicy>) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Export under today's UTC ingestion partition
    pub async fn export_star_schema(
        &self,
        aggregate: &ApplicationAggregate,
        documents: &[ApplicationDocument],
    ) -> Result<ExportManifest, ExportError> {
        self.export_star_schema_on(aggregate, documents, paths::today())
            .await
    }

    /// Export under an explicit ingestion partition
    #[instrument(
        skip(self, aggregate, documents),
        fields(application_id = %aggregate.id, container = %self.container)
    )]
    pub async fn export_star_schema_on(
        &self,
        aggregate: &ApplicationAggregate,
        documents: &[ApplicationDocument],
        ingestion_date: NaiveDate,
    ) -> Result<ExportManifest, ExportError> {
        let result = self.run_export(aggregate, documents, ingestion_date).await;

        match &result {
            Ok(manifest) => info!(
                documents_written = manifest.documents.len(),
                documents_received = documents.len(),
                total_size_bytes = manifest.total_size_bytes,
                "Star schema export completed"
            ),
            Err(e) => {
                error!(error = %e, "Star schema export failed");
                self.retry_policy
                    .on_failure(FailedDelivery::Export {
                        application_id: aggregate.id.clone(),
                        error: e.to_string(),
                    })
                    .await;
            },
        }

        result
    }

    async fn run_export(
        &self,
        aggregate: &ApplicationAggregate,
        documents: &[ApplicationDocument],
        ingestion_date: NaiveDate,
    ) -> Result<ExportManifest, ExportError> {
        aggregate
            .validate()
            .map_err(|e| ExportError::InvalidAggregate(e.to_string()))?;

        // All structured keys are resolved before the first write
        let date = Some(ingestion_date);
        let candidate_key = paths::build_key(EntityType::DimCandidates, &aggregate.candidate_id, date)?;
        let job_offer_key = paths::build_key(EntityType::DimJobOffers, &aggregate.job_offer_id, date)?;
        let fact_key = paths::build_key(EntityType::FactApplications, &aggregate.id, date)?;
        let planned = plan_documents(&aggregate.id, documents, ingestion_date);

        let partition_date = ingestion_date.format("%Y-%m-%d").to_string();
        let mut manifest = ExportManifest::default();

        let dim_candidate = star_schema::build_dim_candidate(aggregate, ingestion_date);
        let metadata = ObjectMetadata::table(EntityType::DimCandidates.as_str())
            .with("candidate_id", &aggregate.candidate_id)
            .with("ingestion_date", &partition_date);
        let written = self
            .write_record(EntityType::DimCandidates, &candidate_key, &dim_candidate, &metadata, &manifest)
            .await?;
        manifest.set_dim_candidate(written);

        let dim_job_offer = star_schema::build_dim_job_offer(aggregate, ingestion_date);
        let metadata = ObjectMetadata::table(EntityType::DimJobOffers.as_str())
            .with("job_offer_id", &aggregate.job_offer_id)
            .with("ingestion_date", &partition_date);
        let written = self
            .write_record(EntityType::DimJobOffers, &job_offer_key, &dim_job_offer, &metadata, &manifest)
            .await?;
        manifest.set_dim_job_offer(written);

        let blob_paths = planned.iter().map(|p| p.key.clone()).collect();
        let fact = star_schema::build_fact_application(aggregate, documents, ingestion_date)
            .with_document_blob_paths(blob_paths);
        let metadata = ObjectMetadata::table(EntityType::FactApplications.as_str())
            .with("application_id", &aggregate.id)
            .with("candidate_id", &aggregate.candidate_id)
            .with("job_offer_id", &aggregate.job_offer_id)
            .with("ingestion_date", &partition_date);
        let written = self
            .write_record(EntityType::FactApplications, &fact_key, &fact, &metadata, &manifest)
            .await?;
        manifest.set_fact_application(written);

        for planned in planned {
            if let Some(entry) = self.write_document(&aggregate.id, &partition_date, planned).await {
                manifest.add_document(entry);
            }
        }

        Ok(manifest)
    }

    async fn write_record<T: Serialize>(
        &self,
        entity_type: EntityType,
        key: &str,
        record: &T,
        metadata: &ObjectMetadata,
        manifest: &ExportManifest,
    ) -> Result<WrittenRecord, ExportError> {
        let table = entity_type.as_str();
        let payload = serde_json::to_vec_pretty(record).map_err(|source| ExportError::Serialization {
            table,
            source,
            partial: Box::new(manifest.clone()),
        })?;

        let put = self
            .store
            .put(&self.container, key, payload, JSON_CONTENT_TYPE, metadata)
            .await
            .map_err(|source| ExportError::Storage {
                table,
                source,
                partial: Box::new(manifest.clone()),
            })?;

        debug!(table, key = %put.key, size = put.size_bytes, "Wrote record");

        Ok(WrittenRecord {
            path: put.key,
            size_bytes: put.size_bytes,
        })
    }

    async fn write_document(
        &self,
        application_id: &str,
        partition_date: &str,
        planned: PlannedDocument<'_>,
    ) -> Option<DocumentEntry> {
        let document = planned.document;
        let metadata = ObjectMetadata::entity_type("document")
            .with("application_id", application_id)
            .with("document_type", &document.document_type)
            .with("file_name", &document.file_name)
            .with("ingestion_date", partition_date);

        let content_type = content_type_for(&document.file_name);
        match self
            .store
            .put(&self.container, &planned.key, planned.data.to_vec(), content_type, &metadata)
            .await
        {
            Ok(put) => {
                debug!(
                    document_type = %document.document_type,
                    key = %put.key,
                    size = put.size_bytes,
                    "Wrote document"
                );
                Some(DocumentEntry {
                    document_type: document.document_type.clone(),
                    blob_path: put.key,
                    size_bytes: put.size_bytes,
                })
            },
            Err(e) => {
                error!(
                    document_type = %document.document_type,
                    file_name = %document.file_name,
                    error = %e,
                    "Document write failed, skipping"
                );
                None
            },
        }
    }
}

/// Documents that will be written, in input order.
///
/// Documents without a payload or whose key cannot be built are skipped
/// here, so the fact's `document_blob_paths` only names objects the export
/// attempts to write. Two documents resolving to the same key would overwrite
/// each other; the first one wins and later ones are skipped.
fn plan_documents<'a>(
    application_id: &str,
    documents: &'a [ApplicationDocument],
    ingestion_date: NaiveDate,
) -> Vec<PlannedDocument<'a>> {
    let mut planned = Vec::with_capacity(documents.len());
    let mut seen_keys = HashSet::new();

    for document in documents {
        let Some(data) = document.payload() else {
            warn!(
                document_type = %document.document_type,
                file_name = %document.file_name,
                "Document has no payload, skipping"
            );
            continue;
        };

        let key = match paths::build_document_key(
            application_id,
            &document.document_type,
            &document.file_name,
            Some(ingestion_date),
        ) {
            Ok(key) => key,
            Err(e) => {
                warn!(
                    document_type = %document.document_type,
                    file_name = %document.file_name,
                    error = %e,
                    "Document key is invalid, skipping"
                );
                continue;
            },
        };

        if !seen_keys.insert(key.clone()) {
            warn!(
                document_type = %document.document_type,
                file_name = %document.file_name,
                key = %key,
                "Document key already used in this export, skipping"
            );
            continue;
        }

        planned.push(PlannedDocument { document, data, key });
    }

    planned
}

/// MIME type derived from the file extension
pub fn content_type_for(file_name: &str) -> &'static str {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("pdf") => "application/pdf",
        Some("doc") => "application/msword",
        Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("txt") => "text/plain",
        Some("json") => JSON_CONTENT_TYPE,
        _ => "application/octet-stream",
    }
}
