use serde::{Deserialize, Serialize};

/// Location and size of a structured record written by an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WrittenRecord {
    pub path: String,
    pub size_bytes: u64,
}

/// A document successfully written by an export
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub document_type: String,
    pub blob_path: String,
    pub size_bytes: u64,
}

/// What a single export wrote.
///
/// Returned to the caller for observability; never persisted. Records that
/// were not written are `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportManifest {
    pub dim_candidate: Option<WrittenRecord>,
    pub dim_job_offer: Option<WrittenRecord>,
    pub fact_application: Option<WrittenRecord>,
    pub documents: Vec<DocumentEntry>,
    pub total_size_bytes: u64,
}

impl ExportManifest {
    pub fn set_dim_candidate(&mut self, record: WrittenRecord) {
        self.total_size_bytes += record.size_bytes;
        self.dim_candidate = Some(record);
    }

    pub fn set_dim_job_offer(&mut self, record: WrittenRecord) {
        self.total_size_bytes += record.size_bytes;
        self.dim_job_offer = Some(record);
    }

    pub fn set_fact_application(&mut self, record: WrittenRecord) {
        self.total_size_bytes += record.size_bytes;
        self.fact_application = Some(record);
    }

    pub fn add_document(&mut self, entry: DocumentEntry) {
        self.total_size_bytes += entry.size_bytes;
        self.documents.push(entry);
    }

    /// All three structured records were written
    pub fn is_complete(&self) -> bool {
        self.dim_candidate.is_some() && self.dim_job_offer.is_some() && self.fact_application.is_some()
    }
}
