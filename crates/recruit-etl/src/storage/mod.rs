//! Object store client
//!
//! Write-only byte-level access to the object store backing the export
//! warehouse. Every write overwrites whatever is stored under the key (last
//! writer wins, no versioning) and is tagged with string metadata so external
//! catalogues can index the object without reading it.
//!
//! Two backends are provided:
//! - [`S3ObjectStore`] for S3-compatible storage (AWS, MinIO)
//! - [`InMemoryObjectStore`] for tests and local runs

use async_trait::async_trait;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub mod config;
pub mod memory;
pub mod s3;

pub use config::StorageConfig;
pub use memory::{InMemoryObjectStore, StoredObject};
pub use s3::S3ObjectStore;

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The object store rejected or failed a write.
///
/// Carries the underlying transport error. Not retried by the client.
#[derive(Debug, Error)]
#[error("Failed to write object {container}/{key}: {source}")]
pub struct StorageWriteError {
    pub container: String,
    pub key: String,
    #[source]
    pub source: BoxError,
}

impl StorageWriteError {
    pub fn new(
        container: impl Into<String>,
        key: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            container: container.into(),
            key: key.into(),
            source: source.into(),
        }
    }
}

/// Outcome of a successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PutResult {
    pub url: String,
    pub key: String,
    pub size_bytes: u64,
    /// SHA-256 of the payload, hex encoded
    pub checksum: String,
}

/// String tags attached to every written object
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ObjectMetadata(BTreeMap<String, String>);

impl ObjectMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Metadata for a star-schema record, tagged with its table name
    pub fn table(name: &str) -> Self {
        Self::new().with("table", name)
    }

    /// Metadata for a non-tabular object such as a binary document
    pub fn entity_type(name: &str) -> Self {
        Self::new().with("entity_type", name)
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.0.insert(key.into(), value.to_string());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Byte-level writes against an object store.
///
/// Implementations must treat `put` as a single atomic object write that
/// replaces any existing object under `key`.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        container: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> Result<PutResult, StorageWriteError>;
}
