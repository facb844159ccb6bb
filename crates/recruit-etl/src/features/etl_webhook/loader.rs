//! Source of application snapshots for the export endpoint
//!
//! The relational fetch of an application and its joins lives with the
//! submission system. The endpoint only depends on [`AggregateLoader`].

use anyhow::Context;
use async_trait::async_trait;
use recruit_common::types::ApplicationSnapshot;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[async_trait]
pub trait AggregateLoader: Send + Sync {
    /// Load an application with its candidate, profile, job offer and
    /// documents. `Ok(None)` when the application does not exist.
    async fn load(&self, application_id: &str) -> anyhow::Result<Option<ApplicationSnapshot>>;
}

/// Snapshots held in memory, keyed by application id
#[derive(Clone, Default)]
pub struct InMemoryAggregateLoader {
    snapshots: Arc<RwLock<HashMap<String, ApplicationSnapshot>>>,
}

impl InMemoryAggregateLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, snapshot: ApplicationSnapshot) {
        self.snapshots
            .write()
            .await
            .insert(snapshot.application.id.clone(), snapshot);
    }
}

#[async_trait]
impl AggregateLoader for InMemoryAggregateLoader {
    async fn load(&self, application_id: &str) -> anyhow::Result<Option<ApplicationSnapshot>> {
        Ok(self.snapshots.read().await.get(application_id).cloned())
    }
}

/// Reads `{dir}/{application_id}.json` snapshot files
#[derive(Debug, Clone)]
pub struct DirectoryAggregateLoader {
    dir: PathBuf,
}

impl DirectoryAggregateLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn snapshot_path(&self, application_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", application_id))
    }
}

#[async_trait]
impl AggregateLoader for DirectoryAggregateLoader {
    async fn load(&self, application_id: &str) -> anyhow::Result<Option<ApplicationSnapshot>> {
        let path = self.snapshot_path(application_id);

        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "No snapshot for application");
                return Ok(None);
            },
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read snapshot {}", path.display()));
            },
        };

        let snapshot = ApplicationSnapshot::from_json_slice(&raw)
            .with_context(|| format!("Invalid snapshot {}", path.display()))?;

        if snapshot.application.id != application_id {
            anyhow::bail!(
                "Snapshot {} holds application '{}'",
                path.display(),
                snapshot.application.id
            );
        }

        Ok(Some(snapshot))
    }
}
