use async_trait::async_trait;
use recruit_common::checksum::sha256_hex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{ObjectMetadata, ObjectStore, PutResult, StorageWriteError};

/// An object held by [`InMemoryObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub metadata: ObjectMetadata,
}

#[derive(Default)]
struct Inner {
    objects: HashMap<(String, String), StoredObject>,
    /// Every attempted key, in call order, including failed attempts
    write_log: Vec<String>,
    failing_prefixes: Vec<String>,
}

/// Process-local object store with the same overwrite semantics as S3.
///
/// Cloning shares the underlying map. Writes to keys matching a registered
/// failure prefix are rejected, which lets tests exercise partial failures.
#[derive(Clone, Default)]
pub struct InMemoryObjectStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject every subsequent write whose key starts with `prefix`
    pub async fn fail_writes_matching(&self, prefix: impl Into<String>) {
        self.inner.write().await.failing_prefixes.push(prefix.into());
    }

    pub async fn get(&self, container: &str, key: &str) -> Option<StoredObject> {
        self.inner
            .read()
            .await
            .objects
            .get(&(container.to_string(), key.to_string()))
            .cloned()
    }

    /// Stored keys of a container, sorted
    pub async fn keys(&self, container: &str) -> Vec<String> {
        let inner = self.inner.read().await;
        let mut keys: Vec<String> = inner
            .objects
            .keys()
            .filter(|(c, _)| c == container)
            .map(|(_, k)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    pub async fn write_log(&self) -> Vec<String> {
        self.inner.read().await.write_log.clone()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.objects.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        container: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> Result<PutResult, StorageWriteError> {
        let mut inner = self.inner.write().await;
        inner.write_log.push(key.to_string());

        if inner.failing_prefixes.iter().any(|p| key.starts_with(p.as_str())) {
            return Err(StorageWriteError::new(
                container,
                key,
                std::io::Error::other("simulated object store failure"),
            ));
        }

        let result = PutResult {
            url: format!("memory://{}/{}", container, key),
            key: key.to_string(),
            size_bytes: data.len() as u64,
            checksum: sha256_hex(&data),
        };

        debug!(container, key, size = result.size_bytes, "Stored object in memory");

        inner.objects.insert(
            (container.to_string(), key.to_string()),
            StoredObject {
                data,
                content_type: content_type.to_string(),
                metadata: metadata.clone(),
            },
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_overwrites_existing_object() {
        let store = InMemoryObjectStore::new();
        let metadata = ObjectMetadata::table("dim_candidates");

        store
            .put("raw", "k.json", b"first".to_vec(), "application/json", &metadata)
            .await
            .unwrap();
        let second = store
            .put("raw", "k.json", b"second!".to_vec(), "application/json", &metadata)
            .await
            .unwrap();

        assert_eq!(second.size_bytes, 7);
        assert_eq!(store.len().await, 1);
        let stored = store.get("raw", "k.json").await.unwrap();
        assert_eq!(stored.data, b"second!");
        assert!(recruit_common::checksum::verify_sha256(&stored.data, &second.checksum).is_ok());
        assert_eq!(stored.metadata.get("table"), Some("dim_candidates"));
    }

    #[tokio::test]
    async fn test_injected_failure_is_logged_and_not_stored() {
        let store = InMemoryObjectStore::new();
        store.fail_writes_matching("documents/").await;

        let err = store
            .put("raw", "documents/a/cv.pdf", vec![1, 2, 3], "application/pdf", &ObjectMetadata::new())
            .await
            .unwrap_err();

        assert_eq!(err.key, "documents/a/cv.pdf");
        assert!(store.is_empty().await);
        assert_eq!(store.write_log().await, vec!["documents/a/cv.pdf".to_string()]);
    }

    #[tokio::test]
    async fn test_containers_are_isolated() {
        let store = InMemoryObjectStore::new();
        let metadata = ObjectMetadata::new();
        store.put("raw", "a", vec![1], "text/plain", &metadata).await.unwrap();
        store.put("curated", "b", vec![2], "text/plain", &metadata).await.unwrap();

        assert_eq!(store.keys("raw").await, vec!["a".to_string()]);
        assert!(store.get("raw", "b").await.is_none());
    }
}
