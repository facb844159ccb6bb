use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::{
    config::{retry::RetryConfig, timeout::TimeoutConfig, Region},
    primitives::ByteStream,
    Client,
};
use recruit_common::checksum::sha256_hex;
use std::borrow::Cow;
use std::time::Duration;
use tracing::{debug, info, instrument};

use super::{config::StorageConfig, ObjectMetadata, ObjectStore, PutResult, StorageWriteError};

/// S3-compatible object store (AWS S3, MinIO).
///
/// Containers map to buckets. The SDK's own retries are disabled: a failed
/// write surfaces immediately and the caller owns the retry decision.
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
    endpoint: Option<String>,
}

impl S3ObjectStore {
    pub async fn new(config: StorageConfig) -> anyhow::Result<Self> {
        debug!("Initializing object store with config: {:?}", config);

        let timeouts = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.operation_timeout_secs))
            .build();

        let mut builder = match (&config.access_key, &config.secret_key) {
            (Some(access_key), Some(secret_key)) => {
                let credentials =
                    Credentials::new(access_key, secret_key, None, None, "recruit-etl-storage");
                aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .credentials_provider(credentials)
                    .region(Region::new(config.region.clone()))
            },
            _ => {
                let shared = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .load()
                    .await;
                aws_sdk_s3::config::Builder::from(&shared)
            },
        };

        builder = builder
            .force_path_style(config.path_style)
            .retry_config(RetryConfig::disabled())
            .timeout_config(timeouts);

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(builder.build());

        info!(
            endpoint = config.endpoint.as_deref().unwrap_or("aws"),
            region = %config.region,
            "Object store client initialized"
        );

        Ok(Self {
            client,
            endpoint: config.endpoint,
        })
    }

    /// Public location of an object, used in write results
    pub fn object_url(&self, container: &str, key: &str) -> String {
        match &self.endpoint {
            Some(endpoint) => format!("{}/{}/{}", endpoint.trim_end_matches('/'), container, key),
            None => format!("s3://{}/{}", container, key),
        }
    }
}

/// S3 user metadata travels as HTTP headers and must stay US-ASCII.
/// Values with other characters (accented file names) are percent-encoded.
fn metadata_header_value(value: &str) -> Cow<'_, str> {
    if value.chars().all(|c| c.is_ascii_graphic() || c == ' ') {
        Cow::Borrowed(value)
    } else {
        urlencoding::encode(value)
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    #[instrument(skip(self, data, metadata), fields(size = data.len()))]
    async fn put(
        &self,
        container: &str,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
        metadata: &ObjectMetadata,
    ) -> Result<PutResult, StorageWriteError> {
        let checksum = sha256_hex(&data);
        let size_bytes = data.len() as u64;

        debug!("Uploading {} bytes to s3://{}/{}", size_bytes, container, key);

        let mut request = self
            .client
            .put_object()
            .bucket(container)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data));

        for (name, value) in metadata.iter() {
            request = request.metadata(name, metadata_header_value(value));
        }

        request
            .send()
            .await
            .map_err(|e| StorageWriteError::new(container, key, e))?;

        info!("Successfully uploaded to s3://{}/{}", container, key);

        Ok(PutResult {
            url: self.object_url(container, key),
            key: key.to_string(),
            size_bytes,
            checksum,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(endpoint: Option<&str>) -> S3ObjectStore {
        S3ObjectStore {
            client: Client::from_conf(
                aws_sdk_s3::Config::builder()
                    .behavior_version(BehaviorVersion::latest())
                    .build(),
            ),
            endpoint: endpoint.map(str::to_string),
        }
    }

    #[test]
    fn test_object_url_with_endpoint() {
        let store = store(Some("http://localhost:9000/"));
        assert_eq!(
            store.object_url("raw", "facts/fact_applications/ingestion_date=2025-10-17/A1.json"),
            "http://localhost:9000/raw/facts/fact_applications/ingestion_date=2025-10-17/A1.json"
        );
    }

    #[test]
    fn test_metadata_ascii_values_pass_through() {
        assert_eq!(metadata_header_value("2025-10-17"), "2025-10-17");
        assert_eq!(metadata_header_value("lettre motivation.pdf"), "lettre motivation.pdf");
        assert!(matches!(metadata_header_value("cv.pdf"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_metadata_non_ascii_values_are_encoded() {
        let encoded = metadata_header_value("diplôme_élève.pdf");
        assert_eq!(encoded, "dipl%C3%B4me_%C3%A9l%C3%A8ve.pdf");
        assert!(encoded.is_ascii());

        let with_newline = metadata_header_value("a\nb");
        assert_eq!(with_newline, "a%0Ab");
    }

    #[test]
    fn test_object_url_without_endpoint() {
        let store = store(None);
        assert_eq!(store.object_url("raw", "documents/x.pdf"), "s3://raw/documents/x.pdf");
    }
}
