use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::env;

/// Default region when none is configured.
pub const DEFAULT_S3_REGION: &str = "us-east-1";

/// Default per-operation timeout for object store calls, in seconds.
pub const DEFAULT_OPERATION_TIMEOUT_SECS: u64 = 30;

/// Environment variable holding a connection-string style storage configuration.
pub const STORAGE_CONNECTION_STRING_VAR: &str = "STORAGE_CONNECTION_STRING";

#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    pub endpoint: Option<String>,
    pub region: String,
    /// Default container for exports when `ETL_CONTAINER` is unset
    pub bucket: Option<String>,
    /// `None` falls back to the default AWS credential chain
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub path_style: bool,
    pub operation_timeout_secs: u64,
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "<redacted>"))
            .field("path_style", &self.path_style)
            .field("operation_timeout_secs", &self.operation_timeout_secs)
            .finish()
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: DEFAULT_S3_REGION.to_string(),
            bucket: None,
            access_key: None,
            secret_key: None,
            path_style: false,
            operation_timeout_secs: DEFAULT_OPERATION_TIMEOUT_SECS,
        }
    }
}

impl StorageConfig {
    /// Load from `STORAGE_CONNECTION_STRING` when set, otherwise from the
    /// individual `S3_*` variables.
    pub fn from_env() -> anyhow::Result<Self> {
        if let Some(connection) = connection_string_from_env() {
            return Self::from_connection_string(&connection);
        }

        Ok(Self {
            endpoint: env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty()),
            region: env::var("S3_REGION").unwrap_or_else(|_| DEFAULT_S3_REGION.to_string()),
            bucket: env::var("S3_BUCKET").ok().filter(|v| !v.is_empty()),
            access_key: env::var("S3_ACCESS_KEY")
                .or_else(|_| env::var("AWS_ACCESS_KEY_ID"))
                .ok(),
            secret_key: env::var("S3_SECRET_KEY")
                .or_else(|_| env::var("AWS_SECRET_ACCESS_KEY"))
                .ok(),
            path_style: env::var("S3_PATH_STYLE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            operation_timeout_secs: env::var("S3_OPERATION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_OPERATION_TIMEOUT_SECS),
        })
    }

    /// Parse `key=value` pairs separated by `;`.
    ///
    /// Recognised keys (case-insensitive): `endpoint`, `region`, `bucket`,
    /// `access_key`, `secret_key`, `path_style`, `timeout_secs`.
    ///
    /// ```
    /// use recruit_etl::storage::StorageConfig;
    ///
    /// let config = StorageConfig::from_connection_string(
    ///     "endpoint=http://localhost:9000;access_key=minio;secret_key=minio123;path_style=true",
    /// ).unwrap();
    /// assert!(config.path_style);
    /// ```
    pub fn from_connection_string(connection: &str) -> anyhow::Result<Self> {
        if connection.trim().is_empty() {
            bail!("Storage connection string cannot be empty");
        }

        let mut config = Self::default();

        for pair in connection.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = pair
                .split_once('=')
                .with_context(|| format!("Malformed connection string segment: '{}'", pair))?;
            let value = value.trim();

            match key.trim().to_ascii_lowercase().as_str() {
                "endpoint" => config.endpoint = Some(value.to_string()),
                "region" => config.region = value.to_string(),
                "bucket" => config.bucket = Some(value.to_string()).filter(|v| !v.is_empty()),
                "access_key" => config.access_key = Some(value.to_string()),
                "secret_key" => config.secret_key = Some(value.to_string()),
                "path_style" => {
                    config.path_style = value
                        .parse()
                        .with_context(|| format!("Invalid path_style value: '{}'", value))?
                },
                "timeout_secs" => {
                    config.operation_timeout_secs = value
                        .parse()
                        .with_context(|| format!("Invalid timeout_secs value: '{}'", value))?
                },
                other => bail!("Unknown connection string key: '{}'", other),
            }
        }

        if config.access_key.is_some() != config.secret_key.is_some() {
            bail!("access_key and secret_key must be provided together");
        }

        Ok(config)
    }

}

/// The raw connection string, if one is configured and non-empty.
pub fn connection_string_from_env() -> Option<String> {
    env::var(STORAGE_CONNECTION_STRING_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
}
