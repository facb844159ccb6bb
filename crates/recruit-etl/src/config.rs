//! Configuration management

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::features::etl_webhook::processing::DEFAULT_PROCESSING_TIMEOUT_SECS;
use crate::storage::StorageConfig;
use crate::webhook::config::WEBHOOK_SECRET_VAR;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8000;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// ============================================================================
// ETL Configuration Constants
// ============================================================================

/// Default container (bucket) receiving the exported objects.
pub const DEFAULT_ETL_CONTAINER: &str = "raw";

/// Default directory of application snapshots for local runs.
pub const DEFAULT_AGGREGATE_DIR: &str = "./data/applications";

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub etl: EtlConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
}

/// Export configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct EtlConfig {
    pub container: String,
    pub aggregate_dir: PathBuf,
    /// Expected `X-Webhook-Token` on the export endpoint
    #[serde(skip_serializing)]
    pub webhook_secret: Option<String>,
    pub processing_function_url: Option<String>,
    pub processing_timeout_secs: u64,
}

impl std::fmt::Debug for EtlConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EtlConfig")
            .field("container", &self.container)
            .field("aggregate_dir", &self.aggregate_dir)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "<redacted>"))
            .field("processing_function_url", &self.processing_function_url)
            .field("processing_timeout_secs", &self.processing_timeout_secs)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env::var("RECRUIT_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string()),
                port: env::var("RECRUIT_PORT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env::var("RECRUIT_SHUTDOWN_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS),
            },
            etl: EtlConfig {
                container: non_empty_var("ETL_CONTAINER")
                    .or_else(storage_bucket)
                    .unwrap_or_else(|| DEFAULT_ETL_CONTAINER.to_string()),
                aggregate_dir: env::var("ETL_AGGREGATE_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|_| PathBuf::from(DEFAULT_AGGREGATE_DIR)),
                webhook_secret: non_empty_var(WEBHOOK_SECRET_VAR),
                processing_function_url: non_empty_var("ETL_PROCESSING_FUNCTION_URL"),
                processing_timeout_secs: env::var("ETL_PROCESSING_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(DEFAULT_PROCESSING_TIMEOUT_SECS),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        let container = self.etl.container.trim();
        if container.is_empty() {
            anyhow::bail!("ETL container cannot be empty");
        }
        if container != self.etl.container || container.contains('/') {
            anyhow::bail!("ETL container '{}' is not a valid bucket name", self.etl.container);
        }

        if self.etl.processing_function_url.is_some() && self.etl.processing_timeout_secs == 0 {
            anyhow::bail!("Processing function timeout must be greater than 0");
        }

        if self.etl.webhook_secret.is_none() {
            tracing::warn!("No webhook secret configured - the ETL endpoint accepts unauthenticated calls");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            },
            etl: EtlConfig {
                container: DEFAULT_ETL_CONTAINER.to_string(),
                aggregate_dir: PathBuf::from(DEFAULT_AGGREGATE_DIR),
                webhook_secret: None,
                processing_function_url: None,
                processing_timeout_secs: DEFAULT_PROCESSING_TIMEOUT_SECS,
            },
        }
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Bucket named by the storage configuration. A malformed connection string
/// is reported when the store itself is built.
fn storage_bucket() -> Option<String> {
    StorageConfig::from_env().ok().and_then(|storage| storage.bucket)
}
