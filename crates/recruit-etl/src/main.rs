//! Recruitment ETL - Main entry point

use anyhow::Result;
use recruit_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tokio::signal;
use tracing::info;

use recruit_etl::{
    api,
    config::Config,
    etl::EtlExportService,
    features::{
        etl_webhook::{DirectoryAggregateLoader, EtlWebhookState, ProcessingNotifier},
        FeatureState,
    },
    storage::{S3ObjectStore, StorageConfig},
};

#[tokio::main]
async fn main() -> Result<()> {
    let log_config = LogConfig::builder()
        .log_file_prefix("recruit-etl")
        .filter_directives("recruit_etl=debug,tower_http=debug,aws_smithy_runtime=info")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Recruitment ETL");

    let config = Config::load()?;
    info!(
        "Configuration loaded - server will bind to {}:{}",
        config.server.host, config.server.port
    );

    let storage_config = StorageConfig::from_env()?;
    let store = S3ObjectStore::new(storage_config).await?;
    info!(container = %config.etl.container, "Storage client initialized");

    let exporter = EtlExportService::new(Arc::new(store), config.etl.container.clone());

    let loader = DirectoryAggregateLoader::new(config.etl.aggregate_dir.clone());
    info!(dir = %loader.dir().display(), "Reading application snapshots");

    let processing = config
        .etl
        .processing_function_url
        .as_ref()
        .map(|url| ProcessingNotifier::new(url.clone(), Duration::from_secs(config.etl.processing_timeout_secs)))
        .transpose()?;
    if let Some(notifier) = &processing {
        info!(url = %notifier.url(), "Processing function notification enabled");
    }

    let state = FeatureState {
        etl: EtlWebhookState {
            exporter,
            loader: Arc::new(loader),
            webhook_secret: config.etl.webhook_secret.clone(),
            processing,
        },
    };

    let app = api::create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(config.server.shutdown_timeout_secs))
        .await?;

    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal(timeout_secs: u64) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }

    // In-flight exports get a bounded grace period
    info!("Waiting up to {} seconds for connections to close", timeout_secs);
    tokio::time::sleep(Duration::from_secs(timeout_secs.min(5))).await;
}
