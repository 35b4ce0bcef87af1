//! Recall indexer binary.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recall_core::config::{encryption_key, DatabaseConfig, ProviderConfig};
use recall_core::crypto::Encryptor;
use recall_core::db::{create_pool, ensure_schema};
use recall_core::integration::SourceRegistry;
use recall_indexer::{IndexerConfig, JobHandler, Worker};

/// Initialize tracing/logging.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,recall_indexer=debug,recall=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting Recall indexer"
    );

    let config = IndexerConfig::from_env()?;
    let db_config = DatabaseConfig::from_env()?;
    let providers = ProviderConfig::from_env()?;

    let pool = create_pool(&db_config).await?;
    ensure_schema(&pool).await?;

    let encryptor = Encryptor::from_base64(&encryption_key())?;
    let registry = SourceRegistry::standard(reqwest::Client::new(), &providers);
    let handler = JobHandler::new(pool, registry, encryptor);

    let worker = Worker::new(config, handler).await?;
    worker.run(shutdown_signal()).await
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down");
        }
    }
}
