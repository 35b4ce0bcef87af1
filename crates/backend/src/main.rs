//! Recall backend server.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use recall_backend::{build_router, config::BackendConfig, state::AppState};
use recall_core::config::DatabaseConfig;
use recall_core::db::{create_pool, ensure_schema};
use recall_core::integration::slack::SlackClient;

/// Initialize tracing/logging.
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,recall_backend=debug,recall=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = BackendConfig::from_env()?;

    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.workers)
        .enable_all()
        .build()?
        .block_on(serve(config))
}

async fn serve(config: BackendConfig) -> anyhow::Result<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        workers = config.workers,
        "Starting Recall backend"
    );

    let db_config = DatabaseConfig::from_env().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load database config, using defaults");
        DatabaseConfig::default()
    });

    let db_pool = create_pool(&db_config).await?;
    ensure_schema(&db_pool).await?;

    let slack = config
        .slack_bot_token
        .as_deref()
        .map(|token| SlackClient::new(reqwest::Client::new(), token));

    let bot_user_id = match &slack {
        Some(client) => match client.bot_user_id().await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(error = %e, "auth.test failed, bot joins will not be recognised");
                None
            }
        },
        None => {
            tracing::info!("SLACK_BOT_TOKEN not set, team names fall back to team ids");
            None
        }
    };

    let addr: SocketAddr = config.bind_address().parse()?;
    let state = AppState::new(db_pool, config, slack, bot_user_id);
    let app = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
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
            tracing::info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
