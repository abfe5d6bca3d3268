//! Guestbook REST service
//!
//! Serves:
//! - Entry list/get/create/delete under `/api/guestbook`
//! - Health and build info under `/actuator`
//!
//! Entries are stored in SQLite unless `--memory` is given.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use guestbook_service::config::{Config, Overrides};
use guestbook_service::cors::CorsPolicy;
use guestbook_service::{router, AppState};
use guestbook_store::{EntryRepository, MemoryRepository, SqliteRepository};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "guestbook-service")]
#[command(about = "REST API for guestbook entries")]
struct Cli {
    /// Optional JSON config file
    #[arg(long, env = "GUESTBOOK_CONFIG")]
    config: Option<PathBuf>,

    #[command(flatten)]
    overrides: Overrides,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "guestbook_service=info,guestbook_store=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::load(cli.config.as_deref())?;
    config.apply_overrides(cli.overrides);

    let cors = CorsPolicy::from_config(&config.cors).context("Invalid CORS configuration")?;
    tracing::info!("Allowed origins: {:?}", config.cors.allowed_origins);

    let repository: Arc<dyn EntryRepository> = if config.database.in_memory {
        tracing::warn!("Using in-memory store; entries are lost on shutdown");
        Arc::new(MemoryRepository::new())
    } else {
        let repository = SqliteRepository::open(&config.database.path).with_context(|| {
            format!("Failed to open database: {:?}", config.database.path)
        })?;
        Arc::new(repository)
    };

    let state = Arc::new(AppState::new(repository));
    let app = router(state, &cors);

    let addr = config.server.socket_addr()?;

    tracing::info!("Starting guestbook-service on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Guestbook service shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
