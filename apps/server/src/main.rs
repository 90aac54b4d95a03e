//! # Niaga Server
//!
//! HTTP entry point for the Niaga POS back-office.
//!
//! ## Startup
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  env ──► ServerConfig::load ──► Database::new (migrations) ──► Router  │
//! │                                                                         │
//! │  dashboard / kasir ───► HTTP (8080) ───► handlers ───► SQLite (WAL)    │
//! │                                                                         │
//! │  SIGINT / SIGTERM ───► graceful shutdown ───► pool closed               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use niaga_db::{Database, DbConfig};
use niaga_server::{build_router, AppState, ServerConfig};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Niaga POS server...");

    // Load configuration
    let config = ServerConfig::load().context("invalid configuration")?;
    info!(
        addr = %config.bind_addr(),
        db = %config.database_path,
        tz_offset_hours = config.tz_offset_hours,
        "Configuration loaded"
    );
    if config.uses_dev_secret() {
        warn!("JWT_SECRET not set, using the development secret");
    }

    // Connect to database (runs migrations)
    let db = Database::new(
        DbConfig::new(&config.database_path).max_connections(config.db_max_connections),
    )
    .await
    .context("failed to open database")?;
    info!("Database ready");

    let addr = config.bind_addr();
    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins; otherwise info with debug for this crate.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,niaga_server=debug,tower_http=info,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
