//! Inner Compass - journaling service entry point
//!
//! Resolves configuration, opens the database, repairs any entries left
//! without an analysis, and serves the JSON API.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use inner_compass::config::{self, FileConfig, PipelineConfig};
use inner_compass::services::{EntryAnalyzer, GeminiClient};
use inner_compass::{db, AppState};

/// Command-line arguments for inner-compass
#[derive(Parser, Debug)]
#[command(name = "inner-compass")]
#[command(about = "Journaling service with AI-assisted reflection")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "3000", env = "INNER_COMPASS_PORT")]
    port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "INNER_COMPASS_HOST")]
    host: String,

    /// Directory holding the SQLite database
    #[arg(short, long, env = "INNER_COMPASS_DATA_DIR")]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "inner_compass=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting Inner Compass journaling service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let file_config = FileConfig::load();
    let data_dir = config::resolve_data_dir(args.data_dir.clone(), &file_config);
    let db_path = config::database_path(&data_dir);
    info!("Database: {}", db_path.display());

    let pool = db::init_database(&db_path)
        .await
        .context("Failed to initialize database")?;

    let pipeline_config = PipelineConfig {
        api_key_fallback: config::resolve_api_key_fallback(&file_config),
        ..PipelineConfig::default()
    };
    if pipeline_config.api_key_fallback.is_none() {
        info!(
            "No Gemini API key fallback configured; set one via POST /settings, \
             the {} environment variable, or the config file",
            config::GEMINI_API_KEY_ENV
        );
    }

    let client = GeminiClient::new().context("Failed to build generation client")?;
    let analyzer = Arc::new(EntryAnalyzer::new(
        pool.clone(),
        Arc::new(client),
        pipeline_config,
    ));

    // Repair the crash window between entry insert and analysis upsert
    let repaired = analyzer
        .ensure_analyses()
        .await
        .context("Startup analysis repair failed")?;
    if repaired > 0 {
        info!(repaired, "Backfilled missing analyses at startup");
    }

    let state = AppState::new(pool, analyzer);
    let app = inner_compass::build_router(state);

    let host: std::net::IpAddr = args.host.parse().context("Invalid host address")?;
    let addr = SocketAddr::from((host, args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
