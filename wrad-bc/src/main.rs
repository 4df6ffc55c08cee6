//! wrad-bc (Radio Broadcast) - continuous radio channel service
//!
//! Rotates through the configured catalog playlist on wall-clock time and
//! streams "now playing" to listeners over SSE.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wrad_bc::catalog::SqliteCatalog;
use wrad_bc::config::Config;
use wrad_bc::{build_router, AppState, RadioScheduler};
use wrad_common::config::LoggingConfig;

const MODULE_NAME: &str = "wrad-bc";

/// Command-line arguments; each overrides the config file
#[derive(Parser, Debug)]
#[command(name = "wrad-bc", version, about = "WRAD radio broadcast service")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "WRAD_BC_PORT")]
    port: Option<u16>,

    /// Path to the catalog database
    #[arg(short, long, env = "WRAD_DATABASE")]
    database: Option<PathBuf>,

    /// Config file (default: <config dir>/wrad/wrad-bc.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Name of the playlist to broadcast
    #[arg(long, env = "WRAD_PLAYLIST")]
    playlist: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = wrad_common::config::resolve_config_path(args.config.as_deref(), MODULE_NAME);
    let mut config: Config = wrad_common::config::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;
    apply_args(&mut config, &args);

    init_tracing(&config.logging)?;

    // Build identification first, before any I/O can stall startup
    info!(
        "Starting WRAD Radio Broadcast (wrad-bc) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match &config_path {
        Some(path) if path.exists() => info!("Configuration file: {}", path.display()),
        _ => info!("No configuration file found, using defaults and arguments"),
    }

    config.validate().context("Invalid configuration")?;

    info!("Catalog database: {}", config.database_path.display());
    let catalog = match SqliteCatalog::connect_readonly(&config.database_path).await {
        Ok(catalog) => catalog,
        Err(e) => {
            error!("Failed to open catalog database: {}", e);
            return Err(e.into());
        }
    };

    let scheduler = RadioScheduler::new(Arc::new(catalog), config.radio.clone());
    let tasks = scheduler.start();

    let app = build_router(AppState::new(Arc::clone(&scheduler)));
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("wrad-bc listening on http://{}", addr);
    info!("Live events: http://{}/radio/events", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tasks.shutdown().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Command-line / environment values win over the config file
fn apply_args(config: &mut Config, args: &Args) {
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(database) = &args.database {
        config.database_path = database.clone();
    }
    if let Some(playlist) = &args.playlist {
        config.radio.playlist_name = playlist.clone();
    }
}

/// `RUST_LOG` overrides the configured level
fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))
        .context("Invalid logging.level")?;

    match &logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
        }
    }
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received terminate signal, shutting down"),
    }
}
