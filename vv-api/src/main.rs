//! vv-api - VibrationVIEW REST automation service
//!
//! Serves the VibrationVIEW automation interface over HTTP on port 5000
//! by default. Configuration comes from the command line, `VV_*`
//! environment variables, then `vv-api.toml`.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vv_api::vendor::SimulatedConnector;
use vv_api::{build_router, AppState};
use vv_common::config::{default_config_path, ConfigOverrides, ServiceConfig};

/// Command-line arguments for vv-api
#[derive(Parser, Debug)]
#[command(name = "vv-api")]
#[command(about = "REST automation service for VibrationVIEW")]
#[command(version)]
struct Args {
    /// Config file (defaults to <config dir>/vibrationview/vv-api.toml)
    #[arg(short, long, env = "VV_API_CONFIG")]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// VibrationVIEW profile folder
    #[arg(long)]
    profile_folder: Option<PathBuf>,

    /// VibrationVIEW report folder
    #[arg(long)]
    report_folder: Option<PathBuf>,

    /// Extra folder data files may be read from
    #[arg(long)]
    data_folder: Option<PathBuf>,

    /// Folder receiving uploaded test templates
    #[arg(long)]
    new_test_defaults_folder: Option<PathBuf>,

    /// VibrationVIEW executable used to render reports
    #[arg(long)]
    report_exe: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Enable debug mode
    #[arg(long)]
    debug: bool,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            host: self.host.clone(),
            port: self.port,
            profile_folder: self.profile_folder.clone(),
            report_folder: self.report_folder.clone(),
            data_folder: self.data_folder.clone(),
            new_test_defaults_folder: self.new_test_defaults_folder.clone(),
            report_exe: self.report_exe.clone(),
            log_level: self.log_level.clone(),
            debug: self.debug.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let config = ServiceConfig::resolve(&args.overrides(), args.config.as_deref())
        .context("Failed to resolve configuration")?;

    let level = if config.debug { "debug" } else { config.log_level.as_str() };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("vv_api={lvl},vv_common={lvl},tower_http={lvl}", lvl = level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting VibrationVIEW REST API (vv-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    if let Some(path) = &config_path {
        info!("Config file: {}", path.display());
    }
    info!("Profile folder: {}", config.profile_folder.display());
    info!("Report folder: {}", config.report_folder.display());
    if let Some(data_folder) = &config.data_folder {
        info!("Data folder: {}", data_folder.display());
    }
    info!("Report executable: {}", config.report_exe.display());

    warn!("No VibrationVIEW automation transport configured, using the simulated controller");
    let connector = Arc::new(SimulatedConnector::default());

    let addr = format!("{}:{}", config.host, config.port);
    let state = AppState::new(config, connector);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;
    info!("vv-api listening on http://{}", addr);
    info!("Health check: http://{}/api/health", addr);

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
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
