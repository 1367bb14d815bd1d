//! Chorale Server - Standalone headless multiroom controller.
//!
//! This binary manages a configured fleet of LinkPlay-family speakers
//! without a GUI: it polls each device, maintains group topology, and
//! exposes the HTTP API for UIs and automations.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chorale_core::{bootstrap_services, start_server, AppState, DeviceIdentity};
use clap::Parser;
use tokio::signal;

use crate::config::ServerConfig;

/// Chorale Server - Headless multiroom speaker fleet controller.
#[derive(Parser, Debug)]
#[command(name = "chorale-server")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (YAML).
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(short, long, default_value = "info", env = "CHORALE_LOG_LEVEL")]
    log_level: log::LevelFilter,

    /// Bind port (overrides config file).
    #[arg(short = 'p', long, env = "CHORALE_BIND_PORT")]
    port: Option<u16>,

    /// Speaker addresses to manage in addition to the config file.
    #[arg(short = 'd', long = "device", value_name = "IP")]
    devices: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    env_logger::Builder::new()
        .filter_level(args.log_level)
        .format_timestamp_millis()
        .init();

    log::info!("Chorale Server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.bind_port = port;
    }

    log::info!(
        "Configuration: bind_port={}, {} configured device(s), poll intervals {}s/{}s",
        config.bind_port,
        config.devices.len() + args.devices.len(),
        config.player_status_interval,
        config.device_status_interval
    );

    // Bootstrap services
    let core_config = config.to_core_config();
    let services = bootstrap_services(&core_config).context("Failed to bootstrap services")?;

    log::info!("Services bootstrapped successfully");

    // Register configured devices; a bad entry is logged and skipped so one
    // typo doesn't keep the rest of the fleet down.
    for entry in &config.devices {
        let identity = DeviceIdentity::new(
            entry.ip.clone(),
            entry.name.clone().unwrap_or_default(),
            entry.udn.clone(),
        );
        if let Err(e) = services.fleet.add_device(identity) {
            log::error!("Skipping configured device {}: {}", entry.ip, e);
        }
    }
    for ip in &args.devices {
        let identity = DeviceIdentity::new(ip.clone(), String::new(), None);
        if let Err(e) = services.fleet.add_device(identity) {
            log::error!("Skipping device {}: {}", ip, e);
        }
    }

    if services.fleet.is_empty() {
        log::warn!("No devices configured - add entries to the config file or pass --device");
    }

    // Build app state for the HTTP server
    let app_state = AppState::new(&services);

    let bind_port = config.bind_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(app_state, bind_port).await {
            log::error!("Server error: {}", e);
        }
    });

    log::info!("HTTP server started on port {}", config.bind_port);

    // Wait for shutdown signal
    shutdown_signal().await;

    log::info!("Shutdown signal received, cleaning up...");

    // Graceful shutdown: stop polling; in-flight requests complete and are
    // discarded.
    services.shutdown();

    server_handle.abort();

    log::info!("Shutdown complete");
    Ok(())
}

/// Waits for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
