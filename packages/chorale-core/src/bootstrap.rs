//! Application bootstrap and dependency wiring.
//!
//! This module contains the composition root - the single place where the
//! shared HTTP client, event bridge, and fleet are instantiated and wired
//! together. Embedders call [`bootstrap_services`] once and then add their
//! configured devices to the fleet.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::sync::broadcast;

use crate::error::{ChoraleError, ChoraleResult};
use crate::events::{BroadcastEvent, BroadcastEventBridge, EventEmitter};
use crate::device::fleet::Fleet;
use crate::linkplay::client::{DeviceCommands, LinkPlayClient};
use crate::runtime::TokioSpawner;
use crate::state::Config;

/// Container for all bootstrapped services.
#[derive(Clone)]
pub struct ChoraleServices {
    /// The managed device fleet.
    pub fleet: Arc<Fleet>,
    /// Broadcast channel sender for real-time events.
    pub broadcast_tx: broadcast::Sender<BroadcastEvent>,
    /// Event bridge for emitting events to subscribers and optional
    /// external consumers.
    pub event_bridge: Arc<BroadcastEventBridge>,
    /// Shared HTTP client for connection pooling.
    http_client: Client,
    /// Task spawner for background operations.
    pub spawner: TokioSpawner,
}

impl ChoraleServices {
    /// Returns the shared HTTP client.
    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    /// Initiates graceful shutdown: stops every controller's polling and
    /// releases all directory entries. In-flight requests complete and their
    /// results are discarded.
    pub fn shutdown(&self) {
        log::info!("[Bootstrap] Beginning graceful shutdown...");
        self.fleet.shutdown();
        log::info!("[Bootstrap] Shutdown complete");
    }
}

/// Creates the shared HTTP client for all device communication.
///
/// Per-request timeouts are applied in the transport layer; the connect
/// timeout here just keeps dead addresses from stalling the pool.
fn create_http_client(config: &Config) -> ChoraleResult<Client> {
    Client::builder()
        .connect_timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .map_err(|e| ChoraleError::Internal(format!("Failed to create HTTP client: {}", e)))
}

/// Bootstraps all services with their dependencies.
///
/// This is the composition root where the shared infrastructure is created
/// in dependency order: HTTP client, broadcast channel, event bridge, fleet.
///
/// # Errors
///
/// Returns an error if the configuration fails validation or the HTTP
/// client cannot be built.
pub fn bootstrap_services(config: &Config) -> ChoraleResult<ChoraleServices> {
    config
        .validate()
        .map_err(ChoraleError::Configuration)?;

    // Create task spawner from current runtime
    let spawner = TokioSpawner::current();

    // Create shared HTTP client for connection pooling
    let http_client = create_http_client(config)?;

    // Create broadcast channel for real-time events
    let (broadcast_tx, _) = broadcast::channel::<BroadcastEvent>(config.event_channel_capacity);

    // Create the event bridge that maps domain events to broadcast transport
    let event_bridge = Arc::new(BroadcastEventBridge::with_sender(broadcast_tx.clone()));

    let device_client: Arc<dyn DeviceCommands> = Arc::new(LinkPlayClient::new(
        http_client.clone(),
        Duration::from_secs(config.request_timeout_secs),
    ));

    let emitter: Arc<dyn EventEmitter> = event_bridge.clone();
    let fleet = Arc::new(Fleet::new(
        device_client,
        emitter,
        config.clone(),
        spawner.clone(),
    ));

    Ok(ChoraleServices {
        fleet,
        broadcast_tx,
        event_bridge,
        http_client,
        spawner,
    })
}
