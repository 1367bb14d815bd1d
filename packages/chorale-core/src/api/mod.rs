//! HTTP API layer.
//!
//! This module contains thin handlers that delegate to the fleet.
//! It provides the router construction and server startup functionality.

use std::sync::Arc;

use thiserror::Error;

use crate::bootstrap::ChoraleServices;
use crate::device::fleet::Fleet;
use crate::events::BroadcastEventBridge;

pub mod http;

/// Errors that can occur when starting or running the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to a TCP port.
    #[error("Failed to bind to port: {0}")]
    Bind(#[from] std::io::Error),
}

/// Shared application state for the API layer.
///
/// This is a thin wrapper that holds references to services.
/// All coordination logic lives in the fleet's controllers.
#[derive(Clone)]
pub struct AppState {
    /// The managed device fleet.
    pub fleet: Arc<Fleet>,
    /// Event bridge clients can subscribe to.
    pub event_bridge: Arc<BroadcastEventBridge>,
}

impl AppState {
    /// Builds the API state from bootstrapped services.
    #[must_use]
    pub fn new(services: &ChoraleServices) -> Self {
        Self {
            fleet: Arc::clone(&services.fleet),
            event_bridge: Arc::clone(&services.event_bridge),
        }
    }
}

/// Starts the HTTP server on the given port.
pub async fn start_server(state: AppState, port: u16) -> Result<(), ServerError> {
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("Server listening on http://0.0.0.0:{}", port);
    let app = http::create_router(state);

    axum::serve(listener, app).await?;
    Ok(())
}
