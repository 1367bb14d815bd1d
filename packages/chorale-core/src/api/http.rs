//! HTTP route handlers.
//!
//! All handlers are thin - they delegate to the fleet and its controllers.
//! Group commands are decoded from JSON into the closed [`GroupCommand`]
//! type once, here at the system boundary.

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::AppState;
use crate::device::state::{DeviceIdentity, DeviceSnapshot};
use crate::error::{ChoraleError, ChoraleResult};
use crate::group::dispatcher::{CommandOutcome, GroupCommand};

// ─────────────────────────────────────────────────────────────────────────────
// Request Types
// ─────────────────────────────────────────────────────────────────────────────

/// Body of `POST /api/devices`.
#[derive(Debug, Deserialize)]
struct AddDeviceRequest {
    ip: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    udn: Option<String>,
}

/// Body of `POST /api/devices/{ip}/command`: the group command grammar
/// exposed to clients.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "camelCase")]
enum CommandRequest {
    /// Attach the device to a master.
    Join { master: String },
    /// Disband the group the device masters.
    Ungroup,
    /// Ask the device's master to kick it.
    Leave,
    /// Eject a slave from the device's group.
    Kick { slave: String },
    /// Set every member's volume.
    SetGroupVolume { volume: u8 },
    /// Mute or unmute every member.
    SetGroupMute { mute: bool },
}

impl From<CommandRequest> for GroupCommand {
    fn from(request: CommandRequest) -> Self {
        match request {
            CommandRequest::Join { master } => GroupCommand::Join { master },
            CommandRequest::Ungroup => GroupCommand::Ungroup,
            CommandRequest::Leave => GroupCommand::Leave,
            CommandRequest::Kick { slave } => GroupCommand::Kick { slave },
            CommandRequest::SetGroupVolume { volume } => GroupCommand::SetGroupVolume(volume),
            CommandRequest::SetGroupMute { mute } => GroupCommand::SetGroupMute(mute),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Creates the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/fleet", get(get_fleet))
        .route("/api/devices", post(add_device))
        .route(
            "/api/devices/{ip}",
            get(get_device).delete(remove_device),
        )
        .route("/api/devices/{ip}/command", post(dispatch_command))
        .route("/api/devices/{ip}/refresh", post(refresh_device))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Liveness probe.
async fn health_check() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Snapshots of every managed device.
async fn get_fleet(State(state): State<AppState>) -> Json<Vec<DeviceSnapshot>> {
    Json(state.fleet.snapshots())
}

/// Snapshot of one device.
async fn get_device(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> ChoraleResult<Json<DeviceSnapshot>> {
    let controller = state
        .fleet
        .get(&ip)
        .ok_or_else(|| ChoraleError::DeviceNotFound(ip))?;
    Ok(Json(controller.snapshot()))
}

/// Adds a device to the fleet and starts polling it.
async fn add_device(
    State(state): State<AppState>,
    Json(request): Json<AddDeviceRequest>,
) -> ChoraleResult<Json<DeviceSnapshot>> {
    let identity = DeviceIdentity::new(
        request.ip,
        request.name.unwrap_or_default(),
        request.udn,
    );
    let controller = state.fleet.add_device(identity)?;
    Ok(Json(controller.snapshot()))
}

/// Removes a device from the fleet.
async fn remove_device(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> ChoraleResult<Json<serde_json::Value>> {
    if state.fleet.remove_device(&ip) {
        Ok(Json(json!({ "removed": ip })))
    } else {
        Err(ChoraleError::DeviceNotFound(ip))
    }
}

/// Decodes and dispatches one group command.
async fn dispatch_command(
    State(state): State<AppState>,
    Path(ip): Path<String>,
    Json(request): Json<CommandRequest>,
) -> ChoraleResult<Json<CommandOutcome>> {
    let controller = state
        .fleet
        .get(&ip)
        .ok_or_else(|| ChoraleError::DeviceNotFound(ip))?;
    let outcome = controller.dispatch(GroupCommand::from(request)).await?;
    Ok(Json(outcome))
}

/// Explicitly recomputes a device's group aggregates and returns the
/// refreshed snapshot.
async fn refresh_device(
    State(state): State<AppState>,
    Path(ip): Path<String>,
) -> ChoraleResult<Json<DeviceSnapshot>> {
    let controller = state
        .fleet
        .get(&ip)
        .ok_or_else(|| ChoraleError::DeviceNotFound(ip))?;
    controller.refresh_group_levels();
    Ok(Json(controller.snapshot()))
}
