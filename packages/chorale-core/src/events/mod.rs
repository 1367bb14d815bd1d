//! Event system for real-time client communication.
//!
//! This module provides:
//! - [`EventEmitter`] trait for domain services to emit events
//! - [`BroadcastEventBridge`] for channel-based transport
//! - Event types for the device, group, and fleet domains
//!
//! Events carry the externally observable state the coordinator maintains:
//! group role, master address, member list, group name, and group levels,
//! plus per-device playback and connectivity changes.

mod bridge;
mod emitter;

pub use bridge::BroadcastEventBridge;
pub use emitter::{EventEmitter, LoggingEventEmitter, NoopEventEmitter};

use serde::Serialize;

use crate::device::state::Connectivity;
use crate::group::role::GroupRole;
use crate::linkplay::status::PlaybackStatus;

/// Events broadcast to clients.
///
/// This enum categorizes all real-time events that can be sent to connected
/// clients. Each category has its own inner event type with specific variants.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "category", rename_all = "camelCase")]
pub enum BroadcastEvent {
    /// Per-device playback and connectivity changes.
    Device(DeviceEvent),

    /// Group role, membership, and aggregate changes.
    Group(GroupEvent),

    /// Fleet composition changes.
    Fleet(FleetEvent),
}

/// Events from a single device's playback channel.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum DeviceEvent {
    /// Playback status changed.
    PlaybackChanged {
        /// Device address.
        address: String,
        /// New playback status.
        playback: PlaybackStatus,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Device volume or mute changed.
    LevelsChanged {
        /// Device address.
        address: String,
        /// New volume (0-100).
        volume: u8,
        /// New mute flag.
        mute: bool,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Track metadata changed.
    TrackChanged {
        /// Device address.
        address: String,
        /// Track title.
        title: String,
        /// Track artist.
        artist: String,
        /// Track album.
        album: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Communication status changed (offline threshold crossed or recovered).
    ConnectivityChanged {
        /// Device address.
        address: String,
        /// New communication status.
        connectivity: Connectivity,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Events from the group coordination channel of one device.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GroupEvent {
    /// Role or member set changed.
    RoleChanged {
        /// Device address.
        address: String,
        /// New role.
        role: GroupRole,
        /// Member addresses (empty unless master).
        members: Vec<String>,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Group display name changed.
    NameChanged {
        /// Device address.
        address: String,
        /// New group name.
        name: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// Aggregated group volume/mute changed.
    LevelsChanged {
        /// Device address.
        address: String,
        /// Aggregated volume (0 unless master).
        volume: u8,
        /// Aggregated mute (false unless master).
        mute: bool,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}

/// Events about fleet composition.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum FleetEvent {
    /// A device controller was added.
    DeviceAdded {
        /// Device address.
        address: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
    /// A device controller was removed.
    DeviceRemoved {
        /// Device address.
        address: String,
        /// Unix timestamp in milliseconds.
        timestamp: u64,
    },
}
