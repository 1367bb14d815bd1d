//! Chorale Core - shared library for Chorale.
//!
//! This crate provides the core functionality for Chorale, a controller for
//! fleets of LinkPlay-family network speakers grouped into synchronized
//! multiroom clusters. It is designed to be used by embedders (GUI shells)
//! and the standalone headless server.
//!
//! There is no central coordinator on the network: each device is polled
//! independently over HTTP, and group membership is inferred, propagated,
//! and reconciled from periodic status observation plus an in-process peer
//! directory shortcut between devices managed by the same control point.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`runtime`]: Task spawning abstraction for async runtime independence
//! - [`events`]: Event system for real-time client communication
//! - [`state`]: Core configuration
//! - [`linkplay`]: LinkPlay device protocol (commands, status models, HTTP)
//! - [`device`]: Per-device records, polling, and the fleet container
//! - [`group`]: Role inference, membership propagation, and group commands
//! - [`api`]: HTTP API surface for host UIs
//! - [`error`]: Centralized error types
//!
//! # Abstraction Traits
//!
//! Core logic depends on traits at its seams:
//!
//! - [`DeviceCommands`](linkplay::DeviceCommands): the device HTTP client
//! - [`PeerDirectory`](group::PeerDirectory): cross-device propagation
//! - [`EventEmitter`](events::EventEmitter): observable state delivery
//! - [`TaskSpawner`](runtime::TaskSpawner): background task spawning
//!
//! Each trait has a default implementation suitable for the standalone
//! server; tests and embedders supply their own.

#![warn(clippy::all)]

pub mod api;
pub mod bootstrap;
pub mod device;
pub mod error;
pub mod events;
pub mod group;
pub mod linkplay;
pub mod runtime;
pub mod state;
pub mod utils;

#[cfg(test)]
pub(crate) mod test_support;

// Re-export commonly used types at the crate root
pub use bootstrap::{bootstrap_services, ChoraleServices};
pub use error::{ChoraleError, ChoraleResult, ErrorCode, HttpResult};
pub use events::{
    BroadcastEvent, BroadcastEventBridge, DeviceEvent, EventEmitter, FleetEvent, GroupEvent,
    LoggingEventEmitter, NoopEventEmitter,
};
pub use runtime::{TaskSpawner, TokioSpawner};
pub use state::Config;
pub use utils::{now_millis, validate_speaker_address, AddressValidationError};

// Re-export device types
pub use device::{Connectivity, DeviceController, DeviceIdentity, DeviceSnapshot, Fleet, TrackInfo};

// Re-export group types
pub use group::{
    CommandOutcome, GroupCommand, GroupRole, GroupState, InProcessPeerDirectory, MemberLevels,
    PeerDirectory, PeerHandle,
};

// Re-export LinkPlay types
pub use linkplay::{DeviceCommands, LinkPlayClient, PlaybackStatus};

// Re-export API types
pub use api::{start_server, AppState, ServerError};
