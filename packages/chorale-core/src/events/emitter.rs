//! Event emitter abstraction for decoupling services from transport.
//!
//! Services depend on the [`EventEmitter`] trait rather than concrete
//! broadcast channels, enabling testing and alternative transport
//! implementations.

use super::{DeviceEvent, FleetEvent, GroupEvent};

/// Trait for emitting domain events without knowledge of transport.
///
/// The poller, coordinator, and dispatcher use this trait to surface the
/// externally observable state; how events reach a UI (broadcast channel,
/// embedder callback) is the bridge's concern.
pub trait EventEmitter: Send + Sync {
    /// Emits a per-device playback/connectivity event.
    fn emit_device(&self, event: DeviceEvent);

    /// Emits a group coordination event.
    fn emit_group(&self, event: GroupEvent);

    /// Emits a fleet composition event.
    fn emit_fleet(&self, event: FleetEvent);
}

/// No-op emitter for tests and embedders that poll snapshots instead.
pub struct NoopEventEmitter;

impl EventEmitter for NoopEventEmitter {
    fn emit_device(&self, _event: DeviceEvent) {
        // No-op
    }

    fn emit_group(&self, _event: GroupEvent) {
        // No-op
    }

    fn emit_fleet(&self, _event: FleetEvent) {
        // No-op
    }
}

/// Logging emitter for debugging and development.
///
/// Logs all events at debug level. Useful for debugging event flow
/// or in development environments.
pub struct LoggingEventEmitter;

impl EventEmitter for LoggingEventEmitter {
    fn emit_device(&self, event: DeviceEvent) {
        tracing::debug!(?event, "device_event");
    }

    fn emit_group(&self, event: GroupEvent) {
        tracing::debug!(?event, "group_event");
    }

    fn emit_fleet(&self, event: FleetEvent) {
        tracing::debug!(?event, "fleet_event");
    }
}
