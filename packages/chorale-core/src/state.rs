//! Core application state types.
//!
//! This module provides the controller [`Config`] shared by the core library
//! and its embedders. The standalone server wraps this in its own config type
//! that adds file loading and environment overrides.

use serde::{Deserialize, Serialize};

/// Configuration for the Chorale controller core.
///
/// All fields have sensible defaults. Poll intervals of 0 disable the
/// corresponding poll loop entirely.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    // Polling
    /// Interval between player-status polls per device (seconds, 0 = disabled).
    pub player_status_interval_secs: u64,

    /// Interval between extended device-status polls per device (seconds, 0 = disabled).
    pub device_status_interval_secs: u64,

    /// Per-request HTTP timeout (seconds). Timeouts count as transport failures.
    pub request_timeout_secs: u64,

    // Connectivity
    /// Consecutive transport failures before a device is marked offline.
    pub offline_threshold: u32,

    // Events
    /// Capacity of the event broadcast channel.
    pub event_channel_capacity: usize,
}

impl Config {
    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be >= 1".to_string());
        }
        if self.offline_threshold == 0 {
            return Err("offline_threshold must be >= 1".to_string());
        }
        if self.event_channel_capacity == 0 {
            return Err(
                "event_channel_capacity must be >= 1 (broadcast::channel panics on 0)".to_string(),
            );
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            player_status_interval_secs: 5,
            device_status_interval_secs: 10,
            request_timeout_secs: 3,
            offline_threshold: 3,
            event_channel_capacity: 100,
        }
    }
}
