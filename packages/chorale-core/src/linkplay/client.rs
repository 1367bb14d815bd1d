//! High-level LinkPlay client commands.
//!
//! [`DeviceCommands`] is the seam the coordination layer depends on;
//! [`LinkPlayClient`] is the reqwest-backed implementation. Keeping the
//! trait here lets tests inject recording/scripted doubles without any
//! network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use super::commands::ApiCommand;
use super::http::{send_ack_command, send_query, HttpResult};
use super::status::{DeviceStatus, PlayerStatus, SlaveList};

/// Trait for LinkPlay device operations.
///
/// Used by the poller, coordinator, and dispatcher to talk to speakers.
#[async_trait]
pub trait DeviceCommands: Send + Sync {
    /// Queries playback status, levels, and track metadata.
    async fn player_status(&self, ip: &str) -> HttpResult<PlayerStatus>;

    /// Queries extended device status (grouping, names).
    async fn device_status(&self, ip: &str) -> HttpResult<DeviceStatus>;

    /// Queries a master's authoritative slave roster.
    async fn slave_list(&self, ip: &str) -> HttpResult<SlaveList>;

    /// Sets the device's own volume (0-100).
    async fn set_volume(&self, ip: &str, volume: u8) -> HttpResult<()>;

    /// Mutes or unmutes the device.
    async fn set_mute(&self, ip: &str, mute: bool) -> HttpResult<()>;

    /// Attaches the device at `ip` to `master_ip` as a slave.
    async fn join_master(&self, ip: &str, master_ip: &str) -> HttpResult<()>;

    /// Disbands the group mastered by the device at `ip`.
    async fn ungroup(&self, ip: &str) -> HttpResult<()>;

    /// Asks the master to eject one slave from its group.
    async fn kick_slave(&self, master_ip: &str, slave_ip: &str) -> HttpResult<()>;

    /// Sets one slave's volume through the master.
    async fn slave_volume(&self, master_ip: &str, slave_ip: &str, volume: u8) -> HttpResult<()>;

    /// Mutes or unmutes one slave through the master.
    async fn slave_mute(&self, master_ip: &str, slave_ip: &str, mute: bool) -> HttpResult<()>;
}

/// Reqwest-backed implementation of [`DeviceCommands`].
///
/// Holds the shared HTTP client (connection pooling) and the per-request
/// timeout from configuration.
#[derive(Clone)]
pub struct LinkPlayClient {
    client: Client,
    timeout: Duration,
}

impl LinkPlayClient {
    /// Creates a new client around a shared `reqwest::Client`.
    #[must_use]
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }
}

#[async_trait]
impl DeviceCommands for LinkPlayClient {
    async fn player_status(&self, ip: &str) -> HttpResult<PlayerStatus> {
        send_query(&self.client, ip, &ApiCommand::GetPlayerStatus, self.timeout).await
    }

    async fn device_status(&self, ip: &str) -> HttpResult<DeviceStatus> {
        send_query(&self.client, ip, &ApiCommand::GetStatusEx, self.timeout).await
    }

    async fn slave_list(&self, ip: &str) -> HttpResult<SlaveList> {
        send_query(&self.client, ip, &ApiCommand::GetSlaveList, self.timeout).await
    }

    async fn set_volume(&self, ip: &str, volume: u8) -> HttpResult<()> {
        send_ack_command(&self.client, ip, &ApiCommand::SetVolume(volume), self.timeout).await
    }

    async fn set_mute(&self, ip: &str, mute: bool) -> HttpResult<()> {
        send_ack_command(&self.client, ip, &ApiCommand::SetMute(mute), self.timeout).await
    }

    async fn join_master(&self, ip: &str, master_ip: &str) -> HttpResult<()> {
        let command = ApiCommand::JoinGroupMaster {
            master: master_ip.to_string(),
        };
        send_ack_command(&self.client, ip, &command, self.timeout).await
    }

    async fn ungroup(&self, ip: &str) -> HttpResult<()> {
        send_ack_command(&self.client, ip, &ApiCommand::Ungroup, self.timeout).await
    }

    async fn kick_slave(&self, master_ip: &str, slave_ip: &str) -> HttpResult<()> {
        let command = ApiCommand::SlaveKickout {
            slave: slave_ip.to_string(),
        };
        send_ack_command(&self.client, master_ip, &command, self.timeout).await
    }

    async fn slave_volume(&self, master_ip: &str, slave_ip: &str, volume: u8) -> HttpResult<()> {
        let command = ApiCommand::SlaveVolume {
            slave: slave_ip.to_string(),
            volume,
        };
        send_ack_command(&self.client, master_ip, &command, self.timeout).await
    }

    async fn slave_mute(&self, master_ip: &str, slave_ip: &str, mute: bool) -> HttpResult<()> {
        let command = ApiCommand::SlaveMute {
            slave: slave_ip.to_string(),
            mute,
        };
        send_ack_command(&self.client, master_ip, &command, self.timeout).await
    }
}
