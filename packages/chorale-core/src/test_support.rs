//! Shared test doubles for coordination tests.
//!
//! [`RecordingCommands`] captures every command a test drives onto the wire
//! and lets tests script failures and roster responses; [`CountingEmitter`]
//! collects emitted events; [`TestRig`] bundles the directory, client, and
//! emitter one scenario shares.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::device::controller::DeviceController;
use crate::device::state::DeviceIdentity;
use crate::events::{BroadcastEvent, DeviceEvent, EventEmitter, FleetEvent, GroupEvent};
use crate::group::directory::InProcessPeerDirectory;
use crate::linkplay::client::DeviceCommands;
use crate::linkplay::commands::ApiCommand;
use crate::linkplay::http::{HttpError, HttpResult};
use crate::linkplay::status::{DeviceStatus, PlayerStatus, SlaveList};
use crate::state::Config;

/// Directory, client, and emitter shared by the controllers of one test.
pub(crate) struct TestRig {
    pub directory: Arc<InProcessPeerDirectory>,
    pub client: Arc<RecordingCommands>,
    pub emitter: Arc<CountingEmitter>,
}

impl TestRig {
    pub fn new() -> Self {
        Self {
            directory: Arc::new(InProcessPeerDirectory::new()),
            client: Arc::new(RecordingCommands::new()),
            emitter: Arc::new(CountingEmitter::new()),
        }
    }
}

/// Config with polling disabled; tests feed snapshots directly.
pub(crate) fn test_config() -> Config {
    Config {
        player_status_interval_secs: 0,
        device_status_interval_secs: 0,
        ..Config::default()
    }
}

/// Builds a controller wired into the rig and registers it in the directory.
pub(crate) fn make_controller(address: &str, rig: &TestRig) -> Arc<DeviceController> {
    let client: Arc<dyn DeviceCommands> = rig.client.clone();
    let directory: Arc<dyn crate::group::directory::PeerDirectory> = rig.directory.clone();
    let emitter: Arc<dyn EventEmitter> = rig.emitter.clone();
    let controller = DeviceController::new(
        DeviceIdentity::new(address.to_string(), String::new(), None),
        client,
        directory,
        emitter,
        test_config(),
    );
    rig.directory.register(controller.clone());
    controller
}

/// Extended-status snapshot for an ungrouped device.
pub(crate) fn ungrouped_status() -> DeviceStatus {
    DeviceStatus {
        group: false,
        master_ip: None,
        host_ip: None,
        group_name: None,
        device_name: None,
        uuid: None,
    }
}

/// Extended-status snapshot for a slave grouped under `master`.
pub(crate) fn grouped_status(master: &str) -> DeviceStatus {
    DeviceStatus {
        group: true,
        master_ip: Some(master.to_string()),
        host_ip: None,
        group_name: None,
        device_name: None,
        uuid: None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Recording Client
// ─────────────────────────────────────────────────────────────────────────────

/// [`DeviceCommands`] double that records calls and scripts responses.
pub(crate) struct RecordingCommands {
    /// Every call as (target address, rendered command string).
    calls: Mutex<Vec<(String, String)>>,
    /// Targets whose commands fail with a transport error.
    fail_targets: Mutex<HashSet<String>>,
    /// Slave addresses whose slave-level commands fail regardless of target.
    fail_slaves: Mutex<HashSet<String>>,
    /// Scripted slave rosters per master address.
    slave_lists: Mutex<HashMap<String, SlaveList>>,
    /// Scripted player-status responses per address (drained in order).
    player_statuses: Mutex<HashMap<String, Vec<PlayerStatus>>>,
    /// Scripted device-status responses per address (drained in order).
    device_statuses: Mutex<HashMap<String, Vec<DeviceStatus>>>,
}

impl RecordingCommands {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_targets: Mutex::new(HashSet::new()),
            fail_slaves: Mutex::new(HashSet::new()),
            slave_lists: Mutex::new(HashMap::new()),
            player_statuses: Mutex::new(HashMap::new()),
            device_statuses: Mutex::new(HashMap::new()),
        }
    }

    /// All recorded calls in order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    /// Commands sent to one target, in order.
    pub fn calls_for(&self, target: &str) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter(|(t, _)| t == target)
            .map(|(_, c)| c.clone())
            .collect()
    }

    /// Number of commands to `target` containing `needle`.
    pub fn count_commands(&self, target: &str, needle: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(t, c)| t == target && c.contains(needle))
            .count()
    }

    /// Number of commands to any target containing `needle`.
    pub fn count_commands_everywhere(&self, needle: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|(_, c)| c.contains(needle))
            .count()
    }

    /// Makes every command addressed to `target` fail.
    pub fn fail_target(&self, target: &str) {
        self.fail_targets.lock().insert(target.to_string());
    }

    /// Makes slave-level commands naming `slave` fail.
    pub fn fail_slave_commands_for(&self, slave: &str) {
        self.fail_slaves.lock().insert(slave.to_string());
    }

    /// Scripts the roster returned by `multiroom:getSlaveList` on `target`.
    pub fn set_slave_list(&self, target: &str, list: SlaveList) {
        self.slave_lists.lock().insert(target.to_string(), list);
    }

    /// Queues a player-status response for `target`.
    #[allow(dead_code)]
    pub fn push_player_status(&self, target: &str, status: PlayerStatus) {
        self.player_statuses
            .lock()
            .entry(target.to_string())
            .or_default()
            .push(status);
    }

    /// Queues a device-status response for `target`.
    #[allow(dead_code)]
    pub fn push_device_status(&self, target: &str, status: DeviceStatus) {
        self.device_statuses
            .lock()
            .entry(target.to_string())
            .or_default()
            .push(status);
    }

    fn record(&self, target: &str, command: &ApiCommand) {
        self.calls
            .lock()
            .push((target.to_string(), command.to_string()));
    }

    fn scripted_failure() -> HttpError {
        HttpError::Status(500, "scripted failure".into())
    }

    fn ack(&self, target: &str, command: ApiCommand) -> HttpResult<()> {
        self.record(target, &command);
        if self.fail_targets.lock().contains(target) {
            return Err(Self::scripted_failure());
        }
        Ok(())
    }
}

#[async_trait]
impl DeviceCommands for RecordingCommands {
    async fn player_status(&self, ip: &str) -> HttpResult<PlayerStatus> {
        self.record(ip, &ApiCommand::GetPlayerStatus);
        if self.fail_targets.lock().contains(ip) {
            return Err(Self::scripted_failure());
        }
        let mut scripted = self.player_statuses.lock();
        match scripted.get_mut(ip).filter(|queue| !queue.is_empty()) {
            Some(queue) => Ok(queue.remove(0)),
            None => Err(Self::scripted_failure()),
        }
    }

    async fn device_status(&self, ip: &str) -> HttpResult<DeviceStatus> {
        self.record(ip, &ApiCommand::GetStatusEx);
        if self.fail_targets.lock().contains(ip) {
            return Err(Self::scripted_failure());
        }
        let mut scripted = self.device_statuses.lock();
        match scripted.get_mut(ip).filter(|queue| !queue.is_empty()) {
            Some(queue) => Ok(queue.remove(0)),
            None => Err(Self::scripted_failure()),
        }
    }

    async fn slave_list(&self, ip: &str) -> HttpResult<SlaveList> {
        self.record(ip, &ApiCommand::GetSlaveList);
        if self.fail_targets.lock().contains(ip) {
            return Err(Self::scripted_failure());
        }
        Ok(self
            .slave_lists
            .lock()
            .get(ip)
            .cloned()
            .unwrap_or_default())
    }

    async fn set_volume(&self, ip: &str, volume: u8) -> HttpResult<()> {
        self.ack(ip, ApiCommand::SetVolume(volume))
    }

    async fn set_mute(&self, ip: &str, mute: bool) -> HttpResult<()> {
        self.ack(ip, ApiCommand::SetMute(mute))
    }

    async fn join_master(&self, ip: &str, master_ip: &str) -> HttpResult<()> {
        self.ack(
            ip,
            ApiCommand::JoinGroupMaster {
                master: master_ip.to_string(),
            },
        )
    }

    async fn ungroup(&self, ip: &str) -> HttpResult<()> {
        self.ack(ip, ApiCommand::Ungroup)
    }

    async fn kick_slave(&self, master_ip: &str, slave_ip: &str) -> HttpResult<()> {
        self.ack(
            master_ip,
            ApiCommand::SlaveKickout {
                slave: slave_ip.to_string(),
            },
        )
    }

    async fn slave_volume(&self, master_ip: &str, slave_ip: &str, volume: u8) -> HttpResult<()> {
        if self.fail_slaves.lock().contains(slave_ip) {
            self.record(
                master_ip,
                &ApiCommand::SlaveVolume {
                    slave: slave_ip.to_string(),
                    volume,
                },
            );
            return Err(Self::scripted_failure());
        }
        self.ack(
            master_ip,
            ApiCommand::SlaveVolume {
                slave: slave_ip.to_string(),
                volume,
            },
        )
    }

    async fn slave_mute(&self, master_ip: &str, slave_ip: &str, mute: bool) -> HttpResult<()> {
        if self.fail_slaves.lock().contains(slave_ip) {
            self.record(
                master_ip,
                &ApiCommand::SlaveMute {
                    slave: slave_ip.to_string(),
                    mute,
                },
            );
            return Err(Self::scripted_failure());
        }
        self.ack(
            master_ip,
            ApiCommand::SlaveMute {
                slave: slave_ip.to_string(),
                mute,
            },
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Counting Emitter
// ─────────────────────────────────────────────────────────────────────────────

/// [`EventEmitter`] double that stores every emitted event.
pub(crate) struct CountingEmitter {
    events: Mutex<Vec<BroadcastEvent>>,
}

impl CountingEmitter {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// All events emitted so far.
    #[allow(dead_code)]
    pub fn events(&self) -> Vec<BroadcastEvent> {
        self.events.lock().clone()
    }

    /// Number of group events emitted so far.
    pub fn group_event_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, BroadcastEvent::Group(_)))
            .count()
    }

    /// Number of device connectivity events emitted so far.
    #[allow(dead_code)]
    pub fn connectivity_event_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| {
                matches!(
                    e,
                    BroadcastEvent::Device(DeviceEvent::ConnectivityChanged { .. })
                )
            })
            .count()
    }
}

impl EventEmitter for CountingEmitter {
    fn emit_device(&self, event: DeviceEvent) {
        self.events.lock().push(BroadcastEvent::Device(event));
    }

    fn emit_group(&self, event: GroupEvent) {
        self.events.lock().push(BroadcastEvent::Group(event));
    }

    fn emit_fleet(&self, event: FleetEvent) {
        self.events.lock().push(BroadcastEvent::Fleet(event));
    }
}
