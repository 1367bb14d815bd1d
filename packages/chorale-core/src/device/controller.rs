//! Per-device controller: owns the device's records and wires the poller,
//! coordinator, and dispatcher together.
//!
//! One controller is created per configured device. It registers itself in
//! the peer directory (it *is* the device's [`PeerHandle`]) and serializes
//! every mutation of the device's records behind per-device locks. Disposing
//! a controller cancels its poll loops; in-flight requests complete and
//! their results are discarded.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::error::ChoraleResult;
use crate::events::{DeviceEvent, EventEmitter};
use crate::group::coordinator::GroupCoordinator;
use crate::group::directory::{PeerDirectory, PeerHandle};
use crate::group::dispatcher::{CommandDispatcher, CommandOutcome, GroupCommand};
use crate::group::role::GroupRole;
use crate::group::state::{GroupState, MemberLevels};
use crate::linkplay::client::DeviceCommands;
use crate::linkplay::http::{HttpError, HttpResult};
use crate::linkplay::status::{DeviceStatus, PlayerStatus};
use crate::runtime::TokioSpawner;
use crate::state::Config;
use crate::utils::now_millis;

use super::poller::{self, PollSequence};
use super::state::{Connectivity, DeviceIdentity, DeviceSnapshot, DeviceState};

/// Controller instance for one speaker.
pub struct DeviceController {
    identity: DeviceIdentity,
    /// Display name; refreshed from extended-status snapshots.
    display_name: Mutex<String>,
    device: Arc<Mutex<DeviceState>>,
    group: Arc<Mutex<GroupState>>,
    coordinator: Arc<GroupCoordinator>,
    dispatcher: CommandDispatcher,
    client: Arc<dyn DeviceCommands>,
    directory: Arc<dyn PeerDirectory>,
    emitter: Arc<dyn EventEmitter>,
    config: Config,
    cancel_token: CancellationToken,
    pub(crate) player_seq: PollSequence,
    pub(crate) status_seq: PollSequence,
}

impl DeviceController {
    /// Creates a controller for one device. Polling does not start until
    /// [`DeviceController::start`] is called.
    pub fn new(
        identity: DeviceIdentity,
        client: Arc<dyn DeviceCommands>,
        directory: Arc<dyn PeerDirectory>,
        emitter: Arc<dyn EventEmitter>,
        config: Config,
    ) -> Arc<Self> {
        let device = Arc::new(Mutex::new(DeviceState::default()));
        let group = Arc::new(Mutex::new(GroupState::default()));

        let coordinator = Arc::new(GroupCoordinator::new(
            identity.address.clone(),
            Arc::clone(&device),
            Arc::clone(&group),
            Arc::clone(&directory),
            Arc::clone(&client),
            Arc::clone(&emitter),
        ));

        let dispatcher = CommandDispatcher::new(
            identity.address.clone(),
            Arc::clone(&group),
            Arc::clone(&coordinator),
            Arc::clone(&directory),
            Arc::clone(&client),
        );

        let display_name = Mutex::new(identity.name.clone());

        Arc::new(Self {
            identity,
            display_name,
            device,
            group,
            coordinator,
            dispatcher,
            client,
            directory,
            emitter,
            config,
            cancel_token: CancellationToken::new(),
            player_seq: PollSequence::default(),
            status_seq: PollSequence::default(),
        })
    }

    /// Starts the two poll loops on the shared task pool.
    pub fn start(self: &Arc<Self>, spawner: &TokioSpawner) {
        poller::start(self, spawner);
    }

    /// Cancels the poll loops. In-flight requests complete and their
    /// results are discarded.
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    /// The device's network address.
    pub fn address(&self) -> &str {
        &self.identity.address
    }

    /// The device's identity record.
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub(crate) fn cancel_token(&self) -> &CancellationToken {
        &self.cancel_token
    }

    /// Executes a group-scoped command on this device.
    pub async fn dispatch(&self, command: GroupCommand) -> ChoraleResult<CommandOutcome> {
        self.dispatcher.dispatch(command).await
    }

    /// Explicitly recomputes and publishes this device's group aggregates.
    pub fn refresh_group_levels(&self) {
        self.coordinator.refresh_group_levels();
    }

    /// Returns a copy of the current group record.
    pub fn group_snapshot(&self) -> GroupState {
        self.group.lock().clone()
    }

    /// Builds the full UI-facing snapshot of this device.
    pub fn snapshot(&self) -> DeviceSnapshot {
        let device = self.device.lock().clone();
        let group = self.group.lock().clone();
        DeviceSnapshot {
            address: self.identity.address.clone(),
            name: self.display_name.lock().clone(),
            udn: self.identity.udn.clone(),
            playback: device.playback,
            volume: device.volume,
            mute: device.mute,
            shuffle: device.shuffle,
            repeat: device.repeat,
            track: device.track,
            connectivity: device.connectivity,
            role: group.role,
            members: group.members.into_iter().collect(),
            group_name: group.name,
            group_volume: group.volume,
            group_mute: group.mute,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Poll Entry Points
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) async fn poll_player_once(self: Arc<Self>, seq: u64) {
        let result = self.client.player_status(&self.identity.address).await;
        if self.cancel_token.is_cancelled() {
            return;
        }
        self.apply_player_result(seq, result);
    }

    pub(crate) async fn poll_device_once(self: Arc<Self>, seq: u64) {
        let result = self.client.device_status(&self.identity.address).await;
        if self.cancel_token.is_cancelled() {
            return;
        }
        self.apply_device_result(seq, result).await;
    }

    /// Handles one player-status completion.
    pub(crate) fn apply_player_result(&self, seq: u64, result: HttpResult<PlayerStatus>) {
        match result {
            Ok(status) => {
                if !self.player_seq.try_advance(seq) {
                    log::debug!(
                        "[Poller] {} discarding stale player status (seq {})",
                        self.address(),
                        seq
                    );
                    return;
                }
                self.record_success();

                let delta = self.device.lock().apply_player_status(&status);
                let timestamp = now_millis();

                if delta.playback {
                    self.emitter.emit_device(DeviceEvent::PlaybackChanged {
                        address: self.identity.address.clone(),
                        playback: status.status,
                        timestamp,
                    });
                }
                if delta.track {
                    self.emitter.emit_device(DeviceEvent::TrackChanged {
                        address: self.identity.address.clone(),
                        title: status.title.clone(),
                        artist: status.artist.clone(),
                        album: status.album.clone(),
                        timestamp,
                    });
                }
                if delta.levels {
                    self.emitter.emit_device(DeviceEvent::LevelsChanged {
                        address: self.identity.address.clone(),
                        volume: status.vol,
                        mute: status.mute,
                        timestamp,
                    });
                    self.poke_group_aggregation();
                }
            }
            Err(err) if err.is_transport() => self.record_failure(&err),
            Err(err) => {
                // Protocol failure: snapshot dropped, prior state retained,
                // connectivity untouched
                log::warn!(
                    "[Poller] {} dropping malformed player status: {}",
                    self.address(),
                    err
                );
            }
        }
    }

    /// Handles one extended-status completion and runs role inference.
    pub(crate) async fn apply_device_result(&self, seq: u64, result: HttpResult<DeviceStatus>) {
        match result {
            Ok(status) => {
                if !self.status_seq.try_advance(seq) {
                    log::debug!(
                        "[Poller] {} discarding stale device status (seq {})",
                        self.address(),
                        seq
                    );
                    return;
                }
                self.record_success();

                if let Some(name) = status.device_name.as_deref().filter(|n| !n.is_empty()) {
                    let mut display = self.display_name.lock();
                    if *display != name {
                        *display = name.to_string();
                    }
                }

                self.coordinator.apply_device_status(&status).await;
            }
            Err(err) if err.is_transport() => self.record_failure(&err),
            Err(err) => {
                log::warn!(
                    "[Poller] {} dropping malformed device status: {}",
                    self.address(),
                    err
                );
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Connectivity Tracking
    // ─────────────────────────────────────────────────────────────────────────

    /// Opportunistic aggregation after a volume/mute change: a master
    /// recomputes its own aggregates, a slave pokes its master through the
    /// directory.
    fn poke_group_aggregation(&self) {
        let role = self.group.lock().role.clone();
        match role {
            GroupRole::Master => self.coordinator.refresh_group_levels(),
            GroupRole::Slave { master } => {
                if let Some(handle) = self.directory.lookup(&master) {
                    handle.refresh_group_levels();
                }
            }
            GroupRole::Standalone => {}
        }
    }

    fn record_success(&self) {
        let recovered = {
            let mut device = self.device.lock();
            device.consecutive_failures = 0;
            if device.connectivity != Connectivity::Online {
                device.connectivity = Connectivity::Online;
                true
            } else {
                false
            }
        };
        if recovered {
            log::info!("[Poller] {} is online", self.address());
            self.emitter.emit_device(DeviceEvent::ConnectivityChanged {
                address: self.identity.address.clone(),
                connectivity: Connectivity::Online,
                timestamp: now_millis(),
            });
        }
    }

    fn record_failure(&self, err: &HttpError) {
        let went_offline = {
            let mut device = self.device.lock();
            device.consecutive_failures += 1;
            log::warn!(
                "[Poller] {} request failed ({} consecutive): {}",
                self.address(),
                device.consecutive_failures,
                err
            );
            if device.connectivity == Connectivity::Online
                && device.consecutive_failures >= self.config.offline_threshold
            {
                device.connectivity = Connectivity::Offline;
                true
            } else {
                false
            }
        };
        if went_offline {
            // The group role freezes at its last known value until a fresh
            // snapshot arrives after recovery.
            log::warn!("[Poller] {} marked offline", self.address());
            self.emitter.emit_device(DeviceEvent::ConnectivityChanged {
                address: self.identity.address.clone(),
                connectivity: Connectivity::Offline,
                timestamp: now_millis(),
            });
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Test Entry Points
    // ─────────────────────────────────────────────────────────────────────────

    /// Feeds an extended-status snapshot as if polled successfully.
    #[cfg(test)]
    pub(crate) async fn feed_device_status(&self, status: DeviceStatus) {
        let seq = self.status_seq.next();
        self.apply_device_result(seq, Ok(status)).await;
    }

    /// Feeds a player-status snapshot as if polled successfully.
    #[cfg(test)]
    pub(crate) fn feed_player_status(&self, status: PlayerStatus) {
        let seq = self.player_seq.next();
        self.apply_player_result(seq, Ok(status));
    }

    /// Feeds a minimal player snapshot carrying only volume/mute.
    #[cfg(test)]
    pub(crate) fn feed_player_levels(&self, volume: u8, mute: bool) {
        let seq = self.player_seq.next();
        self.feed_player_levels_with_seq(seq, volume, mute);
    }

    /// Feeds a levels-only snapshot under an explicit sequence number, for
    /// exercising out-of-order completion.
    #[cfg(test)]
    pub(crate) fn feed_player_levels_with_seq(&self, seq: u64, volume: u8, mute: bool) {
        self.apply_player_result(
            seq,
            Ok(PlayerStatus {
                status: crate::linkplay::status::PlaybackStatus::Playing,
                vol: volume,
                mute,
                loop_mode: -1,
                title: String::new(),
                artist: String::new(),
                album: String::new(),
            }),
        );
    }

    /// Current connectivity, for assertions.
    #[cfg(test)]
    pub(crate) fn connectivity(&self) -> Connectivity {
        self.device.lock().connectivity
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Peer Handle
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl PeerHandle for DeviceController {
    fn address(&self) -> &str {
        &self.identity.address
    }

    fn role(&self) -> GroupRole {
        self.group.lock().role.clone()
    }

    fn report_membership(&self, slave: &str) {
        self.coordinator.report_membership(slave);
    }

    fn report_departure(&self, slave: &str) {
        self.coordinator.report_departure(slave);
    }

    fn force_standalone(&self) {
        self.coordinator.force_standalone();
    }

    fn device_levels(&self) -> Option<MemberLevels> {
        self.device.lock().levels()
    }

    fn refresh_group_levels(&self) {
        self.coordinator.refresh_group_levels();
    }

    async fn kick_member(&self, slave: &str) -> ChoraleResult<CommandOutcome> {
        self.dispatcher
            .dispatch(GroupCommand::Kick {
                slave: slave.to_string(),
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::linkplay::http::HttpError;
    use crate::linkplay::test_fixtures::PLAYER_STATUS_PLAYING;
    use crate::test_support::{make_controller, TestRig};

    fn transport_error() -> HttpError {
        HttpError::Status(500, "scripted failure".into())
    }

    fn parse_error() -> HttpError {
        HttpError::Parse(serde_json::from_str::<serde_json::Value>("not json").unwrap_err())
    }

    #[tokio::test]
    async fn device_goes_offline_after_threshold_failures() {
        let rig = TestRig::new();
        let device = make_controller("10.0.0.1", &rig);
        device.feed_player_levels(10, false);
        assert_eq!(device.connectivity(), Connectivity::Online);

        for _ in 0..2 {
            device.apply_player_result(device.player_seq.next(), Err(transport_error()));
        }
        assert_eq!(
            device.connectivity(),
            Connectivity::Online,
            "below the threshold the device stays online"
        );

        device.apply_player_result(device.player_seq.next(), Err(transport_error()));
        assert_eq!(device.connectivity(), Connectivity::Offline);
    }

    #[tokio::test]
    async fn first_success_after_failures_restores_online() {
        let rig = TestRig::new();
        let device = make_controller("10.0.0.1", &rig);
        device.feed_player_levels(10, false);

        for _ in 0..3 {
            device.apply_player_result(device.player_seq.next(), Err(transport_error()));
        }
        assert_eq!(device.connectivity(), Connectivity::Offline);

        device.feed_player_levels(10, false);
        assert_eq!(device.connectivity(), Connectivity::Online);
    }

    #[tokio::test]
    async fn parse_failures_do_not_count_toward_offline() {
        let rig = TestRig::new();
        let device = make_controller("10.0.0.1", &rig);
        device.feed_player_levels(10, false);

        for _ in 0..5 {
            device.apply_player_result(device.player_seq.next(), Err(parse_error()));
        }
        assert_eq!(device.connectivity(), Connectivity::Online);
    }

    #[tokio::test]
    async fn never_polled_device_stays_unknown_through_failures() {
        let rig = TestRig::new();
        let device = make_controller("10.0.0.1", &rig);

        for _ in 0..4 {
            device.apply_player_result(device.player_seq.next(), Err(transport_error()));
        }
        assert_eq!(device.connectivity(), Connectivity::Unknown);
    }

    #[tokio::test]
    async fn stale_player_response_is_discarded() {
        let rig = TestRig::new();
        let device = make_controller("10.0.0.1", &rig);

        let slow_seq = device.player_seq.next();
        let fast_seq = device.player_seq.next();

        // Newer request completes first
        device.feed_player_levels_with_seq(fast_seq, 70, false);
        // The older, slower response must not overwrite newer state
        device.feed_player_levels_with_seq(slow_seq, 20, true);

        let snapshot = device.snapshot();
        assert_eq!(snapshot.volume, 70);
        assert!(!snapshot.mute);
    }

    #[tokio::test]
    async fn player_status_updates_snapshot_fields() {
        let rig = TestRig::new();
        let device = make_controller("10.0.0.1", &rig);
        let status: PlayerStatus = serde_json::from_str(PLAYER_STATUS_PLAYING).unwrap();
        device.feed_player_status(status);

        let snapshot = device.snapshot();
        assert_eq!(snapshot.volume, 42);
        assert_eq!(snapshot.track.title, "Blue in Green");
        assert!(snapshot.shuffle);
        assert!(snapshot.repeat);
    }

    #[tokio::test]
    async fn device_name_refreshes_from_extended_status() {
        let rig = TestRig::new();
        let device = make_controller("10.0.0.1", &rig);

        let mut status = crate::test_support::ungrouped_status();
        status.device_name = Some("Kitchen".into());
        device.feed_device_status(status).await;

        assert_eq!(device.snapshot().name, "Kitchen");
    }
}
