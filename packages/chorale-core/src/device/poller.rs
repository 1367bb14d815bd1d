//! Periodic status polling for one device.
//!
//! Responsibilities:
//! - Two independent interval loops per device (player status and extended
//!   device status), each disabled by a zero interval
//! - Per-request sequence numbers so an out-of-order completion can never
//!   overwrite newer state with older data
//! - Graceful stop through the controller's cancellation token; in-flight
//!   requests complete and their results are discarded
//!
//! Each tick spawns the request as its own task, so one slow device never
//! delays its own next tick or any other device's polling.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;

use crate::runtime::{TaskSpawner, TokioSpawner};

use super::controller::DeviceController;

/// Which of the two poll loops a request belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollKind {
    /// `getPlayerStatus`: playback, levels, track metadata.
    Player,
    /// `getStatusEx`: grouping and device fields.
    Device,
}

/// Monotonic request sequencing for one poll kind.
///
/// `try_advance` accepts a response only if its sequence number is newer
/// than everything applied so far, discarding stale completions.
#[derive(Debug, Default)]
pub(crate) struct PollSequence {
    issued: AtomicU64,
    applied: AtomicU64,
}

impl PollSequence {
    /// Allocates the sequence number for the next request.
    pub fn next(&self) -> u64 {
        self.issued.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Tries to mark `seq` as applied. Returns false when a newer response
    /// has already been applied.
    pub fn try_advance(&self, seq: u64) -> bool {
        self.applied.fetch_max(seq, Ordering::SeqCst) < seq
    }
}

/// Starts both poll loops for a controller.
///
/// A zero interval disables the corresponding loop.
pub(crate) fn start(controller: &Arc<DeviceController>, spawner: &TokioSpawner) {
    let config = controller.config();
    spawn_loop(
        controller,
        spawner,
        PollKind::Player,
        config.player_status_interval_secs,
    );
    spawn_loop(
        controller,
        spawner,
        PollKind::Device,
        config.device_status_interval_secs,
    );
}

fn spawn_loop(
    controller: &Arc<DeviceController>,
    spawner: &TokioSpawner,
    kind: PollKind,
    period_secs: u64,
) {
    if period_secs == 0 {
        log::info!(
            "[Poller] {} {:?} polling disabled by configuration",
            controller.address(),
            kind
        );
        return;
    }

    let controller = Arc::clone(controller);
    let request_spawner = spawner.clone();
    spawner.spawn(async move {
        let token = controller.cancel_token().clone();
        let mut interval = tokio::time::interval(Duration::from_secs(period_secs));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    log::debug!(
                        "[Poller] {} {:?} loop stopped",
                        controller.address(),
                        kind
                    );
                    break;
                }
                _ = interval.tick() => {}
            }

            let controller = Arc::clone(&controller);
            match kind {
                PollKind::Player => {
                    let seq = controller.player_seq.next();
                    request_spawner.spawn(async move {
                        controller.poll_player_once(seq).await;
                    });
                }
                PollKind::Device => {
                    let seq = controller.status_seq.next();
                    request_spawner.spawn(async move {
                        controller.poll_device_once(seq).await;
                    });
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::state::{Connectivity, DeviceIdentity};
    use crate::linkplay::client::DeviceCommands;
    use crate::linkplay::status::{PlaybackStatus, PlayerStatus};
    use crate::state::Config;
    use crate::test_support::TestRig;
    use std::time::Duration;

    fn player_status(volume: u8) -> PlayerStatus {
        PlayerStatus {
            status: PlaybackStatus::Playing,
            vol: volume,
            mute: false,
            loop_mode: -1,
            title: String::new(),
            artist: String::new(),
            album: String::new(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn poll_loop_applies_responses_and_tracks_offline() {
        let rig = TestRig::new();
        rig.client.push_player_status("10.0.0.1", player_status(70));

        let client: std::sync::Arc<dyn DeviceCommands> = rig.client.clone();
        let directory: std::sync::Arc<dyn crate::group::directory::PeerDirectory> =
            rig.directory.clone();
        let emitter: std::sync::Arc<dyn crate::events::EventEmitter> =
            rig.emitter.clone();
        let controller = DeviceController::new(
            DeviceIdentity::new("10.0.0.1".into(), String::new(), None),
            client,
            directory,
            emitter,
            Config {
                player_status_interval_secs: 5,
                device_status_interval_secs: 0,
                ..Config::default()
            },
        );
        controller.start(&TokioSpawner::current());

        // First tick fires immediately and applies the scripted response
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(controller.snapshot().volume, 70);
        assert_eq!(controller.connectivity(), Connectivity::Online);

        // The queue is drained: the next three ticks fail and cross the
        // offline threshold
        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(controller.connectivity(), Connectivity::Offline);

        // Cancellation stops the loop: no further requests go out
        controller.shutdown();
        tokio::time::sleep(Duration::from_secs(1)).await;
        let polls_at_shutdown = rig.client.count_commands("10.0.0.1", "getPlayerStatus");
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(
            rig.client.count_commands("10.0.0.1", "getPlayerStatus"),
            polls_at_shutdown
        );
    }

    #[tokio::test(start_paused = true)]
    async fn zero_interval_disables_polling() {
        let rig = TestRig::new();
        let client: std::sync::Arc<dyn DeviceCommands> = rig.client.clone();
        let directory: std::sync::Arc<dyn crate::group::directory::PeerDirectory> =
            rig.directory.clone();
        let emitter: std::sync::Arc<dyn crate::events::EventEmitter> =
            rig.emitter.clone();
        let controller = DeviceController::new(
            DeviceIdentity::new("10.0.0.1".into(), String::new(), None),
            client,
            directory,
            emitter,
            Config {
                player_status_interval_secs: 0,
                device_status_interval_secs: 0,
                ..Config::default()
            },
        );
        controller.start(&TokioSpawner::current());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rig.client.calls().is_empty());
    }

    #[test]
    fn sequence_advances_monotonically() {
        let seq = PollSequence::default();
        let first = seq.next();
        let second = seq.next();
        assert!(second > first);

        assert!(seq.try_advance(first));
        assert!(seq.try_advance(second));
    }

    #[test]
    fn stale_sequence_is_rejected() {
        let seq = PollSequence::default();
        let first = seq.next();
        let second = seq.next();

        // Second response completes first (slow network on the first)
        assert!(seq.try_advance(second));
        assert!(!seq.try_advance(first), "older response must be discarded");
        assert!(!seq.try_advance(second), "replay of the same seq is stale");
    }
}
