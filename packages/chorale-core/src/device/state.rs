//! Per-device identity and playback state records.
//!
//! A [`DeviceState`] is created when its controller initializes and lives as
//! long as the device is configured. It is mutated exclusively by the status
//! poller's response handlers; everyone else reads snapshots.

use serde::Serialize;

use crate::group::role::GroupRole;
use crate::group::state::MemberLevels;
use crate::linkplay::status::{PlaybackStatus, PlayerStatus};

// ─────────────────────────────────────────────────────────────────────────────
// Identity
// ─────────────────────────────────────────────────────────────────────────────

/// Stable key for a device: network address plus optional discovered UDN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceIdentity {
    /// Network address. Non-empty for any device eligible for coordination.
    pub address: String,
    /// Configured display name (may be empty until the first poll).
    pub name: String,
    /// Globally unique identifier from discovery, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udn: Option<String>,
}

impl DeviceIdentity {
    /// Creates a new identity.
    #[must_use]
    pub fn new(address: String, name: String, udn: Option<String>) -> Self {
        Self { address, name, udn }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Connectivity
// ─────────────────────────────────────────────────────────────────────────────

/// Communication status of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Connectivity {
    /// Last status request succeeded.
    Online,
    /// Consecutive failures crossed the offline threshold.
    Offline,
    /// No successful poll yet.
    #[default]
    Unknown,
}

// ─────────────────────────────────────────────────────────────────────────────
// Track Metadata
// ─────────────────────────────────────────────────────────────────────────────

/// Current track metadata. Fields may be empty (radio streams, line-in).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    /// Track title.
    pub title: String,
    /// Track artist.
    pub artist: String,
    /// Track album.
    pub album: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Device State
// ─────────────────────────────────────────────────────────────────────────────

/// Change flags from applying a player-status snapshot.
///
/// Drives event emission: only fields that actually changed produce events
/// (no duplicate side effects from identical snapshots).
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerDelta {
    /// Playback status changed.
    pub playback: bool,
    /// Volume or mute changed.
    pub levels: bool,
    /// Track metadata changed.
    pub track: bool,
    /// Shuffle or repeat changed.
    pub mode: bool,
}

impl PlayerDelta {
    /// Whether any field changed.
    #[must_use]
    pub fn any(&self) -> bool {
        self.playback || self.levels || self.track || self.mode
    }
}

/// Mutable per-device playback and connectivity record.
#[derive(Debug, Clone, Default)]
pub struct DeviceState {
    /// Current playback status.
    pub playback: PlaybackStatus,
    /// Device volume (0-100).
    pub volume: u8,
    /// Device mute flag.
    pub mute: bool,
    /// Shuffle flag decoded from the loop mode.
    pub shuffle: bool,
    /// Repeat flag decoded from the loop mode.
    pub repeat: bool,
    /// Current track metadata.
    pub track: TrackInfo,
    /// Communication status.
    pub connectivity: Connectivity,
    /// Consecutive transport failures since the last success.
    pub consecutive_failures: u32,
    /// Whether at least one player-status snapshot was ever applied.
    pub has_player_status: bool,
}

impl DeviceState {
    /// Applies a player-status snapshot, returning which fields changed.
    pub fn apply_player_status(&mut self, status: &PlayerStatus) -> PlayerDelta {
        let mut delta = PlayerDelta::default();
        self.has_player_status = true;

        if self.playback != status.status {
            self.playback = status.status;
            delta.playback = true;
        }
        if self.volume != status.vol || self.mute != status.mute {
            self.volume = status.vol;
            self.mute = status.mute;
            delta.levels = true;
        }
        let shuffle = status.shuffle();
        let repeat = status.repeat();
        if self.shuffle != shuffle || self.repeat != repeat {
            self.shuffle = shuffle;
            self.repeat = repeat;
            delta.mode = true;
        }
        if self.track.title != status.title
            || self.track.artist != status.artist
            || self.track.album != status.album
        {
            self.track = TrackInfo {
                title: status.title.clone(),
                artist: status.artist.clone(),
                album: status.album.clone(),
            };
            delta.track = true;
        }

        delta
    }

    /// Last-known levels, or `None` before the first player-status poll.
    ///
    /// Aggregation skips members with no known value instead of inventing
    /// defaults for them; an offline member still contributes its last-known
    /// levels.
    #[must_use]
    pub fn levels(&self) -> Option<MemberLevels> {
        if !self.has_player_status {
            return None;
        }
        Some(MemberLevels {
            volume: self.volume,
            mute: self.mute,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Snapshots
// ─────────────────────────────────────────────────────────────────────────────

/// UI-facing snapshot of one device's full observable state.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    /// Device address.
    pub address: String,
    /// Display name.
    pub name: String,
    /// Discovered UDN, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udn: Option<String>,
    /// Playback status.
    pub playback: PlaybackStatus,
    /// Device volume.
    pub volume: u8,
    /// Device mute.
    pub mute: bool,
    /// Shuffle flag.
    pub shuffle: bool,
    /// Repeat flag.
    pub repeat: bool,
    /// Current track metadata.
    pub track: TrackInfo,
    /// Communication status.
    pub connectivity: Connectivity,
    /// Group role.
    pub role: GroupRole,
    /// Group members (non-empty only for masters).
    pub members: Vec<String>,
    /// Group display name.
    pub group_name: String,
    /// Aggregated group volume (0 unless master).
    pub group_volume: u8,
    /// Aggregated group mute (false unless master).
    pub group_mute: bool,
}
