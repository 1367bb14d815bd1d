//! Typed models for LinkPlay status responses.
//!
//! Handles deserializing `getPlayerStatus`, `getStatusEx`, and
//! `multiroom:getSlaveList` JSON bodies, including the firmware quirks:
//! numeric fields arrive as strings (`"vol":"50"`), track metadata is
//! hex-encoded UTF-8, and shuffle/repeat are packed into a single `loop`
//! mode integer.

use serde::{Deserialize, Deserializer, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Playback Status
// ─────────────────────────────────────────────────────────────────────────────

/// Playback state reported by `getPlayerStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackStatus {
    /// Actively playing audio.
    Playing,
    /// Paused with a loaded source.
    Paused,
    /// No playback.
    #[default]
    Stopped,
    /// Buffering or switching sources.
    Loading,
}

impl PlaybackStatus {
    /// Decodes the wire `status` string.
    ///
    /// Firmware variants spell these differently ("play"/"playing",
    /// "load"/"loading"); unknown values fall back to `Stopped`.
    #[must_use]
    pub fn from_wire(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "play" | "playing" => Self::Playing,
            "pause" | "paused" => Self::Paused,
            "load" | "loading" => Self::Loading,
            "stop" | "stopped" | "none" => Self::Stopped,
            other => {
                log::debug!("[LinkPlay] Unrecognized playback status {:?}", other);
                Self::Stopped
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Field Decoding Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// JSON value that may be a bare number or a string-wrapped number.
#[derive(Deserialize)]
#[serde(untagged)]
enum StrOrNum {
    Num(i64),
    Str(String),
}

impl StrOrNum {
    fn as_i64<E: serde::de::Error>(&self) -> Result<i64, E> {
        match self {
            Self::Num(n) => Ok(*n),
            Self::Str(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

fn de_volume<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
    let n = StrOrNum::deserialize(deserializer)?.as_i64()?;
    Ok(n.clamp(0, 100) as u8)
}

fn de_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let n = StrOrNum::deserialize(deserializer)?.as_i64()?;
    Ok(n != 0)
}

fn de_mode<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    StrOrNum::deserialize(deserializer)?.as_i64()
}

fn de_playback<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PlaybackStatus, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(PlaybackStatus::from_wire(&raw))
}

fn de_hex_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    let raw = String::deserialize(deserializer)?;
    Ok(decode_hex_text(&raw))
}

/// Decodes a hex-encoded UTF-8 text field.
///
/// Metadata fields come hex-encoded on most firmware, but some sources pass
/// plain text through. Anything that is not plausibly hex, or does not decode
/// to valid UTF-8, is returned unchanged.
pub(crate) fn decode_hex_text(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || trimmed.len() % 2 != 0
        || !trimmed.bytes().all(|b| b.is_ascii_hexdigit())
    {
        return raw.to_string();
    }

    let mut bytes = Vec::with_capacity(trimmed.len() / 2);
    for i in (0..trimmed.len()).step_by(2) {
        match u8::from_str_radix(&trimmed[i..i + 2], 16) {
            Ok(byte) => bytes.push(byte),
            Err(_) => return raw.to_string(),
        }
    }

    match String::from_utf8(bytes) {
        Ok(decoded) => decoded,
        Err(_) => raw.to_string(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// getPlayerStatus
// ─────────────────────────────────────────────────────────────────────────────

/// Snapshot of a device's playback channel from `getPlayerStatus`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerStatus {
    /// Current playback state.
    #[serde(default, deserialize_with = "de_playback")]
    pub status: PlaybackStatus,

    /// Device volume (0-100).
    #[serde(default, deserialize_with = "de_volume")]
    pub vol: u8,

    /// Device mute flag.
    #[serde(default, deserialize_with = "de_flag")]
    pub mute: bool,

    /// Packed shuffle/repeat mode. `loop` is a keyword, hence the rename.
    #[serde(rename = "loop", default = "default_loop_mode", deserialize_with = "de_mode")]
    pub loop_mode: i64,

    /// Track title (hex-encoded on the wire, may be empty).
    #[serde(rename = "Title", default, deserialize_with = "de_hex_text")]
    pub title: String,

    /// Track artist (hex-encoded on the wire, may be empty).
    #[serde(rename = "Artist", default, deserialize_with = "de_hex_text")]
    pub artist: String,

    /// Track album (hex-encoded on the wire, may be empty).
    #[serde(rename = "Album", default, deserialize_with = "de_hex_text")]
    pub album: String,
}

fn default_loop_mode() -> i64 {
    -1
}

impl PlayerStatus {
    /// Whether shuffle is active for the current loop mode.
    ///
    /// Mode table: 0 repeat-all, 1 repeat-one, 2 shuffle+repeat,
    /// 3 shuffle only, anything else plain sequential.
    #[must_use]
    pub fn shuffle(&self) -> bool {
        matches!(self.loop_mode, 2 | 3)
    }

    /// Whether any repeat mode is active for the current loop mode.
    #[must_use]
    pub fn repeat(&self) -> bool {
        matches!(self.loop_mode, 0 | 1 | 2)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// getStatusEx
// ─────────────────────────────────────────────────────────────────────────────

/// Extended device status from `getStatusEx`, carrying the grouping fields
/// that drive role inference.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceStatus {
    /// Whether the device currently considers itself part of a group.
    #[serde(default, deserialize_with = "de_flag")]
    pub group: bool,

    /// Master address as reported by newer firmware.
    #[serde(default)]
    pub master_ip: Option<String>,

    /// Master address field used by older firmware.
    #[serde(default)]
    pub host_ip: Option<String>,

    /// Display name of the group (hex-encoded on some firmware).
    #[serde(rename = "GroupName", default, deserialize_with = "de_opt_hex_text")]
    pub group_name: Option<String>,

    /// Device's own display name.
    #[serde(rename = "DeviceName", default, deserialize_with = "de_opt_hex_text")]
    pub device_name: Option<String>,

    /// Discovered unique device name, when the firmware reports one.
    #[serde(default)]
    pub uuid: Option<String>,
}

fn de_opt_hex_text<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.map(|s| decode_hex_text(&s)))
}

impl DeviceStatus {
    /// Returns the master address this device claims, preferring `master_ip`
    /// and falling back to the legacy `host_ip` field. Empty strings count
    /// as absent.
    #[must_use]
    pub fn master_address(&self) -> Option<&str> {
        self.master_ip
            .as_deref()
            .filter(|ip| !ip.is_empty())
            .or_else(|| self.host_ip.as_deref().filter(|ip| !ip.is_empty()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// multiroom:getSlaveList
// ─────────────────────────────────────────────────────────────────────────────

/// One slave in a master's authoritative roster.
#[derive(Debug, Clone, Deserialize)]
pub struct SlaveEntry {
    /// Slave address.
    pub ip: String,

    /// Slave display name (hex-encoded on some firmware).
    #[serde(default, deserialize_with = "de_hex_text")]
    pub name: String,

    /// Slave volume (0-100).
    #[serde(default, deserialize_with = "de_volume")]
    pub volume: u8,

    /// Slave mute flag.
    #[serde(default, deserialize_with = "de_flag")]
    pub mute: bool,
}

/// Response body of `multiroom:getSlaveList`.
///
/// When a device has no slaves the firmware omits `slave_list` entirely.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct SlaveList {
    /// Advertised slave count.
    #[serde(default, deserialize_with = "de_mode")]
    pub slaves: i64,

    /// Roster entries, absent when the device has no slaves.
    #[serde(default)]
    pub slave_list: Vec<SlaveEntry>,
}
