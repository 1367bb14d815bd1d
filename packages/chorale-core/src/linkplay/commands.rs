//! Typed command grammar for the LinkPlay HTTP API.
//!
//! Every request this controller can make is a variant of [`ApiCommand`];
//! the wire strings are rendered in exactly one place. Handlers decode user
//! intent into these variants at the system boundary instead of switching on
//! raw command strings.

use std::fmt;

/// A command understood by LinkPlay-family speakers.
///
/// Rendered into the `command=` query parameter of `httpapi.asp`. Queries
/// return JSON bodies; mutating commands acknowledge with a bare `OK`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCommand {
    /// Playback status, volume, mute, loop mode, and track metadata.
    GetPlayerStatus,
    /// Extended device status: grouping flag, master address, group name.
    GetStatusEx,
    /// The master's authoritative slave roster with per-slave levels.
    GetSlaveList,
    /// Set the device's own volume (0-100, clamped).
    SetVolume(u8),
    /// Mute or unmute the device.
    SetMute(bool),
    /// Disband the group this device masters.
    Ungroup,
    /// Eject a named slave from the group (sent to the master).
    SlaveKickout {
        /// Address of the slave to remove.
        slave: String,
    },
    /// Attach this device to a master as a slave.
    JoinGroupMaster {
        /// Address of the master to join.
        master: String,
    },
    /// Set a named slave's volume (sent to the master).
    SlaveVolume {
        /// Address of the slave.
        slave: String,
        /// Desired volume (0-100, clamped).
        volume: u8,
    },
    /// Mute or unmute a named slave (sent to the master).
    SlaveMute {
        /// Address of the slave.
        slave: String,
        /// `true` to mute.
        mute: bool,
    },
}

impl ApiCommand {
    /// Returns true for commands that answer with a JSON body rather
    /// than a bare `OK` acknowledgment.
    #[must_use]
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Self::GetPlayerStatus | Self::GetStatusEx | Self::GetSlaveList
        )
    }
}

impl fmt::Display for ApiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GetPlayerStatus => write!(f, "getPlayerStatus"),
            Self::GetStatusEx => write!(f, "getStatusEx"),
            Self::GetSlaveList => write!(f, "multiroom:getSlaveList"),
            Self::SetVolume(volume) => write!(f, "setPlayerCmd:vol:{}", volume.min(&100)),
            Self::SetMute(mute) => write!(f, "setPlayerCmd:mute:{}", u8::from(*mute)),
            Self::Ungroup => write!(f, "multiroom:Ungroup"),
            Self::SlaveKickout { slave } => write!(f, "multiroom:SlaveKickout:{}", slave),
            // The wifi parameter is a legacy direct-connect channel; modern
            // firmware expects the literal 0.0.0.0 placeholder.
            Self::JoinGroupMaster { master } => {
                write!(f, "ConnectMasterAp:JoinGroupMaster:eth{}:wifi0.0.0.0", master)
            }
            Self::SlaveVolume { slave, volume } => {
                write!(f, "multiroom:SlaveVolume:{}:{}", slave, volume.min(&100))
            }
            Self::SlaveMute { slave, mute } => {
                write!(f, "multiroom:SlaveMute:{}:{}", slave, u8::from(*mute))
            }
        }
    }
}
