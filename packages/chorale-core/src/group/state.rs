//! Per-device group coordination state.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use super::role::GroupRole;

/// Last-known volume/mute levels for one group member.
///
/// Fed by slave-roster queries, live peer reads, and optimistic dispatcher
/// writes; consumed by group aggregation when a member has no live peer
/// handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberLevels {
    /// Volume 0-100.
    pub volume: u8,
    /// Mute flag.
    pub mute: bool,
}

/// Group coordination record for a single device.
///
/// Mutated only by the device's own coordinator and by peer coordinators
/// acting through its directory handle; the owning controller serializes
/// every mutation behind one per-device lock.
#[derive(Debug, Clone, Default)]
pub struct GroupState {
    /// Current role.
    pub role: GroupRole,

    /// Member addresses. Populated only while `role` is `Master`.
    pub members: BTreeSet<String>,

    /// Group display name from the latest extended-status snapshot.
    pub name: String,

    /// Aggregated group volume. Non-zero only while `role` is `Master`.
    pub volume: u8,

    /// Aggregated group mute. Meaningful only while `role` is `Master`.
    pub mute: bool,

    /// Last-known levels per member address.
    pub member_levels: BTreeMap<String, MemberLevels>,
}

impl GroupState {
    /// Resets the record to an ungrouped state.
    ///
    /// A device that is not a master always reports 0 / unmuted on the
    /// group channel.
    pub fn reset_to_standalone(&mut self) {
        self.role = GroupRole::Standalone;
        self.members.clear();
        self.member_levels.clear();
        self.volume = 0;
        self.mute = false;
    }

    /// Moves the record into the slave role under `master`.
    ///
    /// Slaves hold no member list and report 0 / unmuted on the group
    /// channel.
    pub fn become_slave_of(&mut self, master: String) {
        self.role = GroupRole::Slave { master };
        self.members.clear();
        self.member_levels.clear();
        self.volume = 0;
        self.mute = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_membership_and_levels() {
        let mut state = GroupState {
            role: GroupRole::Master,
            volume: 80,
            mute: true,
            name: "Downstairs".into(),
            ..GroupState::default()
        };
        state.members.insert("10.0.0.2".into());
        state.member_levels.insert(
            "10.0.0.2".into(),
            MemberLevels {
                volume: 80,
                mute: true,
            },
        );

        state.reset_to_standalone();

        assert_eq!(state.role, GroupRole::Standalone);
        assert!(state.members.is_empty());
        assert!(state.member_levels.is_empty());
        assert_eq!(state.volume, 0);
        assert!(!state.mute);
        // Display name survives regrouping
        assert_eq!(state.name, "Downstairs");
    }

    #[test]
    fn become_slave_records_master() {
        let mut state = GroupState::default();
        state.members.insert("10.0.0.9".into());

        state.become_slave_of("10.0.0.1".into());

        assert_eq!(state.role.master_address(), Some("10.0.0.1"));
        assert!(state.members.is_empty());
        assert_eq!(state.volume, 0);
    }
}
