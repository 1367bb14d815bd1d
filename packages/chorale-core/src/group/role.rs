//! Group role of a device in multiroom playback.

use serde::Serialize;

/// Role of a device in synchronized multiroom playback.
///
/// Exactly one value per device at any instant. A slave carries its master's
/// address inside the variant, so "master with a master address" and similar
/// contradictions are unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupRole {
    /// Not currently part of any group.
    #[default]
    Standalone,
    /// Owns the member list; other devices sync to it.
    Master,
    /// Plays in lockstep with a master; knows only that master's address.
    Slave {
        /// Address of the master this device follows.
        master: String,
    },
}

impl GroupRole {
    /// Whether this device currently masters a group.
    #[must_use]
    pub fn is_master(&self) -> bool {
        matches!(self, Self::Master)
    }

    /// Whether this device currently follows a master.
    #[must_use]
    pub fn is_slave(&self) -> bool {
        matches!(self, Self::Slave { .. })
    }

    /// The master address a slave follows, if any.
    #[must_use]
    pub fn master_address(&self) -> Option<&str> {
        match self {
            Self::Slave { master } => Some(master),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_role_is_standalone() {
        assert_eq!(GroupRole::default(), GroupRole::Standalone);
    }

    #[test]
    fn slave_exposes_master_address() {
        let role = GroupRole::Slave {
            master: "10.0.0.1".into(),
        };
        assert!(role.is_slave());
        assert!(!role.is_master());
        assert_eq!(role.master_address(), Some("10.0.0.1"));
        assert_eq!(GroupRole::Master.master_address(), None);
    }

    #[test]
    fn serializes_tagged() {
        assert_eq!(
            serde_json::to_value(GroupRole::Standalone).unwrap(),
            serde_json::json!({ "kind": "standalone" })
        );
        assert_eq!(
            serde_json::to_value(GroupRole::Slave {
                master: "10.0.0.1".into()
            })
            .unwrap(),
            serde_json::json!({ "kind": "slave", "master": "10.0.0.1" })
        );
    }
}
