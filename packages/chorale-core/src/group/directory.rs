//! Peer directory: the in-process propagation shortcut between devices
//! managed by the same control point.
//!
//! There is no network-level group protocol. A coordinator that needs to
//! observe or influence another device's group state goes through a
//! [`PeerHandle`] obtained here, never through another controller's
//! internals. A lookup miss is not an error - the peer simply is not
//! managed by this process and will self-correct on its own next poll.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::error::ChoraleResult;
use crate::group::dispatcher::CommandOutcome;
use crate::group::role::GroupRole;
use crate::group::state::MemberLevels;

/// Peer-facing interface of one device's coordination state.
///
/// Deliberately small: peers report membership changes and read levels,
/// they do not reach into each other's records.
#[async_trait]
pub trait PeerHandle: Send + Sync {
    /// The device's network address.
    fn address(&self) -> &str;

    /// Current group role.
    fn role(&self) -> GroupRole;

    /// A slave reports that it now follows this device.
    ///
    /// Adds the slave to the member set and, if this device had no members,
    /// promotes it to master: a master may first observe membership through
    /// a slave's report rather than its own status.
    fn report_membership(&self, slave: &str);

    /// A former slave reports that it has left this device's group.
    ///
    /// Removes the slave from the member set and demotes this device to
    /// standalone when the set empties.
    fn report_departure(&self, slave: &str);

    /// Immediately marks this device standalone (disband fast-path).
    fn force_standalone(&self);

    /// Last-known device volume/mute, or `None` if never successfully polled.
    fn device_levels(&self) -> Option<MemberLevels>;

    /// Recomputes this device's group aggregates from current member levels.
    fn refresh_group_levels(&self);

    /// Ejects one slave through this device's master command path.
    ///
    /// Used by a slave's `Leave`: these devices cannot command themselves
    /// out of a group, the master must kick them.
    async fn kick_member(&self, slave: &str) -> ChoraleResult<CommandOutcome>;
}

/// Lookup from device address to that device's coordination handle.
///
/// Injected into every coordinator; the production implementation is
/// [`InProcessPeerDirectory`], tests supply partial directories to model
/// peers managed by other control points.
pub trait PeerDirectory: Send + Sync {
    /// Finds the handle for one address, if managed by this process.
    fn lookup(&self, address: &str) -> Option<Arc<dyn PeerHandle>>;

    /// All handles currently managed by this process.
    fn peers(&self) -> Vec<Arc<dyn PeerHandle>>;
}

/// DashMap-backed directory shared by all controllers of one process.
#[derive(Default)]
pub struct InProcessPeerDirectory {
    entries: DashMap<String, Arc<dyn PeerHandle>>,
}

impl InProcessPeerDirectory {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a device's handle under its address.
    ///
    /// Called when a device's controller initializes. Re-registering an
    /// address replaces the previous handle.
    pub fn register(&self, handle: Arc<dyn PeerHandle>) {
        let address = handle.address().to_string();
        if self.entries.insert(address.clone(), handle).is_some() {
            log::warn!("[Directory] Replaced existing handle for {}", address);
        }
    }

    /// Removes a device's handle.
    ///
    /// Called when the controller is disposed. Returns true if an entry
    /// existed.
    pub fn release(&self, address: &str) -> bool {
        self.entries.remove(address).is_some()
    }

    /// Number of registered devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl PeerDirectory for InProcessPeerDirectory {
    fn lookup(&self, address: &str) -> Option<Arc<dyn PeerHandle>> {
        self.entries.get(address).map(|r| Arc::clone(r.value()))
    }

    fn peers(&self) -> Vec<Arc<dyn PeerHandle>> {
        self.entries.iter().map(|r| Arc::clone(r.value())).collect()
    }
}
