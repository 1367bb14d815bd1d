//! Group role inference and aggregation.
//!
//! Responsibilities:
//! - Deriving a device's role (standalone / master / slave) from each
//!   extended-status snapshot
//! - Propagating membership changes to peers through the directory
//! - Promoting a master that first learns of its group through a slave's
//!   report, and demoting masters whose member set empties
//! - Aggregating group volume/mute across the member set
//!
//! There is no shared ledger: role is re-derived every cycle from the
//! freshest local evidence (the device's own grouped flag, or peers' claims
//! about it) rather than trusted from a prior decision. That bounds any
//! split-brain window to one polling interval per affected device.
//!
//! Lock discipline: this device's group lock is never held across a peer
//! call, and peer handles only ever lock their own device's records, so
//! cross-device propagation cannot deadlock.

use std::collections::BTreeSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::state::DeviceState;
use crate::events::{EventEmitter, GroupEvent};
use crate::group::directory::PeerDirectory;
use crate::group::role::GroupRole;
use crate::group::state::{GroupState, MemberLevels};
use crate::linkplay::client::DeviceCommands;
use crate::linkplay::status::DeviceStatus;
use crate::utils::now_millis;

/// Role-inference state machine for one device.
pub struct GroupCoordinator {
    address: String,
    device: Arc<Mutex<DeviceState>>,
    group: Arc<Mutex<GroupState>>,
    directory: Arc<dyn PeerDirectory>,
    client: Arc<dyn DeviceCommands>,
    emitter: Arc<dyn EventEmitter>,
}

impl GroupCoordinator {
    /// Creates a coordinator for the device at `address`.
    pub fn new(
        address: String,
        device: Arc<Mutex<DeviceState>>,
        group: Arc<Mutex<GroupState>>,
        directory: Arc<dyn PeerDirectory>,
        client: Arc<dyn DeviceCommands>,
        emitter: Arc<dyn EventEmitter>,
    ) -> Self {
        Self {
            address,
            device,
            group,
            directory,
            client,
            emitter,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Role Inference
    // ─────────────────────────────────────────────────────────────────────────

    /// Runs one role-inference cycle from an extended-status snapshot.
    ///
    /// Invoked by the poller for every successfully parsed `getStatusEx`
    /// response. A grouped snapshot without a usable master address is a
    /// protocol failure: logged and dropped, prior role retained.
    pub async fn apply_device_status(&self, status: &DeviceStatus) {
        let before = self.group.lock().clone();

        if status.group {
            let Some(master) = status.master_address() else {
                log::warn!(
                    "[Coordinator] {} reports grouped without a master address, dropping snapshot",
                    self.address
                );
                return;
            };
            if master == self.address {
                log::warn!(
                    "[Coordinator] {} reports itself as its own master, dropping snapshot",
                    self.address
                );
                return;
            }
            self.transition_to_slave(&before, master.to_string(), status);
        } else {
            self.rederive_ungrouped(&before, status).await;
        }

        self.publish_changes(&before);
    }

    /// The snapshot says "grouped under `master`".
    fn transition_to_slave(&self, before: &GroupState, master: String, status: &DeviceStatus) {
        let unchanged = before.role.master_address() == Some(master.as_str());

        if !unchanged {
            // Report departure to a previous master first, so its member set
            // does not misrepresent this device for a full cycle.
            if let Some(old_master) = before.role.master_address() {
                if let Some(handle) = self.directory.lookup(old_master) {
                    handle.report_departure(&self.address);
                }
            }

            match self.directory.lookup(&master) {
                Some(handle) => handle.report_membership(&self.address),
                None => log::debug!(
                    "[Coordinator] Master {} not managed locally; it will learn of {} from its own polling",
                    master,
                    self.address
                ),
            }

            log::info!("[Coordinator] {} is now a slave of {}", self.address, master);
        }

        let mut group = self.group.lock();
        group.become_slave_of(master);
        refresh_name(&mut group, status);
    }

    /// The snapshot says "not grouped": re-derive from peer claims.
    async fn rederive_ungrouped(&self, before: &GroupState, status: &DeviceStatus) {
        // A former slave tells its old master it left; an empty member set
        // demotes that master.
        if let Some(old_master) = before.role.master_address() {
            if let Some(handle) = self.directory.lookup(old_master) {
                handle.report_departure(&self.address);
            }
        }

        let claimants = self.scan_claimants();

        if claimants.is_empty() {
            let mut group = self.group.lock();
            group.reset_to_standalone();
            refresh_name(&mut group, status);
            return;
        }

        let was_master = before.role.is_master();
        let mut members = claimants;
        let mut seeded = Vec::new();

        if !was_master {
            // Standalone->Master edge: fetch the authoritative roster once.
            // Ongoing membership is maintained by peer reports and the
            // per-cycle scan, not by re-querying.
            match self.client.slave_list(&self.address).await {
                Ok(list) => {
                    for entry in list.slave_list {
                        members.insert(entry.ip.clone());
                        seeded.push(entry);
                    }
                }
                Err(e) => log::warn!(
                    "[Coordinator] {} slave roster query failed, proceeding with peer claims: {}",
                    self.address,
                    e
                ),
            }
            log::info!(
                "[Coordinator] {} promoted to master of {} member(s)",
                self.address,
                members.len()
            );
        } else {
            // Members not managed in-process never show up in the scan;
            // keep them until a kick or ungroup names them. Locally managed
            // ex-members drop out here within one cycle.
            for member in &before.members {
                if self.directory.lookup(member).is_none() {
                    members.insert(member.clone());
                }
            }
        }

        {
            let mut group = self.group.lock();
            group.role = GroupRole::Master;
            let kept = members.clone();
            group.member_levels.retain(|addr, _| kept.contains(addr));
            group.members = members;
            for entry in seeded {
                group.member_levels.insert(
                    entry.ip,
                    MemberLevels {
                        volume: entry.volume,
                        mute: entry.mute,
                    },
                );
            }
            refresh_name(&mut group, status);
        }

        self.recompute_levels();
    }

    /// Addresses of directory-known peers currently claiming this device as
    /// their master.
    fn scan_claimants(&self) -> BTreeSet<String> {
        self.directory
            .peers()
            .iter()
            .filter(|peer| peer.address() != self.address)
            .filter(|peer| {
                matches!(peer.role(), GroupRole::Slave { master } if master == self.address)
            })
            .map(|peer| peer.address().to_string())
            .collect()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Peer-Facing Operations
    // ─────────────────────────────────────────────────────────────────────────

    /// A slave reports that it now follows this device.
    ///
    /// Promotes this device to master if it was not one already: a master may
    /// first observe membership through a slave's report rather than its own
    /// status snapshot.
    pub fn report_membership(&self, slave: &str) {
        if slave == self.address {
            return;
        }
        let before = self.group.lock().clone();
        {
            let mut group = self.group.lock();
            group.members.insert(slave.to_string());
            if !group.role.is_master() {
                log::info!(
                    "[Coordinator] {} promoted to master by {}'s report",
                    self.address,
                    slave
                );
                group.role = GroupRole::Master;
            }
        }
        self.recompute_levels();
        self.publish_changes(&before);
    }

    /// A former slave reports that it left this device's group.
    pub fn report_departure(&self, slave: &str) {
        let before = self.group.lock().clone();
        {
            let mut group = self.group.lock();
            group.members.remove(slave);
            group.member_levels.remove(slave);
            if group.role.is_master() && group.members.is_empty() {
                log::info!(
                    "[Coordinator] {} lost its last member, demoting to standalone",
                    self.address
                );
                group.reset_to_standalone();
            }
        }
        self.recompute_levels();
        self.publish_changes(&before);
    }

    /// Immediately marks this device standalone.
    ///
    /// Disband fast-path: members of an ungrouped master would not discover
    /// disbandment until their own next extended-status poll; leaving them
    /// stale would misrepresent UI state for one extra cycle.
    pub fn force_standalone(&self) {
        let before = self.group.lock().clone();
        self.group.lock().reset_to_standalone();
        self.publish_changes(&before);
    }

    /// Recomputes aggregates and publishes any resulting change.
    pub fn refresh_group_levels(&self) {
        let before = self.group.lock().clone();
        self.recompute_levels();
        self.publish_changes(&before);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Aggregation
    // ─────────────────────────────────────────────────────────────────────────

    /// Recomputes group volume/mute from current member levels.
    ///
    /// Group volume is the maximum over the master's own volume and every
    /// member's; group mute is the AND. A member with a live directory handle
    /// contributes its current levels (and refreshes the cache); otherwise
    /// its last-known cached value is used, or it is skipped entirely if no
    /// value exists. Only a master aggregates; everyone else reports
    /// 0 / unmuted on the group channel.
    pub(crate) fn recompute_levels(&self) {
        let (is_master, members, cached) = {
            let group = self.group.lock();
            (
                group.role.is_master(),
                group.members.clone(),
                group.member_levels.clone(),
            )
        };

        if !is_master {
            let mut group = self.group.lock();
            group.volume = 0;
            group.mute = false;
            return;
        }

        let mut volume = 0;
        let mut mute = true;
        let mut any = false;

        if let Some(own) = self.device.lock().levels() {
            volume = own.volume;
            mute = own.mute;
            any = true;
        }

        let mut fresh = Vec::new();
        for member in &members {
            let live = self
                .directory
                .lookup(member)
                .and_then(|handle| handle.device_levels());
            if let Some(levels) = live {
                fresh.push((member.clone(), levels));
            }
            match live.or_else(|| cached.get(member).copied()) {
                Some(levels) => {
                    volume = volume.max(levels.volume);
                    mute &= levels.mute;
                    any = true;
                }
                None => log::debug!(
                    "[Coordinator] No known levels for member {}, skipping in aggregation",
                    member
                ),
            }
        }

        if !any {
            volume = 0;
            mute = false;
        }

        let mut group = self.group.lock();
        // Role may have changed while the lock was released; never attach
        // aggregates to a non-master record.
        if group.role.is_master() {
            group.volume = volume;
            group.mute = mute;
            for (member, levels) in fresh {
                group.member_levels.insert(member, levels);
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Publication
    // ─────────────────────────────────────────────────────────────────────────

    /// Emits events for every observable field that differs from `before`.
    ///
    /// Feeding the same snapshot twice therefore produces no duplicate side
    /// effects: nothing changed, nothing is emitted.
    pub(crate) fn publish_changes(&self, before: &GroupState) {
        let after = self.group.lock().clone();
        let timestamp = now_millis();

        if after.role != before.role || after.members != before.members {
            self.emitter.emit_group(GroupEvent::RoleChanged {
                address: self.address.clone(),
                role: after.role.clone(),
                members: after.members.iter().cloned().collect(),
                timestamp,
            });
        }
        if after.name != before.name {
            self.emitter.emit_group(GroupEvent::NameChanged {
                address: self.address.clone(),
                name: after.name.clone(),
                timestamp,
            });
        }
        if after.volume != before.volume || after.mute != before.mute {
            self.emitter.emit_group(GroupEvent::LevelsChanged {
                address: self.address.clone(),
                volume: after.volume,
                mute: after.mute,
                timestamp,
            });
        }
    }
}

/// Refreshes the group display name when the snapshot carries one.
fn refresh_name(group: &mut GroupState, status: &DeviceStatus) {
    if let Some(name) = status.group_name.as_deref().filter(|n| !n.is_empty()) {
        group.name = name.to_string();
    }
}
