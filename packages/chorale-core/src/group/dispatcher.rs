//! Group-scoped command execution.
//!
//! Responsibilities:
//! - Role gating: the triggering UI cannot know the current role at command
//!   time, so a command invoked in a role that forbids it is a logged no-op,
//!   never an error
//! - The ungroup fast-path that immediately marks local members standalone
//! - Leave-via-master: these devices cannot command themselves out of a
//!   group, the master must kick them
//! - Concurrent volume/mute fan-out with a single aggregated failure naming
//!   the members that did not acknowledge; applied changes are not rolled
//!   back (the devices have no multi-device transaction primitive)

use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{ChoraleError, ChoraleResult};
use crate::group::coordinator::GroupCoordinator;
use crate::group::directory::PeerDirectory;
use crate::group::role::GroupRole;
use crate::group::state::{GroupState, MemberLevels};
use crate::linkplay::client::DeviceCommands;

/// A group-scoped command, decoded once at the system boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCommand {
    /// Attach this device to a master.
    Join {
        /// Master address to join.
        master: String,
    },
    /// Disband the group this device masters.
    Ungroup,
    /// Ask this slave's master to kick it out.
    Leave,
    /// Eject one slave from this device's group.
    Kick {
        /// Slave address to remove.
        slave: String,
    },
    /// Set the volume of every group member.
    SetGroupVolume(u8),
    /// Mute or unmute every group member.
    SetGroupMute(bool),
}

/// Result of dispatching a command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum CommandOutcome {
    /// The command was issued (and any optimistic local updates applied).
    Applied,
    /// The command was invalid for the current role and skipped.
    Ignored {
        /// Human-readable diagnostic.
        reason: String,
    },
}

impl CommandOutcome {
    fn ignored(reason: &str) -> Self {
        Self::Ignored {
            reason: reason.to_string(),
        }
    }
}

/// The volume or mute change fanned out by a group level command.
#[derive(Debug, Clone, Copy)]
enum LevelChange {
    Volume(u8),
    Mute(bool),
}

/// Executes group commands for one device.
pub struct CommandDispatcher {
    address: String,
    group: Arc<Mutex<GroupState>>,
    coordinator: Arc<GroupCoordinator>,
    directory: Arc<dyn PeerDirectory>,
    client: Arc<dyn DeviceCommands>,
}

impl CommandDispatcher {
    /// Creates a dispatcher for the device at `address`.
    pub fn new(
        address: String,
        group: Arc<Mutex<GroupState>>,
        coordinator: Arc<GroupCoordinator>,
        directory: Arc<dyn PeerDirectory>,
        client: Arc<dyn DeviceCommands>,
    ) -> Self {
        Self {
            address,
            group,
            coordinator,
            directory,
            client,
        }
    }

    /// Executes one group command.
    pub async fn dispatch(&self, command: GroupCommand) -> ChoraleResult<CommandOutcome> {
        match command {
            GroupCommand::Join { master } => self.join(master).await,
            GroupCommand::Ungroup => self.ungroup().await,
            GroupCommand::Leave => self.leave().await,
            GroupCommand::Kick { slave } => self.kick(slave).await,
            GroupCommand::SetGroupVolume(volume) => {
                self.set_group_levels(LevelChange::Volume(volume)).await
            }
            GroupCommand::SetGroupMute(mute) => {
                self.set_group_levels(LevelChange::Mute(mute)).await
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Group Shape
    // ─────────────────────────────────────────────────────────────────────────

    /// Attaches this device to `master`.
    ///
    /// Deliberately does not mutate group state: the next extended-status
    /// snapshot is the sole confirmation that the device actually joined.
    async fn join(&self, master: String) -> ChoraleResult<CommandOutcome> {
        if self.group.lock().role.is_master() {
            log::warn!(
                "[Dispatcher] {} join ignored: device is a group master",
                self.address
            );
            return Ok(CommandOutcome::ignored("device is a group master"));
        }
        if master == self.address {
            return Err(ChoraleError::InvalidRequest(
                "a device cannot join itself".to_string(),
            ));
        }

        self.client.join_master(&self.address, &master).await?;
        log::info!("[Dispatcher] {} asked to join master {}", self.address, master);
        Ok(CommandOutcome::Applied)
    }

    /// Disbands the group this device masters.
    ///
    /// On HTTP success the master optimistically becomes standalone and every
    /// directory-reachable member is marked standalone too: members would not
    /// otherwise discover disbandment until their own next poll.
    async fn ungroup(&self) -> ChoraleResult<CommandOutcome> {
        let (before, members) = {
            let group = self.group.lock();
            if !group.role.is_master() {
                drop(group);
                log::warn!(
                    "[Dispatcher] {} ungroup ignored: device is not a group master",
                    self.address
                );
                return Ok(CommandOutcome::ignored("device is not a group master"));
            }
            let members: Vec<String> = group.members.iter().cloned().collect();
            (group.clone(), members)
        };

        self.client.ungroup(&self.address).await?;

        self.group.lock().reset_to_standalone();
        self.coordinator.publish_changes(&before);

        for member in members {
            match self.directory.lookup(&member) {
                Some(handle) => handle.force_standalone(),
                None => log::debug!(
                    "[Dispatcher] Member {} not managed locally; it will discover disbandment on its next poll",
                    member
                ),
            }
        }

        log::info!("[Dispatcher] {} disbanded its group", self.address);
        Ok(CommandOutcome::Applied)
    }

    /// Asks this slave's master to kick it out of the group.
    async fn leave(&self) -> ChoraleResult<CommandOutcome> {
        let role = self.group.lock().role.clone();
        let GroupRole::Slave { master } = role else {
            log::warn!(
                "[Dispatcher] {} leave ignored: device is not grouped as a slave",
                self.address
            );
            return Ok(CommandOutcome::ignored("device is not grouped as a slave"));
        };

        match self.directory.lookup(&master) {
            Some(handle) => {
                log::info!(
                    "[Dispatcher] {} asking master {} to kick it",
                    self.address,
                    master
                );
                handle.kick_member(&self.address).await
            }
            None => Err(ChoraleError::MasterUnreachable(master)),
        }
    }

    /// Ejects one slave from this device's group.
    async fn kick(&self, slave: String) -> ChoraleResult<CommandOutcome> {
        let before = {
            let group = self.group.lock();
            if !group.role.is_master() {
                drop(group);
                log::warn!(
                    "[Dispatcher] {} kick of {} ignored: device is not a group master",
                    self.address,
                    slave
                );
                return Ok(CommandOutcome::ignored("device is not a group master"));
            }
            group.clone()
        };

        self.client.kick_slave(&self.address, &slave).await?;

        {
            let mut group = self.group.lock();
            group.members.remove(&slave);
            group.member_levels.remove(&slave);
            if group.members.is_empty() {
                group.reset_to_standalone();
            }
        }
        self.coordinator.recompute_levels();
        self.coordinator.publish_changes(&before);

        log::info!("[Dispatcher] {} kicked {}", self.address, slave);
        Ok(CommandOutcome::Applied)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Group Levels
    // ─────────────────────────────────────────────────────────────────────────

    /// Fans a volume or mute change out to every member concurrently.
    ///
    /// The master receives its own player command; each slave is addressed
    /// through the master's slave-level commands. The logical result is
    /// success only if every member acknowledged; the failed members are
    /// reported in one aggregated error and acknowledged changes stand.
    async fn set_group_levels(&self, change: LevelChange) -> ChoraleResult<CommandOutcome> {
        let (before, mut targets) = {
            let group = self.group.lock();
            if !group.role.is_master() {
                drop(group);
                log::warn!(
                    "[Dispatcher] {} group level change ignored: device is not a group master",
                    self.address
                );
                return Ok(CommandOutcome::ignored("device is not a group master"));
            }
            let targets: Vec<String> = group.members.iter().cloned().collect();
            (group.clone(), targets)
        };
        targets.insert(0, self.address.clone());

        let futures: Vec<_> = targets
            .iter()
            .map(|target| {
                let target = target.clone();
                async move {
                    let result = if target == self.address {
                        match change {
                            LevelChange::Volume(volume) => {
                                self.client.set_volume(&target, volume).await
                            }
                            LevelChange::Mute(mute) => self.client.set_mute(&target, mute).await,
                        }
                    } else {
                        match change {
                            LevelChange::Volume(volume) => {
                                self.client.slave_volume(&self.address, &target, volume).await
                            }
                            LevelChange::Mute(mute) => {
                                self.client.slave_mute(&self.address, &target, mute).await
                            }
                        }
                    };
                    (target, result)
                }
            })
            .collect();

        let results = futures::future::join_all(futures).await;

        let mut failed = Vec::new();
        for (target, result) in &results {
            if let Err(err) = result {
                log::warn!(
                    "[Dispatcher] {} level change failed on {}: {}",
                    self.address,
                    target,
                    err
                );
                failed.push(target.clone());
            }
        }

        // Optimistic local view of the group channel; the next poll cycle
        // remains authoritative and may correct it.
        {
            let mut group = self.group.lock();
            if group.role.is_master() {
                match change {
                    LevelChange::Volume(volume) => group.volume = volume.min(100),
                    LevelChange::Mute(mute) => group.mute = mute,
                }
                for (target, result) in &results {
                    if result.is_ok() && *target != self.address {
                        let entry = group
                            .member_levels
                            .entry(target.clone())
                            .or_insert(MemberLevels {
                                volume: 0,
                                mute: false,
                            });
                        match change {
                            LevelChange::Volume(volume) => entry.volume = volume.min(100),
                            LevelChange::Mute(mute) => entry.mute = mute,
                        }
                    }
                }
            }
        }
        self.coordinator.publish_changes(&before);

        if failed.is_empty() {
            Ok(CommandOutcome::Applied)
        } else {
            Err(ChoraleError::PartialFailure { failed })
        }
    }
}
