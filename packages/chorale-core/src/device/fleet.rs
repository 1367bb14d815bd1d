//! The managed set of device controllers.
//!
//! One [`Fleet`] owns every controller of this control point, the shared
//! peer directory, and the add/remove lifecycle: registering a device wires
//! its controller into the directory and starts its poll loops; removing it
//! cancels polling and releases the directory entry.

use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{ChoraleError, ChoraleResult};
use crate::events::{EventEmitter, FleetEvent};
use crate::group::directory::{InProcessPeerDirectory, PeerDirectory};
use crate::linkplay::client::DeviceCommands;
use crate::runtime::TokioSpawner;
use crate::state::Config;
use crate::utils::{now_millis, validate_speaker_address};

use super::controller::DeviceController;
use super::state::{DeviceIdentity, DeviceSnapshot};

/// Container for all managed device controllers.
pub struct Fleet {
    controllers: DashMap<String, Arc<DeviceController>>,
    directory: Arc<InProcessPeerDirectory>,
    client: Arc<dyn DeviceCommands>,
    emitter: Arc<dyn EventEmitter>,
    config: Config,
    spawner: TokioSpawner,
}

impl Fleet {
    /// Creates an empty fleet.
    pub fn new(
        client: Arc<dyn DeviceCommands>,
        emitter: Arc<dyn EventEmitter>,
        config: Config,
        spawner: TokioSpawner,
    ) -> Self {
        Self {
            controllers: DashMap::new(),
            directory: Arc::new(InProcessPeerDirectory::new()),
            client,
            emitter,
            config,
            spawner,
        }
    }

    /// The shared peer directory.
    pub fn directory(&self) -> &Arc<InProcessPeerDirectory> {
        &self.directory
    }

    /// Adds a device and starts polling it.
    ///
    /// The address is validated at this boundary; duplicates are rejected.
    pub fn add_device(&self, identity: DeviceIdentity) -> ChoraleResult<Arc<DeviceController>> {
        validate_speaker_address(&identity.address)?;
        if self.controllers.contains_key(&identity.address) {
            return Err(ChoraleError::InvalidRequest(format!(
                "device {} is already managed",
                identity.address
            )));
        }

        let address = identity.address.clone();
        let directory: Arc<dyn PeerDirectory> = self.directory.clone();
        let controller = DeviceController::new(
            identity,
            Arc::clone(&self.client),
            directory,
            Arc::clone(&self.emitter),
            self.config.clone(),
        );

        self.directory.register(controller.clone());
        self.controllers.insert(address.clone(), controller.clone());
        controller.start(&self.spawner);

        log::info!("[Fleet] Added device {}", address);
        self.emitter.emit_fleet(FleetEvent::DeviceAdded {
            address,
            timestamp: now_millis(),
        });

        Ok(controller)
    }

    /// Removes a device: cancels its poll loops and releases its directory
    /// entry. In-flight requests complete and their results are discarded.
    ///
    /// Returns false if the address was not managed.
    pub fn remove_device(&self, address: &str) -> bool {
        let Some((_, controller)) = self.controllers.remove(address) else {
            return false;
        };

        controller.shutdown();
        self.directory.release(address);

        log::info!("[Fleet] Removed device {}", address);
        self.emitter.emit_fleet(FleetEvent::DeviceRemoved {
            address: address.to_string(),
            timestamp: now_millis(),
        });
        true
    }

    /// Finds a managed controller by address.
    pub fn get(&self, address: &str) -> Option<Arc<DeviceController>> {
        self.controllers.get(address).map(|r| Arc::clone(r.value()))
    }

    /// Snapshots every managed device, ordered by address.
    pub fn snapshots(&self) -> Vec<DeviceSnapshot> {
        let mut snapshots: Vec<DeviceSnapshot> = self
            .controllers
            .iter()
            .map(|r| r.value().snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.address.cmp(&b.address));
        snapshots
    }

    /// Number of managed devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.controllers.len()
    }

    /// Whether the fleet is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.controllers.is_empty()
    }

    /// Stops every controller and clears the fleet.
    pub fn shutdown(&self) {
        log::info!("[Fleet] Shutting down {} controller(s)", self.len());
        for entry in self.controllers.iter() {
            entry.value().shutdown();
            self.directory.release(entry.key());
        }
        self.controllers.clear();
    }
}
