//! Per-device records, polling, and the fleet container.

pub mod controller;
pub mod fleet;
pub(crate) mod poller;
pub mod state;

pub use controller::DeviceController;
pub use fleet::Fleet;
pub use state::{Connectivity, DeviceIdentity, DeviceSnapshot, DeviceState, TrackInfo};
