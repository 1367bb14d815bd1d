//! LinkPlay device protocol: command grammar, status models, and the HTTP
//! client seam used by the coordination layer.

pub mod client;
pub mod commands;
pub mod http;
pub mod status;

#[cfg(test)]
pub mod test_fixtures;

pub use client::{DeviceCommands, LinkPlayClient};
pub use commands::ApiCommand;
pub use http::{HttpError, HttpResult};
pub use status::{DeviceStatus, PlaybackStatus, PlayerStatus, SlaveEntry, SlaveList};
