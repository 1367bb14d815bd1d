//! Server configuration.
//!
//! Supports loading from YAML files with environment variable overrides.
//! Discovery is out of scope for this controller, so the device list is
//! static configuration: one entry per speaker to manage.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// One configured speaker.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceEntry {
    /// Speaker IPv4 address.
    pub ip: String,

    /// Optional display name used until the device reports its own.
    #[serde(default)]
    pub name: Option<String>,

    /// Optional discovered UDN.
    #[serde(default)]
    pub udn: Option<String>,
}

/// Server configuration loaded from YAML with environment overrides.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Port to bind the HTTP server to.
    /// Override: `CHORALE_BIND_PORT`
    pub bind_port: u16,

    /// Speakers to manage.
    pub devices: Vec<DeviceEntry>,

    /// Interval in seconds between player-status polls (0 disables).
    /// Override: `CHORALE_PLAYER_STATUS_INTERVAL`
    pub player_status_interval: u64,

    /// Interval in seconds between extended-status polls (0 disables).
    /// Override: `CHORALE_DEVICE_STATUS_INTERVAL`
    pub device_status_interval: u64,

    /// Per-request HTTP timeout in seconds.
    pub request_timeout: u64,

    /// Consecutive failures before a device is shown offline.
    pub offline_threshold: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let core = chorale_core::Config::default();
        Self {
            bind_port: 49700,
            devices: Vec::new(),
            player_status_interval: core.player_status_interval_secs,
            device_status_interval: core.device_status_interval_secs,
            request_timeout: core.request_timeout_secs,
            offline_threshold: core.offline_threshold,
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a YAML file, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = if let Some(path) = path {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Applies environment variable overrides to the configuration.
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CHORALE_BIND_PORT") {
            if let Ok(port) = val.parse() {
                self.bind_port = port;
            }
        }

        if let Ok(val) = std::env::var("CHORALE_PLAYER_STATUS_INTERVAL") {
            if let Ok(interval) = val.parse() {
                self.player_status_interval = interval;
            }
        }

        if let Ok(val) = std::env::var("CHORALE_DEVICE_STATUS_INTERVAL") {
            if let Ok(interval) = val.parse() {
                self.device_status_interval = interval;
            }
        }
    }

    /// Converts to chorale-core's Config type.
    pub fn to_core_config(&self) -> chorale_core::Config {
        chorale_core::Config {
            player_status_interval_secs: self.player_status_interval,
            device_status_interval_secs: self.device_status_interval,
            request_timeout_secs: self.request_timeout,
            offline_threshold: self.offline_threshold,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_has_no_devices() {
        let config = ServerConfig::default();
        assert!(config.devices.is_empty());
        assert_eq!(config.bind_port, 49700);
        assert!(config.to_core_config().validate().is_ok());
    }

    #[test]
    fn loads_devices_from_yaml() {
        let yaml = "bind_port: 8090\n\
                    player_status_interval: 2\n\
                    devices:\n  \
                    - ip: 192.168.1.50\n    \
                    name: Kitchen\n  \
                    - ip: 192.168.1.51\n    \
                    udn: uuid:FF98F09C\n";
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let config = ServerConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.bind_port, 8090);
        assert_eq!(config.player_status_interval, 2);
        assert_eq!(config.devices.len(), 2);
        assert_eq!(config.devices[0].name.as_deref(), Some("Kitchen"));
        assert_eq!(config.devices[1].udn.as_deref(), Some("uuid:FF98F09C"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = ServerConfig::load(Some(Path::new("/nonexistent/chorale.yaml")));
        assert!(result.is_err());
    }
}
