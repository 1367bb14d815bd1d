//! Shared test fixtures for LinkPlay status payloads.
//!
//! These constants are used by multiple test modules to avoid duplication.
//! Metadata fields are hex-encoded UTF-8, exactly as devices send them.

/// `getPlayerStatus` body: playing at volume 42, shuffle+repeat loop mode,
/// track "Blue in Green" / "Miles Davis" / "Kind of Blue".
pub const PLAYER_STATUS_PLAYING: &str = r#"{
  "status": "play",
  "vol": "42",
  "mute": "0",
  "loop": "2",
  "Title": "426C756520696E20477265656E",
  "Artist": "4D696C6573204461766973",
  "Album": "4B696E64206F6620426C7565"
}"#;

/// `getPlayerStatus` body: stopped, muted, no track loaded.
pub const PLAYER_STATUS_STOPPED: &str = r#"{
  "status": "stop",
  "vol": "15",
  "mute": "1",
  "loop": "-1",
  "Title": "",
  "Artist": "",
  "Album": ""
}"#;

/// `getStatusEx` body for a slave grouped under 10.0.0.1.
/// Group name "Downstairs" arrives hex-encoded.
pub const STATUS_EX_GROUPED: &str = r#"{
  "group": "1",
  "master_ip": "10.0.0.1",
  "uuid": "FF31F09E1A5B2C8D",
  "DeviceName": "4B69746368656E",
  "GroupName": "446F776E737461697273"
}"#;

/// `getStatusEx` body for an ungrouped device.
pub const STATUS_EX_STANDALONE: &str = r#"{
  "group": "0",
  "master_ip": "",
  "uuid": "FF31F09E1A5B2C8D",
  "DeviceName": "4B69746368656E"
}"#;

/// `multiroom:getSlaveList` body with two slaves at volumes 20 and 80.
pub const SLAVE_LIST_TWO: &str = r#"{
  "slaves": 2,
  "slave_list": [
    { "ip": "10.0.0.2", "name": "4B69746368656E", "volume": "20", "mute": "0" },
    { "ip": "10.0.0.3", "name": "44656E", "volume": "80", "mute": "1" }
  ]
}"#;

/// `multiroom:getSlaveList` body for a device with no slaves; the firmware
/// omits the roster array entirely.
pub const SLAVE_LIST_EMPTY: &str = r#"{ "slaves": 0 }"#;
