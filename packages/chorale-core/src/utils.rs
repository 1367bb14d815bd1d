//! General utilities shared across the application.

use std::net::Ipv4Addr;
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Time Utilities
// ─────────────────────────────────────────────────────────────────────────────

/// Returns the current Unix timestamp in milliseconds.
///
/// Returns 0 if the system clock is before the Unix epoch (shouldn't happen in practice).
#[must_use]
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

// ─────────────────────────────────────────────────────────────────────────────
// Speaker Address Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Errors from validating a speaker address supplied by configuration or API.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressValidationError {
    /// The address is empty or not a parseable IPv4 address.
    #[error("not a valid IPv4 address: {0:?}")]
    NotIpv4(String),

    /// Loopback addresses cannot be speakers.
    #[error("loopback address is not a valid speaker address")]
    Loopback,

    /// Unspecified (0.0.0.0) address.
    #[error("unspecified address is not a valid speaker address")]
    Unspecified,

    /// Broadcast address.
    #[error("broadcast address is not a valid speaker address")]
    Broadcast,
}

/// Validates a speaker address for use as a coordination key.
///
/// Devices are addressed by plain IPv4 on the local network; anything that
/// cannot receive a unicast HTTP request is rejected at the boundary rather
/// than failing later inside a poll cycle.
pub fn validate_speaker_address(address: &str) -> Result<(), AddressValidationError> {
    let ip: Ipv4Addr = address
        .parse()
        .map_err(|_| AddressValidationError::NotIpv4(address.to_string()))?;

    if ip.is_loopback() {
        return Err(AddressValidationError::Loopback);
    }
    if ip.is_unspecified() {
        return Err(AddressValidationError::Unspecified);
    }
    if ip.is_broadcast() {
        return Err(AddressValidationError::Broadcast);
    }

    Ok(())
}
