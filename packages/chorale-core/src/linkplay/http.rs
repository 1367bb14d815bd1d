//! Low-level HTTP transport for the LinkPlay device API.
//!
//! Commands are plain GET requests against `httpapi.asp`; queries answer
//! with JSON, mutating commands with a bare `OK`. Higher-level typed calls
//! live in `client.rs`.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use thiserror::Error;

use super::commands::ApiCommand;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur talking to a LinkPlay speaker.
#[derive(Debug, Error)]
pub enum HttpError {
    /// HTTP request to the speaker failed (connect, timeout, transfer).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Speaker answered with a non-success HTTP status.
    #[error("HTTP error {0}: {1}")]
    Status(u16, String),

    /// Speaker answered a mutating command with something other than `OK`.
    #[error("Command rejected by device: {0:?}")]
    Rejected(String),

    /// Failed to parse a JSON status body.
    #[error("Failed to parse device response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Convenient Result alias for device transport operations.
pub type HttpResult<T> = Result<T, HttpError>;

impl HttpError {
    /// Returns true if this error is a transport failure that should count
    /// toward the device's consecutive-failure/offline threshold.
    ///
    /// Parse failures and command rejections mean the device is reachable;
    /// they are logged and dropped without touching connectivity state.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status(_, _))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Request Primitives
// ─────────────────────────────────────────────────────────────────────────────

/// Sends a command to a LinkPlay speaker and returns the raw response body.
///
/// This is the core transport function for all device communication. Each
/// request carries its own timeout; a timeout surfaces as `HttpError::Http`
/// and is treated like any other transport failure by callers.
pub async fn send_command(
    client: &Client,
    ip: &str,
    command: &ApiCommand,
    timeout: Duration,
) -> HttpResult<String> {
    let url = format!("http://{}/httpapi.asp?command={}", ip, command);

    log::debug!("[LinkPlay] {} -> {}", command, url);

    let start = std::time::Instant::now();
    let res = client.get(&url).timeout(timeout).send().await;

    log::debug!(
        "[LinkPlay] {} to {} completed in {:?}: {:?}",
        command,
        ip,
        start.elapsed(),
        res.as_ref().map(|r| r.status())
    );

    let res = res?;
    let status = res.status();
    let body = res.text().await?;

    if !status.is_success() {
        return Err(HttpError::Status(status.as_u16(), body));
    }

    Ok(body)
}

/// Sends a query command and deserializes its JSON response body.
pub async fn send_query<T: DeserializeOwned>(
    client: &Client,
    ip: &str,
    command: &ApiCommand,
    timeout: Duration,
) -> HttpResult<T> {
    let body = send_command(client, ip, command, timeout).await?;
    Ok(serde_json::from_str(&body)?)
}

/// Sends a mutating command and checks the `OK` acknowledgment.
///
/// Devices acknowledge accepted commands with the literal body `OK`; any
/// other body (commonly `Failed` or `unknown command`) is a rejection.
pub async fn send_ack_command(
    client: &Client,
    ip: &str,
    command: &ApiCommand,
    timeout: Duration,
) -> HttpResult<()> {
    let body = send_command(client, ip, command, timeout).await?;
    if body.trim().eq_ignore_ascii_case("ok") {
        Ok(())
    } else {
        Err(HttpError::Rejected(body.trim().to_string()))
    }
}
