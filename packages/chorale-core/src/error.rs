//! Centralized error types for the Chorale core library.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to appropriate HTTP status codes
//! - Implements `IntoResponse` for automatic JSON error responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::linkplay::http::HttpError;

/// Trait for error types that provide machine-readable error codes.
///
/// Implement this trait to provide consistent error codes across different
/// error conversion paths.
pub trait ErrorCode {
    /// Returns a machine-readable error code for API responses.
    fn code(&self) -> &'static str;
}

impl ErrorCode for HttpError {
    fn code(&self) -> &'static str {
        match self {
            Self::Http(_) => "http_request_failed",
            Self::Status(_, _) => "http_error_status",
            Self::Rejected(_) => "command_rejected",
            Self::Parse(_) => "response_parse_error",
        }
    }
}

/// Application-wide error type for the Chorale controller.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "details")]
pub enum ChoraleError {
    /// HTTP command to a speaker failed.
    #[error("Device command failed: {0}")]
    Device(String),

    /// Speaker not found in the managed fleet.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// A slave asked to leave but its master is not managed by this process.
    #[error("Master not locally reachable: {0}")]
    MasterUnreachable(String),

    /// A fan-out group command succeeded on some members and failed on others.
    ///
    /// Already-applied changes are not rolled back; the failed members are
    /// named so the caller can surface them.
    #[error("Group command failed for members: {failed:?}")]
    PartialFailure {
        /// Addresses of the members whose command failed.
        failed: Vec<String>,
    },

    /// Client sent an invalid or malformed request.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid IP address for speaker configuration.
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Controller configuration error (bad intervals, thresholds, etc.).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ChoraleError {
    /// Returns a machine-readable error code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Device(_) => "device_command_failed",
            Self::DeviceNotFound(_) => "device_not_found",
            Self::MasterUnreachable(_) => "master_unreachable",
            Self::PartialFailure { .. } => "partial_group_failure",
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidAddress(_) => "invalid_address",
            Self::Configuration(_) => "configuration_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DeviceNotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidRequest(_) | Self::InvalidAddress(_) => StatusCode::BAD_REQUEST,
            Self::MasterUnreachable(_) => StatusCode::CONFLICT,
            Self::PartialFailure { .. } | Self::Device(_) => StatusCode::BAD_GATEWAY,
            Self::Configuration(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Result Type Aliases
// ─────────────────────────────────────────────────────────────────────────────

// Re-export the transport Result alias from its defining module
pub use crate::linkplay::http::HttpResult;

/// Convenient Result alias for application-wide operations.
pub type ChoraleResult<T> = Result<T, ChoraleError>;

/// JSON response body for error responses.
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    message: String,
    status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    failed_members: Option<Vec<String>>,
}

impl IntoResponse for ChoraleError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let failed_members = match &self {
            Self::PartialFailure { failed } => Some(failed.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.code(),
            message: self.to_string(),
            status: status.as_u16(),
            failed_members,
        };
        (status, Json(body)).into_response()
    }
}

impl From<HttpError> for ChoraleError {
    fn from(err: HttpError) -> Self {
        Self::Device(err.to_string())
    }
}

impl From<crate::utils::AddressValidationError> for ChoraleError {
    fn from(err: crate::utils::AddressValidationError) -> Self {
        Self::InvalidAddress(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_not_found_maps_to_404() {
        let err = ChoraleError::DeviceNotFound("10.0.0.9".into());
        assert_eq!(err.code(), "device_not_found");
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn partial_failure_names_members() {
        let err = ChoraleError::PartialFailure {
            failed: vec!["10.0.0.2".into(), "10.0.0.3".into()],
        };
        assert_eq!(err.code(), "partial_group_failure");
        assert!(err.to_string().contains("10.0.0.2"));
        assert!(err.to_string().contains("10.0.0.3"));
    }

    #[test]
    fn master_unreachable_is_conflict() {
        let err = ChoraleError::MasterUnreachable("10.0.0.1".into());
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
