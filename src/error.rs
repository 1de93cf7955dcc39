//! Error types for an availability check run
//!
//! Errors are classified by where they surface:
//! - Configuration: missing credentials or locations, detected before any request
//! - Per-location: transport, status and payload failures, degraded to a label-only block
//! - Output: writing the summary or flag files, the only errors that fail the run

use thiserror::Error;

/// Error types for an availability check run
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("Missing BEARER_TOKEN or LOCATION_IDS")]
    MissingConfiguration,

    #[error("Invalid URL for {key}: {value}")]
    InvalidUrl { key: &'static str, value: String },

    #[error("Invalid value for header {0}")]
    InvalidHeader(&'static str),

    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
}

impl CheckError {
    /// Returns true if the run cannot start with the given settings
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CheckError::MissingConfiguration
                | CheckError::InvalidUrl { .. }
                | CheckError::InvalidHeader(_)
        )
    }

    /// Get a short hint for the log line that reports this error
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            CheckError::MissingConfiguration => "Set BEARER_TOKEN and LOCATION_IDS.",
            CheckError::InvalidUrl { .. } => "Use an absolute http(s) URL.",
            CheckError::InvalidHeader(_) => "Remove control characters from the token and origin.",
            CheckError::Http(_) => "Check network connectivity to the upstream API.",
            CheckError::Status { status, .. } if *status == 401 || *status == 403 => {
                "The bearer token was rejected; refresh BEARER_TOKEN."
            }
            CheckError::Status { .. } => "The upstream API refused the request.",
            CheckError::Json(_) => "The upstream response was not the expected JSON.",
            CheckError::Io(_) => "Check permissions on the output directory.",
        }
    }
}
