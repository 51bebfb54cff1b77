//! Unified error handling for sensorlog
//!
//! This crate provides a single error type used across all sensorlog components.
//! It uses thiserror for ergonomic error definitions with proper Display and Error trait impls.

use std::io;
use std::path::PathBuf;

/// Result type alias using SensorLogError
pub type Result<T> = std::result::Result<T, SensorLogError>;

/// Unified error type for all sensorlog operations
#[derive(thiserror::Error, Debug)]
pub enum SensorLogError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    // ============================================================================
    // Column Log Errors
    // ============================================================================
    #[error("Unusable log header in {path}: {reason}")]
    HeaderParse {
        path: PathBuf,
        reason: String,
    },

    #[error("Invalid sensor identifier: {0}")]
    InvalidIdentifier(String),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    // ============================================================================
    // Remote Transport Errors
    // ============================================================================
    #[error("Invalid endpoint URL {url}: {reason}")]
    InvalidUrl {
        url: String,
        reason: String,
    },

    #[error("HTTP transport failed: {0}")]
    HttpTransport(String),

    #[error("Endpoint answered HTTP {status}: {body}")]
    HttpStatus {
        status: u16,
        body: String,
    },

    #[error("Operation timed out: {0}")]
    Timeout(String),

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl SensorLogError {
    /// Create a header parse error
    pub fn header(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::HeaderParse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid URL error
    pub fn invalid_url(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidUrl {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Create a transport error from a string
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::HttpTransport(msg.into())
    }

    /// True when the endpoint refused the request itself (HTTP 4xx)
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::HttpStatus { status, .. } if (400..500).contains(status))
    }
}

// Allow converting from String to SensorLogError
impl From<String> for SensorLogError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to SensorLogError
impl From<&str> for SensorLogError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_only_for_client_errors() {
        let bad_request = SensorLogError::HttpStatus { status: 400, body: String::new() };
        let unavailable = SensorLogError::HttpStatus { status: 503, body: String::new() };

        assert!(bad_request.is_rejection());
        assert!(!unavailable.is_rejection());
        assert!(!SensorLogError::transport("connection refused").is_rejection());
    }

    #[test]
    fn test_display_includes_path() {
        let err = SensorLogError::header("/tmp/x.csv", "empty first line");
        assert_eq!(err.to_string(), "Unusable log header in /tmp/x.csv: empty first line");
    }
}
