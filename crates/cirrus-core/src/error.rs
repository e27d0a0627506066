//! Error types for cirrus
//!
//! This module defines all error types used throughout the crate.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cirrus operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for cirrus
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed zone file, with the offending file and line
    #[error("{}:{line}: {message}", .path.display())]
    ZoneParse {
        /// Zone file the error was found in
        path: PathBuf,
        /// 1-based line number
        line: usize,
        /// What went wrong
        message: String,
    },

    /// I/O errors (reading config or zone files)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML deserialization errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Hosted zone or record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a zone parse error pointing at `path:line`
    pub fn zone_parse(path: impl Into<PathBuf>, line: usize, msg: impl Into<String>) -> Self {
        Self::ZoneParse {
            path: path.into(),
            line,
            message: msg.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// True for errors caused by local input (config, zone files, arguments)
    /// rather than by the provider.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::ZoneParse { .. } | Self::Yaml(_) | Self::InvalidInput(_)
        )
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_parse_error_names_file_and_line() {
        let err = Error::zone_parse("zones/example.com", 12, "unknown record type 'AX'");
        assert_eq!(
            err.to_string(),
            "zones/example.com:12: unknown record type 'AX'"
        );
        assert!(err.is_input_error());
    }

    #[test]
    fn provider_errors_are_not_input_errors() {
        assert!(!Error::provider("route53", "boom").is_input_error());
        assert!(!Error::rate_limited("slow down").is_input_error());
    }
}
