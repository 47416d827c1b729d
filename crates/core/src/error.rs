//! Error types for mediapilot-core

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for mediapilot-core
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mediapilot-core
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file not found
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidConfig(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The asset to upload is unusable
    #[error("Invalid file: {0}")]
    InvalidFile(String),

    /// Upload source recognised but not supported
    #[error("Unsupported upload source: {0}")]
    UnsupportedSource(String),

    /// Authentication error
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Permission denied
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Not found error
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limit reached
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Any other non-success answer from the media API
    #[error("Media API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Network error
    #[error("Network error: {0}")]
    Network(String),

    /// HTTP client error
    #[error("HTTP client error: {0}")]
    HttpClient(String),

    /// Timeout
    #[error("Operation timed out")]
    Timeout,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    /// Deserialization error
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] toml::de::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::Timeout
        } else if err.is_connect() {
            Error::Network(err.to_string())
        } else if err.is_request() || err.is_builder() {
            Error::HttpClient(err.to_string())
        } else if err.is_decode() {
            Error::Api {
                status: err.status().map(|s| s.as_u16()).unwrap_or(200),
                message: format!("unexpected response body: {}", err),
            }
        } else {
            Error::Network(err.to_string())
        }
    }
}
