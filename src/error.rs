//! Error types for footdata-dl
//!
//! This module provides error handling for the library, including:
//! - Transport-level errors (network failure, bad status after the one retry)
//! - Malformed service responses (fatal — continuing would corrupt the dataset)
//! - Configuration and persistence errors with context
//!
//! A request-level decline by the data service is deliberately *not* an error:
//! the transport surfaces it as [`crate::transport::ServiceResponse::Declined`]
//! and the orchestrator converts it into a resume marker.

use thiserror::Error;

/// Result type alias for footdata-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for footdata-dl
///
/// This is the primary error type used throughout the library. Each variant includes
/// contextual information to help diagnose issues.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.batch_size")
        key: Option<String>,
    },

    /// Season string does not name two consecutive calendar years
    #[error("invalid season {value:?}: {reason}")]
    Season {
        /// The season string that failed to parse
        value: String,
        /// The reason the season string is invalid
        reason: String,
    },

    /// The service declined a request outside a batched run
    ///
    /// Inside a run, declines never become errors — the orchestrator turns
    /// them into a resume marker. This variant exists for the operations
    /// with no batch boundary to resume from (player-URL collection).
    #[error("data service declined request: {reason}")]
    Declined {
        /// The service's stated reason
        reason: String,
    },

    /// Network error (connection, timeout, DNS)
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Bad HTTP status from the data service, surviving the one built-in retry
    #[error("bad response from data service: {status} / {body}")]
    Status {
        /// The HTTP status code of the final response
        status: u16,
        /// The response body, for diagnostics
        body: String,
    },

    /// Response failed to parse into the expected envelope shape
    #[error("malformed response from data service: {message}")]
    MalformedResponse {
        /// What was wrong with the response shape
        message: String,
    },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key.
    pub(crate) fn config(message: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}
