//! Error types for thirdbrain
//!
//! This module defines the error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for thirdbrain operations
///
/// Covers configuration loading, the completion endpoint (transport,
/// status, and response shape failures), stream decoding, and snapshot
/// storage.
#[derive(Error, Debug)]
pub enum ThirdBrainError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-level failure talking to the completion endpoint
    #[error("Transport error: {0}")]
    Transport(String),

    /// The completion endpoint answered with a non-success status
    #[error("API request failed with status {status}: {body}")]
    HttpStatus {
        /// HTTP status code returned by the endpoint
        status: u16,
        /// Response body text (or a placeholder when unreadable)
        body: String,
    },

    /// A non-streamed response carried no `message` field
    #[error("Invalid API response: No message field received")]
    MissingMessage,

    /// A non-streamed response carried a message without content
    #[error("Invalid API response: No content in message")]
    MissingContent,

    /// Failure while reading a streamed response body
    #[error("Stream error: {0}")]
    Stream(String),

    /// Session snapshot storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Unknown or ambiguous session identifier
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for thirdbrain operations
///
/// Uses `anyhow::Error` so callers get context-rich errors while still being
/// able to downcast to [`ThirdBrainError`] when they need the kind.
pub type Result<T> = anyhow::Result<T>;
