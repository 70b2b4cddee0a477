//! Crate-wide error type and result alias

use thiserror::Error;

/// Errors that cut across gateway subsystems.
///
/// Subsystems with their own failure taxonomy (bridge, content, minting)
/// define module-local enums and convert into this type only at seams that
/// need a single error channel (startup, storage).
#[derive(Debug, Error)]
pub enum GatewayError {
    /// MongoDB connection or query failure
    #[error("Database error: {0}")]
    Database(String),

    /// Invalid or incomplete configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Bearer token missing, malformed, or failed validation
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// I/O error (listener bind, subprocess plumbing)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encode/decode failure outside the bridge boundary
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
