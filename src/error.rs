//! Error types for voxkb

use thiserror::Error;

/// Result type alias for voxkb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while answering a spoken query
///
/// None of these are fatal to a session: every failure path leads back to an
/// idle, re-armable state.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Knowledge source unreachable or malformed
    #[error("knowledge load error: {0}")]
    Load(String),

    /// No bearer token available for the completion endpoint
    #[error("missing credential")]
    MissingCredential,

    /// Network failure, timeout, or non-2xx response from the completion endpoint
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Completion endpoint answered with an unexpected body shape
    #[error("malformed response: {0}")]
    MalformedResponse(String),

    /// Capture engine error
    #[error("capture error: {0}")]
    Capture(String),

    /// Speech engine error
    #[error("speech error: {0}")]
    Speech(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
