//! Error types for termdeck.

use thiserror::Error;

use crate::SessionId;

/// Main error type for termdeck operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Session creation attempted while the registry is full
    #[error("Session limit reached (max: {0})")]
    CapacityExceeded(usize),

    /// Operation referenced a session that is no longer registered
    #[error("Session not found: {0}")]
    SessionNotFound(SessionId),

    /// The process host could not create a session
    #[error("Failed to spawn session: {0}")]
    SpawnFailure(String),

    /// PTY-related errors on an already running session
    #[error("PTY error: {0}")]
    Pty(String),

    /// Invalid key chord string
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the controller can carry on after this error.
    ///
    /// Capacity, stale-session and spawn errors are reported to the user (or
    /// ignored) and leave the controller state untouched.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::CapacityExceeded(_) | Error::SessionNotFound(_) | Error::SpawnFailure(_)
        )
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
