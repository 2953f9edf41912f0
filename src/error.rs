//! Roshan error types

use std::time::Duration;

/// Roshan error types
#[derive(Debug, thiserror::Error)]
pub enum RoshanError {
    // Remote boundary errors
    #[error("remote service error ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request cancelled: {0}")]
    Cancelled(String),

    /// Entity lookup miss. Distinct from an empty search result, which is
    /// a valid (non-error) outcome.
    #[error("not found: {0}")]
    NotFound(String),

    // Cache errors
    /// A persisted entry exists but cannot be deserialized. Surfaced so the
    /// caller can decide to clear and refetch; never treated as a miss.
    #[error("corrupt cache entry for '{key}': {detail}")]
    CacheCorruption { key: String, detail: String },

    // Rate limiter errors
    #[error("rate limiter timed out after {waited:?}")]
    RateLimitTimeout { waited: Duration },

    // Data errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected response shape: {0}")]
    Data(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RoshanError {
    /// Process exit code for the command surface.
    ///
    /// Each error kind in the public taxonomy maps to a distinct non-zero
    /// code; everything else (data, I/O, configuration) is a generic 1.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Remote { .. } | Self::Transport(_) | Self::Cancelled(_) => 2,
            Self::NotFound(_) => 3,
            Self::CacheCorruption { .. } => 4,
            Self::RateLimitTimeout { .. } => 5,
            _ => 1,
        }
    }

    /// Whether this error came from the remote boundary (as opposed to
    /// local cache, limiter, or configuration state).
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Remote { .. } | Self::Transport(_) | Self::Cancelled(_) | Self::NotFound(_)
        )
    }
}

/// Result type alias for Roshan operations
pub type Result<T> = std::result::Result<T, RoshanError>;
