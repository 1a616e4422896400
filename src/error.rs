//! Error types for feed-capture.
//!
//! The extraction pipeline itself never fails: heuristic misses produce empty
//! fields and detached nodes are pruned. Errors only surface from configuration
//! parsing, the messaging channel, and the reference store's file backing.

/// Error type for crate operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration was malformed or out of range.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Failure delivering a record across the message boundary.
///
/// Every variant is non-fatal: the record is dropped for this pass and the
/// post stays eligible for a later one.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DispatchError {
    /// The extension/runtime was reloaded and the channel is gone.
    #[error("extension context invalidated")]
    ContextInvalidated,

    /// The runtime is not reachable yet (or any more).
    #[error("runtime unavailable")]
    Unavailable,

    /// The collaborator answered with `success: false`.
    #[error("store rejected record: {0}")]
    Rejected(String),

    /// Any other transport-level failure.
    #[error("channel error: {0}")]
    Channel(String),
}

impl DispatchError {
    /// Classify a raw channel error message the way runtimes report it.
    #[must_use]
    pub fn from_channel_message(message: &str) -> Self {
        if message.contains("context invalidated") {
            Self::ContextInvalidated
        } else {
            Self::Channel(message.to_string())
        }
    }
}

/// Failure inside the reference persistence store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file did not hold a valid record array.
    #[error("storage contents invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
