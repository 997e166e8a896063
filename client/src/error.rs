//! Unified error handling for the sync client.
//!
//! Expected failure modes (offline, remote failure, parse failure) never
//! cross the facade boundary as errors: the facade catches, logs, and
//! degrades. These types exist for the layers underneath it.

use thiserror::Error;

/// Errors from the local half of the sync client.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Local store read/write failure (quota, permissions, corruption).
    /// Caught at the facade; the caller's in-memory collection remains the
    /// fallback source of truth for that operation.
    #[error("local persistence error: {0}")]
    LocalPersistence(#[from] std::io::Error),

    /// Serialization or parse failure from the engine.
    #[error(transparent)]
    Engine(#[from] satchel_engine::Error),
}

/// Errors from the remote database collaborator.
///
/// Always caught inside the spawned remote task and logged as a warning;
/// local state is the accepted outcome and nothing is retried.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("remote unavailable: {0}")]
    Unavailable(String),

    #[error("remote rejected operation: {0}")]
    Rejected(String),
}

/// Result type alias for client operations.
pub type Result<T> = std::result::Result<T, SyncError>;
