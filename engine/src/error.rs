//! Error types for the Satchel engine.

use thiserror::Error;

/// All possible errors from the Satchel engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("failed to parse stored collection: {0}")]
    Parse(String),

    #[error("failed to serialize collection: {0}")]
    Serialize(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, Error>;
