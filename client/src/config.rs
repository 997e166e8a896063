//! Configuration management for the sync client.

use std::env;
use std::path::PathBuf;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory backing the persistent local store
    pub storage_dir: PathBuf,
    /// Identifier for this execution context (tab/window/process)
    pub context_id: String,
    /// Collection keys the facade loads at startup
    pub collections: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let storage_dir = env::var("SATCHEL_STORAGE_DIR")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::MissingStorageDir)?;

        let context_id = env::var("SATCHEL_CONTEXT_ID")
            .unwrap_or_else(|_| uuid::Uuid::new_v4().to_string());

        let collections = env::var("SATCHEL_COLLECTIONS")
            .unwrap_or_else(|_| "chats,quizzes".to_string())
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();

        if collections.is_empty() {
            return Err(ConfigError::EmptyCollections);
        }

        Ok(Self {
            storage_dir,
            context_id,
            collections,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("SATCHEL_STORAGE_DIR environment variable is required")]
    MissingStorageDir,

    #[error("SATCHEL_COLLECTIONS must name at least one collection")]
    EmptyCollections,
}
