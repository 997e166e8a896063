//! Sync status snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A derived, read-only snapshot of the sync core's state.
///
/// Never persisted; assembled on demand from the connectivity monitor and
/// the facade's bookkeeping. `pending_count` counts remote operations
/// spawned but not yet completed in this process - completions, successful
/// or failed, decrement it, and offline skips never increment it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    /// Current host connectivity signal.
    pub is_online: bool,
    /// When a remote operation last completed successfully, if ever.
    #[serde(default, with = "crate::timestamp::option")]
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Remote operations in flight.
    pub pending_count: usize,
}

impl SyncStatus {
    /// Status for a core with no remote activity yet.
    pub fn offline() -> Self {
        Self {
            is_online: false,
            last_synced_at: None,
            pending_count: 0,
        }
    }
}
