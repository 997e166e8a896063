//! Connectivity monitor - tracks the host's online/offline signal.
//!
//! The monitor is a point-in-time mirror of whatever the host environment
//! reports; there is no polling or probing of its own. Transitions do not
//! trigger retries of previously failed remote operations - the sync core
//! is best-effort, not queued.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Point-in-time connectivity snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityStatus {
    pub is_online: bool,
}

/// Shared handle on the host connectivity signal.
///
/// Cloning is cheap; all clones observe the same flag. The embedding
/// application feeds the host's online/offline events into
/// [`ConnectivityMonitor::set_online`].
#[derive(Debug, Clone)]
pub struct ConnectivityMonitor {
    online: Arc<AtomicBool>,
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        // Hosts report online until told otherwise.
        Self::new(true)
    }
}

impl ConnectivityMonitor {
    /// Create a monitor with the given initial signal.
    pub fn new(online: bool) -> Self {
        Self {
            online: Arc::new(AtomicBool::new(online)),
        }
    }

    /// Current signal as a plain bool.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Acquire)
    }

    /// Current signal as a snapshot.
    pub fn status(&self) -> ConnectivityStatus {
        ConnectivityStatus {
            is_online: self.is_online(),
        }
    }

    /// Record an online/offline transition reported by the host.
    pub fn set_online(&self, online: bool) {
        let previous = self.online.swap(online, Ordering::AcqRel);
        if previous != online {
            tracing::info!(online, "connectivity changed");
        }
    }
}
