//! # Satchel Client
//!
//! The hybrid sync service for the Satchel study assistant: a local-first
//! facade mediating between a persistent key-value store and an optional
//! remote database.
//!
//! Feature code consumes four calls - [`HybridSync::is_ready`],
//! [`HybridSync::on_ready`], [`HybridSync::save_data`], and
//! [`HybridSync::get_sync_status`] - plus the delete-reconciliation routine
//! [`HybridSync::delete_record`]. Writes persist locally first and are
//! mirrored remotely on a best-effort basis; users are never blocked on, or
//! shown errors for, remote sync failures.
//!
//! ## Composition
//!
//! The facade is wired at the application's composition root:
//!
//! ```rust,no_run
//! use satchel_client::{HybridSync, MemoryBackend};
//!
//! let sync = HybridSync::builder(MemoryBackend::new())
//!     .collection("chats")
//!     .collection("quizzes")
//!     .build();
//!
//! sync.on_ready(|| tracing::info!("collections available"));
//! sync.load();
//! ```

pub mod config;
pub mod connectivity;
pub mod error;
pub mod facade;
pub mod notify;
pub mod remote;
pub mod store;

// Re-export main types at crate root
pub use config::{Config, ConfigError};
pub use connectivity::{ConnectivityMonitor, ConnectivityStatus};
pub use error::{RemoteError, SyncError};
pub use facade::{HybridSync, HybridSyncBuilder};
pub use notify::{ChangeNotifier, StorageEvent, Subscription};
pub use remote::{NoRemote, RemoteDatabase, RemoteSyncAdapter, TaskSet};
pub use store::{FileBackend, KeyValueBackend, LocalStore, MemoryBackend};

// Engine types most call sites need alongside the facade
pub use satchel_engine::{
    Collection, DeleteOutcome, ReadinessGate, RemoteDisposition, SyncRecord, SyncStatus,
};
