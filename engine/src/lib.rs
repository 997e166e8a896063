//! # Satchel Engine
//!
//! Local-first sync primitives for the Satchel study assistant.
//!
//! This crate provides the pure logic behind the hybrid sync service:
//! record collections, the readiness lifecycle, delete reconciliation,
//! and timestamp revival. The local copy is authoritative; the remote
//! database is a best-effort mirror.
//!
//! ## Design Principles
//!
//! - **No IO**: the engine has no knowledge of files, network, or platform
//! - **Local-first**: collection membership is decided by the local store
//! - **Optimistic**: mutations apply immediately, remote confirmation is
//!   advisory
//!
//! ## Core Concepts
//!
//! ### Records
//!
//! Domain records are opaque to the engine except for two reserved fields,
//! enforced by the [`SyncRecord`] trait:
//! - `id` - locally generated, unique within a collection, immutable
//! - `remote_id` - assigned once the remote database first accepts the
//!   record; absent until then, never cleared by the engine
//!
//! ### Collections
//!
//! A [`Collection`] is an ordered sequence of records stored under one key.
//! The engine preserves whatever order the caller gives it.
//!
//! ### Readiness
//!
//! The [`ReadinessGate`] is a one-shot lifecycle flag with a FIFO waiter
//! list. Consumers must not read persisted collections until it fires;
//! reads before readiness yield an empty collection, never an error.
//!
//! ### Delete Reconciliation
//!
//! Deletes are optimistic: the record leaves the local collection
//! immediately, and a best-effort remote delete is issued only when the
//! host is online and the record carried a `remote_id`. See [`reconcile`]
//! for the phase machine and the pure remote-action decision.
//!
//! ## Quick Start
//!
//! ```rust
//! use satchel_engine::{Collection, RecordId, RemoteId, SyncRecord};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
//! #[serde(rename_all = "camelCase")]
//! struct Chat {
//!     id: RecordId,
//!     #[serde(skip_serializing_if = "Option::is_none")]
//!     remote_id: Option<RemoteId>,
//!     title: String,
//! }
//!
//! impl SyncRecord for Chat {
//!     fn id(&self) -> &RecordId {
//!         &self.id
//!     }
//!     fn remote_id(&self) -> Option<&RemoteId> {
//!         self.remote_id.as_ref()
//!     }
//!     fn set_remote_id(&mut self, remote_id: RemoteId) {
//!         self.remote_id = Some(remote_id);
//!     }
//! }
//!
//! let mut chats = Collection::new();
//! chats.push(Chat {
//!     id: "chat_1".into(),
//!     remote_id: None,
//!     title: "Biology revision".into(),
//! });
//!
//! let json = chats.to_json().unwrap();
//! let restored: Collection<Chat> = Collection::from_json(&json).unwrap();
//! assert_eq!(chats, restored);
//! ```

pub mod collection;
pub mod error;
pub mod ready;
pub mod reconcile;
pub mod record;
pub mod status;
pub mod timestamp;

// Re-export main types at crate root
pub use collection::Collection;
pub use error::Error;
pub use ready::ReadinessGate;
pub use reconcile::{
    remote_delete_action, DeleteOutcome, DeletePhase, RemoteAction, RemoteDisposition,
};
pub use record::SyncRecord;
pub use status::SyncStatus;

/// Type aliases for clarity
pub type RecordId = String;
pub type RemoteId = String;
pub type CollectionKey = String;
