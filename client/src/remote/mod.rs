//! Remote sync adapter - best-effort mirroring to a remote database.
//!
//! The adapter bridges local writes to a remote database collaborator on a
//! fire-and-forget basis. It is only consulted while the host is online; a
//! failed remote operation is a logged warning, not a queued task. No
//! retry, backoff, or durable outbox is maintained, and nothing here ever
//! rolls back a local write.

mod tasks;

pub use tasks::TaskSet;

use crate::error::RemoteError;
use chrono::{DateTime, Utc};
use satchel_engine::RemoteId;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// The remote database collaborator consumed by the sync core.
///
/// Implemented outside this crate by the application's data-access layer;
/// the core only needs create/update and delete-by-remote-id.
pub trait RemoteDatabase: Send + Sync + 'static {
    /// Create or update a record remotely, returning its remote identifier.
    fn upsert(
        &self,
        collection: &str,
        payload: serde_json::Value,
    ) -> impl Future<Output = Result<RemoteId, RemoteError>> + Send;

    /// Delete the record with the given remote identifier. Returns whether
    /// the remote knew the record.
    fn delete_by_id(
        &self,
        remote_id: &RemoteId,
    ) -> impl Future<Output = Result<bool, RemoteError>> + Send;
}

/// Placeholder collaborator for facades configured without a remote.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemote;

impl RemoteDatabase for NoRemote {
    async fn upsert(
        &self,
        _collection: &str,
        _payload: serde_json::Value,
    ) -> Result<RemoteId, RemoteError> {
        Err(RemoteError::Unavailable("no remote configured".into()))
    }

    async fn delete_by_id(&self, _remote_id: &RemoteId) -> Result<bool, RemoteError> {
        Err(RemoteError::Unavailable("no remote configured".into()))
    }
}

/// Fire-and-forget bridge between local writes and the remote database.
///
/// Keeps the sync bookkeeping (`pending_count`, `last_synced_at`) that
/// [`crate::facade::HybridSync::get_sync_status`] reports.
#[derive(Debug)]
pub struct RemoteSyncAdapter<D> {
    db: Arc<D>,
    tasks: TaskSet,
    pending: Arc<AtomicUsize>,
    last_synced_at: Arc<Mutex<Option<DateTime<Utc>>>>,
}

impl<D: RemoteDatabase> RemoteSyncAdapter<D> {
    /// Wrap a remote database collaborator.
    pub fn new(db: Arc<D>) -> Self {
        Self {
            db,
            tasks: TaskSet::new(),
            pending: Arc::new(AtomicUsize::new(0)),
            last_synced_at: Arc::new(Mutex::new(None)),
        }
    }

    /// Remote operations spawned but not yet completed.
    pub fn pending_count(&self) -> usize {
        self.pending.load(Ordering::Acquire)
    }

    /// When a remote operation last completed successfully, if ever.
    pub fn last_synced_at(&self) -> Option<DateTime<Utc>> {
        *self
            .last_synced_at
            .lock()
            .expect("sync bookkeeping lock poisoned")
    }

    /// Spawn a non-blocking push of one record.
    ///
    /// `on_confirmed` runs with the remote identifier after a confirmed
    /// remote write; the facade uses it to stamp `remote_id` into the
    /// stored record. Failure is logged and the local copy stands.
    pub fn spawn_push<F>(
        &self,
        collection: &str,
        record_id: &str,
        payload: serde_json::Value,
        on_confirmed: F,
    ) where
        F: FnOnce(RemoteId) + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        let pending = Arc::clone(&self.pending);
        let last_synced_at = Arc::clone(&self.last_synced_at);
        let collection = collection.to_string();
        let record_id = record_id.to_string();

        pending.fetch_add(1, Ordering::AcqRel);
        self.tasks.spawn(async move {
            match db.upsert(&collection, payload).await {
                Ok(remote_id) => {
                    tracing::debug!(
                        collection = %collection,
                        record_id = %record_id,
                        remote_id = %remote_id,
                        "remote push confirmed"
                    );
                    *last_synced_at
                        .lock()
                        .expect("sync bookkeeping lock poisoned") = Some(Utc::now());
                    on_confirmed(remote_id);
                }
                Err(e) => {
                    tracing::warn!(
                        collection = %collection,
                        record_id = %record_id,
                        error = %e,
                        "remote push failed, local copy stands"
                    );
                }
            }
            pending.fetch_sub(1, Ordering::AcqRel);
        });
    }

    /// Spawn a non-blocking remote delete.
    ///
    /// Only called when the host is online and the record carried a remote
    /// identifier. Failure is terminal: the local removal already happened
    /// and a remote orphan is tolerated.
    pub fn spawn_delete(&self, collection: &str, remote_id: RemoteId) {
        let db = Arc::clone(&self.db);
        let pending = Arc::clone(&self.pending);
        let last_synced_at = Arc::clone(&self.last_synced_at);
        let collection = collection.to_string();

        pending.fetch_add(1, Ordering::AcqRel);
        self.tasks.spawn(async move {
            match db.delete_by_id(&remote_id).await {
                Ok(found) => {
                    tracing::debug!(
                        collection = %collection,
                        remote_id = %remote_id,
                        found,
                        "remote delete completed"
                    );
                    *last_synced_at
                        .lock()
                        .expect("sync bookkeeping lock poisoned") = Some(Utc::now());
                }
                Err(e) => {
                    tracing::warn!(
                        collection = %collection,
                        remote_id = %remote_id,
                        error = %e,
                        "remote delete failed, keeping local removal"
                    );
                }
            }
            pending.fetch_sub(1, Ordering::AcqRel);
        });
    }

    /// Await everything in flight. Used by tests and orderly teardown.
    pub async fn drain(&self) {
        self.tasks.drain().await;
    }

    /// Best-effort cancellation of everything in flight.
    pub fn abort_all(&self) {
        self.tasks.abort_all();
    }
}
