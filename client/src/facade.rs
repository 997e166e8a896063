//! Hybrid sync facade - the four-call contract consumed by feature code.
//!
//! Composes the readiness gate, local store, connectivity monitor, remote
//! sync adapter, and change notifier. Feature code waits on the gate, then
//! reads and writes collections exclusively through this facade: writes
//! persist locally first (synchronously, in call order), mirror remotely
//! on a best-effort basis, and broadcast to sibling contexts. Direct
//! backend writes bypass notification and are a correctness hazard.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use satchel_engine::{
    remote_delete_action, Collection, DeleteOutcome, DeletePhase, ReadinessGate, RemoteAction,
    RemoteDisposition, RemoteId, SyncRecord, SyncStatus,
};

use crate::connectivity::ConnectivityMonitor;
use crate::notify::{ChangeNotifier, StorageEvent, Subscription};
use crate::remote::{NoRemote, RemoteDatabase, RemoteSyncAdapter};
use crate::store::{KeyValueBackend, LocalStore};

struct Inner<B, D> {
    gate: Arc<ReadinessGate>,
    store: LocalStore<B>,
    // Serializes read-modify-write sections per facade; never held across
    // an await point.
    write_lock: Mutex<()>,
    monitor: ConnectivityMonitor,
    notifier: Arc<ChangeNotifier>,
    remote: Option<RemoteSyncAdapter<D>>,
    collections: Vec<String>,
}

/// The hybrid sync service.
///
/// Cheap to clone; all clones share the same gate, store, and bookkeeping.
pub struct HybridSync<B, D = NoRemote> {
    inner: Arc<Inner<B, D>>,
}

impl<B, D> Clone for HybridSync<B, D> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B: KeyValueBackend> HybridSync<B> {
    /// Start composing a facade over the given local backend.
    pub fn builder(backend: B) -> HybridSyncBuilder<B, NoRemote> {
        HybridSyncBuilder {
            backend,
            remote: None,
            monitor: ConnectivityMonitor::default(),
            notifier: None,
            gate: None,
            collections: Vec::new(),
        }
    }
}

impl<B: KeyValueBackend, D: RemoteDatabase> HybridSync<B, D> {
    /// Current readiness flag. Pure, no side effects.
    pub fn is_ready(&self) -> bool {
        self.inner.gate.is_ready()
    }

    /// Run `callback` once the initial local load has completed.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner.gate.on_ready(callback);
    }

    /// Startup sequence: prime every declared collection from the local
    /// store, then mark the gate ready.
    ///
    /// `save_data` calls issued before this still write durably, but their
    /// visibility to consumers waiting on [`HybridSync::on_ready`] is not
    /// guaranteed.
    pub fn load(&self) {
        for key in &self.inner.collections {
            match self.inner.store.read_raw(key) {
                Some(raw) => match serde_json::from_str::<serde_json::Value>(&raw) {
                    Ok(serde_json::Value::Array(records)) => {
                        tracing::debug!(key = %key, records = records.len(), "collection loaded");
                    }
                    Ok(_) => {
                        tracing::warn!(key = %key, "stored value is not an array, treating as empty");
                    }
                    Err(e) => {
                        tracing::warn!(key = %key, error = %e, "stored collection failed to parse, treating as empty");
                    }
                },
                None => tracing::debug!(key = %key, "no stored collection"),
            }
        }

        self.inner.gate.mark_ready();
        tracing::info!("hybrid sync ready");
    }

    /// Read the collection stored under `key`.
    ///
    /// Before readiness this returns an empty collection rather than
    /// partially loaded data.
    pub fn read_data<R: SyncRecord>(&self, key: &str) -> Collection<R> {
        if !self.inner.gate.is_ready() {
            tracing::debug!(key, "read before readiness, returning empty collection");
            return Collection::new();
        }
        self.inner.store.read(key)
    }

    /// Persist `collection` under `key` and mirror the change.
    ///
    /// The local write is synchronous and applied in call order. When the
    /// host is online and a remote is configured, changed records are
    /// pushed on background tasks; the caller is never suspended waiting
    /// on a remote result. Local write failure degrades to in-memory-only
    /// for this operation: logged, not surfaced.
    pub fn save_data<R>(&self, key: &str, collection: &Collection<R>)
    where
        R: SyncRecord + Send + Sync + 'static,
    {
        let inner = &self.inner;

        let (old_raw, new_json) = {
            let _guard = inner.write_lock.lock().expect("facade write lock poisoned");
            let old_raw = inner.store.read_raw(key);

            let new_json = match collection.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(key, error = %e, "failed to serialize collection, keeping in-memory copy only");
                    return;
                }
            };

            if let Err(e) = inner.store.write_raw(key, &new_json) {
                tracing::warn!(key, error = %e, "local write failed, keeping in-memory copy only");
                return;
            }

            (old_raw, new_json)
        };

        inner.notifier.broadcast(StorageEvent {
            key: key.to_string(),
            new_value: Some(new_json),
            old_value: old_raw.clone(),
        });

        self.mirror_changes(key, collection, old_raw.as_deref());
    }

    /// Delete reconciliation: remove `id` from the collection under `key`.
    ///
    /// The local removal is optimistic and immediate; the remote delete is
    /// best-effort and issued only when online and the record carried a
    /// remote ID. The only recovery edge restores the prior snapshot when
    /// the local write itself fails.
    pub fn delete_record<R>(&self, key: &str, id: &str) -> DeleteOutcome
    where
        R: SyncRecord + Send + Sync + 'static,
    {
        let inner = &self.inner;

        let (removed, old_raw, new_json) = {
            let _guard = inner.write_lock.lock().expect("facade write lock poisoned");
            let old_raw = inner.store.read_raw(key);
            let mut collection: Collection<R> = inner.store.read(key);

            let Some(removed) = collection.remove(id) else {
                tracing::debug!(key, record_id = id, "delete of absent record is a no-op");
                return DeleteOutcome::NotFound;
            };
            tracing::trace!(key, record_id = id, phase = %DeletePhase::PendingLocalRemoval, "delete started");

            let new_json = match collection.to_json() {
                Ok(json) => json,
                Err(e) => {
                    // Nothing was written, so the stored snapshot is intact.
                    tracing::warn!(key, record_id = id, error = %e, "failed to serialize remainder, delete abandoned");
                    return DeleteOutcome::RolledBack;
                }
            };

            if let Err(e) = inner.store.write_raw(key, &new_json) {
                tracing::warn!(key, record_id = id, error = %e, "local removal failed, restoring prior snapshot");
                if let Some(snapshot) = old_raw.as_deref() {
                    if let Err(e) = inner.store.restore_raw(key, snapshot) {
                        tracing::error!(key, error = %e, "failed to restore prior snapshot");
                    }
                }
                tracing::trace!(key, record_id = id, phase = %DeletePhase::Present, "delete rolled back");
                return DeleteOutcome::RolledBack;
            }
            tracing::trace!(key, record_id = id, phase = %DeletePhase::RemovedLocal, "local removal durable");

            (removed, old_raw, new_json)
        };

        inner.notifier.broadcast(StorageEvent {
            key: key.to_string(),
            new_value: Some(new_json),
            old_value: old_raw,
        });

        let Some(adapter) = &inner.remote else {
            tracing::debug!(key, record_id = id, "no remote configured, delete is local only");
            return DeleteOutcome::Removed {
                remote: RemoteDisposition::SkippedDisabled,
            };
        };

        match remote_delete_action(inner.monitor.is_online(), removed.remote_id()) {
            RemoteAction::Attempt(remote_id) => {
                tracing::trace!(key, record_id = id, phase = %DeletePhase::RemoteDeleteAttempted, "remote delete issued");
                adapter.spawn_delete(key, remote_id);
                DeleteOutcome::Removed {
                    remote: RemoteDisposition::Attempted,
                }
            }
            RemoteAction::SkipOffline => {
                tracing::debug!(key, record_id = id, "offline, skipping remote delete");
                DeleteOutcome::Removed {
                    remote: RemoteDisposition::SkippedOffline,
                }
            }
            RemoteAction::SkipNoRemoteId => {
                tracing::debug!(key, record_id = id, "record never synced, nothing to delete remotely");
                DeleteOutcome::Removed {
                    remote: RemoteDisposition::SkippedNoRemoteId,
                }
            }
        }
    }

    /// Merge the connectivity snapshot with the sync bookkeeping.
    /// Read-only, side-effect free.
    pub fn get_sync_status(&self) -> SyncStatus {
        let (last_synced_at, pending_count) = match &self.inner.remote {
            Some(adapter) => (adapter.last_synced_at(), adapter.pending_count()),
            None => (None, 0),
        };

        SyncStatus {
            is_online: self.inner.monitor.is_online(),
            last_synced_at,
            pending_count,
        }
    }

    /// Subscribe to storage-change notifications.
    pub fn subscribe(&self) -> Subscription {
        self.inner.notifier.subscribe()
    }

    /// The connectivity monitor, for feeding in host online/offline events.
    pub fn monitor(&self) -> &ConnectivityMonitor {
        &self.inner.monitor
    }

    /// Await in-flight remote operations. For tests and orderly teardown;
    /// normal operation never waits on the mirror.
    pub async fn flush_remote(&self) {
        if let Some(adapter) = &self.inner.remote {
            adapter.drain().await;
        }
    }

    /// Best-effort cancellation of in-flight remote operations.
    pub fn shutdown(&self) {
        if let Some(adapter) = &self.inner.remote {
            adapter.abort_all();
        }
    }

    /// Push records that differ from the stored pre-image.
    fn mirror_changes<R>(&self, key: &str, collection: &Collection<R>, old_raw: Option<&str>)
    where
        R: SyncRecord + Send + Sync + 'static,
    {
        let Some(adapter) = &self.inner.remote else {
            return;
        };
        if !self.inner.monitor.is_online() {
            tracing::debug!(key, "offline, skipping remote mirror");
            return;
        }

        let old_by_id = index_by_id(old_raw);

        for record in collection.iter() {
            let payload = match serde_json::to_value(record) {
                Ok(payload) => payload,
                Err(e) => {
                    tracing::warn!(key, record_id = %record.id(), error = %e, "record failed to serialize, skipping push");
                    continue;
                }
            };

            if old_by_id.get(record.id().as_str()) == Some(&payload) {
                continue;
            }

            let inner = Arc::clone(&self.inner);
            let key_owned = key.to_string();
            let record_id = record.id().clone();
            adapter.spawn_push(key, record.id(), payload, move |remote_id| {
                confirm_remote_id::<B, D, R>(&inner, &key_owned, &record_id, remote_id);
            });
        }
    }
}

/// Builder wiring the facade at the application's composition root.
pub struct HybridSyncBuilder<B, D = NoRemote> {
    backend: B,
    remote: Option<Arc<D>>,
    monitor: ConnectivityMonitor,
    notifier: Option<Arc<ChangeNotifier>>,
    gate: Option<Arc<ReadinessGate>>,
    collections: Vec<String>,
}

impl<B: KeyValueBackend, D: RemoteDatabase> HybridSyncBuilder<B, D> {
    /// Mirror writes to the given remote database.
    pub fn remote<D2: RemoteDatabase>(self, db: Arc<D2>) -> HybridSyncBuilder<B, D2> {
        HybridSyncBuilder {
            backend: self.backend,
            remote: Some(db),
            monitor: self.monitor,
            notifier: self.notifier,
            gate: self.gate,
            collections: self.collections,
        }
    }

    /// Use the given connectivity monitor instead of a default-online one.
    pub fn monitor(mut self, monitor: ConnectivityMonitor) -> Self {
        self.monitor = monitor;
        self
    }

    /// Share an externally owned change notifier.
    pub fn notifier(mut self, notifier: Arc<ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Share an externally owned readiness gate, so waiters can register
    /// before the facade is built.
    pub fn gate(mut self, gate: Arc<ReadinessGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Declare a collection key loaded at startup.
    pub fn collection(mut self, key: impl Into<String>) -> Self {
        self.collections.push(key.into());
        self
    }

    /// Declare several collection keys loaded at startup.
    pub fn collections<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.collections.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Assemble the facade. Call [`HybridSync::load`] afterwards to run the
    /// startup sequence and release waiters.
    pub fn build(self) -> HybridSync<B, D> {
        HybridSync {
            inner: Arc::new(Inner {
                gate: self.gate.unwrap_or_default(),
                store: LocalStore::new(self.backend),
                write_lock: Mutex::new(()),
                monitor: self.monitor,
                notifier: self.notifier.unwrap_or_else(ChangeNotifier::new_shared),
                remote: self.remote.map(RemoteSyncAdapter::new),
                collections: self.collections,
            }),
        }
    }
}

/// Stamp a confirmed remote ID into the stored record, at most once.
fn confirm_remote_id<B, D, R>(
    inner: &Arc<Inner<B, D>>,
    key: &str,
    record_id: &str,
    remote_id: RemoteId,
) where
    B: KeyValueBackend,
    D: RemoteDatabase,
    R: SyncRecord,
{
    let (old_raw, new_json) = {
        let _guard = inner.write_lock.lock().expect("facade write lock poisoned");
        let old_raw = inner.store.read_raw(key);
        let mut collection: Collection<R> = inner.store.read(key);

        let Some(record) = collection.get_mut(record_id) else {
            tracing::debug!(key, record_id, "record gone before remote confirmation");
            return;
        };
        if record.remote_id().is_some() {
            return;
        }
        record.set_remote_id(remote_id);

        let new_json = match collection.to_json() {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(key, record_id, error = %e, "failed to serialize after remote confirmation");
                return;
            }
        };
        if let Err(e) = inner.store.write_raw(key, &new_json) {
            tracing::warn!(key, record_id, error = %e, "failed to persist remote id");
            return;
        }

        (old_raw, new_json)
    };

    inner.notifier.broadcast(StorageEvent {
        key: key.to_string(),
        new_value: Some(new_json),
        old_value: old_raw,
    });
}

/// Index the stored pre-image by record ID for change detection.
///
/// IDs may be strings or numbers in values written by earlier clients.
fn index_by_id(raw: Option<&str>) -> HashMap<String, serde_json::Value> {
    let Some(raw) = raw else {
        return HashMap::new();
    };
    let Ok(serde_json::Value::Array(values)) = serde_json::from_str(raw) else {
        return HashMap::new();
    };

    values
        .into_iter()
        .filter_map(|value| {
            let id = match value.get("id")? {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                _ => return None,
            };
            Some((id, value))
        })
        .collect()
}
