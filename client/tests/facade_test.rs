//! Integration tests for the hybrid sync facade.
//!
//! Exercises the full composition - gate, store, monitor, adapter,
//! notifier - against a counting in-process remote.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};
use satchel_client::{
    Collection, ConnectivityMonitor, DeleteOutcome, HybridSync, KeyValueBackend, MemoryBackend,
    ReadinessGate, RemoteDatabase, RemoteDisposition, RemoteError, SyncRecord,
};
use satchel_engine::{RecordId, RemoteId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Chat {
    id: RecordId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remote_id: Option<RemoteId>,
    title: String,
    #[serde(with = "satchel_engine::timestamp")]
    created_at: DateTime<Utc>,
}

impl SyncRecord for Chat {
    fn id(&self) -> &RecordId {
        &self.id
    }
    fn remote_id(&self) -> Option<&RemoteId> {
        self.remote_id.as_ref()
    }
    fn set_remote_id(&mut self, remote_id: RemoteId) {
        self.remote_id = Some(remote_id);
    }
}

fn chat(id: &str, title: &str) -> Chat {
    Chat {
        id: id.into(),
        remote_id: None,
        title: title.into(),
        created_at: Utc.timestamp_millis_opt(1706745600000).unwrap(),
    }
}

fn synced_chat(id: &str, title: &str, remote_id: &str) -> Chat {
    Chat {
        remote_id: Some(remote_id.into()),
        ..chat(id, title)
    }
}

/// Remote that counts calls and can be told to fail.
#[derive(Debug, Default)]
struct FakeRemote {
    upserts: AtomicUsize,
    deletes: AtomicUsize,
    fail_deletes: bool,
    deleted_ids: Mutex<Vec<RemoteId>>,
}

impl RemoteDatabase for FakeRemote {
    async fn upsert(
        &self,
        _collection: &str,
        payload: serde_json::Value,
    ) -> Result<RemoteId, RemoteError> {
        let n = self.upserts.fetch_add(1, Ordering::SeqCst);
        let local_id = payload
            .get("id")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        Ok(format!("srv-{local_id}-{n}"))
    }

    async fn delete_by_id(&self, remote_id: &RemoteId) -> Result<bool, RemoteError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        if self.fail_deletes {
            return Err(RemoteError::Rejected("storage layer said no".into()));
        }
        self.deleted_ids.lock().unwrap().push(remote_id.clone());
        Ok(true)
    }
}

fn facade_with(
    remote: Arc<FakeRemote>,
    monitor: ConnectivityMonitor,
) -> HybridSync<MemoryBackend, FakeRemote> {
    let sync = HybridSync::builder(MemoryBackend::new())
        .remote(remote)
        .monitor(monitor)
        .collection("chats")
        .build();
    sync.load();
    sync
}

// ============================================================================
// Readiness
// ============================================================================

#[test]
fn on_ready_before_load_queues_until_load_completes() {
    // Scenario: two records saved, a waiter registered before load, the
    // waiter fires after load and sees both records in original order.
    let gate = Arc::new(ReadinessGate::new());
    let sync = HybridSync::builder(MemoryBackend::new())
        .gate(Arc::clone(&gate))
        .collection("chats")
        .build();

    let chats: Collection<Chat> = vec![chat("1", "A"), chat("2", "B")].into();
    sync.save_data("chats", &chats);

    let fired = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&fired);
    sync.on_ready(move || {
        counter.fetch_add(1, Ordering::SeqCst);
    });
    assert_eq!(fired.load(Ordering::SeqCst), 0);
    assert!(!sync.is_ready());

    sync.load();

    assert!(sync.is_ready());
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    let read: Collection<Chat> = sync.read_data("chats");
    let ids: Vec<_> = read.ids().map(String::as_str).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[test]
fn waiters_fire_in_registration_order_across_facade_clones() {
    let sync = HybridSync::builder(MemoryBackend::new())
        .collection("chats")
        .build();
    let clone = sync.clone();

    let order = Arc::new(Mutex::new(Vec::new()));
    for (label, facade) in [("first", &sync), ("second", &clone), ("third", &sync)] {
        let order = Arc::clone(&order);
        facade.on_ready(move || order.lock().unwrap().push(label));
    }

    clone.load();

    assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
}

// ============================================================================
// Save and mirror
// ============================================================================

#[tokio::test]
async fn online_save_pushes_new_records_and_stamps_remote_ids() {
    let remote = Arc::new(FakeRemote::default());
    let sync = facade_with(Arc::clone(&remote), ConnectivityMonitor::new(true));

    let chats: Collection<Chat> = vec![chat("1", "A"), chat("2", "B")].into();
    sync.save_data("chats", &chats);
    sync.flush_remote().await;

    assert_eq!(remote.upserts.load(Ordering::SeqCst), 2);

    let read: Collection<Chat> = sync.read_data("chats");
    assert!(read.get("1").unwrap().remote_id().is_some());
    assert!(read.get("2").unwrap().remote_id().is_some());

    // Caller-visible order is untouched by the confirmation write-back.
    let ids: Vec<_> = read.ids().map(String::as_str).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn offline_save_never_touches_the_remote() {
    let remote = Arc::new(FakeRemote::default());
    let monitor = ConnectivityMonitor::new(false);
    let sync = facade_with(Arc::clone(&remote), monitor);

    let chats: Collection<Chat> = vec![chat("1", "A")].into();
    sync.save_data("chats", &chats);
    sync.flush_remote().await;

    assert_eq!(remote.upserts.load(Ordering::SeqCst), 0);
    assert_eq!(remote.deletes.load(Ordering::SeqCst), 0);

    // The local write happened regardless.
    let read: Collection<Chat> = sync.read_data("chats");
    assert_eq!(read.len(), 1);
}

#[tokio::test]
async fn unchanged_records_are_not_pushed_again() {
    let remote = Arc::new(FakeRemote::default());
    let sync = facade_with(Arc::clone(&remote), ConnectivityMonitor::new(true));

    let chats: Collection<Chat> = vec![chat("1", "A")].into();
    sync.save_data("chats", &chats);
    sync.flush_remote().await;
    assert_eq!(remote.upserts.load(Ordering::SeqCst), 1);

    // Re-save the stored state verbatim: nothing changed, nothing pushed.
    let stored: Collection<Chat> = sync.read_data("chats");
    sync.save_data("chats", &stored);
    sync.flush_remote().await;
    assert_eq!(remote.upserts.load(Ordering::SeqCst), 1);

    // Mutating one record pushes exactly that record.
    let mut edited = stored;
    edited.get_mut("1").unwrap().title = "A, revised".into();
    sync.save_data("chats", &edited);
    sync.flush_remote().await;
    assert_eq!(remote.upserts.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn remote_id_is_set_at_most_once() {
    let remote = Arc::new(FakeRemote::default());
    let sync = facade_with(Arc::clone(&remote), ConnectivityMonitor::new(true));

    let chats: Collection<Chat> = vec![chat("1", "A")].into();
    sync.save_data("chats", &chats);
    sync.flush_remote().await;

    let first: Collection<Chat> = sync.read_data("chats");
    let first_remote_id = first.get("1").unwrap().remote_id().cloned().unwrap();

    // An edit pushes again; the confirmation must not replace the id.
    let mut edited = first;
    edited.get_mut("1").unwrap().title = "A, revised".into();
    sync.save_data("chats", &edited);
    sync.flush_remote().await;

    let second: Collection<Chat> = sync.read_data("chats");
    assert_eq!(
        second.get("1").unwrap().remote_id(),
        Some(&first_remote_id)
    );
}

// ============================================================================
// Delete reconciliation
// ============================================================================

#[tokio::test]
async fn offline_delete_is_immediate_and_local_only() {
    // Scenario: delete id 2 while offline. Local collection shrinks
    // immediately, the remote adapter is never called, a later read
    // confirms the record is gone.
    let remote = Arc::new(FakeRemote::default());
    let monitor = ConnectivityMonitor::new(false);
    let sync = facade_with(Arc::clone(&remote), monitor);

    let chats: Collection<Chat> =
        vec![synced_chat("1", "A", "r1"), synced_chat("2", "B", "r2")].into();
    sync.save_data("chats", &chats);

    let outcome = sync.delete_record::<Chat>("chats", "2");
    assert_eq!(
        outcome,
        DeleteOutcome::Removed {
            remote: RemoteDisposition::SkippedOffline
        }
    );

    sync.flush_remote().await;
    assert_eq!(remote.deletes.load(Ordering::SeqCst), 0);

    let read: Collection<Chat> = sync.read_data("chats");
    assert!(read.get("2").is_none());
    let ids: Vec<_> = read.ids().map(String::as_str).collect();
    assert_eq!(ids, vec!["1"]);
}

#[tokio::test]
async fn online_delete_with_remote_id_issues_remote_delete() {
    let remote = Arc::new(FakeRemote::default());
    let sync = facade_with(Arc::clone(&remote), ConnectivityMonitor::new(true));

    let chats: Collection<Chat> = vec![synced_chat("1", "A", "r1")].into();
    sync.save_data("chats", &chats);
    sync.flush_remote().await;

    let outcome = sync.delete_record::<Chat>("chats", "1");
    assert_eq!(
        outcome,
        DeleteOutcome::Removed {
            remote: RemoteDisposition::Attempted
        }
    );

    sync.flush_remote().await;
    assert_eq!(*remote.deleted_ids.lock().unwrap(), vec!["r1".to_string()]);
}

#[tokio::test]
async fn failed_remote_delete_does_not_resurrect_the_record() {
    // Scenario: delete id 1 online with remoteId r1, remote delete fails.
    // The record stays absent locally and no rollback occurs.
    let remote = Arc::new(FakeRemote {
        fail_deletes: true,
        ..Default::default()
    });
    let sync = facade_with(Arc::clone(&remote), ConnectivityMonitor::new(true));

    let chats: Collection<Chat> = vec![synced_chat("1", "A", "r1")].into();
    sync.save_data("chats", &chats);
    sync.flush_remote().await;

    let outcome = sync.delete_record::<Chat>("chats", "1");
    assert!(outcome.is_removed());

    sync.flush_remote().await;
    assert_eq!(remote.deletes.load(Ordering::SeqCst), 1);

    let read: Collection<Chat> = sync.read_data("chats");
    assert!(read.is_empty());
}

#[tokio::test]
async fn delete_of_never_synced_record_skips_remote() {
    let remote = Arc::new(FakeRemote::default());
    let sync = facade_with(Arc::clone(&remote), ConnectivityMonitor::new(true));

    let chats: Collection<Chat> = vec![chat("1", "A")].into();
    sync.save_data("chats", &chats);
    // Delete before any push confirmation can assign a remote id.
    let outcome = sync.delete_record::<Chat>("chats", "1");

    assert_eq!(
        outcome,
        DeleteOutcome::Removed {
            remote: RemoteDisposition::SkippedNoRemoteId
        }
    );

    sync.flush_remote().await;
    assert_eq!(remote.deletes.load(Ordering::SeqCst), 0);
}

/// Backend that fails a set number of upcoming writes.
#[derive(Debug, Default)]
struct FlakyBackend {
    inner: MemoryBackend,
    failures_left: Arc<AtomicUsize>,
}

impl KeyValueBackend for FlakyBackend {
    fn get(&self, key: &str) -> std::io::Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> std::io::Result<()> {
        let armed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if armed {
            return Err(std::io::Error::new(
                std::io::ErrorKind::Other,
                "quota exceeded",
            ));
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> std::io::Result<()> {
        self.inner.remove(key)
    }
}

#[test]
fn failed_local_removal_restores_prior_snapshot() {
    let failures = Arc::new(AtomicUsize::new(0));
    let backend = FlakyBackend {
        inner: MemoryBackend::new(),
        failures_left: Arc::clone(&failures),
    };
    let sync = HybridSync::builder(backend).collection("chats").build();
    sync.load();

    let chats: Collection<Chat> = vec![chat("1", "A"), chat("2", "B")].into();
    sync.save_data("chats", &chats);

    // Arm exactly one failure: the delete's removal write fails, the
    // restore write that follows succeeds.
    failures.store(1, Ordering::SeqCst);

    let outcome = sync.delete_record::<Chat>("chats", "2");
    assert_eq!(outcome, DeleteOutcome::RolledBack);

    let read: Collection<Chat> = sync.read_data("chats");
    let ids: Vec<_> = read.ids().map(String::as_str).collect();
    assert_eq!(ids, vec!["1", "2"]);
}

#[tokio::test]
async fn confirmation_after_delete_does_not_resurrect() {
    // A push in flight when its record is deleted must not write the
    // record back on confirmation.
    let remote = Arc::new(FakeRemote::default());
    let sync = facade_with(Arc::clone(&remote), ConnectivityMonitor::new(true));

    let chats: Collection<Chat> = vec![chat("1", "A")].into();
    sync.save_data("chats", &chats);
    let _ = sync.delete_record::<Chat>("chats", "1");

    sync.flush_remote().await;

    let read: Collection<Chat> = sync.read_data("chats");
    assert!(read.is_empty());
}

// ============================================================================
// Status and notifications
// ============================================================================

#[tokio::test]
async fn status_merges_monitor_and_bookkeeping() {
    let remote = Arc::new(FakeRemote::default());
    let monitor = ConnectivityMonitor::new(true);
    let sync = facade_with(Arc::clone(&remote), monitor.clone());

    let before = sync.get_sync_status();
    assert!(before.is_online);
    assert!(before.last_synced_at.is_none());

    let chats: Collection<Chat> = vec![chat("1", "A")].into();
    sync.save_data("chats", &chats);
    sync.flush_remote().await;

    let after = sync.get_sync_status();
    assert!(after.last_synced_at.is_some());
    assert_eq!(after.pending_count, 0);

    monitor.set_online(false);
    assert!(!sync.get_sync_status().is_online);
}

#[tokio::test]
async fn sibling_subscribers_see_saves_and_deletes() {
    let remote = Arc::new(FakeRemote::default());
    let sync = facade_with(Arc::clone(&remote), ConnectivityMonitor::new(false));
    let mut sibling = sync.subscribe();

    let chats: Collection<Chat> = vec![chat("1", "A")].into();
    sync.save_data("chats", &chats);
    let _ = sync.delete_record::<Chat>("chats", "1");

    let save_event = sibling.receiver.try_recv().unwrap();
    assert_eq!(save_event.key, "chats");
    assert_eq!(save_event.old_value, None);

    let delete_event = sibling.receiver.try_recv().unwrap();
    assert_eq!(delete_event.key, "chats");
    assert_eq!(delete_event.new_value.as_deref(), Some("[]"));
    assert!(delete_event.old_value.unwrap().contains("\"A\""));
}
