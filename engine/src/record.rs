//! The record contract shared by all synced domain types.

use crate::{RecordId, RemoteId};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Contract for domain records managed by the sync core.
///
/// The engine treats records as opaque except for two reserved fields:
///
/// - `id` - locally generated at creation time, unique within a collection,
///   immutable for the record's lifetime. An `id` is never reused within a
///   collection after deletion.
/// - `remote_id` - assigned at most once, after the remote database first
///   durably accepts the record. Absent until then; once set, never cleared
///   by the engine.
///
/// Everything else on the record (title, content, timestamps) belongs to the
/// caller and round-trips through serialization untouched.
pub trait SyncRecord: Clone + Serialize + DeserializeOwned {
    /// The local identifier of this record.
    fn id(&self) -> &RecordId;

    /// The remote identifier, if the remote database has accepted the record.
    fn remote_id(&self) -> Option<&RemoteId>;

    /// Record the remote identifier after a confirmed remote write.
    ///
    /// The sync core calls this at most once per record, and only when
    /// [`SyncRecord::remote_id`] is `None`.
    fn set_remote_id(&mut self, remote_id: RemoteId);
}
