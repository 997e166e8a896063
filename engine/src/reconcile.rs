//! Delete reconciliation - the one non-trivial state machine in the core.
//!
//! A delete is applied to the local store first and mirrored remotely on a
//! best-effort basis. The phases are:
//!
//! ```text
//! Present -> PendingLocalRemoval -> RemovedLocal
//!         -> (RemoteDeleteAttempted) -> RemovedFinal
//! ```
//!
//! with a single recovery edge `PendingLocalRemoval -> Present`, taken only
//! when the local-removal write itself fails (the prior collection snapshot
//! is restored). The remote-delete step, once reached, has no recovery edge:
//! its failure is terminal and logged, and the local removal stands. The
//! design tolerates a remote orphan over blocking the user-visible delete.

use crate::RemoteId;
use serde::{Deserialize, Serialize};

/// Phases of the delete reconciliation state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeletePhase {
    /// Record is present in the local collection.
    Present,
    /// Record removed from the in-memory collection, local write not yet
    /// confirmed.
    PendingLocalRemoval,
    /// Local write confirmed; the record is gone from the local store.
    RemovedLocal,
    /// A best-effort remote delete has been issued.
    RemoteDeleteAttempted,
    /// Terminal: removal complete (remote mirror advisory at best).
    RemovedFinal,
}

impl DeletePhase {
    /// Whether `next` is a legal transition from this phase.
    ///
    /// `PendingLocalRemoval -> Present` is the recovery edge; there is no
    /// edge out of a failed remote delete.
    pub fn can_advance_to(self, next: DeletePhase) -> bool {
        use DeletePhase::*;
        matches!(
            (self, next),
            (Present, PendingLocalRemoval)
                | (PendingLocalRemoval, RemovedLocal)
                | (PendingLocalRemoval, Present)
                | (RemovedLocal, RemoteDeleteAttempted)
                | (RemovedLocal, RemovedFinal)
                | (RemoteDeleteAttempted, RemovedFinal)
        )
    }
}

impl std::fmt::Display for DeletePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DeletePhase::Present => "present",
            DeletePhase::PendingLocalRemoval => "pending_local_removal",
            DeletePhase::RemovedLocal => "removed_local",
            DeletePhase::RemoteDeleteAttempted => "remote_delete_attempted",
            DeletePhase::RemovedFinal => "removed_final",
        };
        f.write_str(name)
    }
}

/// Decision on whether to issue the remote half of a delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteAction {
    /// Online and the record carries a remote ID: issue the delete.
    Attempt(RemoteId),
    /// Host is offline: proactive skip, not an error path.
    SkipOffline,
    /// The record was never accepted remotely: nothing to delete.
    SkipNoRemoteId,
}

/// Decide the remote half of a delete from the connectivity snapshot and
/// the record's remote identity.
///
/// Offline wins over a missing remote ID: while offline the remote mirror
/// is not consulted at all.
pub fn remote_delete_action(is_online: bool, remote_id: Option<&RemoteId>) -> RemoteAction {
    if !is_online {
        return RemoteAction::SkipOffline;
    }
    match remote_id {
        Some(remote_id) => RemoteAction::Attempt(remote_id.clone()),
        None => RemoteAction::SkipNoRemoteId,
    }
}

/// How the remote half of a completed delete was dispatched.
///
/// The remote call is fire-and-forget, so at the time the outcome is
/// reported the most that can be known is whether an attempt was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteDisposition {
    /// A best-effort remote delete was spawned.
    Attempted,
    /// Skipped: host offline at delete time.
    SkippedOffline,
    /// Skipped: the record carried no remote ID.
    SkippedNoRemoteId,
    /// Skipped: no remote database is configured.
    SkippedDisabled,
}

/// Result of a delete reconciliation, reported to call sites instead of an
/// error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The record was removed locally; `remote` says what happened to the
    /// mirror.
    Removed { remote: RemoteDisposition },
    /// The ID was not present: a no-op, no write and no notification.
    NotFound,
    /// The local-removal write failed and the prior snapshot was restored.
    RolledBack,
}

impl DeleteOutcome {
    /// Whether the record is absent from the local collection after the
    /// operation.
    pub fn is_removed(&self) -> bool {
        matches!(self, DeleteOutcome::Removed { .. })
    }
}
