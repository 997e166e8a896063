//! Readiness gate - a one-shot lifecycle flag with a waiter list.
//!
//! Downstream consumers must not read persisted collections until the
//! initial local load completes. The gate is owned by the application's
//! composition root and shared by reference; it is not a global.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

type ReadyCallback = Box<dyn FnOnce() + Send + 'static>;

/// One-shot readiness flag gating consumer reads until the initial load
/// completes.
///
/// The flag starts `false`, transitions to `true` exactly once via
/// [`ReadinessGate::mark_ready`], and never resets for the lifetime of the
/// process. Callbacks registered before the transition are queued and
/// drained in registration order; callbacks registered after it run
/// synchronously.
#[derive(Default)]
pub struct ReadinessGate {
    ready: AtomicBool,
    waiters: Mutex<Vec<ReadyCallback>>,
}

impl std::fmt::Debug for ReadinessGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReadinessGate")
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

impl ReadinessGate {
    /// Create a gate in the not-ready state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current readiness flag. Pure, no side effects.
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Run `callback` once readiness is achieved.
    ///
    /// If the gate is already ready, the callback runs synchronously on the
    /// calling thread. Otherwise it is enqueued and fires exactly once, in
    /// registration order, the moment [`ReadinessGate::mark_ready`] is
    /// called.
    pub fn on_ready<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        {
            let mut waiters = self.waiters.lock().expect("readiness gate lock poisoned");
            if !self.ready.load(Ordering::Acquire) {
                waiters.push(Box::new(callback));
                return;
            }
            // Already ready: fall through and invoke outside the lock.
        }
        Self::invoke(Box::new(callback));
    }

    /// Flip the flag and drain queued callbacks in FIFO order.
    ///
    /// Idempotent: only the first call drains; subsequent calls are no-ops.
    pub fn mark_ready(&self) {
        let drained = {
            let mut waiters = self.waiters.lock().expect("readiness gate lock poisoned");
            if self.ready.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *waiters)
        };

        for callback in drained {
            Self::invoke(callback);
        }
    }

    /// Number of callbacks still waiting for readiness.
    pub fn waiter_count(&self) -> usize {
        self.waiters
            .lock()
            .expect("readiness gate lock poisoned")
            .len()
    }

    // A panicking callback must not prevent delivery to the rest of the
    // queue.
    fn invoke(callback: ReadyCallback) {
        let _ = catch_unwind(AssertUnwindSafe(callback));
    }
}
