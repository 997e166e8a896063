//! Tracking for fire-and-forget remote operations.

use std::future::Future;
use std::sync::Mutex;
use tokio::task::JoinHandle;

/// Handles for spawned remote operations.
///
/// The default policy is "let it finish or fail silently" - nothing awaits
/// these tasks in normal operation. The set exists so teardown (and tests)
/// can cancel or await what is still in flight instead of leaking it.
#[derive(Debug, Default)]
pub struct TaskSet {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl TaskSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a task onto the current runtime and track its handle.
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let mut handles = self.handles.lock().expect("task set lock poisoned");
        handles.retain(|h| !h.is_finished());
        handles.push(tokio::spawn(future));
    }

    /// Await every tracked task. Best-effort: panicked or aborted tasks are
    /// ignored.
    pub async fn drain(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().expect("task set lock poisoned"));
        let _ = futures::future::join_all(handles).await;
    }

    /// Abort every tracked task.
    pub fn abort_all(&self) {
        let handles = std::mem::take(&mut *self.handles.lock().expect("task set lock poisoned"));
        for handle in handles {
            handle.abort();
        }
    }

    /// Number of tracked (possibly finished) tasks.
    pub fn len(&self) -> usize {
        self.handles.lock().expect("task set lock poisoned").len()
    }

    /// Check whether no tasks are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn drain_awaits_spawned_tasks() {
        let tasks = TaskSet::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = Arc::clone(&count);
            tasks.spawn(async move {
                tokio::time::sleep(Duration::from_millis(5)).await;
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        tasks.drain().await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
        assert!(tasks.is_empty());
    }

    #[tokio::test]
    async fn abort_cancels_pending_tasks() {
        let tasks = TaskSet::new();
        let count = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&count);
        tasks.spawn(async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tasks.abort_all();
        tasks.drain().await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }
}
