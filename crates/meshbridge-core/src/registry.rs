// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Registry of running operation tasks.
//!
//! Every dispatched operation runs as one spawned task, registered here
//! keyed by its operation id with a cancellation token. Tasks deregister
//! themselves on completion. The token is the cancellation surface: today it
//! stops the verification consumer's forwarding; a future cancel API plugs
//! in without touching the dispatcher.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct TaskEntry {
    handle: JoinHandle<()>,
    cancel: CancellationToken,
}

/// Tracks one task per in-flight operation.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    inner: Arc<Mutex<HashMap<String, TaskEntry>>>,
}

impl TaskRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task` as this operation's concurrent task.
    ///
    /// The closure receives the task's cancellation token. The entry is
    /// removed when the task finishes; the registration lock is held across
    /// the spawn so the task's own deregistration can never observe a
    /// not-yet-inserted entry.
    pub fn spawn<F, Fut>(&self, operation_id: &str, task: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let future = task(cancel.clone());

        let registry = Arc::clone(&self.inner);
        let id = operation_id.to_string();
        let task_id = id.clone();

        let mut entries = self.inner.lock().expect("task registry lock poisoned");
        let handle = tokio::spawn(async move {
            future.await;
            registry
                .lock()
                .expect("task registry lock poisoned")
                .remove(&task_id);
            debug!(operation_id = %task_id, "operation task finished");
        });
        entries.insert(id, TaskEntry { handle, cancel });
    }

    /// Trigger the cancellation token of a running operation.
    ///
    /// Returns false when no task is registered under this id.
    pub fn cancel(&self, operation_id: &str) -> bool {
        let entries = self.inner.lock().expect("task registry lock poisoned");
        match entries.get(operation_id) {
            Some(entry) => {
                entry.cancel.cancel();
                true
            }
            None => false,
        }
    }

    /// Whether a task is currently registered and unfinished.
    pub fn is_running(&self, operation_id: &str) -> bool {
        self.inner
            .lock()
            .expect("task registry lock poisoned")
            .get(operation_id)
            .map(|entry| !entry.handle.is_finished())
            .unwrap_or(false)
    }

    /// Wait for an operation's task to finish.
    ///
    /// Takes the entry out of the registry. Returns false when no task is
    /// registered under this id (already finished or never spawned).
    pub async fn wait(&self, operation_id: &str) -> bool {
        let entry = self
            .inner
            .lock()
            .expect("task registry lock poisoned")
            .remove(operation_id);
        match entry {
            Some(entry) => {
                let _ = entry.handle.await;
                true
            }
            None => false,
        }
    }

    /// Number of registered (possibly finished-but-unreaped) tasks.
    pub fn len(&self) -> usize {
        self.inner.lock().expect("task registry lock poisoned").len()
    }

    /// True when no task is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_spawn_registers_and_deregisters() {
        let registry = TaskRegistry::new();
        let (tx, rx) = tokio::sync::oneshot::channel::<()>();

        registry.spawn("op-1", |_cancel| async move {
            let _ = rx.await;
        });
        assert_eq!(registry.len(), 1);
        assert!(registry.is_running("op-1"));

        tx.send(()).unwrap();
        assert!(registry.wait("op-1").await);
        assert!(registry.is_empty());
        assert!(!registry.is_running("op-1"));
    }

    #[tokio::test]
    async fn test_cancel_fires_token() {
        let registry = TaskRegistry::new();
        let (done_tx, done_rx) = tokio::sync::oneshot::channel::<&'static str>();

        registry.spawn("op-2", |cancel| async move {
            tokio::select! {
                _ = cancel.cancelled() => { let _ = done_tx.send("cancelled"); }
                _ = tokio::time::sleep(Duration::from_secs(30)) => {
                    let _ = done_tx.send("timed out");
                }
            }
        });

        assert!(registry.cancel("op-2"));
        assert_eq!(done_rx.await.unwrap(), "cancelled");
        assert!(registry.wait("op-2").await);
    }

    #[tokio::test]
    async fn test_cancel_unknown_operation() {
        let registry = TaskRegistry::new();
        assert!(!registry.cancel("never-dispatched"));
        assert!(!registry.wait("never-dispatched").await);
    }

    #[tokio::test]
    async fn test_completed_task_reaps_its_entry() {
        let registry = TaskRegistry::new();
        registry.spawn("op-3", |_cancel| async {});

        // Entry removal happens as the task's last step.
        for _ in 0..100 {
            if registry.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(registry.is_empty());
    }
}
