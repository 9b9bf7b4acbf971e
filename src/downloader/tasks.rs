//! Supervised background submissions.
//!
//! Every API submission runs as a supervised task: it gets a generated
//! id, a cancellation token, and an entry in the registry. Tasks remove
//! themselves when they finish; cancelling removes the entry and fires
//! the token, which tears down the whole resolve-and-download future.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Submission {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Registry of in-flight background submissions
#[derive(Clone)]
pub struct SubmissionRegistry {
    inner: Arc<Mutex<HashMap<String, Submission>>>,
}

impl Default for SubmissionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Spawn a supervised task, returning its generated id
    pub fn spawn<F>(&self, work: F) -> String
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task_id = uuid::Uuid::new_v4().to_string();
        let cancel = CancellationToken::new();

        let registry = self.inner.clone();
        let id = task_id.clone();
        let token = cancel.clone();

        // Hold the lock across the spawn so the task cannot observe the
        // registry before its own entry is inserted.
        let mut map = self.lock();
        let handle = tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {
                    tracing::debug!(task_id = %id, "task cancelled");
                }
                _ = work => {
                    tracing::debug!(task_id = %id, "task finished");
                }
            }
            let mut map = registry.lock().unwrap_or_else(|e| e.into_inner());
            map.remove(&id);
        });
        map.insert(task_id.clone(), Submission { cancel, handle });

        tracing::info!(task_id = %task_id, "submission started");
        task_id
    }

    /// Cancel a task by id; `false` if it is unknown or already done
    pub fn cancel(&self, task_id: &str) -> bool {
        let submission = self.lock().remove(task_id);
        match submission {
            Some(submission) => {
                submission.cancel.cancel();
                submission.handle.abort();
                tracing::info!(task_id = %task_id, "submission cancelled");
                true
            }
            None => false,
        }
    }

    /// Ids of tasks currently in flight
    pub fn active(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    /// Number of tasks currently in flight
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no tasks are in flight
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Submission>> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
