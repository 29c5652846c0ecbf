//! # Code Manager
//!
//! Serialized write queue from actions to sandbox files.
//!
//! ```text
//! write(a1) write(a2) ...          (enqueue, never blocks)
//!        ↓
//! ┌────────────────────────────────────────────┐
//! │ drain task (at most one)                   │
//! │  pop front → diff requests → diff service  │
//! │  → sandbox write → refresh broadcast       │
//! └────────────────────────────────────────────┘
//!        ↓ empty queue
//!      Idle
//! ```
//!
//! A failed cycle is logged and recorded as a [`SyncFailure`]; the loop moves
//! on to the next queued action. Failures are neither retried nor rolled back
//! out of history.
//!
//! After [`CodeManager::dispose`] the manager is closed for good: new writes
//! are refused, and no cleanup or refresh timer fires, even for a cycle that
//! was in flight when it was disposed.

use super::cleanup::MoveCleanup;
use super::refresh::DelayedRefresh;
use super::request::{get_code_diff_requests, CodeDiffRequest};
use super::CodeWriter;
use crate::action::{Action, CodeDiff};
use crate::analytics::Analytics;
use crate::config::EditorConfig;
use crate::errors::{EditorError, EditorResult};
use crate::preview::PreviewRegistry;
use crate::services::{DiffService, SandboxFiles, TemplateNodeMapper};
use chrono::{DateTime, Utc};
use futures::FutureExt;
use parking_lot::Mutex;
use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Notify;

/// A queued action whose source write did not complete.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncFailure {
    pub action: Action,
    pub reason: String,
    pub at: DateTime<Utc>,
}

#[derive(Default)]
struct WriteQueue {
    pending: VecDeque<Action>,
    executing: bool,
    disposed: bool,
}

struct Inner {
    mapper: Arc<dyn TemplateNodeMapper>,
    diffs: Arc<dyn DiffService>,
    sandbox: Arc<dyn SandboxFiles>,
    analytics: Arc<dyn Analytics>,
    refresh: DelayedRefresh,
    cleanup: MoveCleanup,
    queue: Mutex<WriteQueue>,
    idle: Notify,
    failures: Mutex<Vec<SyncFailure>>,
}

/// Cheap-to-clone handle to the write queue.
#[derive(Clone)]
pub struct CodeManager {
    inner: Arc<Inner>,
}

impl CodeManager {
    pub fn new(
        config: &EditorConfig,
        mapper: Arc<dyn TemplateNodeMapper>,
        diffs: Arc<dyn DiffService>,
        sandbox: Arc<dyn SandboxFiles>,
        previews: Arc<PreviewRegistry>,
        analytics: Arc<dyn Analytics>,
    ) -> Self {
        let cleanup = MoveCleanup::new(Arc::clone(&sandbox), config.move_cleanup_debounce());
        Self {
            inner: Arc::new(Inner {
                mapper,
                diffs,
                sandbox,
                analytics,
                refresh: DelayedRefresh::new(previews, config.refresh_delay()),
                cleanup,
                queue: Mutex::new(WriteQueue::default()),
                idle: Notify::new(),
                failures: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Enqueue `action`, starting the drain task if the queue was idle.
    /// Ignored once disposed.
    pub fn enqueue(&self, action: Action) {
        let mut queue = self.inner.queue.lock();
        if queue.disposed {
            tracing::debug!(kind = action.kind(), "code manager disposed, write dropped");
            return;
        }
        queue.pending.push_back(action);
        if queue.executing {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                queue.executing = true;
                runtime.spawn(drain(Arc::clone(&self.inner)));
            }
            Err(_) => {
                tracing::error!(queued = queue.pending.len(), "no async runtime, code write left queued");
            }
        }
    }

    /// Wait until every queued write has been processed.
    pub async fn flush(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.is_busy() {
                return;
            }
            notified.await;
        }
    }

    /// A write cycle is in flight.
    pub fn is_executing(&self) -> bool {
        self.inner.queue.lock().executing
    }

    fn is_busy(&self) -> bool {
        let queue = self.inner.queue.lock();
        queue.executing || !queue.pending.is_empty()
    }

    /// Actions waiting behind the in-flight one.
    pub fn queue_len(&self) -> usize {
        self.inner.queue.lock().pending.len()
    }

    pub fn failure_count(&self) -> usize {
        self.inner.failures.lock().len()
    }

    /// Remove and return every recorded failure, oldest first.
    pub fn take_failures(&self) -> Vec<SyncFailure> {
        std::mem::take(&mut *self.inner.failures.lock())
    }

    /// Drop queued (not yet started) writes, cancel pending move cleanup and
    /// refresh timers, and refuse every later write.
    ///
    /// The in-flight cycle, if any, still writes its files but schedules no
    /// cleanup or refresh.
    pub fn dispose(&self) {
        let dropped = {
            let mut queue = self.inner.queue.lock();
            queue.disposed = true;
            let dropped = queue.pending.len();
            queue.pending.clear();
            dropped
        };
        self.inner.cleanup.close();
        self.inner.refresh.close();
        if dropped > 0 {
            tracing::debug!(dropped, "disposed code manager with queued writes");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.queue.lock().disposed
    }

    /// Process one action immediately, bypassing the queue.
    pub async fn write_now(&self, action: &Action) -> EditorResult<()> {
        if self.is_disposed() {
            return Err(EditorError::Disposed);
        }
        self.inner.execute_write(action).await
    }

    /// Compute diffs for `requests` without writing them.
    ///
    /// A diff whose `original` came back empty is filled from the current
    /// file content.
    pub async fn get_code_diffs(&self, requests: &[CodeDiffRequest]) -> EditorResult<Vec<CodeDiff>> {
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        let mut diffs = self.inner.diffs.compute_diffs(requests).await?;
        for diff in diffs.iter_mut().filter(|diff| diff.original.is_empty()) {
            if let Some(content) = self.inner.sandbox.read_file(&diff.path).await? {
                diff.original = content;
            }
        }
        Ok(diffs)
    }
}

impl CodeWriter for CodeManager {
    fn write(&self, action: Action) {
        self.enqueue(action);
    }
}

impl std::fmt::Debug for CodeManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let queue = self.inner.queue.lock();
        f.debug_struct("CodeManager")
            .field("queued", &queue.pending.len())
            .field("executing", &queue.executing)
            .field("failures", &self.inner.failures.lock().len())
            .finish()
    }
}

async fn drain(inner: Arc<Inner>) {
    loop {
        let action = {
            let mut queue = inner.queue.lock();
            match queue.pending.pop_front() {
                Some(action) => action,
                None => {
                    queue.executing = false;
                    break;
                }
            }
        };

        let result = match AssertUnwindSafe(inner.execute_write(&action)).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(EditorError::Panicked(panic_message(panic.as_ref()))),
        };

        if let Err(err) = result {
            tracing::error!(kind = action.kind(), error = %err, "failed to write action to code");
            inner.failures.lock().push(SyncFailure {
                action,
                reason: err.to_string(),
                at: Utc::now(),
            });
        }
    }

    inner.idle.notify_waiters();
}

impl Inner {
    async fn execute_write(&self, action: &Action) -> EditorResult<()> {
        let diffs = match action {
            Action::WriteCode(write) => write.diffs.clone(),
            _ => self.compute_diffs(action).await?,
        };
        if diffs.is_empty() {
            return Err(EditorError::EmptyDiff(action.kind()));
        }

        for diff in &diffs {
            if !self.sandbox.write_file(&diff.path, &diff.generated).await? {
                return Err(EditorError::WriteRejected(diff.path.clone()));
            }
        }

        tracing::info!(kind = action.kind(), files = diffs.len(), "wrote code");
        self.analytics.capture("write code");

        if matches!(action, Action::MoveElement(_)) {
            self.cleanup.touch(diffs.iter().map(|diff| diff.path.clone()));
        }
        self.refresh.schedule();

        Ok(())
    }

    async fn compute_diffs(&self, action: &Action) -> EditorResult<Vec<CodeDiff>> {
        let requests = get_code_diff_requests(self.mapper.as_ref(), std::slice::from_ref(action)).await;
        if requests.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!(kind = action.kind(), requests = requests.len(), "computing code diffs");
        Ok(self.diffs.compute_diffs(&requests).await?)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_message_formats() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");

        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");

        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
