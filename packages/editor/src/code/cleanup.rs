//! Trailing-debounced cleanup of files touched by element moves.
//!
//! Every [`MoveCleanup::touch`] adds paths to a pending set and restarts the
//! timer; when the window elapses without another touch, the whole set is
//! sent to the sandbox in one `clean_files` call.

use crate::services::SandboxFiles;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Default)]
struct PendingCleanup {
    paths: BTreeSet<String>,
    timer: Option<JoinHandle<()>>,
    /// Bumped on every touch/cancel so a timer that already woke up can tell
    /// it was superseded.
    generation: u64,
    closed: bool,
}

pub struct MoveCleanup {
    sandbox: Arc<dyn SandboxFiles>,
    window: Duration,
    pending: Arc<Mutex<PendingCleanup>>,
}

impl MoveCleanup {
    pub fn new(sandbox: Arc<dyn SandboxFiles>, window: Duration) -> Self {
        Self {
            sandbox,
            window,
            pending: Arc::new(Mutex::new(PendingCleanup::default())),
        }
    }

    /// Add `paths` to the pending set and restart the window.
    ///
    /// Must be called from within a tokio runtime. Ignored after `close`.
    pub fn touch<I>(&self, paths: I)
    where
        I: IntoIterator<Item = String>,
    {
        let mut pending = self.pending.lock();
        if pending.closed {
            tracing::debug!("move cleanup skipped, code manager disposed");
            return;
        }
        pending.paths.extend(paths);
        if pending.paths.is_empty() {
            return;
        }

        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
        pending.generation += 1;

        let generation = pending.generation;
        let shared = Arc::clone(&self.pending);
        let sandbox = Arc::clone(&self.sandbox);
        let window = self.window;

        pending.timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;

            let paths: Vec<String> = {
                let mut pending = shared.lock();
                if pending.generation != generation {
                    return;
                }
                pending.timer = None;
                std::mem::take(&mut pending.paths).into_iter().collect()
            };

            tracing::debug!(files = paths.len(), "cleaning files after move");
            if let Err(err) = sandbox.clean_files(&paths).await {
                tracing::error!(error = %err, "failed to clean files after move");
            }
        }));
    }

    /// Drop pending paths and stop the timer.
    pub fn cancel(&self) {
        let mut pending = self.pending.lock();
        pending.generation += 1;
        pending.paths.clear();
        if let Some(timer) = pending.timer.take() {
            timer.abort();
        }
    }

    /// Cancel and refuse every later touch.
    pub fn close(&self) {
        self.pending.lock().closed = true;
        self.cancel();
    }

    pub fn is_scheduled(&self) -> bool {
        self.pending.lock().timer.is_some()
    }

    pub fn pending_paths(&self) -> Vec<String> {
        self.pending.lock().paths.iter().cloned().collect()
    }
}

impl Drop for MoveCleanup {
    fn drop(&mut self) {
        self.close();
    }
}
