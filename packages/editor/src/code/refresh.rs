//! Delayed `CleanAfterWrite` broadcasts that follow each source write.
//!
//! Each write gets its own timer so file watchers can settle before the
//! previews re-sync. Timers are owned here: [`DelayedRefresh::close`] aborts
//! the ones still sleeping and refuses new ones.

use crate::preview::{PreviewMessage, PreviewRegistry};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

#[derive(Default)]
struct Timers {
    handles: Vec<JoinHandle<()>>,
    closed: bool,
}

pub struct DelayedRefresh {
    previews: Arc<PreviewRegistry>,
    delay: Duration,
    timers: Mutex<Timers>,
}

impl DelayedRefresh {
    pub fn new(previews: Arc<PreviewRegistry>, delay: Duration) -> Self {
        Self {
            previews,
            delay,
            timers: Mutex::new(Timers::default()),
        }
    }

    /// Broadcast `CleanAfterWrite` once the delay elapses.
    ///
    /// Must be called from within a tokio runtime. Ignored after `close`.
    pub fn schedule(&self) {
        let mut timers = self.timers.lock();
        if timers.closed {
            tracing::debug!("refresh skipped, code manager disposed");
            return;
        }
        timers.handles.retain(|handle| !handle.is_finished());

        let previews = Arc::clone(&self.previews);
        let delay = self.delay;
        timers.handles.push(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            previews.broadcast(PreviewMessage::CleanAfterWrite).await;
        }));
    }

    /// Timers still waiting or broadcasting.
    pub fn pending(&self) -> usize {
        let mut timers = self.timers.lock();
        timers.handles.retain(|handle| !handle.is_finished());
        timers.handles.len()
    }

    /// Abort every outstanding timer and stop accepting new ones.
    pub fn close(&self) {
        let mut timers = self.timers.lock();
        timers.closed = true;
        for handle in timers.handles.drain(..) {
            handle.abort();
        }
    }
}

impl Drop for DelayedRefresh {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PreviewError;
    use crate::preview::PreviewHandle;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountRefreshes(AtomicUsize);

    #[async_trait]
    impl PreviewHandle for CountRefreshes {
        async fn send(&self, message: PreviewMessage) -> Result<(), PreviewError> {
            if message == PreviewMessage::CleanAfterWrite {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn refresh() -> (DelayedRefresh, Arc<CountRefreshes>) {
        let preview = Arc::new(CountRefreshes::default());
        let previews = Arc::new(PreviewRegistry::new());
        previews.register("w1", preview.clone());
        (DelayedRefresh::new(previews, Duration::from_millis(300)), preview)
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_schedule_broadcasts_once_after_delay() {
        let (refresh, preview) = refresh();

        refresh.schedule();
        refresh.schedule();
        assert_eq!(refresh.pending(), 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(preview.0.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(preview.0.load(Ordering::SeqCst), 2);
        assert_eq!(refresh.pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_aborts_and_refuses_timers() {
        let (refresh, preview) = refresh();

        refresh.schedule();
        refresh.close();
        refresh.schedule();
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert_eq!(preview.0.load(Ordering::SeqCst), 0);
        assert_eq!(refresh.pending(), 0);
    }
}
