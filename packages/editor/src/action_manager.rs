//! # Action Manager
//!
//! Single entry point for edits: records actions in history and applies them
//! to live previews. Every applied action (new, undone or redone) reaches the
//! code writer exactly once, enqueued while the history lock is held so the
//! write queue sees actions in history order.
//!
//! Nothing here returns an error. Downstream failures are logged (preview) or
//! recorded by the code writer.

use crate::action::Action;
use crate::analytics::Analytics;
use crate::code::CodeWriter;
use crate::config::EditorConfig;
use crate::history::{HistoryManager, HistoryStatus};
use crate::preview::LivePreviewDispatcher;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;

pub struct ActionManager {
    history: Mutex<HistoryManager>,
    dispatcher: LivePreviewDispatcher,
    writer: Arc<dyn CodeWriter>,
    analytics: Arc<dyn Analytics>,
}

impl ActionManager {
    pub fn new(
        config: &EditorConfig,
        dispatcher: LivePreviewDispatcher,
        writer: Arc<dyn CodeWriter>,
        analytics: Arc<dyn Analytics>,
    ) -> Self {
        let history = HistoryManager::with_max_levels(Arc::clone(&writer), Arc::clone(&analytics), config.history_limit);
        Self {
            history: Mutex::new(history),
            dispatcher,
            writer,
            analytics,
        }
    }

    /// Record `action` (enqueueing its code write) and apply it to previews.
    pub async fn run(&self, action: Action) {
        self.history.lock().push(action.clone());
        self.dispatcher.dispatch(&action).await;
    }

    /// Revert the newest action. Returns the inverse that was applied.
    pub async fn undo(&self) -> Option<Action> {
        let action = {
            let mut history = self.history.lock();
            let action = history.undo()?;
            self.writer.write(action.clone());
            action
        };
        self.dispatcher.dispatch(&action).await;
        self.analytics.capture("undo");
        Some(action)
    }

    /// Reapply the newest undone action. Returns the action that was applied.
    pub async fn redo(&self) -> Option<Action> {
        let action = {
            let mut history = self.history.lock();
            let action = history.redo()?;
            self.writer.write(action.clone());
            action
        };
        self.dispatcher.dispatch(&action).await;
        self.analytics.capture("redo");
        Some(action)
    }

    pub fn start_transaction(&self) {
        self.history.lock().start_transaction();
    }

    pub fn commit_transaction(&self) {
        self.history.lock().commit_transaction();
    }

    pub fn can_undo(&self) -> bool {
        self.history.lock().can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.lock().can_redo()
    }

    pub fn is_in_transaction(&self) -> bool {
        self.history.lock().is_in_transaction()
    }

    pub fn undo_label(&self) -> Option<&'static str> {
        self.history.lock().undo_label()
    }

    pub fn redo_label(&self) -> Option<&'static str> {
        self.history.lock().redo_label()
    }

    pub fn status(&self) -> HistoryStatus {
        self.history.lock().status()
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryStatus> {
        self.history.lock().subscribe()
    }

    /// Run `f` against the history while holding its lock.
    pub fn with_history<R>(&self, f: impl FnOnce(&HistoryManager) -> R) -> R {
        f(&self.history.lock())
    }

    pub fn clear(&self) {
        self.history.lock().clear();
    }
}

impl std::fmt::Debug for ActionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionManager")
            .field("history", &*self.history.lock())
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
