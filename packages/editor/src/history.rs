//! # Undo/Redo History
//!
//! Tracks committed actions and hands back what to apply on undo/redo.
//!
//! ## Design
//!
//! - Committing an action clears the redo stack, forwards the action to the
//!   code writer and emits a variant-specific analytics event
//! - Undo moves the newest action to the redo stack and returns its inverse
//! - Redo moves it back and returns the original action unchanged
//! - Transactions collapse a continuous interaction (a slider drag firing
//!   dozens of style updates) into one entry: while a transaction is open each
//!   push replaces the pending action, and only the last one is committed
//!
//! ```text
//!                 start_transaction
//!   NotInTransaction ───────────────▶ InTransaction(None)
//!          ▲                              │ push(a)
//!          │ commit: push(pending)        ▼
//!          └────────────────────── InTransaction(Some(a))
//! ```
//!
//! The manager never applies anything itself. Callers dispatch whatever
//! `undo`/`redo` return.

use crate::action::Action;
use crate::analytics::Analytics;
use crate::code::CodeWriter;
use std::sync::Arc;
use tokio::sync::watch;

/// Whether pushes are currently being collapsed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TransactionState {
    #[default]
    NotInTransaction,
    InTransaction {
        /// Latest action pushed since the transaction started
        pending: Option<Action>,
    },
}

/// Snapshot published to subscribers after every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HistoryStatus {
    pub can_undo: bool,
    pub can_redo: bool,
    pub in_transaction: bool,
}

/// Undo/redo stacks for editor actions
pub struct HistoryManager {
    /// Committed actions (most recent last)
    undo_stack: Vec<Action>,

    /// Undone actions (most recent last)
    redo_stack: Vec<Action>,

    transaction: TransactionState,

    /// Maximum number of undo levels (0 = unlimited)
    max_levels: usize,

    writer: Arc<dyn CodeWriter>,
    analytics: Arc<dyn Analytics>,
    status: watch::Sender<HistoryStatus>,
}

impl HistoryManager {
    /// Create a history with the default limit of 100 undo levels
    pub fn new(writer: Arc<dyn CodeWriter>, analytics: Arc<dyn Analytics>) -> Self {
        Self::with_max_levels(writer, analytics, 100)
    }

    pub fn with_max_levels(
        writer: Arc<dyn CodeWriter>,
        analytics: Arc<dyn Analytics>,
        max_levels: usize,
    ) -> Self {
        let (status, _) = watch::channel(HistoryStatus::default());
        Self {
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            transaction: TransactionState::NotInTransaction,
            max_levels,
            writer,
            analytics,
            status,
        }
    }

    /// Open a transaction. Any action pending in an already open transaction
    /// is dropped.
    pub fn start_transaction(&mut self) {
        if let TransactionState::InTransaction { pending: Some(dropped) } = &self.transaction {
            tracing::debug!(kind = dropped.kind(), "restarting transaction, dropping pending action");
        }
        self.transaction = TransactionState::InTransaction { pending: None };
        self.publish();
    }

    /// Close the open transaction and commit its last pending action, if any.
    pub fn commit_transaction(&mut self) {
        match std::mem::take(&mut self.transaction) {
            TransactionState::InTransaction { pending: Some(action) } => self.commit(action),
            TransactionState::InTransaction { pending: None } | TransactionState::NotInTransaction => {}
        }
        self.publish();
    }

    /// Record an action.
    ///
    /// Inside a transaction the action only replaces the pending one; outside
    /// it is committed immediately.
    pub fn push(&mut self, action: Action) {
        if let TransactionState::InTransaction { pending } = &mut self.transaction {
            *pending = Some(action);
            return;
        }

        self.commit(action);
        self.publish();
    }

    fn commit(&mut self, action: Action) {
        if !self.redo_stack.is_empty() {
            self.redo_stack.clear();
        }

        self.undo_stack.push(action.clone());

        // Trim if exceeded max levels
        if self.max_levels > 0 && self.undo_stack.len() > self.max_levels {
            self.undo_stack.remove(0);
        }

        self.analytics.capture(action.analytics_event());
        self.writer.write(action);
    }

    /// Pop the newest action and return its inverse for the caller to apply.
    ///
    /// Returns `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Action> {
        self.commit_transaction();

        let action = self.undo_stack.pop()?;
        let inverse = action.inverse();
        self.redo_stack.push(action);
        self.publish();
        Some(inverse)
    }

    /// Pop the newest undone action and return it unchanged for the caller to
    /// apply.
    pub fn redo(&mut self) -> Option<Action> {
        self.commit_transaction();

        let action = self.redo_stack.pop()?;
        self.undo_stack.push(action.clone());
        self.publish();
        Some(action)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn is_in_transaction(&self) -> bool {
        matches!(self.transaction, TransactionState::InTransaction { .. })
    }

    pub fn transaction(&self) -> &TransactionState {
        &self.transaction
    }

    pub fn undo_levels(&self) -> usize {
        self.undo_stack.len()
    }

    pub fn redo_levels(&self) -> usize {
        self.redo_stack.len()
    }

    /// Committed actions, oldest first
    pub fn undo_stack(&self) -> &[Action] {
        &self.undo_stack
    }

    /// Undone actions, oldest first
    pub fn redo_stack(&self) -> &[Action] {
        &self.redo_stack
    }

    /// Wire tag of the action the next undo would revert
    pub fn undo_label(&self) -> Option<&'static str> {
        self.undo_stack.last().map(Action::kind)
    }

    /// Wire tag of the action the next redo would reapply
    pub fn redo_label(&self) -> Option<&'static str> {
        self.redo_stack.last().map(Action::kind)
    }

    /// Drop all history, including any open transaction
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.transaction = TransactionState::NotInTransaction;
        self.publish();
    }

    pub fn status(&self) -> HistoryStatus {
        HistoryStatus {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
            in_transaction: self.is_in_transaction(),
        }
    }

    /// Receiver that observes `can_undo`/`can_redo`/`in_transaction`.
    pub fn subscribe(&self) -> watch::Receiver<HistoryStatus> {
        self.status.subscribe()
    }

    fn publish(&self) {
        let status = self.status();
        self.status.send_if_modified(|current| {
            if *current == status {
                return false;
            }
            *current = status;
            true
        });
    }
}

impl std::fmt::Debug for HistoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryManager")
            .field("undo_stack", &self.undo_stack)
            .field("redo_stack", &self.redo_stack)
            .field("transaction", &self.transaction)
            .field("max_levels", &self.max_levels)
            .finish_non_exhaustive()
    }
}
