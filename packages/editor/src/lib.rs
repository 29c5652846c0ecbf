//! # Onlook Editor
//!
//! Action, history and code synchronization engine for the Onlook visual
//! editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ action_manager: run / undo / redo           │
//! └─────────────────────────────────────────────┘
//!          ↓ push                     ↓ dispatch
//! ┌──────────────────────────┐  ┌───────────────────────────┐
//! │ history: undo/redo stacks│  │ preview: per-webview DOM  │
//! │  + transactions          │  │  mutation messages        │
//! └──────────────────────────┘  └───────────────────────────┘
//!          ↓ write (FIFO)
//! ┌─────────────────────────────────────────────┐
//! │ code: write queue                           │
//! │  - actions → diff requests (per template    │
//! │    node)                                    │
//! │  - diff service → sandbox file writes       │
//! │  - delayed preview refresh, move cleanup    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Actions are self-inverting**: undo never consults DOM or source state
//! 2. **History order is truth**: code writes happen in commit order
//! 3. **Optimistic previews**: previews update immediately, source catches up
//! 4. **Failures stay local**: an unresolved target or failed write never
//!    stops the rest of the pipeline
//!
//! ## Usage
//!
//! ```rust,ignore
//! use onlook_editor::{Editor, EditorConfig, EditorServices};
//!
//! let editor = Editor::new(EditorConfig::default(), services);
//! editor.previews().register("webview-1", preview);
//!
//! editor.run(action).await;
//! let inverse = editor.undo().await;
//!
//! // Source-only edits go through history as `write-code`
//! editor.run_code_diffs(&requests).await?;
//!
//! // Wait for source writes before shutting down
//! editor.flush().await;
//! ```

pub mod action;
mod action_manager;
mod analytics;
pub mod code;
mod config;
mod errors;
mod history;
pub mod preview;
pub mod services;

pub use action::{
    invert, Action, ActionElement, ActionElementLocation, ActionTarget, ActionTargetWithSelector, Change, CodeDiff,
    EditTextAction, ElementAction, GroupAction, GroupActionTarget, ImageAction, ImageContent, InsertPosition,
    MoveActionLocation, MoveElementAction, UpdateStyleAction, WriteCodeAction,
};
pub use action_manager::ActionManager;
pub use analytics::{Analytics, NoopAnalytics, TracingAnalytics};
pub use code::{CodeDiffRequest, CodeManager, CodeWriter, SyncFailure};
pub use config::{EditorConfig, DEFAULT_CONFIG_NAME};
pub use errors::{ConfigError, EditorError, EditorResult, PreviewError, ServiceError};
pub use history::{HistoryManager, HistoryStatus, TransactionState};
pub use preview::{LivePreviewDispatcher, PreviewHandle, PreviewMessage, PreviewRegistry};
pub use services::{DiffService, SandboxFiles, StaticTemplateNodeMap, TemplateNode, TemplateNodeMapper};

use std::sync::Arc;
use tokio::sync::watch;

/// External collaborators the editor is wired to.
#[derive(Clone)]
pub struct EditorServices {
    pub mapper: Arc<dyn TemplateNodeMapper>,
    pub diffs: Arc<dyn DiffService>,
    pub sandbox: Arc<dyn SandboxFiles>,
    pub analytics: Arc<dyn Analytics>,
}

impl EditorServices {
    /// Services with analytics recorded through `tracing`.
    pub fn new(
        mapper: Arc<dyn TemplateNodeMapper>,
        diffs: Arc<dyn DiffService>,
        sandbox: Arc<dyn SandboxFiles>,
    ) -> Self {
        Self {
            mapper,
            diffs,
            sandbox,
            analytics: Arc::new(TracingAnalytics),
        }
    }

    pub fn with_analytics(mut self, analytics: Arc<dyn Analytics>) -> Self {
        self.analytics = analytics;
        self
    }
}

/// One editing session: history, previews and the code write queue.
///
/// Dropping the editor disposes its code manager (queued writes and pending
/// move cleanup are cancelled); call [`Editor::flush`] first to keep them.
pub struct Editor {
    config: EditorConfig,
    previews: Arc<PreviewRegistry>,
    code: CodeManager,
    actions: ActionManager,
}

impl Editor {
    pub fn new(config: EditorConfig, services: EditorServices) -> Self {
        let previews = Arc::new(PreviewRegistry::new());
        let code = CodeManager::new(
            &config,
            services.mapper,
            services.diffs,
            services.sandbox,
            Arc::clone(&previews),
            Arc::clone(&services.analytics),
        );
        let actions = ActionManager::new(
            &config,
            LivePreviewDispatcher::new(Arc::clone(&previews)),
            Arc::new(code.clone()),
            services.analytics,
        );

        Self {
            config,
            previews,
            code,
            actions,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn previews(&self) -> &Arc<PreviewRegistry> {
        &self.previews
    }

    pub fn actions(&self) -> &ActionManager {
        &self.actions
    }

    pub fn code(&self) -> &CodeManager {
        &self.code
    }

    pub async fn run(&self, action: Action) {
        self.actions.run(action).await;
    }

    pub async fn undo(&self) -> Option<Action> {
        self.actions.undo().await
    }

    pub async fn redo(&self) -> Option<Action> {
        self.actions.redo().await
    }

    pub fn start_transaction(&self) {
        self.actions.start_transaction();
    }

    pub fn commit_transaction(&self) {
        self.actions.commit_transaction();
    }

    pub fn can_undo(&self) -> bool {
        self.actions.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.actions.can_redo()
    }

    pub fn is_in_transaction(&self) -> bool {
        self.actions.is_in_transaction()
    }

    pub fn subscribe(&self) -> watch::Receiver<HistoryStatus> {
        self.actions.subscribe()
    }

    /// Wait for every queued code write to finish.
    pub async fn flush(&self) {
        self.code.flush().await;
    }

    pub fn take_failures(&self) -> Vec<SyncFailure> {
        self.code.take_failures()
    }

    /// Compute diffs for `requests` and apply them through history as one
    /// `write-code` action, so the source edit can be undone like any other.
    pub async fn run_code_diffs(&self, requests: &[CodeDiffRequest]) -> EditorResult<()> {
        let diffs = self.code.get_code_diffs(requests).await?;
        if diffs.is_empty() {
            return Err(EditorError::EmptyDiff("write-code"));
        }
        tracing::debug!(requests = requests.len(), files = diffs.len(), "running computed code diffs");
        self.actions.run(Action::WriteCode(WriteCodeAction { diffs })).await;
        Ok(())
    }
}

impl Drop for Editor {
    fn drop(&mut self) {
        self.code.dispose();
    }
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("config", &self.config)
            .field("previews", &self.previews)
            .field("code", &self.code)
            .field("actions", &self.actions)
            .finish()
    }
}
