//! # External Collaborators
//!
//! Interfaces the editor consumes but does not implement: the template-node
//! mapper (selector → source location), the diff service (requests → text
//! diffs) and the sandbox file layer.
//!
//! Every method may suspend, so the traits are async and object-safe; managers
//! hold them as `Arc<dyn ...>`.

use crate::code::CodeDiffRequest;
use crate::errors::ServiceError;
use crate::CodeDiff;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Line/column inside a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

/// Source span of an opening or closing JSX tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TemplateTag {
    pub start: Position,
    pub end: Position,
}

/// Pointer into source code for one rendered element.
///
/// Equality is structural, so two selectors that resolve to the same JSX
/// location (e.g. items rendered by one `map`) produce equal nodes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateNode {
    pub path: String,
    pub start_tag: TemplateTag,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_tag: Option<TemplateTag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl TemplateNode {
    /// Node whose opening tag starts at `line:column` in `path`.
    pub fn at(path: impl Into<String>, line: u32, column: u32) -> Self {
        let start = Position { line, column };
        Self {
            path: path.into(),
            start_tag: TemplateTag { start, end: start },
            end_tag: None,
            component: None,
        }
    }
}

/// Maps a preview element to the JSX that rendered it.
#[async_trait]
pub trait TemplateNodeMapper: Send + Sync {
    /// Resolve `selector` inside preview `webview_id`.
    ///
    /// Returns `None` when the element no longer exists or was never mapped.
    async fn resolve(&self, webview_id: &str, selector: &str) -> Option<TemplateNode>;
}

/// Turns structured edit requests into textual diffs.
#[async_trait]
pub trait DiffService: Send + Sync {
    /// One diff per request whose edits could be resolved; may return fewer
    /// diffs than requests.
    async fn compute_diffs(&self, requests: &[CodeDiffRequest]) -> Result<Vec<CodeDiff>, ServiceError>;
}

/// File access inside the remote sandbox.
#[async_trait]
pub trait SandboxFiles: Send + Sync {
    /// Current content of `path`, `None` when it does not exist. Fills the
    /// original side of computed diffs.
    async fn read_file(&self, path: &str) -> Result<Option<String>, ServiceError>;

    /// Returns `false` when the sandbox refused the write.
    async fn write_file(&self, path: &str, content: &str) -> Result<bool, ServiceError>;

    /// Post-move cleanup (formatting, stale id removal) for a batch of files.
    async fn clean_files(&self, paths: &[String]) -> Result<(), ServiceError>;
}

/// In-memory mapper keyed by `(webview id, selector)`.
///
/// JSON form: `{ "<webviewId>": { "<selector>": TemplateNode } }`.
#[derive(Debug, Default)]
pub struct StaticTemplateNodeMap {
    nodes: RwLock<HashMap<String, HashMap<String, TemplateNode>>>,
}

impl StaticTemplateNodeMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ServiceError> {
        let nodes: HashMap<String, HashMap<String, TemplateNode>> = serde_json::from_str(json)?;
        Ok(Self {
            nodes: RwLock::new(nodes),
        })
    }

    pub fn insert(&self, webview_id: impl Into<String>, selector: impl Into<String>, node: TemplateNode) {
        self.nodes
            .write()
            .entry(webview_id.into())
            .or_default()
            .insert(selector.into(), node);
    }

    pub fn remove(&self, webview_id: &str, selector: &str) -> Option<TemplateNode> {
        self.nodes.write().get_mut(webview_id)?.remove(selector)
    }

    pub fn get(&self, webview_id: &str, selector: &str) -> Option<TemplateNode> {
        self.nodes.read().get(webview_id)?.get(selector).cloned()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl TemplateNodeMapper for StaticTemplateNodeMap {
    async fn resolve(&self, webview_id: &str, selector: &str) -> Option<TemplateNode> {
        self.get(webview_id, selector)
    }
}
