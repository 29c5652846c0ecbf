//! Shared fakes for the editor integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use onlook_editor::{
    Action, ActionTargetWithSelector, Analytics, Change, CodeDiff, CodeDiffRequest, DiffService, EditorConfig,
    PreviewError, PreviewHandle, PreviewMessage, SandboxFiles, ServiceError, TemplateNode, UpdateStyleAction,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

/// In-memory sandbox recording every write and cleanup batch.
#[derive(Default)]
pub struct FakeSandbox {
    files: Mutex<BTreeMap<String, String>>,
    writes: Mutex<Vec<(String, String)>>,
    cleaned: Mutex<Vec<Vec<String>>>,
    rejected: Mutex<BTreeSet<String>>,
}

impl FakeSandbox {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_file(self: Arc<Self>, path: &str, content: &str) -> Arc<Self> {
        self.files.lock().insert(path.to_string(), content.to_string());
        self
    }

    /// Refuse every write to `path`.
    pub fn reject(&self, path: &str) {
        self.rejected.lock().insert(path.to_string());
    }

    pub fn file(&self, path: &str) -> Option<String> {
        self.files.lock().get(path).cloned()
    }

    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().clone()
    }

    pub fn written_contents(&self) -> Vec<String> {
        self.writes.lock().iter().map(|(_, content)| content.clone()).collect()
    }

    pub fn cleaned(&self) -> Vec<Vec<String>> {
        self.cleaned.lock().clone()
    }
}

#[async_trait]
impl SandboxFiles for FakeSandbox {
    async fn read_file(&self, path: &str) -> Result<Option<String>, ServiceError> {
        Ok(self.file(path))
    }

    async fn write_file(&self, path: &str, content: &str) -> Result<bool, ServiceError> {
        if self.rejected.lock().contains(path) {
            return Ok(false);
        }
        self.files.lock().insert(path.to_string(), content.to_string());
        self.writes.lock().push((path.to_string(), content.to_string()));
        Ok(true)
    }

    async fn clean_files(&self, paths: &[String]) -> Result<(), ServiceError> {
        self.cleaned.lock().push(paths.to_vec());
        Ok(())
    }
}

type DiffFn = dyn Fn(&CodeDiffRequest) -> Result<Option<CodeDiff>, ServiceError> + Send + Sync;

/// Diff service driven by a per-request closure, with an optional delay per
/// selector to provoke overlap between write cycles.
pub struct ScriptedDiffService {
    diff: Box<DiffFn>,
    delays: Mutex<BTreeMap<String, Duration>>,
    calls: Mutex<Vec<Vec<CodeDiffRequest>>>,
}

impl ScriptedDiffService {
    pub fn new<F>(diff: F) -> Arc<Self>
    where
        F: Fn(&CodeDiffRequest) -> Result<Option<CodeDiff>, ServiceError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            diff: Box::new(diff),
            delays: Mutex::new(BTreeMap::new()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// One diff per request: the request's className written to its node's
    /// file.
    pub fn class_names() -> Arc<Self> {
        Self::new(|request| {
            Ok(Some(CodeDiff {
                path: request.template_node.path.clone(),
                original: String::new(),
                generated: request.class_name().unwrap_or_default().to_string(),
            }))
        })
    }

    pub fn delay(&self, selector: &str, delay: Duration) {
        self.delays.lock().insert(selector.to_string(), delay);
    }

    pub fn calls(&self) -> Vec<Vec<CodeDiffRequest>> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl DiffService for ScriptedDiffService {
    async fn compute_diffs(&self, requests: &[CodeDiffRequest]) -> Result<Vec<CodeDiff>, ServiceError> {
        self.calls.lock().push(requests.to_vec());

        let delay = requests
            .iter()
            .filter_map(|r| self.delays.lock().get(&r.selector).copied())
            .max();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut diffs = Vec::new();
        for request in requests {
            if let Some(diff) = (self.diff)(request)? {
                diffs.push(diff);
            }
        }
        Ok(diffs)
    }
}

/// Line-based JSX editor over a [`FakeSandbox`]: inserted elements become
/// `<tag data-selector="..." />` lines before the parent's closing tag, and
/// removals drop the matching line.
pub struct JsxLineDiffService {
    sandbox: Arc<FakeSandbox>,
}

impl JsxLineDiffService {
    pub fn new(sandbox: Arc<FakeSandbox>) -> Arc<Self> {
        Arc::new(Self { sandbox })
    }
}

#[async_trait]
impl DiffService for JsxLineDiffService {
    async fn compute_diffs(&self, requests: &[CodeDiffRequest]) -> Result<Vec<CodeDiff>, ServiceError> {
        let mut diffs = Vec::new();

        for request in requests {
            let path = &request.template_node.path;
            let original = self
                .sandbox
                .read_file(path)
                .await?
                .ok_or_else(|| ServiceError::Other(format!("missing file {path}")))?;

            let mut lines: Vec<String> = original.lines().map(str::to_string).collect();

            for removed in &request.removed_elements {
                let marker = format!("data-selector=\"{}\"", removed.selector);
                lines.retain(|line| !line.contains(&marker));
            }

            let closing = lines
                .iter()
                .position(|line| line.trim_start().starts_with("</"))
                .unwrap_or(lines.len());
            for (offset, inserted) in request.inserted_elements.iter().enumerate() {
                let element = &inserted.element;
                lines.insert(
                    closing + offset,
                    format!("      <{} data-selector=\"{}\" />", element.tag_name, element.selector),
                );
            }

            let generated = lines.join("\n") + "\n";
            if generated != original {
                diffs.push(CodeDiff {
                    path: path.clone(),
                    original,
                    generated,
                });
            }
        }

        Ok(diffs)
    }
}

#[derive(Default)]
pub struct FakePreview {
    received: Mutex<Vec<PreviewMessage>>,
}

impl FakePreview {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn received(&self) -> Vec<PreviewMessage> {
        self.received.lock().clone()
    }

    pub fn refreshes(&self) -> usize {
        self.received
            .lock()
            .iter()
            .filter(|m| **m == PreviewMessage::CleanAfterWrite)
            .count()
    }
}

#[async_trait]
impl PreviewHandle for FakePreview {
    async fn send(&self, message: PreviewMessage) -> Result<(), PreviewError> {
        self.received.lock().push(message);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAnalytics {
    events: Mutex<Vec<String>>,
}

impl RecordingAnalytics {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }
}

impl Analytics for RecordingAnalytics {
    fn capture(&self, event: &str) {
        self.events.lock().push(event.to_string());
    }
}

pub const PAGE: &str = "app/page.tsx";

pub fn node(line: u32) -> TemplateNode {
    TemplateNode::at(PAGE, line, 4)
}

pub fn style(selector: &str, original: &str, updated: &str) -> Action {
    Action::UpdateStyle(UpdateStyleAction {
        targets: vec![ActionTargetWithSelector::new("w1", selector)],
        style: "color".to_string(),
        change: Change::new(original.to_string(), updated.to_string()),
    })
}

pub fn config() -> EditorConfig {
    EditorConfig::default()
}
