//! # Live Preview
//!
//! Translates actions into webview-targeted DOM mutation messages and sends
//! them to connected previews, fire-and-forget.
//!
//! Each message type has an explicit wire shape ([`PreviewMessage`]); only
//! plain data crosses the preview boundary.

use crate::action::{
    Action, ActionElement, ActionElementLocation, EditTextAction, ElementAction, GroupAction, ImageContent,
    MoveActionLocation, MoveElementAction, UpdateStyleAction,
};
use crate::errors::PreviewError;
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Message sent over a preview channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "channel", rename_all = "kebab-case")]
pub enum PreviewMessage {
    UpdateStyle {
        selector: String,
        style: String,
        value: String,
    },
    InsertElement {
        location: ActionElementLocation,
        element: ActionElement,
        styles: BTreeMap<String, String>,
    },
    RemoveElement {
        location: ActionElementLocation,
    },
    MoveElement {
        selector: String,
        location: MoveActionLocation,
    },
    EditText {
        selector: String,
        content: String,
    },
    GroupElements {
        location: ActionElementLocation,
        container: ActionElement,
        children: Vec<String>,
    },
    UngroupElements {
        location: ActionElementLocation,
        container: ActionElement,
        children: Vec<String>,
    },
    InsertImage {
        selector: String,
        image: ImageContent,
    },
    RemoveImage {
        selector: String,
    },
    /// Source was rewritten; previews re-sync element ids with the new code.
    CleanAfterWrite,
}

impl PreviewMessage {
    pub fn update_style(selector: &str, action: &UpdateStyleAction) -> Self {
        Self::UpdateStyle {
            selector: selector.to_string(),
            style: action.style.clone(),
            value: action.change.updated.clone(),
        }
    }

    pub fn insert_element(action: &ElementAction) -> Self {
        Self::InsertElement {
            location: action.location.clone(),
            element: action.element.clone(),
            styles: action.styles.clone(),
        }
    }

    pub fn remove_element(action: &ElementAction) -> Self {
        Self::RemoveElement {
            location: action.location.clone(),
        }
    }

    pub fn move_element(selector: &str, action: &MoveElementAction) -> Self {
        Self::MoveElement {
            selector: selector.to_string(),
            location: action.location.clone(),
        }
    }

    pub fn edit_text(selector: &str, action: &EditTextAction) -> Self {
        Self::EditText {
            selector: selector.to_string(),
            content: action.new_content.clone(),
        }
    }

    fn group_parts(action: &GroupAction, webview_id: &str) -> (ActionElementLocation, ActionElement, Vec<String>) {
        let children = action
            .targets
            .iter()
            .filter(|t| t.webview_id == webview_id)
            .map(|t| t.selector.clone())
            .collect();
        (action.location.clone(), action.container.clone(), children)
    }

    pub fn group_elements(action: &GroupAction, webview_id: &str) -> Self {
        let (location, container, children) = Self::group_parts(action, webview_id);
        Self::GroupElements {
            location,
            container,
            children,
        }
    }

    pub fn ungroup_elements(action: &GroupAction, webview_id: &str) -> Self {
        let (location, container, children) = Self::group_parts(action, webview_id);
        Self::UngroupElements {
            location,
            container,
            children,
        }
    }

    /// Wire name of the message channel.
    pub fn channel(&self) -> &'static str {
        match self {
            Self::UpdateStyle { .. } => "update-style",
            Self::InsertElement { .. } => "insert-element",
            Self::RemoveElement { .. } => "remove-element",
            Self::MoveElement { .. } => "move-element",
            Self::EditText { .. } => "edit-text",
            Self::GroupElements { .. } => "group-elements",
            Self::UngroupElements { .. } => "ungroup-elements",
            Self::InsertImage { .. } => "insert-image",
            Self::RemoveImage { .. } => "remove-image",
            Self::CleanAfterWrite => "clean-after-write",
        }
    }
}

/// Messages an action produces, paired with the webview each is addressed to.
pub fn preview_messages(action: &Action) -> Vec<(String, PreviewMessage)> {
    match action {
        Action::UpdateStyle(action) => action
            .targets
            .iter()
            .map(|t| (t.webview_id.clone(), PreviewMessage::update_style(&t.selector, action)))
            .collect(),
        Action::InsertElement(action) => action
            .targets
            .iter()
            .map(|t| (t.webview_id.clone(), PreviewMessage::insert_element(action)))
            .collect(),
        Action::RemoveElement(action) => action
            .targets
            .iter()
            .map(|t| (t.webview_id.clone(), PreviewMessage::remove_element(action)))
            .collect(),
        Action::MoveElement(action) => action
            .targets
            .iter()
            .map(|t| (t.webview_id.clone(), PreviewMessage::move_element(&t.selector, action)))
            .collect(),
        Action::EditText(action) => action
            .targets
            .iter()
            .map(|t| (t.webview_id.clone(), PreviewMessage::edit_text(&t.selector, action)))
            .collect(),
        Action::GroupElements(group) => action
            .webview_ids()
            .into_iter()
            .map(|id| (id.to_string(), PreviewMessage::group_elements(group, id)))
            .collect(),
        Action::UngroupElements(group) => action
            .webview_ids()
            .into_iter()
            .map(|id| (id.to_string(), PreviewMessage::ungroup_elements(group, id)))
            .collect(),
        Action::InsertImage(action) => action
            .targets
            .iter()
            .map(|t| {
                let message = PreviewMessage::InsertImage {
                    selector: t.selector.clone(),
                    image: action.image.clone(),
                };
                (t.webview_id.clone(), message)
            })
            .collect(),
        Action::RemoveImage(action) => action
            .targets
            .iter()
            .map(|t| {
                let message = PreviewMessage::RemoveImage {
                    selector: t.selector.clone(),
                };
                (t.webview_id.clone(), message)
            })
            .collect(),
        Action::WriteCode(_) => Vec::new(),
    }
}

/// Channel into one live preview instance.
#[async_trait]
pub trait PreviewHandle: Send + Sync {
    async fn send(&self, message: PreviewMessage) -> Result<(), PreviewError>;
}

/// Connected previews keyed by webview id.
#[derive(Default)]
pub struct PreviewRegistry {
    previews: RwLock<HashMap<String, Arc<dyn PreviewHandle>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, webview_id: impl Into<String>, preview: Arc<dyn PreviewHandle>) {
        self.previews.write().insert(webview_id.into(), preview);
    }

    pub fn unregister(&self, webview_id: &str) -> Option<Arc<dyn PreviewHandle>> {
        self.previews.write().remove(webview_id)
    }

    pub fn get(&self, webview_id: &str) -> Option<Arc<dyn PreviewHandle>> {
        self.previews.read().get(webview_id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.previews.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.previews.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.previews.read().is_empty()
    }

    /// Send `message` to every connected preview.
    pub async fn broadcast(&self, message: PreviewMessage) {
        let previews: Vec<(String, Arc<dyn PreviewHandle>)> = self
            .previews
            .read()
            .iter()
            .map(|(id, preview)| (id.clone(), Arc::clone(preview)))
            .collect();

        for (webview_id, preview) in previews {
            if let Err(err) = preview.send(message.clone()).await {
                tracing::warn!(webview_id = %webview_id, channel = message.channel(), error = %err, "preview broadcast failed");
            }
        }
    }
}

impl std::fmt::Debug for PreviewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviewRegistry").field("previews", &self.ids()).finish()
    }
}

/// Applies actions to the live previews they target.
#[derive(Debug, Clone)]
pub struct LivePreviewDispatcher {
    registry: Arc<PreviewRegistry>,
}

impl LivePreviewDispatcher {
    pub fn new(registry: Arc<PreviewRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<PreviewRegistry> {
        &self.registry
    }

    /// Send every message for `action`. Targets whose preview is gone are
    /// skipped; send failures are logged. Returns the number delivered.
    pub async fn dispatch(&self, action: &Action) -> usize {
        let mut delivered = 0;

        for (webview_id, message) in preview_messages(action) {
            let Some(preview) = self.registry.get(&webview_id) else {
                tracing::debug!(webview_id = %webview_id, kind = action.kind(), "preview not connected, skipping target");
                continue;
            };

            let channel = message.channel();
            match preview.send(message).await {
                Ok(()) => delivered += 1,
                Err(err) => tracing::warn!(webview_id = %webview_id, channel, error = %err, "failed to dispatch to preview"),
            }
        }

        delivered
    }
}
