//! # Editor Actions
//!
//! Typed records of every reversible visual edit.
//!
//! ## Design Principles
//!
//! 1. **Self-inverting**: every variant carries enough data to build its own
//!    inverse without looking at the live DOM or the source files
//! 2. **Plain data**: actions are `Serialize`/`Deserialize` and hold no
//!    handles, so they can be logged, replayed and sent across processes
//! 3. **Closed set**: `Action` is an enum and every consumer matches on it
//!    exhaustively, so a new variant fails to compile until the inverter,
//!    the preview dispatcher and the diff-request builder all handle it
//!
//! ## Inversion
//!
//! | Action             | Inverse                                  |
//! |--------------------|------------------------------------------|
//! | `update-style`     | same targets and key, change swapped     |
//! | `insert-element`   | `remove-element` with the same payload   |
//! | `remove-element`   | `insert-element` with the same payload   |
//! | `move-element`     | `index` and `originalIndex` swapped      |
//! | `edit-text`        | original and new content swapped         |
//! | `group-elements`   | `ungroup-elements` with the same payload |
//! | `ungroup-elements` | `group-elements` with the same payload   |
//! | `write-code`       | every diff's original/generated swapped  |
//! | `insert-image`     | `remove-image` with the same payload     |
//! | `remove-image`     | `insert-image` with the same payload     |

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Identifies the live preview an edit applies to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTarget {
    pub webview_id: String,
}

/// A preview plus an element locator inside it.
///
/// Selectors are only meaningful at the moment they are resolved; they are
/// looked up again every time an action is applied or written to code.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionTargetWithSelector {
    pub webview_id: String,
    pub selector: String,
}

/// A child element taking part in a group/ungroup.
pub type GroupActionTarget = ActionTargetWithSelector;

impl ActionTargetWithSelector {
    pub fn new(webview_id: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            webview_id: webview_id.into(),
            selector: selector.into(),
        }
    }

    /// Drop the selector, keeping only the preview reference.
    pub fn target(&self) -> ActionTarget {
        ActionTarget {
            webview_id: self.webview_id.clone(),
        }
    }
}

impl ActionTarget {
    pub fn new(webview_id: impl Into<String>) -> Self {
        Self {
            webview_id: webview_id.into(),
        }
    }
}

/// Before/after pair for a single value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change<T> {
    pub original: T,
    pub updated: T,
}

impl<T: Clone> Change<T> {
    pub fn new(original: T, updated: T) -> Self {
        Self { original, updated }
    }

    pub fn reverse(&self) -> Self {
        Self {
            original: self.updated.clone(),
            updated: self.original.clone(),
        }
    }
}

/// Where an element sits inside its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "index", rename_all = "kebab-case")]
pub enum InsertPosition {
    Append,
    Prepend,
    Index(usize),
}

/// Parent element plus position, used by insert/remove/group/ungroup.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionElementLocation {
    /// Selector of the parent element
    pub target_selector: String,
    pub position: InsertPosition,
}

/// Parent element plus the new and previous child index of a moved element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveActionLocation {
    pub target_selector: String,
    pub index: usize,
    pub original_index: usize,
}

impl MoveActionLocation {
    pub fn reverse(&self) -> Self {
        Self {
            target_selector: self.target_selector.clone(),
            index: self.original_index,
            original_index: self.index,
        }
    }
}

/// Recursive description of an element to create in the preview and in code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionElement {
    pub tag_name: String,
    /// Selector the element answers to once it exists in the preview
    pub selector: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    #[serde(default)]
    pub children: Vec<ActionElement>,
}

impl ActionElement {
    pub fn new(tag_name: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            selector: selector.into(),
            attributes: BTreeMap::new(),
            styles: BTreeMap::new(),
            text_content: None,
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_style(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.styles.insert(property.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text_content = Some(text.into());
        self
    }

    pub fn with_child(mut self, child: ActionElement) -> Self {
        self.children.push(child);
        self
    }
}

/// Change one CSS property on one or more elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStyleAction {
    pub targets: Vec<ActionTargetWithSelector>,
    /// CSS property name
    pub style: String,
    pub change: Change<String>,
}

/// Payload shared by insert-element and remove-element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementAction {
    pub targets: Vec<ActionTarget>,
    pub location: ActionElementLocation,
    pub element: ActionElement,
    #[serde(default)]
    pub styles: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveElementAction {
    pub targets: Vec<ActionTargetWithSelector>,
    pub location: MoveActionLocation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTextAction {
    pub targets: Vec<ActionTargetWithSelector>,
    pub original_content: String,
    pub new_content: String,
}

/// Payload shared by group-elements and ungroup-elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAction {
    /// Children wrapped by (or released from) the container
    pub targets: Vec<GroupActionTarget>,
    /// Parent of the container
    pub location: ActionElementLocation,
    pub container: ActionElement,
}

/// A pre-computed textual change to one source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeDiff {
    pub path: String,
    pub original: String,
    pub generated: String,
}

impl CodeDiff {
    pub fn reverse(&self) -> Self {
        Self {
            path: self.path.clone(),
            original: self.generated.clone(),
            generated: self.original.clone(),
        }
    }
}

/// Write already-computed diffs straight to source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteCodeAction {
    pub diffs: Vec<CodeDiff>,
}

/// Image file dropped onto (or taken off) an element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageContent {
    pub file_name: String,
    pub mime_type: String,
    /// Base64 data URL of the image
    pub content: String,
    /// Where the file already lives in the project, if it came from there
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin_path: Option<String>,
}

/// Payload shared by insert-image and remove-image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAction {
    pub targets: Vec<ActionTargetWithSelector>,
    pub image: ImageContent,
}

/// Every reversible edit the editor knows about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Action {
    UpdateStyle(UpdateStyleAction),
    InsertElement(ElementAction),
    RemoveElement(ElementAction),
    MoveElement(MoveElementAction),
    EditText(EditTextAction),
    GroupElements(GroupAction),
    UngroupElements(GroupAction),
    WriteCode(WriteCodeAction),
    InsertImage(ImageAction),
    RemoveImage(ImageAction),
}

impl Action {
    /// Build the action that undoes this one.
    ///
    /// Pure: only the action's own payload is consulted.
    pub fn inverse(&self) -> Action {
        match self {
            Action::UpdateStyle(action) => Action::UpdateStyle(UpdateStyleAction {
                targets: action.targets.clone(),
                style: action.style.clone(),
                change: action.change.reverse(),
            }),
            Action::InsertElement(action) => Action::RemoveElement(action.clone()),
            Action::RemoveElement(action) => Action::InsertElement(action.clone()),
            Action::MoveElement(action) => Action::MoveElement(MoveElementAction {
                targets: action.targets.clone(),
                location: action.location.reverse(),
            }),
            Action::EditText(action) => Action::EditText(EditTextAction {
                targets: action.targets.clone(),
                original_content: action.new_content.clone(),
                new_content: action.original_content.clone(),
            }),
            Action::GroupElements(action) => Action::UngroupElements(action.clone()),
            Action::UngroupElements(action) => Action::GroupElements(action.clone()),
            Action::WriteCode(action) => Action::WriteCode(WriteCodeAction {
                diffs: action.diffs.iter().map(CodeDiff::reverse).collect(),
            }),
            Action::InsertImage(action) => Action::RemoveImage(action.clone()),
            Action::RemoveImage(action) => Action::InsertImage(action.clone()),
        }
    }

    /// Wire tag of this variant (`"update-style"`, ...).
    pub fn kind(&self) -> &'static str {
        match self {
            Action::UpdateStyle(_) => "update-style",
            Action::InsertElement(_) => "insert-element",
            Action::RemoveElement(_) => "remove-element",
            Action::MoveElement(_) => "move-element",
            Action::EditText(_) => "edit-text",
            Action::GroupElements(_) => "group-elements",
            Action::UngroupElements(_) => "ungroup-elements",
            Action::WriteCode(_) => "write-code",
            Action::InsertImage(_) => "insert-image",
            Action::RemoveImage(_) => "remove-image",
        }
    }

    /// Analytics event emitted when this action is committed to history.
    pub fn analytics_event(&self) -> &'static str {
        match self {
            Action::UpdateStyle(_) => "style action",
            Action::InsertElement(_) => "insert element action",
            Action::RemoveElement(_) => "remove element action",
            Action::MoveElement(_) => "move element action",
            Action::EditText(_) => "edit text action",
            Action::GroupElements(_) => "group elements action",
            Action::UngroupElements(_) => "ungroup elements action",
            Action::WriteCode(_) => "write code action",
            Action::InsertImage(_) => "insert image action",
            Action::RemoveImage(_) => "remove image action",
        }
    }

    /// Previews touched by this action, in first-seen order.
    pub fn webview_ids(&self) -> Vec<&str> {
        let ids: Vec<&str> = match self {
            Action::UpdateStyle(a) => a.targets.iter().map(|t| t.webview_id.as_str()).collect(),
            Action::InsertElement(a) | Action::RemoveElement(a) => {
                a.targets.iter().map(|t| t.webview_id.as_str()).collect()
            }
            Action::MoveElement(a) => a.targets.iter().map(|t| t.webview_id.as_str()).collect(),
            Action::EditText(a) => a.targets.iter().map(|t| t.webview_id.as_str()).collect(),
            Action::GroupElements(a) | Action::UngroupElements(a) => {
                a.targets.iter().map(|t| t.webview_id.as_str()).collect()
            }
            Action::InsertImage(a) | Action::RemoveImage(a) => {
                a.targets.iter().map(|t| t.webview_id.as_str()).collect()
            }
            Action::WriteCode(_) => Vec::new(),
        };

        let mut unique = Vec::with_capacity(ids.len());
        for id in ids {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        unique
    }
}

/// Free-function form of [`Action::inverse`].
pub fn invert(action: &Action) -> Action {
    action.inverse()
}
