//! # Code Diff Requests
//!
//! Translates actions into per-template-node edit requests for the diff
//! service.
//!
//! Requests are keyed by [`TemplateNode`] (a source location), not by
//! selector: repeated elements rendered from one JSX location share a
//! request. The aggregation map lives only for one
//! [`get_code_diff_requests`] call.
//!
//! Targets whose selector no longer resolves are skipped one by one; the
//! rest of the batch is still translated.

use super::tailwind;
use crate::action::{
    Action, ActionElement, ActionElementLocation, ActionTargetWithSelector, EditTextAction, ElementAction,
    GroupAction, ImageAction, ImageContent, InsertPosition, MoveActionLocation, MoveElementAction, UpdateStyleAction,
};
use crate::services::{TemplateNode, TemplateNodeMapper};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const CLASS_NAME: &str = "className";

/// Element to insert under the request's template node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeInsert {
    /// Styles already folded into `attributes.className`
    pub element: ActionElement,
    pub position: InsertPosition,
}

/// Child to remove from the request's template node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeRemove {
    pub selector: String,
    pub position: InsertPosition,
    /// Source location of the removed child, when it still resolves
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<TemplateNode>,
}

/// Child relocated within the request's template node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeMove {
    /// Source location of the moved child itself
    pub node: TemplateNode,
    pub location: MoveActionLocation,
}

/// Children wrapped into (or released from) a container element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeGroup {
    pub container: ActionElement,
    pub position: InsertPosition,
    pub children: Vec<TemplateNode>,
}

/// Every pending edit for one template node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeDiffRequest {
    /// Selector that first referenced the node in this batch
    pub selector: String,
    pub template_node: TemplateNode,
    pub inserted_elements: Vec<CodeInsert>,
    pub moved_elements: Vec<CodeMove>,
    pub removed_elements: Vec<CodeRemove>,
    pub group_elements: Vec<CodeGroup>,
    pub ungroup_elements: Vec<CodeGroup>,
    /// Images set on the node itself
    #[serde(default)]
    pub inserted_images: Vec<ImageContent>,
    #[serde(default)]
    pub removed_images: Vec<ImageContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_content: Option<String>,
    pub attributes: BTreeMap<String, String>,
}

impl CodeDiffRequest {
    pub fn new(template_node: TemplateNode, selector: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            template_node,
            inserted_elements: Vec::new(),
            moved_elements: Vec::new(),
            removed_elements: Vec::new(),
            group_elements: Vec::new(),
            ungroup_elements: Vec::new(),
            inserted_images: Vec::new(),
            removed_images: Vec::new(),
            text_content: None,
            attributes: BTreeMap::new(),
        }
    }

    pub fn class_name(&self) -> Option<&str> {
        self.attributes.get(CLASS_NAME).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.inserted_elements.is_empty()
            && self.moved_elements.is_empty()
            && self.removed_elements.is_empty()
            && self.group_elements.is_empty()
            && self.ungroup_elements.is_empty()
            && self.inserted_images.is_empty()
            && self.removed_images.is_empty()
            && self.text_content.is_none()
            && self.attributes.is_empty()
    }

    /// Fold a style change into `attributes.className`.
    pub fn apply_style(&mut self, property: &str, value: &str) {
        let existing = self.class_name().unwrap_or_default();
        let merged = tailwind::apply_style(existing, property, value);
        self.attributes.insert(CLASS_NAME.to_string(), merged);
    }
}

/// Per-batch aggregation map, in first-touched order.
pub type RequestMap = IndexMap<TemplateNode, CodeDiffRequest>;

/// Look up the request for `template_node`, creating an empty one on first
/// touch.
pub fn get_or_create_code_diff_request<'m>(
    template_node: TemplateNode,
    selector: &str,
    map: &'m mut RequestMap,
) -> &'m mut CodeDiffRequest {
    map.entry(template_node.clone())
        .or_insert_with(|| CodeDiffRequest::new(template_node, selector))
}

/// Build diff requests for a batch of actions.
///
/// `write-code` actions carry finished diffs and contribute nothing here.
pub async fn get_code_diff_requests(mapper: &dyn TemplateNodeMapper, actions: &[Action]) -> Vec<CodeDiffRequest> {
    let mut map = RequestMap::new();

    for action in actions {
        match action {
            Action::UpdateStyle(action) => add_style(mapper, action, &mut map).await,
            Action::InsertElement(action) => add_insert(mapper, action, &mut map).await,
            Action::RemoveElement(action) => add_remove(mapper, action, &mut map).await,
            Action::MoveElement(action) => add_move(mapper, action, &mut map).await,
            Action::EditText(action) => add_text(mapper, action, &mut map).await,
            Action::GroupElements(action) => {
                for (node, selector, group) in collect_group(mapper, action).await {
                    let request = get_or_create_code_diff_request(node, &selector, &mut map);
                    push_unique(&mut request.group_elements, group);
                }
            }
            Action::UngroupElements(action) => {
                for (node, selector, group) in collect_group(mapper, action).await {
                    let request = get_or_create_code_diff_request(node, &selector, &mut map);
                    push_unique(&mut request.ungroup_elements, group);
                }
            }
            Action::InsertImage(action) => {
                for (node, selector) in resolve_image_targets(mapper, action).await {
                    let request = get_or_create_code_diff_request(node, &selector, &mut map);
                    push_unique(&mut request.inserted_images, action.image.clone());
                }
            }
            Action::RemoveImage(action) => {
                for (node, selector) in resolve_image_targets(mapper, action).await {
                    let request = get_or_create_code_diff_request(node, &selector, &mut map);
                    push_unique(&mut request.removed_images, action.image.clone());
                }
            }
            Action::WriteCode(_) => {}
        }
    }

    map.into_values().collect()
}

async fn resolve_target(mapper: &dyn TemplateNodeMapper, target: &ActionTargetWithSelector) -> Option<TemplateNode> {
    resolve(mapper, &target.webview_id, &target.selector).await
}

async fn resolve(mapper: &dyn TemplateNodeMapper, webview_id: &str, selector: &str) -> Option<TemplateNode> {
    let node = mapper.resolve(webview_id, selector).await;
    if node.is_none() {
        tracing::debug!(webview_id, selector, "no template node for selector, skipping target");
    }
    node
}

async fn add_style(mapper: &dyn TemplateNodeMapper, action: &UpdateStyleAction, map: &mut RequestMap) {
    for target in &action.targets {
        let Some(node) = resolve_target(mapper, target).await else {
            continue;
        };
        let request = get_or_create_code_diff_request(node, &target.selector, map);
        request.apply_style(&action.style, &action.change.updated);
    }
}

async fn add_insert(mapper: &dyn TemplateNodeMapper, action: &ElementAction, map: &mut RequestMap) {
    let ActionElementLocation {
        target_selector,
        position,
    } = &action.location;

    for target in &action.targets {
        let Some(parent) = resolve(mapper, &target.webview_id, target_selector).await else {
            continue;
        };
        let insert = CodeInsert {
            element: to_code_element(&action.element, &action.styles),
            position: position.clone(),
        };
        let request = get_or_create_code_diff_request(parent, target_selector, map);
        push_unique(&mut request.inserted_elements, insert);
    }
}

async fn add_remove(mapper: &dyn TemplateNodeMapper, action: &ElementAction, map: &mut RequestMap) {
    let ActionElementLocation {
        target_selector,
        position,
    } = &action.location;

    for target in &action.targets {
        let Some(parent) = resolve(mapper, &target.webview_id, target_selector).await else {
            continue;
        };
        let remove = CodeRemove {
            selector: action.element.selector.clone(),
            position: position.clone(),
            node: mapper.resolve(&target.webview_id, &action.element.selector).await,
        };
        let request = get_or_create_code_diff_request(parent, target_selector, map);
        push_unique(&mut request.removed_elements, remove);
    }
}

async fn add_move(mapper: &dyn TemplateNodeMapper, action: &MoveElementAction, map: &mut RequestMap) {
    let location = &action.location;

    for target in &action.targets {
        let Some(parent) = resolve(mapper, &target.webview_id, &location.target_selector).await else {
            continue;
        };
        let Some(child) = resolve_target(mapper, target).await else {
            continue;
        };
        let moved = CodeMove {
            node: child,
            location: location.clone(),
        };
        let request = get_or_create_code_diff_request(parent, &location.target_selector, map);
        push_unique(&mut request.moved_elements, moved);
    }
}

async fn add_text(mapper: &dyn TemplateNodeMapper, action: &EditTextAction, map: &mut RequestMap) {
    for target in &action.targets {
        let Some(node) = resolve_target(mapper, target).await else {
            continue;
        };
        let request = get_or_create_code_diff_request(node, &target.selector, map);
        request.text_content = Some(action.new_content.clone());
    }
}

async fn resolve_image_targets(mapper: &dyn TemplateNodeMapper, action: &ImageAction) -> Vec<(TemplateNode, String)> {
    let mut resolved = Vec::new();
    for target in &action.targets {
        if let Some(node) = resolve_target(mapper, target).await {
            resolved.push((node, target.selector.clone()));
        }
    }
    resolved
}

/// Resolve a group/ungroup per preview: the parent must resolve, and only the
/// children that resolve are carried along.
async fn collect_group(mapper: &dyn TemplateNodeMapper, action: &GroupAction) -> Vec<(TemplateNode, String, CodeGroup)> {
    let location = &action.location;
    let mut webviews: Vec<&str> = Vec::new();
    for target in &action.targets {
        if !webviews.contains(&target.webview_id.as_str()) {
            webviews.push(&target.webview_id);
        }
    }

    let mut groups = Vec::new();
    for webview_id in webviews {
        let Some(parent) = resolve(mapper, webview_id, &location.target_selector).await else {
            continue;
        };

        let mut children = Vec::new();
        for child in action.targets.iter().filter(|t| t.webview_id == webview_id) {
            if let Some(node) = resolve_target(mapper, child).await {
                children.push(node);
            }
        }
        if children.is_empty() {
            tracing::debug!(webview_id, "no group children resolved, skipping");
            continue;
        }

        let group = CodeGroup {
            container: to_code_element(&action.container, &BTreeMap::new()),
            position: location.position.clone(),
            children,
        };
        groups.push((parent, location.target_selector.clone(), group));
    }
    groups
}

/// Copy an element for source insertion, folding its styles (and `extra`)
/// into `className`, recursively.
fn to_code_element(element: &ActionElement, extra: &BTreeMap<String, String>) -> ActionElement {
    let existing = element.attributes.get(CLASS_NAME).map(String::as_str).unwrap_or_default();
    let class_name = tailwind::apply_styles(existing, element.styles.iter().chain(extra.iter()));

    let mut attributes = element.attributes.clone();
    if class_name.is_empty() {
        attributes.remove(CLASS_NAME);
    } else {
        attributes.insert(CLASS_NAME.to_string(), class_name);
    }

    ActionElement {
        tag_name: element.tag_name.clone(),
        selector: element.selector.clone(),
        attributes,
        styles: BTreeMap::new(),
        text_content: element.text_content.clone(),
        children: element
            .children
            .iter()
            .map(|child| to_code_element(child, &BTreeMap::new()))
            .collect(),
    }
}

/// The same edit reached through two previews is recorded once.
fn push_unique<T: PartialEq>(items: &mut Vec<T>, item: T) {
    if !items.contains(&item) {
        items.push(item);
    }
}
