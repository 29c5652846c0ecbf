pub mod history;
pub mod init;
pub mod invert;
pub mod requests;

pub use history::{history, HistoryArgs};
pub use init::{init, InitArgs};
pub use invert::{invert, InvertArgs};
pub use requests::{requests, RequestsArgs};

use anyhow::{Context, Result};
use onlook_editor::Action;
use std::fs;
use std::path::Path;

/// Read an action log: a JSON array of actions, or a single action.
pub fn load_actions(path: &Path) -> Result<Vec<Action>> {
    let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_actions(&content).with_context(|| format!("Invalid action log {}", path.display()))
}

pub fn parse_actions(content: &str) -> Result<Vec<Action>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let actions = if value.is_array() {
        serde_json::from_value(value)?
    } else {
        vec![serde_json::from_value(value)?]
    };
    Ok(actions)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STYLE: &str = r##"{
        "type": "update-style",
        "targets": [{ "webviewId": "w1", "selector": "#a" }],
        "style": "color",
        "change": { "original": "#000", "updated": "#fff" }
    }"##;

    #[test]
    fn test_parse_single_action_and_array() {
        assert_eq!(parse_actions(STYLE).unwrap().len(), 1);
        assert_eq!(parse_actions(&format!("[{STYLE}, {STYLE}]")).unwrap().len(), 2);
    }

    #[test]
    fn test_parse_rejects_unknown_type() {
        let err = parse_actions(r#"{ "type": "teleport-element" }"#).unwrap_err();
        assert!(err.to_string().contains("teleport-element"));
    }

    #[test]
    fn test_load_actions_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("actions.json");
        fs::write(&path, "not json").unwrap();

        let err = load_actions(&path).unwrap_err();
        assert!(err.to_string().contains("actions.json"));
    }
}
