use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_CONFIG_NAME: &str = "onlook.config.json";

/// Editor engine configuration file format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorConfig {
    /// Maximum number of undo levels (0 = unlimited)
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Delay before previews are told to refresh after a code write
    #[serde(default = "default_refresh_delay_ms")]
    pub refresh_delay_ms: u64,

    /// Trailing window that coalesces cleanup after element moves
    #[serde(default = "default_move_cleanup_debounce_ms")]
    pub move_cleanup_debounce_ms: u64,
}

fn default_history_limit() -> usize {
    100
}

fn default_refresh_delay_ms() -> u64 {
    300
}

fn default_move_cleanup_debounce_ms() -> u64 {
    1000
}

impl EditorConfig {
    /// Load config from a directory, falling back to defaults when absent
    pub fn load(dir: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = dir.as_ref().join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    pub fn refresh_delay(&self) -> Duration {
        Duration::from_millis(self.refresh_delay_ms)
    }

    pub fn move_cleanup_debounce(&self) -> Duration {
        Duration::from_millis(self.move_cleanup_debounce_ms)
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_limit: default_history_limit(),
            refresh_delay_ms: default_refresh_delay_ms(),
            move_cleanup_debounce_ms: default_move_cleanup_debounce_ms(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let json = r#"{ "historyLimit": 20, "refreshDelayMs": 50 }"#;

        let config: EditorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.history_limit, 20);
        assert_eq!(config.refresh_delay(), Duration::from_millis(50));
        assert_eq!(config.move_cleanup_debounce_ms, 1000);
    }

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.history_limit, 100);
        assert_eq!(config.refresh_delay_ms, 300);
        assert_eq!(config.move_cleanup_debounce(), Duration::from_secs(1));
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap(), EditorConfig::default());

        std::fs::write(
            dir.path().join(DEFAULT_CONFIG_NAME),
            r#"{ "moveCleanupDebounceMs": 250 }"#,
        )
        .unwrap();
        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config.move_cleanup_debounce_ms, 250);
        assert_eq!(config.history_limit, 100);
    }

    #[test]
    fn test_load_rejects_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{ not json").unwrap();
        assert!(matches!(EditorConfig::load(dir.path()), Err(ConfigError::Parse(_))));
    }
}
