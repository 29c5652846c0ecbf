use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use onlook_editor::{EditorConfig, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Maximum number of undo levels (0 = unlimited)
    #[arg(long)]
    pub history_limit: Option<usize>,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, dir: &Path) -> Result<()> {
    let config_path = dir.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    let mut config = EditorConfig::default();
    if let Some(limit) = args.history_limit {
        config.history_limit = limit;
    }

    let content = serde_json::to_string_pretty(&config)?;
    fs::write(&config_path, content + "\n")
        .with_context(|| format!("Failed to write {}", config_path.display()))?;

    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();

        init(
            InitArgs {
                history_limit: Some(25),
                force: false,
            },
            dir.path(),
        )
        .unwrap();

        let config = EditorConfig::load(dir.path()).unwrap();
        assert_eq!(config.history_limit, 25);
        assert_eq!(config.refresh_delay_ms, 300);
    }

    #[test]
    fn test_init_keeps_existing_config_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_NAME);
        fs::write(&path, r#"{ "historyLimit": 5 }"#).unwrap();

        init(
            InitArgs {
                history_limit: None,
                force: false,
            },
            dir.path(),
        )
        .unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap().history_limit, 5);

        init(
            InitArgs {
                history_limit: None,
                force: true,
            },
            dir.path(),
        )
        .unwrap();
        assert_eq!(EditorConfig::load(dir.path()).unwrap().history_limit, 100);
    }
}
