use super::load_actions;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use onlook_editor::{invert as invert_action, Action};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct InvertArgs {
    /// Action log (JSON array of actions)
    pub input: PathBuf,

    /// Output format (text, json)
    #[arg(short, long, default_value = "json")]
    pub format: String,
}

pub fn invert(args: InvertArgs) -> Result<()> {
    let actions = load_actions(&args.input)?;
    let inverses: Vec<Action> = actions.iter().map(invert_action).collect();

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&inverses)?),
        "text" => {
            for (action, inverse) in actions.iter().zip(&inverses) {
                println!("  {} → {}", action.kind().bright_white(), inverse.kind().cyan());
            }
        }
        other => anyhow::bail!("Unknown format: {}. Use: text or json", other),
    }

    Ok(())
}
