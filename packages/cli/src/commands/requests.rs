use super::load_actions;
use anyhow::{Context, Result};
use clap::Args;
use onlook_editor::code::get_code_diff_requests;
use onlook_editor::StaticTemplateNodeMap;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RequestsArgs {
    /// Action log (JSON array of actions)
    pub input: PathBuf,

    /// Template node map: { "<webviewId>": { "<selector>": TemplateNode } }
    #[arg(short, long)]
    pub nodes: PathBuf,
}

pub async fn requests(args: RequestsArgs) -> Result<()> {
    let actions = load_actions(&args.input)?;

    let nodes = fs::read_to_string(&args.nodes)
        .with_context(|| format!("Failed to read {}", args.nodes.display()))?;
    let mapper = StaticTemplateNodeMap::from_json(&nodes)
        .with_context(|| format!("Invalid template node map {}", args.nodes.display()))?;

    let requests = get_code_diff_requests(&mapper, &actions).await;
    tracing::debug!(actions = actions.len(), requests = requests.len(), "built diff requests");

    println!("{}", serde_json::to_string_pretty(&requests)?);
    Ok(())
}
