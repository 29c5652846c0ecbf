mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{history, init, invert, requests, HistoryArgs, InitArgs, InvertArgs, RequestsArgs};
use onlook_editor::EditorConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Onlook CLI - inspect serialized editor action logs
#[derive(Parser, Debug)]
#[command(name = "onlook")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory containing onlook.config.json (defaults to current directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default onlook.config.json
    Init(InitArgs),

    /// Print the inverse of every action in a log
    Invert(InvertArgs),

    /// Build code diff requests for a batch of actions
    Requests(RequestsArgs),

    /// Replay actions through history, then undo/redo
    History(HistoryArgs),
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = run(cli).await;

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_dir = match cli.config {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Command::Init(args) => init(args, &config_dir),
        Command::Invert(args) => invert(args),
        Command::Requests(args) => requests(args).await,
        Command::History(args) => {
            let config = EditorConfig::load(&config_dir)?;
            history(args, &config)
        }
    }
}
