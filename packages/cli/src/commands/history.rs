use super::load_actions;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use onlook_editor::{Action, CodeWriter, EditorConfig, HistoryManager, NoopAnalytics};
use parking_lot::Mutex;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Args)]
pub struct HistoryArgs {
    /// Action log (JSON array of actions)
    pub input: PathBuf,

    /// Number of undo steps after replaying the log
    #[arg(short, long, default_value = "0")]
    pub undo: usize,

    /// Number of redo steps after undoing
    #[arg(short, long, default_value = "0")]
    pub redo: usize,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

/// Collects the actions history forwards to code.
#[derive(Default)]
struct CollectWrites {
    writes: Mutex<Vec<Action>>,
}

impl CodeWriter for CollectWrites {
    fn write(&self, action: Action) {
        self.writes.lock().push(action);
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryReport {
    pub undo_stack: Vec<Action>,
    pub redo_stack: Vec<Action>,
    /// Actions that undo/redo would apply, in order
    pub applied: Vec<Action>,
    /// Actions forwarded to the code writer while replaying
    pub code_writes: Vec<Action>,
}

pub fn replay(actions: Vec<Action>, undo: usize, redo: usize, config: &EditorConfig) -> HistoryReport {
    let writer = Arc::new(CollectWrites::default());
    let mut history = HistoryManager::with_max_levels(writer.clone(), Arc::new(NoopAnalytics), config.history_limit);

    for action in actions {
        history.push(action);
    }

    let mut applied = Vec::new();
    applied.extend((0..undo).map_while(|_| history.undo()));
    applied.extend((0..redo).map_while(|_| history.redo()));

    let code_writes = writer.writes.lock().clone();
    HistoryReport {
        undo_stack: history.undo_stack().to_vec(),
        redo_stack: history.redo_stack().to_vec(),
        applied,
        code_writes,
    }
}

pub fn history(args: HistoryArgs, config: &EditorConfig) -> Result<()> {
    let actions = load_actions(&args.input)?;
    let report = replay(actions, args.undo, args.redo, config);

    match args.format.as_str() {
        "json" => println!("{}", serde_json::to_string_pretty(&report)?),
        "text" => print_report(&report),
        other => anyhow::bail!("Unknown format: {}. Use: text or json", other),
    }

    Ok(())
}

fn print_report(report: &HistoryReport) {
    println!("{}", "📜 History".bright_blue().bold());
    println!("   Undo stack: {} entries", report.undo_stack.len());
    for action in report.undo_stack.iter().rev() {
        println!("     {} {}", "•".green(), action.kind());
    }
    println!("   Redo stack: {} entries", report.redo_stack.len());
    for action in report.redo_stack.iter().rev() {
        println!("     {} {}", "•".yellow(), action.kind());
    }
    if !report.applied.is_empty() {
        println!("   Applied:");
        for action in &report.applied {
            println!("     {} {}", "→".cyan(), action.kind());
        }
    }
}
