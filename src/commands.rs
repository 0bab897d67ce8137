//! Command definitions and dispatch
//!
//! Maps each subcommand onto its catalog handler.

mod catalog;

use crate::error::AppResult;
use crate::output::Output;
use crate::snapshot::{DiffEngine, DiffOptions};
use crate::state::AppState;
use argh::FromArgs;
use std::io::Write;
use std::path::PathBuf;

#[derive(FromArgs, PartialEq, Eq, Debug, Clone)]
/// track database schemas across projects
pub struct Cli {
    #[argh(switch, short = 'v', long = "verbose")]
    /// enable debug logging
    pub verbose: bool,

    #[argh(switch, long = "no-color")]
    /// disable colored output
    pub no_color: bool,

    #[argh(option, long = "catalog-dir")]
    /// catalog directory (overrides SCHEMA_CATALOG_DIR)
    pub catalog_dir: Option<PathBuf>,

    #[argh(subcommand)]
    pub command: Command,
}

#[derive(FromArgs, PartialEq, Eq, Debug, Clone)]
#[argh(subcommand)]
pub enum Command {
    Scan(ScanCommand),
    Diff(DiffCommand),
    History(HistoryCommand),
    Find(FindCommand),
    List(ListCommand),
}

#[derive(FromArgs, PartialEq, Eq, Debug, Clone)]
#[argh(subcommand, name = "scan")]
/// discover and catalog the schemas of a project
pub struct ScanCommand {
    #[argh(positional, default = "PathBuf::from(\".\")")]
    /// project directory (defaults to the current directory)
    pub path: PathBuf,
}

#[derive(FromArgs, PartialEq, Eq, Debug, Clone)]
#[argh(subcommand, name = "diff")]
/// compare the current schema against the last snapshot
pub struct DiffCommand {
    #[argh(positional, default = "PathBuf::from(\".\")")]
    /// project directory (defaults to the current directory)
    pub path: PathBuf,

    #[argh(switch)]
    /// also report primary-key, unique and default changes
    pub strict: bool,

    #[argh(switch)]
    /// print the drift report as JSON
    pub json: bool,
}

#[derive(FromArgs, PartialEq, Eq, Debug, Clone)]
#[argh(subcommand, name = "history")]
/// show the evolution of a table across every snapshot
pub struct HistoryCommand {
    #[argh(positional)]
    /// table name
    pub table: String,

    #[argh(switch)]
    /// print the history as JSON
    pub json: bool,
}

#[derive(FromArgs, PartialEq, Eq, Debug, Clone)]
#[argh(subcommand, name = "find")]
/// find a table across all cataloged projects
pub struct FindCommand {
    #[argh(positional)]
    /// table name
    pub table: String,

    #[argh(switch)]
    /// print the matches as JSON
    pub json: bool,
}

#[derive(FromArgs, PartialEq, Eq, Debug, Clone)]
#[argh(subcommand, name = "list")]
/// list all cataloged projects
pub struct ListCommand {
    #[argh(switch)]
    /// print the project summaries as JSON
    pub json: bool,
}

/// Run a parsed command against the application state
pub fn run<W: Write>(command: &Command, state: &AppState, out: &mut Output<W>) -> AppResult<()> {
    match command {
        Command::Scan(cmd) => catalog::scan(state, out, &cmd.path),
        Command::Diff(cmd) => {
            let engine = if cmd.strict {
                DiffEngine::new(DiffOptions {
                    compare_constraints: true,
                })
            } else {
                state.diff_engine()
            };
            catalog::diff(state, &engine, out, &cmd.path, cmd.json)
        }
        Command::History(cmd) => catalog::history(state, out, &cmd.table, cmd.json),
        Command::Find(cmd) => catalog::find(state, out, &cmd.table, cmd.json),
        Command::List(cmd) => catalog::list(state, out, cmd.json),
    }
}
