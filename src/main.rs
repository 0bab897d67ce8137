//! Schema Catalog - schema snapshots and drift detection for local projects
//!
//! Scans a project tree for schema definitions, stores versioned snapshots in
//! a file-backed catalog and answers cross-project questions about them:
//! - `scan`: discover schema files, extract tables and store a snapshot
//! - `diff`: compare the working tree against the last stored snapshot
//! - `history` / `find` / `list`: query the catalog

mod commands;
mod config;
mod discovery;
mod error;
mod introspection;
mod output;
mod revision;
mod snapshot;
mod state;

use crate::commands::Cli;
use crate::config::Settings;
use crate::output::Output;
use crate::state::AppState;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> anyhow::Result<()> {
    let cli: Cli = argh::from_env();

    init_tracing(cli.verbose);

    let settings = Settings::load(cli.catalog_dir.as_deref())?;
    debug!("Catalog root: {}", settings.catalog.root.display());

    let state = AppState::new(&settings);
    let mut out = Output::stdout(cli.no_color || settings.output.no_color);

    commands::run(&cli.command, &state, &mut out)?;
    Ok(())
}

/// Initialize tracing; logs go to stderr so reports on stdout stay clean
fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("warn,schema_catalog=info")
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();
}
