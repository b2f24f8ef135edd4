//! sb - Storyboard CLI
//!
//! A standalone CLI for markdown task boards: story and task headers in
//! plain files, scanned into Kanban columns, moved between statuses, and
//! committed in conflict-checked batches with an operation log for undo.

use clap::Parser;
use sb::cli::Cli;
use sb::output::{emit_error, infer_command_name_from_args};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Tracing is opt-in via RUST_LOG. Invalid or oversized filter strings
/// are ignored rather than aborting startup.
fn log_filter() -> EnvFilter {
    let off = || EnvFilter::new("off");

    match std::env::var("RUST_LOG") {
        Ok(raw) => {
            let raw = raw.trim();
            if raw.is_empty() || raw.len() > 4096 {
                off()
            } else {
                EnvFilter::try_new(raw).unwrap_or_else(|_| off())
            }
        }
        Err(_) => off(),
    }
}

fn main() {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(log_filter())
        .init();

    let command = infer_command_name_from_args();
    let cli = Cli::parse();
    let json = cli.json;
    if let Err(err) = cli.run() {
        let _ = emit_error(&command, &err, json);
        std::process::exit(err.exit_code());
    }
}
