//! sb scan command implementation.

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::scan::scan_root;

pub struct ScanOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub fn run(options: ScanOptions) -> Result<()> {
    let (store, config) = super::open_store(options.root)?;
    let outcome = scan_root(&store, &config.parse_options())?;

    let mut human = HumanOutput::new(format!(
        "Scanned {}: {} task(s), {} story(ies)",
        store.root().display(),
        outcome.tasks.len(),
        outcome.stories.len()
    ));
    human.push_summary("tasks", outcome.tasks.len().to_string());
    human.push_summary("stories", outcome.stories.len().to_string());
    human.push_summary("errors", outcome.errors.len().to_string());

    for error in &outcome.errors {
        human.push_warning(format!("{}: {}", error.file.display(), error.error));
    }
    for task in &outcome.tasks {
        for warning in &task.warnings {
            human.push_warning(format!("{}: {}", task.id, warning));
        }
    }

    if outcome.tasks.is_empty() && outcome.stories.is_empty() {
        human.push_next_step("add task files under tasks/<status>/");
    } else {
        human.push_next_step("sb board");
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "scan",
        &outcome,
        Some(&human),
    )
}
