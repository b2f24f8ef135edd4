//! sb board, snapshot, and diff command implementations.

use std::path::PathBuf;

use crate::board::{build_board_model, BoardModel};
use crate::diff::diff_boards;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::scan::scan_root;
use crate::store::TaskStore;

pub struct BoardOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct SnapshotOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct DiffOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Build the current model, keeping the baseline's column order when
/// a baseline exists.
fn current_model(store: &TaskStore, config: &crate::config::Config) -> Result<BoardModel> {
    let outcome = scan_root(store, &config.parse_options())?;
    let previous = store.load_baseline()?;
    Ok(build_board_model(&outcome.tasks, previous.as_ref()))
}

pub fn run_board(options: BoardOptions) -> Result<()> {
    let (store, config) = super::open_store(options.root)?;
    let model = current_model(&store, &config)?;

    let mut human = HumanOutput::new(format!("Board at {}", store.root().display()));
    for column in &model.columns {
        let tasks = if column.tasks.is_empty() {
            "-".to_string()
        } else {
            column.tasks.join(", ")
        };
        human.push_detail(format!(
            "{} ({}): {}",
            column.title,
            column.tasks.len(),
            tasks
        ));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "board",
        &model,
        Some(&human),
    )
}

#[derive(serde::Serialize)]
struct SnapshotReport {
    version: String,
    tasks: usize,
    file: PathBuf,
}

pub fn run_snapshot(options: SnapshotOptions) -> Result<()> {
    let (store, config) = super::open_store(options.root)?;
    let model = current_model(&store, &config)?;
    store.save_baseline(&model)?;

    let report = SnapshotReport {
        version: model.version.clone(),
        tasks: model.tasks.len(),
        file: store.baseline_file(),
    };

    let mut human = HumanOutput::new("Saved baseline snapshot");
    human.push_summary("tasks", report.tasks.to_string());
    human.push_summary("version", report.version.clone());
    human.push_summary("file", report.file.display().to_string());
    human.push_next_step("sb diff");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "snapshot",
        &report,
        Some(&human),
    )
}

pub fn run_diff(options: DiffOptions) -> Result<()> {
    let (store, config) = super::open_store(options.root)?;
    let baseline = store
        .load_baseline()?
        .ok_or_else(|| Error::BaselineMissing(store.baseline_file()))?;

    let outcome = scan_root(&store, &config.parse_options())?;
    let next = build_board_model(&outcome.tasks, Some(&baseline));
    let diff = diff_boards(&baseline, &next);

    let header = if diff.is_empty() {
        "No changes since baseline".to_string()
    } else {
        format!("{} change(s) since baseline", diff.change_count())
    };

    let mut human = HumanOutput::new(header);
    for moved in &diff.moved {
        human.push_detail(format!(
            "moved {}: {} -> {} (position {})",
            moved.id, moved.from, moved.to, moved.position
        ));
    }
    for reordered in &diff.reordered {
        human.push_detail(format!(
            "reordered {} in {}: {} -> {}",
            reordered.id, reordered.column, reordered.from, reordered.to
        ));
    }
    for id in &diff.added {
        human.push_detail(format!("added {id}"));
    }
    for id in &diff.removed {
        human.push_detail(format!("removed {id}"));
    }
    if !diff.is_empty() {
        human.push_next_step("sb snapshot");
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "diff",
        &diff,
        Some(&human),
    )
}
