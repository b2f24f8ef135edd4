//! sb save command implementation.
//!
//! Reads staged moves from a JSON file, checks them against the baseline
//! snapshot, applies them as a batch, and records the result in the
//! operation log. `--force` skips the baseline check.

use std::fs;
use std::path::PathBuf;

use uuid::Uuid;

use crate::board::build_board_model;
use crate::error::{Error, Result};
use crate::oplog::{MoveChange, OpLog, OpOutcome, OpRecord};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::save::{apply_moves, check_baseline, SaveReport};
use crate::scan::scan_root;
use crate::store::MoveRequest;

pub struct SaveOptions {
    pub moves: PathBuf,
    pub force: bool,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct CommitReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    op_id: Option<Uuid>,
    baseline_refreshed: bool,
    #[serde(flatten)]
    report: SaveReport,
}

pub fn run(options: SaveOptions) -> Result<()> {
    let (store, config) = super::open_store(options.root)?;
    let parse_options = config.parse_options();

    let text = fs::read_to_string(&options.moves)?;
    let requests: Vec<MoveRequest> = serde_json::from_str(&text)?;
    if requests.is_empty() {
        return Err(Error::InvalidArgument(format!(
            "no moves staged in {} (expected a JSON list of {{\"id\", \"to\"}} pairs)",
            options.moves.display()
        )));
    }

    let baseline = store.load_baseline()?;
    if !options.force {
        let baseline = baseline
            .as_ref()
            .ok_or_else(|| Error::BaselineMissing(store.baseline_file()))?;
        check_baseline(&store, baseline, &requests, &parse_options)?;
    }

    let outcome = apply_moves(&store, &requests);

    let mut op_id = None;
    if !outcome.changes.is_empty() {
        let mut record = OpRecord::new(format!("sb save --moves {}", options.moves.display()));
        record.moves = outcome.changes.iter().map(MoveChange::from_outcome).collect();
        if outcome.report.failed > 0 {
            record.outcome = OpOutcome::failed(format!(
                "{} of {} moves failed",
                outcome.report.failed, outcome.report.requested
            ));
        }
        OpLog::for_store(&store).append(&record)?;
        op_id = Some(record.op_id);
    }

    // Re-snapshot after a successful apply so the next diff starts clean
    let baseline_refreshed = outcome.report.applied > 0;
    if baseline_refreshed {
        let fresh = scan_root(&store, &parse_options)?;
        let model = build_board_model(&fresh.tasks, baseline.as_ref());
        store.save_baseline(&model)?;
    }

    let header = if outcome.report.failed == 0 {
        format!("Saved {} move(s)", outcome.report.applied)
    } else {
        format!(
            "Saved {} move(s), {} failed",
            outcome.report.applied, outcome.report.failed
        )
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("requested", outcome.report.requested.to_string());
    human.push_summary("applied", outcome.report.applied.to_string());
    human.push_summary("failed", outcome.report.failed.to_string());
    for change in &outcome.changes {
        human.push_detail(format!(
            "{}: {} -> {}",
            change.id, change.previous_status, change.status
        ));
    }
    for result in &outcome.report.results {
        if let crate::save::SaveResult::Failed { id, error } = result {
            human.push_warning(format!("{id}: {error}"));
        }
    }
    if let Some(op_id) = op_id {
        human.push_next_step(format!("sb undo --op {op_id}"));
    }

    let report = CommitReport {
        op_id,
        baseline_refreshed,
        report: outcome.report,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "save",
        &report,
        Some(&human),
    )
}
