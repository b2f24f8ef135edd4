//! Baseline-checked batch commit of staged moves.
//!
//! The commit flow is check-then-write: re-scan the tree, compare the
//! current status of every task the batch touches against what the
//! baseline recorded, and only apply the moves when nothing diverged.
//! A single divergence aborts the whole batch before any file I/O.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::board::{BoardModel, Status};
use crate::error::{Error, Result};
use crate::header::ParseOptions;
use crate::scan;
use crate::store::{MoveOutcome, MoveRequest, TaskStore};

/// Per-item commit result, serialized as `{id, status}` or `{id, error}`
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SaveResult {
    Applied { id: String, status: Status },
    Failed { id: String, error: String },
}

/// Counts and per-item results for a batch commit
#[derive(Debug, Clone, Serialize)]
pub struct SaveReport {
    pub requested: usize,
    pub applied: usize,
    pub failed: usize,
    pub results: Vec<SaveResult>,
}

/// Report plus the full receipts needed for the operation log
#[derive(Debug)]
pub struct SaveOutcome {
    pub report: SaveReport,
    pub changes: Vec<MoveOutcome>,
}

/// Compare the tree's current statuses against the baseline for every task
/// the batch intends to change.
///
/// The comparison is per task id against the baseline's recorded status
/// string, not against any live model. Tasks absent from the baseline
/// compare as `(none)`; tasks missing from the tree compare as `(missing)`.
pub fn check_baseline(
    store: &TaskStore,
    baseline: &BoardModel,
    moves: &[MoveRequest],
    options: &ParseOptions,
) -> Result<()> {
    let outcome = scan::scan_root(store, options)?;

    let mut current: HashMap<&str, &str> = HashMap::new();
    for task in &outcome.tasks {
        current.insert(task.id.as_str(), task.status.as_str());
    }

    for request in moves {
        let expected = baseline
            .tasks
            .get(&request.id)
            .map(|task| task.status.as_str())
            .unwrap_or("(none)");
        let found = current
            .get(request.id.as_str())
            .copied()
            .unwrap_or("(missing)");

        if expected != found {
            debug!(
                id = %request.id,
                expected,
                found,
                "baseline check failed, aborting batch"
            );
            return Err(Error::Conflict {
                id: request.id.clone(),
                expected: expected.to_string(),
                found: found.to_string(),
                pending: moves.len(),
            });
        }
    }

    Ok(())
}

/// Apply a batch of moves without any baseline check, collecting a
/// per-item result rather than failing the batch on one item's error.
pub fn apply_moves(store: &TaskStore, moves: &[MoveRequest]) -> SaveOutcome {
    let items = store.move_tasks(moves);

    let mut report = SaveReport {
        requested: moves.len(),
        applied: 0,
        failed: 0,
        results: Vec::with_capacity(items.len()),
    };
    let mut changes = Vec::new();

    for item in items {
        match item.result {
            Ok(outcome) => {
                report.applied += 1;
                report.results.push(SaveResult::Applied {
                    id: outcome.id.clone(),
                    status: outcome.status,
                });
                changes.push(outcome);
            }
            Err(err) => {
                report.failed += 1;
                report.results.push(SaveResult::Failed {
                    id: item.id,
                    error: err.to_string(),
                });
            }
        }
    }

    info!(
        applied = report.applied,
        failed = report.failed,
        "batch commit finished"
    );
    SaveOutcome { report, changes }
}

/// Check the baseline, then apply. On conflict the tree is untouched.
pub fn save_moves(
    store: &TaskStore,
    baseline: &BoardModel,
    moves: &[MoveRequest],
    options: &ParseOptions,
) -> Result<SaveOutcome> {
    check_baseline(store, baseline, moves, options)?;
    Ok(apply_moves(store, moves))
}
