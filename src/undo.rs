//! Undo operations based on the operation log.
//!
//! Basic semantics:
//! - Files are renamed back to their recorded previous paths
//! - Status lines are restored to their recorded previous values, verbatim
//! - Moves within a record unwind in reverse order

use std::fs;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::lock;
use crate::oplog::{OpLog, OpRecord};
use crate::store::{set_status_line, TaskStore};

/// Options for undoing an operation.
#[derive(Debug, Clone, Default)]
pub struct UndoOptions {
    /// Undo this specific record instead of the newest undoable one
    pub op_id: Option<Uuid>,
}

/// Summary of an undo operation.
#[derive(Debug, Clone, Serialize)]
pub struct UndoSummary {
    pub op_id: Uuid,
    pub command: String,
    /// Task ids whose files were restored
    pub restored: Vec<String>,
}

/// Undo the last recorded move operation (or a specific op_id).
///
/// The restore is literal: whatever path and status value the record
/// captured comes back, even if that status would not be settable through
/// a normal move (backlog files return to the story tree this way).
pub fn undo(store: &TaskStore, options: UndoOptions) -> Result<UndoSummary> {
    let log = OpLog::for_store(store);
    let record = select_record(&log, options.op_id)?;

    let mut summary = UndoSummary {
        op_id: record.op_id,
        command: record.command.clone(),
        restored: Vec::new(),
    };

    for change in record.moves.iter().rev() {
        if change.from_path != change.to_path {
            if let Some(parent) = change.from_path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(&change.to_path, &change.from_path)?;
        }

        let content = fs::read_to_string(&change.from_path)?;
        let (restored, _) =
            set_status_line(&content, &change.previous_status).ok_or_else(|| {
                Error::OperationFailed(format!(
                    "no Status: line in header of {}",
                    change.from_path.display()
                ))
            })?;
        lock::write_atomic_str(&change.from_path, &restored)?;

        summary.restored.push(change.id.clone());
    }

    Ok(summary)
}

fn select_record(log: &OpLog, op_id: Option<Uuid>) -> Result<OpRecord> {
    if let Some(id) = op_id {
        let record = log
            .find(id)?
            .ok_or_else(|| Error::OperationFailed(format!("operation not found: {id}")))?;
        if !record.is_undoable() {
            return Err(Error::OperationFailed(format!(
                "operation has no recorded moves: {id}"
            )));
        }
        return Ok(record);
    }

    log.latest_undoable()?
        .ok_or_else(|| Error::OperationFailed("no undoable operations found".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Status;
    use crate::oplog::MoveChange;
    use tempfile::TempDir;

    fn task_content(id: &str, status: &str) -> String {
        format!("# Task: {id}\nStatus: {status}\nStory: NONE\nCreated: 2025-06-01\nType: chore\n")
    }

    fn setup() -> (TempDir, TaskStore) {
        let temp = TempDir::new().unwrap();
        let store = TaskStore::new(temp.path());
        store.init_layout().unwrap();
        (temp, store)
    }

    #[test]
    fn undo_reverses_a_recorded_move() {
        let (temp, store) = setup();
        let original = temp.path().join("tasks/todo/U-1-work.md");
        fs::write(&original, task_content("U-1", "todo")).unwrap();

        let outcome = store.move_task("U-1", Status::Done).unwrap();
        let mut record = OpRecord::new("sb mv U-1 done");
        record.moves.push(MoveChange::from_outcome(&outcome));
        OpLog::for_store(&store).append(&record).unwrap();

        let summary = undo(&store, UndoOptions::default()).unwrap();
        assert_eq!(summary.op_id, record.op_id);
        assert_eq!(summary.restored, vec!["U-1"]);

        assert!(original.exists());
        assert!(!temp.path().join("tasks/done/U-1-work.md").exists());
        assert!(fs::read_to_string(&original)
            .unwrap()
            .contains("Status: todo\n"));
    }

    #[test]
    fn undo_restores_story_tree_placement() {
        let (temp, store) = setup();
        fs::create_dir_all(temp.path().join("stories/checkout")).unwrap();
        let original = temp.path().join("stories/checkout/U-2-later.md");
        fs::write(&original, task_content("U-2", "backlog")).unwrap();

        let outcome = store.move_task("U-2", Status::Todo).unwrap();
        let mut record = OpRecord::new("sb mv U-2 todo");
        record.moves.push(MoveChange::from_outcome(&outcome));
        OpLog::for_store(&store).append(&record).unwrap();

        undo(&store, UndoOptions::default()).unwrap();
        assert!(original.exists());
        assert!(fs::read_to_string(&original)
            .unwrap()
            .contains("Status: backlog\n"));
    }

    #[test]
    fn undo_by_op_id_picks_that_record() {
        let (temp, store) = setup();
        fs::write(
            temp.path().join("tasks/todo/U-3.md"),
            task_content("U-3", "todo"),
        )
        .unwrap();
        fs::write(
            temp.path().join("tasks/todo/U-4.md"),
            task_content("U-4", "todo"),
        )
        .unwrap();

        let log = OpLog::for_store(&store);

        let first = store.move_task("U-3", Status::Review).unwrap();
        let mut first_record = OpRecord::new("sb mv U-3 review");
        first_record.moves.push(MoveChange::from_outcome(&first));
        log.append(&first_record).unwrap();

        let second = store.move_task("U-4", Status::Done).unwrap();
        let mut second_record = OpRecord::new("sb mv U-4 done");
        second_record.moves.push(MoveChange::from_outcome(&second));
        log.append(&second_record).unwrap();

        // Undo the older record explicitly; the newer one stays applied
        let summary = undo(
            &store,
            UndoOptions {
                op_id: Some(first_record.op_id),
            },
        )
        .unwrap();
        assert_eq!(summary.restored, vec!["U-3"]);
        assert!(temp.path().join("tasks/todo/U-3.md").exists());
        assert!(temp.path().join("tasks/done/U-4.md").exists());
    }

    #[test]
    fn undo_with_empty_log_errors() {
        let (_temp, store) = setup();
        let err = undo(&store, UndoOptions::default()).unwrap_err();
        assert!(matches!(err, Error::OperationFailed(_)));
    }

    #[test]
    fn undo_unknown_op_id_errors() {
        let (_temp, store) = setup();
        let err = undo(
            &store,
            UndoOptions {
                op_id: Some(Uuid::new_v4()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, Error::OperationFailed(_)));
    }
}
