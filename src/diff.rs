//! Diffing two board snapshots
//!
//! Classifies every task across a previous and a next snapshot as moved,
//! reordered, added, removed, or unchanged. A task that changed column is
//! reported once, as moved, even when its index changed too.

use serde::Serialize;

use std::collections::{HashMap, HashSet};

use crate::board::{BoardModel, Status};

/// A task whose column changed between snapshots
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovedTask {
    pub id: String,
    pub from: Status,
    pub to: Status,
    /// Index in the destination column
    pub position: usize,
}

/// A task that stayed in its column but changed index
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReorderedTask {
    pub id: String,
    pub column: Status,
    pub from: usize,
    pub to: usize,
}

/// Classification of every task across two snapshots
#[derive(Debug, Clone, Default, Serialize)]
pub struct BoardDiff {
    pub moved: Vec<MovedTask>,
    pub reordered: Vec<ReorderedTask>,
    pub added: Vec<String>,
    pub removed: Vec<String>,
    pub unchanged: Vec<String>,
}

impl BoardDiff {
    /// True when the snapshots describe the same layout
    pub fn is_empty(&self) -> bool {
        self.moved.is_empty()
            && self.reordered.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
    }

    /// Entries that represent an actual change
    pub fn change_count(&self) -> usize {
        self.moved.len() + self.reordered.len() + self.added.len() + self.removed.len()
    }
}

/// Compare two snapshots and classify every task on either board.
pub fn diff_boards(prev: &BoardModel, next: &BoardModel) -> BoardDiff {
    let mut prev_index: HashMap<&str, (Status, usize)> = HashMap::new();
    for column in &prev.columns {
        for (index, id) in column.tasks.iter().enumerate() {
            prev_index.insert(id.as_str(), (column.id, index));
        }
    }

    let next_ids: HashSet<&str> = next.task_ids().collect();

    let mut diff = BoardDiff::default();

    for column in &prev.columns {
        for id in &column.tasks {
            if !next_ids.contains(id.as_str()) {
                diff.removed.push(id.clone());
            }
        }
    }

    for column in &next.columns {
        for (index, id) in column.tasks.iter().enumerate() {
            match prev_index.get(id.as_str()) {
                None => diff.added.push(id.clone()),
                Some((prev_status, prev_index)) => {
                    if *prev_status != column.id {
                        diff.moved.push(MovedTask {
                            id: id.clone(),
                            from: *prev_status,
                            to: column.id,
                            position: index,
                        });
                    } else if *prev_index != index {
                        diff.reordered.push(ReorderedTask {
                            id: id.clone(),
                            column: column.id,
                            from: *prev_index,
                            to: index,
                        });
                    } else {
                        diff.unchanged.push(id.clone());
                    }
                }
            }
        }
    }

    diff
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::build_board_model;
    use crate::header::TaskHeader;

    fn header(id: &str, status: &str) -> TaskHeader {
        TaskHeader {
            id: id.to_string(),
            status: status.to_string(),
            story: crate::header::NO_STORY.to_string(),
            created: "2025-06-01".to_string(),
            kind: "chore".to_string(),
            related: Vec::new(),
            owner: None,
            raw: String::new(),
            warnings: Vec::new(),
            file_path: None,
        }
    }

    #[test]
    fn classifies_moved_added_removed() {
        let prev = build_board_model(
            &[
                header("T-001", "todo"),
                header("T-002", "todo"),
                header("T-003", "review"),
            ],
            None,
        );
        let next = build_board_model(
            &[
                header("T-001", "in-progress"),
                header("T-002", "todo"),
                header("T-004", "todo"),
            ],
            Some(&prev),
        );

        let diff = diff_boards(&prev, &next);

        assert_eq!(
            diff.moved,
            vec![MovedTask {
                id: "T-001".to_string(),
                from: Status::Todo,
                to: Status::InProgress,
                position: 0,
            }]
        );
        assert_eq!(diff.added, vec!["T-004"]);
        assert_eq!(diff.removed, vec!["T-003"]);
        // T-002 slid up when T-001 left; index comparison is literal
        assert_eq!(
            diff.reordered,
            vec![ReorderedTask {
                id: "T-002".to_string(),
                column: Status::Todo,
                from: 1,
                to: 0,
            }]
        );
        assert!(diff.unchanged.is_empty());
    }

    #[test]
    fn self_diff_is_empty_and_everything_unchanged() {
        let model = build_board_model(
            &[
                header("A-1", "todo"),
                header("A-2", "in-progress"),
                header("A-3", "done"),
            ],
            None,
        );
        let diff = diff_boards(&model, &model);

        assert!(diff.is_empty());
        assert_eq!(diff.change_count(), 0);
        let mut unchanged = diff.unchanged.clone();
        unchanged.sort();
        assert_eq!(unchanged, vec!["A-1", "A-2", "A-3"]);
    }

    #[test]
    fn reorder_within_column_is_reported_with_indices() {
        let prev = build_board_model(
            &[header("R-1", "todo"), header("R-2", "todo"), header("R-3", "todo")],
            None,
        );
        let mut next = prev.clone();
        if let Some(column) = next.columns.iter_mut().find(|c| c.id == Status::Todo) {
            column.tasks = vec!["R-3".to_string(), "R-1".to_string(), "R-2".to_string()];
        }

        let diff = diff_boards(&prev, &next);
        assert!(diff.moved.is_empty());
        assert_eq!(
            diff.reordered,
            vec![
                ReorderedTask {
                    id: "R-3".to_string(),
                    column: Status::Todo,
                    from: 2,
                    to: 0,
                },
                ReorderedTask {
                    id: "R-1".to_string(),
                    column: Status::Todo,
                    from: 0,
                    to: 1,
                },
                ReorderedTask {
                    id: "R-2".to_string(),
                    column: Status::Todo,
                    from: 1,
                    to: 2,
                },
            ]
        );
    }

    #[test]
    fn column_change_is_moved_never_reordered() {
        let prev = build_board_model(
            &[header("M-1", "todo"), header("M-2", "todo")],
            None,
        );
        let next = build_board_model(
            &[header("M-1", "review"), header("M-2", "todo")],
            Some(&prev),
        );

        let diff = diff_boards(&prev, &next);
        assert_eq!(diff.moved.len(), 1);
        assert_eq!(diff.moved[0].id, "M-1");
        assert!(diff.reordered.iter().all(|entry| entry.id != "M-1"));
    }

    #[test]
    fn empty_boards_diff_empty() {
        let prev = build_board_model(&[], None);
        let next = build_board_model(&[], None);
        let diff = diff_boards(&prev, &next);
        assert!(diff.is_empty());
        assert!(diff.unchanged.is_empty());
    }
}
