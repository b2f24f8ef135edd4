//! Board model: fixed status columns and deterministic task ordering
//!
//! A board always carries one column per status, in vocabulary order,
//! even when empty, so snapshots keep a stable shape for diffing. Tasks
//! with unrecognized statuses are shelved in backlog rather than dropped.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::header::TaskHeader;

/// Lifecycle stages a task can occupy, in column order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    Backlog,
    Todo,
    InProgress,
    Review,
    Done,
}

impl Status {
    /// Every status, in board column order
    pub const ALL: [Status; 5] = [
        Status::Backlog,
        Status::Todo,
        Status::InProgress,
        Status::Review,
        Status::Done,
    ];

    /// Statuses a task can be moved to. Backlog is where unscheduled work
    /// lives in the story tree; it is never an update target.
    pub const ACTIVE: [Status; 4] = [
        Status::Todo,
        Status::InProgress,
        Status::Review,
        Status::Done,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Backlog => "backlog",
            Status::Todo => "todo",
            Status::InProgress => "in-progress",
            Status::Review => "review",
            Status::Done => "done",
        }
    }

    /// Parse a normalized (lowercased) status value
    pub fn parse(value: &str) -> Option<Status> {
        match value {
            "backlog" => Some(Status::Backlog),
            "todo" => Some(Status::Todo),
            "in-progress" => Some(Status::InProgress),
            "review" => Some(Status::Review),
            "done" => Some(Status::Done),
            _ => None,
        }
    }

    pub fn is_active(self) -> bool {
        !matches!(self, Status::Backlog)
    }

    /// Column label for this status ("in-progress" -> "In Progress")
    pub fn title(self) -> String {
        column_title(self.as_str())
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Status::parse(&s.to_lowercase()).ok_or_else(|| Error::UnsupportedStatus(s.to_string()))
    }
}

/// Derive a column label from a status key: hyphens become spaces and
/// the first letter of each word is uppercased.
pub fn column_title(id: &str) -> String {
    id.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// One board column: a status bucket with an ordered task-id list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardColumn {
    pub id: Status,
    pub title: String,
    pub tasks: Vec<String>,
}

/// A full board snapshot: five columns plus a task lookup map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardModel {
    pub columns: Vec<BoardColumn>,
    /// Task headers keyed by id; BTreeMap keeps serialization stable
    pub tasks: BTreeMap<String, TaskHeader>,
    /// Build timestamp (RFC 3339)
    pub version: String,
}

impl BoardModel {
    /// Column holding the given status
    pub fn column(&self, status: Status) -> Option<&BoardColumn> {
        self.columns.iter().find(|column| column.id == status)
    }

    /// Column and index of a task id, if present on the board
    pub fn position(&self, id: &str) -> Option<(Status, usize)> {
        for column in &self.columns {
            if let Some(index) = column.tasks.iter().position(|task| task == id) {
                return Some((column.id, index));
            }
        }
        None
    }

    /// All task ids on the board, in column walk order
    pub fn task_ids(&self) -> impl Iterator<Item = &str> {
        self.columns
            .iter()
            .flat_map(|column| column.tasks.iter().map(String::as_str))
    }
}

/// Assemble a board from scanned task headers.
///
/// Every status gets a column even when empty. A task whose status is not
/// in the vocabulary lands in backlog. Without a previous model, columns
/// are sorted lexically by task id; with one, the previous order is kept
/// for ids still present and newcomers append at the end. Duplicate ids
/// resolve to the later header.
pub fn build_board_model(tasks: &[TaskHeader], previous: Option<&BoardModel>) -> BoardModel {
    let mut buckets: BTreeMap<Status, Vec<String>> = Status::ALL
        .iter()
        .map(|status| (*status, Vec::new()))
        .collect();
    let mut task_map: BTreeMap<String, TaskHeader> = BTreeMap::new();

    for task in tasks {
        let status = Status::parse(&task.status).unwrap_or(Status::Backlog);
        if task_map.contains_key(&task.id) {
            // Later duplicate takes over the column slot as well
            for bucket in buckets.values_mut() {
                bucket.retain(|id| id != &task.id);
            }
        }
        if let Some(bucket) = buckets.get_mut(&status) {
            bucket.push(task.id.clone());
        }
        task_map.insert(task.id.clone(), task.clone());
    }

    let ordered = match previous {
        None => buckets
            .into_iter()
            .map(|(status, mut ids)| {
                ids.sort();
                (status, ids)
            })
            .collect(),
        Some(previous) => order_from_previous(buckets, previous),
    };

    let columns = Status::ALL
        .iter()
        .map(|status| BoardColumn {
            id: *status,
            title: status.title(),
            tasks: ordered.get(status).cloned().unwrap_or_default(),
        })
        .collect();

    BoardModel {
        columns,
        tasks: task_map,
        version: Utc::now().to_rfc3339(),
    }
}

/// Sticky ordering: ids the previous column already had keep its relative
/// order; ids new to the column append in bucket-encounter order.
fn order_from_previous(
    mut buckets: BTreeMap<Status, Vec<String>>,
    previous: &BoardModel,
) -> BTreeMap<Status, Vec<String>> {
    let mut ordered = BTreeMap::new();

    for prev_column in &previous.columns {
        let Some(bucket) = buckets.remove(&prev_column.id) else {
            continue;
        };
        let members: HashSet<&String> = bucket.iter().collect();
        let carried: HashSet<&String> = prev_column.tasks.iter().collect();

        let mut ids: Vec<String> = prev_column
            .tasks
            .iter()
            .filter(|id| members.contains(id))
            .cloned()
            .collect();
        for id in &bucket {
            if !carried.contains(id) {
                ids.push(id.clone());
            }
        }
        ordered.insert(prev_column.id, ids);
    }

    // Statuses the previous model did not carry keep bucket order
    for (status, bucket) in buckets {
        ordered.insert(status, bucket);
    }

    ordered
}

/// Produce a new model with one task moved to `to` at `position`.
///
/// Value in, value out; the input model stays intact so callers can keep
/// snapshots for undo. `position` is clamped to the destination length.
pub fn apply_move(model: &BoardModel, id: &str, to: Status, position: usize) -> Result<BoardModel> {
    if model.position(id).is_none() {
        return Err(Error::TaskNotFound(id.to_string()));
    }

    let mut next = model.clone();
    for column in &mut next.columns {
        column.tasks.retain(|task| task != id);
    }
    if let Some(column) = next.columns.iter_mut().find(|column| column.id == to) {
        let index = position.min(column.tasks.len());
        column.tasks.insert(index, id.to_string());
    }
    if let Some(task) = next.tasks.get_mut(id) {
        task.status = to.as_str().to_string();
    }
    next.version = Utc::now().to_rfc3339();

    Ok(next)
}
