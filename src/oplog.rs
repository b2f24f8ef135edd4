//! Operation log storage for sb
//!
//! Stores append-only operation records under `.sb/oplog/`. Every applied
//! status change is recorded with enough detail to invert it: the file's
//! previous path and previous status value.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::lock::{self, FileLock, DEFAULT_LOCK_TIMEOUT_MS};
use crate::store::{MoveOutcome, TaskStore};

/// Operation log record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpRecord {
    pub op_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub command: String,
    pub outcome: OpOutcome,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub moves: Vec<MoveChange>,
}

impl OpRecord {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            op_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            command: command.into(),
            outcome: OpOutcome::success(),
            moves: Vec::new(),
        }
    }

    /// True when this record carries enough detail to be undone
    pub fn is_undoable(&self) -> bool {
        !self.moves.is_empty()
    }
}

/// Operation outcome summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpOutcome {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OpOutcome {
    pub fn success() -> Self {
        Self {
            status: "success".to_string(),
            message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            status: "failed".to_string(),
            message: Some(message.into()),
        }
    }
}

/// One applied move, with the detail needed to invert it
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MoveChange {
    pub id: String,
    pub from_path: PathBuf,
    pub to_path: PathBuf,
    pub previous_status: String,
    pub new_status: String,
}

impl MoveChange {
    pub fn from_outcome(outcome: &MoveOutcome) -> Self {
        Self {
            id: outcome.id.clone(),
            from_path: outcome.from.clone(),
            to_path: outcome.to.clone(),
            previous_status: outcome.previous_status.clone(),
            new_status: outcome.status.as_str().to_string(),
        }
    }
}

/// Operation log manager
#[derive(Debug, Clone)]
pub struct OpLog {
    dir: PathBuf,
}

impl OpLog {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn for_store(store: &TaskStore) -> Self {
        Self::new(store.oplog_dir())
    }

    /// Append a new operation record to the log
    pub fn append(&self, record: &OpRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let lock_path = oplog_lock_path(&self.dir);
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;

        let path = self.dir.join(record_filename(record));
        if path.exists() {
            return Err(Error::OperationFailed(format!(
                "operation log entry already exists: {}",
                path.display()
            )));
        }

        let json = serde_json::to_vec_pretty(record)?;
        lock::write_atomic(&path, &json)?;
        Ok(path)
    }

    /// Read all operation records (sorted by filename, oldest first)
    pub fn read_all(&self) -> Result<Vec<OpRecord>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }

        let lock_path = oplog_lock_path(&self.dir);
        let _lock = FileLock::acquire(&lock_path, DEFAULT_LOCK_TIMEOUT_MS)?;

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("json"))
            .collect();

        paths.sort();

        paths
            .into_iter()
            .map(|path| {
                let content = fs::read_to_string(&path)?;
                Ok(serde_json::from_str(&content)?)
            })
            .collect()
    }

    /// Read records sorted newest first, truncated to `limit`
    pub fn read_recent(&self, limit: usize) -> Result<Vec<OpRecord>> {
        let mut records = self.read_all()?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        records.truncate(limit);
        Ok(records)
    }

    /// Find a record by operation id
    pub fn find(&self, op_id: Uuid) -> Result<Option<OpRecord>> {
        Ok(self
            .read_all()?
            .into_iter()
            .find(|record| record.op_id == op_id))
    }

    /// The newest record that can be undone, if any
    pub fn latest_undoable(&self) -> Result<Option<OpRecord>> {
        let mut records = self.read_all()?;
        records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(records.into_iter().find(|record| record.is_undoable()))
    }
}

/// Format a single operation record for human-readable output
pub fn format_record(record: &OpRecord) -> String {
    let ts = record.timestamp.to_rfc3339();
    let outcome = match &record.outcome.message {
        Some(msg) => format!("{} ({})", record.outcome.status, msg),
        None => record.outcome.status.clone(),
    };
    let moves = if record.moves.is_empty() {
        "-".to_string()
    } else {
        record
            .moves
            .iter()
            .map(|change| format!("{}->{}", change.id, change.new_status))
            .collect::<Vec<_>>()
            .join(",")
    };

    format!(
        "{ts} {op_id} outcome={outcome} command=\"{command}\" moves=[{moves}]",
        op_id = record.op_id,
        command = record.command
    )
}

/// Format multiple records as lines
pub fn format_records(records: &[OpRecord]) -> String {
    records.iter().map(format_record).collect::<Vec<_>>().join("\n")
}

fn oplog_lock_path(dir: &Path) -> PathBuf {
    dir.join("oplog.lock")
}

fn record_filename(record: &OpRecord) -> String {
    let ts = record.timestamp.format("%Y%m%dT%H%M%S%.3fZ");
    format!("{}-{}.json", ts, record.op_id)
}
