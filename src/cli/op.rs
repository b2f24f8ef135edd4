//! sb op log and undo command implementations.

use std::path::PathBuf;

use serde::Serialize;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::oplog::{format_records, OpLog, OpRecord};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::undo;

/// Options for the op log command.
pub struct LogOptions {
    pub limit: usize,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

/// Options for the undo command.
pub struct UndoOptions {
    pub op: Option<String>,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(Serialize)]
struct LogReport {
    count: usize,
    records: Vec<OpRecord>,
}

pub fn run_log(options: LogOptions) -> Result<()> {
    let (store, _config) = super::open_store(options.root)?;
    let log = OpLog::for_store(&store);
    let records = log.read_recent(options.limit)?;

    let mut human = HumanOutput::new(if records.is_empty() {
        "No operations recorded".to_string()
    } else {
        format!("{} operation(s)", records.len())
    });
    if !records.is_empty() {
        for line in format_records(&records).lines() {
            human.push_detail(line.to_string());
        }
    }

    let report = LogReport {
        count: records.len(),
        records,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "op log",
        &report,
        Some(&human),
    )
}

pub fn run_undo(options: UndoOptions) -> Result<()> {
    let (store, _config) = super::open_store(options.root)?;

    let op_id = match options.op {
        Some(raw) => Some(Uuid::parse_str(&raw).map_err(|_| {
            Error::InvalidArgument(format!("invalid operation id '{raw}'"))
        })?),
        None => None,
    };

    let summary = undo::undo(&store, undo::UndoOptions { op_id })?;

    let mut human = HumanOutput::new(format!(
        "Undid \"{}\": restored {} file(s)",
        summary.command,
        summary.restored.len()
    ));
    human.push_summary("op_id", summary.op_id.to_string());
    for id in &summary.restored {
        human.push_detail(format!("restored {id}"));
    }
    human.push_next_step("sb snapshot");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "undo",
        &summary,
        Some(&human),
    )
}
