//! sb mv command implementation.

use std::path::PathBuf;

use uuid::Uuid;

use crate::board::Status;
use crate::error::Result;
use crate::oplog::{MoveChange, OpLog, OpRecord};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::MoveOutcome;

pub struct MvOptions {
    pub id: String,
    pub to: String,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct MvReport {
    op_id: Uuid,
    #[serde(flatten)]
    outcome: MoveOutcome,
}

pub fn run(options: MvOptions) -> Result<()> {
    let (store, _config) = super::open_store(options.root)?;

    let to: Status = options.to.parse()?;
    let outcome = store.move_task(&options.id, to)?;

    let mut record = OpRecord::new(format!("sb mv {} {}", options.id, options.to));
    record.moves.push(MoveChange::from_outcome(&outcome));
    OpLog::for_store(&store).append(&record)?;

    let mut human = HumanOutput::new(format!("Moved {} to {}", outcome.id, outcome.status));
    human.push_summary("was", outcome.previous_status.clone());
    human.push_summary("now", outcome.status.to_string());
    if outcome.relocated {
        human.push_summary("file", format!("relocated to {}", outcome.to.display()));
    } else {
        human.push_summary("file", outcome.to.display().to_string());
    }
    human.push_next_step("sb diff");

    let report = MvReport {
        op_id: record.op_id,
        outcome,
    };

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "mv",
        &report,
        Some(&human),
    )
}
