//! sb task command implementations.

use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::header::TaskHeader;
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::scan::scan_root;

pub struct ListOptions {
    pub status: Option<String>,
    pub story: Option<String>,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

pub struct ShowOptions {
    pub id: String,
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct TaskRow {
    id: String,
    status: String,
    story: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<PathBuf>,
}

#[derive(serde::Serialize)]
struct TaskList {
    tasks: Vec<TaskRow>,
}

impl TaskRow {
    fn from_header(task: &TaskHeader) -> Self {
        Self {
            id: task.id.clone(),
            status: task.status.clone(),
            story: task.story.clone(),
            file: task.file_path.clone(),
        }
    }
}

pub fn run_list(options: ListOptions) -> Result<()> {
    let (store, config) = super::open_store(options.root)?;
    let outcome = scan_root(&store, &config.parse_options())?;

    // Filters compare the raw lowercased status string, so backlog
    // tasks with off-vocabulary statuses stay findable by their text
    let status_filter = options.status.map(|value| value.to_lowercase());
    let story_filter = options.story;

    let rows: Vec<TaskRow> = outcome
        .tasks
        .iter()
        .filter(|task| {
            status_filter
                .as_deref()
                .map_or(true, |status| task.status == status)
        })
        .filter(|task| {
            story_filter
                .as_deref()
                .map_or(true, |story| task.story == story)
        })
        .map(TaskRow::from_header)
        .collect();

    let mut human = HumanOutput::new(format!("{} task(s)", rows.len()));
    for row in &rows {
        human.push_detail(format!("{}  {}  story={}", row.id, row.status, row.story));
    }
    for error in &outcome.errors {
        human.push_warning(format!("{}: {}", error.file.display(), error.error));
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task list",
        &TaskList { tasks: rows },
        Some(&human),
    )
}

pub fn run_show(options: ShowOptions) -> Result<()> {
    let (store, config) = super::open_store(options.root)?;
    let outcome = scan_root(&store, &config.parse_options())?;

    let task = outcome
        .task(&options.id)
        .ok_or_else(|| Error::TaskNotFound(options.id.clone()))?;

    let mut human = HumanOutput::new(format!("{} ({})", task.id, task.status));
    human.push_summary("status", task.status.clone());
    human.push_summary("story", task.story.clone());
    human.push_summary("created", task.created.clone());
    human.push_summary("type", task.kind.clone());
    if let Some(owner) = &task.owner {
        human.push_summary("owner", owner.clone());
    }
    if !task.related.is_empty() {
        human.push_summary("related", task.related.join(" "));
    }
    if let Some(path) = &task.file_path {
        human.push_summary("file", path.display().to_string());
    }
    for warning in &task.warnings {
        human.push_warning(warning.clone());
    }

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "task show",
        task,
        Some(&human),
    )
}
