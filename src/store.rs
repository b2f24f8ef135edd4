//! File-system task store
//!
//! Active tasks live in status-partitioned directories; backlog tasks and
//! stories live in a separate story tree that is searched recursively.
//! Local board state sits next to them under `.sb/`.
//!
//! # Directory Structure
//!
//! ```text
//! <root>/
//!   tasks/                      # Active tasks, one dir per status
//!     todo/IMP-101-retry.md
//!     in-progress/
//!     review/
//!     done/
//!   stories/                    # Story tree; backlog tasks nest here
//!     checkout-flow/
//!       story.md
//!       IMP-204-edge-cases.md
//!   .sb/                        # Local state (ignored)
//!     baseline.json             # Retained board snapshot
//!     oplog/                    # Operation log entries
//!       <timestamp>-<uuid>.json
//! ```

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::{BoardModel, Status};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::lock::{self, DEFAULT_LOCK_TIMEOUT_MS};

/// Name of the local state directory under the board root
pub const STATE_DIR: &str = ".sb";

const BASELINE_FILE: &str = "baseline.json";
const OPLOG_DIR: &str = "oplog";

/// Where a task's backing file was found
#[derive(Debug, Clone)]
pub struct TaskLocation {
    pub path: PathBuf,
    /// Status directory the file sits in; `None` for story-tree hits
    pub status: Option<Status>,
}

/// A single requested status change
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MoveRequest {
    pub id: String,
    pub to: Status,
}

/// Receipt for an applied move
#[derive(Debug, Clone, Serialize)]
pub struct MoveOutcome {
    pub id: String,
    pub status: Status,
    pub from: PathBuf,
    pub to: PathBuf,
    pub relocated: bool,
    /// Status value the file carried before the rewrite
    pub previous_status: String,
}

/// One item of a batch move: the request id plus what happened to it
#[derive(Debug)]
pub struct MoveItem {
    pub id: String,
    pub result: Result<MoveOutcome>,
}

/// Store rooted at a directory holding `tasks/` and `stories/`
#[derive(Debug, Clone)]
pub struct TaskStore {
    root: PathBuf,
    tasks_dir: String,
    stories_dir: String,
}

impl TaskStore {
    /// Store with the default directory names
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            tasks_dir: crate::config::PathsConfig::default().tasks,
            stories_dir: crate::config::PathsConfig::default().stories,
        }
    }

    /// Store with directory names taken from `.sb.toml`
    pub fn with_config(root: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            root: root.into(),
            tasks_dir: config.paths.tasks.clone(),
            stories_dir: config.paths.stories.clone(),
        }
    }

    // =========================================================================
    // Path accessors
    // =========================================================================

    /// Path to the board root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path to the active task directory
    pub fn tasks_dir(&self) -> PathBuf {
        self.root.join(&self.tasks_dir)
    }

    /// Path to the story tree
    pub fn stories_dir(&self) -> PathBuf {
        self.root.join(&self.stories_dir)
    }

    /// Path to one status directory under the active task directory
    pub fn status_dir(&self, status: Status) -> PathBuf {
        self.tasks_dir().join(status.as_str())
    }

    /// Path to the local `.sb/` state directory
    pub fn state_dir(&self) -> PathBuf {
        self.root.join(STATE_DIR)
    }

    /// Path to the retained baseline snapshot
    pub fn baseline_file(&self) -> PathBuf {
        self.state_dir().join(BASELINE_FILE)
    }

    /// Path to the operation log directory
    pub fn oplog_dir(&self) -> PathBuf {
        self.state_dir().join(OPLOG_DIR)
    }

    // =========================================================================
    // Layout
    // =========================================================================

    /// Check whether this root has a board layout
    pub fn is_initialized(&self) -> bool {
        self.tasks_dir().is_dir()
    }

    /// Error unless the board layout exists
    pub fn ensure_initialized(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(Error::BoardNotFound(self.root.clone()))
        }
    }

    /// Create the directory layout. Returns the paths newly created.
    pub fn init_layout(&self) -> Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for status in Status::ACTIVE {
            ensure_dir(&self.status_dir(status), &mut created)?;
        }
        ensure_dir(&self.stories_dir(), &mut created)?;
        ensure_dir(&self.state_dir(), &mut created)?;
        ensure_dir(&self.oplog_dir(), &mut created)?;
        Ok(created)
    }

    // =========================================================================
    // Locating and collecting task files
    // =========================================================================

    /// Find the file backing a task id.
    ///
    /// Active status directories are searched first, in column order, for
    /// `<id>-<anything>` or `<id>.md`; the story tree is searched
    /// recursively as a fallback for backlog items.
    pub fn locate(&self, id: &str) -> Result<Option<TaskLocation>> {
        for status in Status::ACTIVE {
            let dir = self.status_dir(status);
            if let Some(path) = find_in_dir(&dir, id)? {
                debug!(id, status = %status, path = %path.display(), "located active task file");
                return Ok(Some(TaskLocation {
                    path,
                    status: Some(status),
                }));
            }
        }

        let pattern = format!("{}/**/*.md", self.stories_dir().display());
        for entry in glob::glob(&pattern)? {
            let path = entry.map_err(|err| Error::OperationFailed(err.to_string()))?;
            if file_matches_id(&path, id) {
                debug!(id, path = %path.display(), "located task file in story tree");
                return Ok(Some(TaskLocation { path, status: None }));
            }
        }

        Ok(None)
    }

    /// Gather every markdown file in the active directories and the story
    /// tree as (path, content) pairs. Paths are sorted per directory so a
    /// scan is deterministic.
    pub fn collect_files(&self) -> Result<Vec<(PathBuf, String)>> {
        let mut files = Vec::new();

        for status in Status::ACTIVE {
            let dir = self.status_dir(status);
            if !dir.is_dir() {
                continue;
            }
            let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.extension().and_then(|ext| ext.to_str()) == Some("md"))
                .collect();
            paths.sort();
            for path in paths {
                let content = fs::read_to_string(&path)?;
                files.push((path, content));
            }
        }

        let pattern = format!("{}/**/*.md", self.stories_dir().display());
        for entry in glob::glob(&pattern)? {
            let path = entry.map_err(|err| Error::OperationFailed(err.to_string()))?;
            let content = fs::read_to_string(&path)?;
            files.push((path, content));
        }

        Ok(files)
    }

    // =========================================================================
    // Status updates
    // =========================================================================

    /// Change a task's status, relocating its file when needed.
    ///
    /// Only active statuses are settable; backlog lives in the story tree
    /// and is not a move target. The target is validated and the header is
    /// checked for a rewritable `Status:` line before any file is touched.
    pub fn move_task(&self, id: &str, to: Status) -> Result<MoveOutcome> {
        if !to.is_active() {
            return Err(Error::UnsupportedStatus(to.as_str().to_string()));
        }

        let location = self
            .locate(id)?
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;

        let content = fs::read_to_string(&location.path)?;
        let (rewritten, previous_status) =
            set_status_line(&content, to.as_str()).ok_or_else(|| {
                Error::OperationFailed(format!(
                    "no Status: line in header of {}",
                    location.path.display()
                ))
            })?;

        let relocated = location.status != Some(to);
        let destination = if relocated {
            let target_dir = self.status_dir(to);
            fs::create_dir_all(&target_dir)?;
            let file_name = location.path.file_name().ok_or_else(|| {
                Error::OperationFailed(format!("invalid task path: {}", location.path.display()))
            })?;
            let destination = target_dir.join(file_name);
            // Relocate first, then rewrite at the new path
            fs::rename(&location.path, &destination)?;
            destination
        } else {
            location.path.clone()
        };

        lock::write_atomic_str(&destination, &rewritten)?;
        debug!(
            id,
            from = %location.path.display(),
            to = %destination.display(),
            status = %to,
            "task moved"
        );

        Ok(MoveOutcome {
            id: id.to_string(),
            status: to,
            from: location.path,
            to: destination,
            relocated,
            previous_status,
        })
    }

    /// Apply a batch of moves one item at a time. A failing item records
    /// its error and never aborts the rest.
    pub fn move_tasks(&self, moves: &[MoveRequest]) -> Vec<MoveItem> {
        moves
            .iter()
            .map(|request| MoveItem {
                id: request.id.clone(),
                result: self.move_task(&request.id, request.to),
            })
            .collect()
    }

    // =========================================================================
    // Baseline persistence
    // =========================================================================

    /// Load the retained baseline snapshot, if one has been captured
    pub fn load_baseline(&self) -> Result<Option<BoardModel>> {
        let path = self.baseline_file();
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Persist a board snapshot as the new baseline
    pub fn save_baseline(&self, model: &BoardModel) -> Result<()> {
        let json = serde_json::to_vec_pretty(model)?;
        lock::write_atomic_locked(&self.baseline_file(), &json, DEFAULT_LOCK_TIMEOUT_MS)?;
        Ok(())
    }
}

fn ensure_dir(path: &Path, created: &mut Vec<PathBuf>) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
        created.push(path.to_path_buf());
    }
    Ok(())
}

/// Direct children of `dir` matching the task id, lexically first wins.
fn find_in_dir(dir: &Path, id: &str) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    Ok(entries.into_iter().find(|path| file_matches_id(path, id)))
}

fn file_matches_id(path: &Path, id: &str) -> bool {
    let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
        return false;
    };
    name == format!("{id}.md") || name.starts_with(&format!("{id}-"))
}

/// Rewrite the first `Status:` line occurring before the body and return
/// the new content plus the previous value. Returns `None` when the
/// header carries no status line. Every other line, including a trailing
/// newline, is preserved byte for byte.
pub fn set_status_line(content: &str, status: &str) -> Option<(String, String)> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut replace_at = None;

    for (index, line) in lines.iter().enumerate() {
        if line.starts_with("## ") {
            // Status: lines inside the body are free text, not fields
            break;
        }
        if let Some(rest) = line.strip_prefix("Status:") {
            replace_at = Some((index, rest.trim().to_string()));
            break;
        }
    }

    let (index, previous) = replace_at?;
    let new_line = format!("Status: {status}");

    let mut out = String::with_capacity(content.len() + new_line.len());
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        if i == index {
            out.push_str(&new_line);
        } else {
            out.push_str(line);
        }
    }

    Some((out, previous))
}

/// Ensure the board root's .gitignore covers `.sb/`, creating it if needed
pub fn ensure_gitignore(root: &Path) -> std::io::Result<bool> {
    let gitignore_path = root.join(".gitignore");
    let pattern = format!("/{}/", STATE_DIR);

    let existing = if gitignore_path.exists() {
        fs::read_to_string(&gitignore_path)?
    } else {
        String::new()
    };

    let already_ignored = existing.lines().any(|line| {
        let trimmed = line.trim();
        trimmed == ".sb" || trimmed == ".sb/" || trimmed == "/.sb" || trimmed == "/.sb/"
    });

    if already_ignored {
        return Ok(false);
    }

    let mut file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&gitignore_path)?;

    if !existing.is_empty() && !existing.ends_with('\n') {
        writeln!(file)?;
    }

    writeln!(file, "# sb local board state")?;
    writeln!(file, "{}", pattern)?;
    Ok(true)
}
