//! Batch scanning of task and story files
//!
//! A scan walks a batch of (path, content) pairs through the header
//! parser and partitions the results. One malformed file never aborts the
//! batch; it becomes an error entry and the rest still parse.

use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::header::{parse_header, Header, ParseOptions, StoryHeader, TaskHeader};
use crate::store::TaskStore;

/// A (path, content) pair fed to the scanner
#[derive(Debug, Clone)]
pub struct ScanFile {
    pub path: PathBuf,
    pub content: String,
}

/// A per-file parse failure
#[derive(Debug, Clone, Serialize)]
pub struct ScanError {
    pub file: PathBuf,
    pub error: String,
}

/// Partitioned result of scanning a batch of files
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanOutcome {
    pub stories: Vec<StoryHeader>,
    pub tasks: Vec<TaskHeader>,
    pub errors: Vec<ScanError>,
}

impl ScanOutcome {
    /// Look up a scanned task by id
    pub fn task(&self, id: &str) -> Option<&TaskHeader> {
        self.tasks.iter().find(|task| task.id == id)
    }
}

/// Parse a batch of files, isolating per-file failures.
///
/// Files without a recognized header marker are skipped silently; files
/// with a marker but a broken header land in `errors` with the path and
/// the parser's message.
pub fn scan_files(files: Vec<ScanFile>, options: &ParseOptions) -> ScanOutcome {
    let mut outcome = ScanOutcome::default();

    for file in files {
        match parse_header(&file.content, options) {
            Ok(Some(Header::Story(mut story))) => {
                story.file_path = Some(file.path);
                outcome.stories.push(story);
            }
            Ok(Some(Header::Task(mut task))) => {
                task.file_path = Some(file.path);
                outcome.tasks.push(task);
            }
            Ok(None) => {
                debug!(file = %file.path.display(), "no header marker, skipping");
            }
            Err(err) => {
                debug!(file = %file.path.display(), error = %err, "header parse failed");
                outcome.errors.push(ScanError {
                    file: file.path,
                    error: err.to_string(),
                });
            }
        }
    }

    outcome
}

/// Scan every markdown file reachable from the store's directories.
pub fn scan_root(store: &TaskStore, options: &ParseOptions) -> Result<ScanOutcome> {
    let files = store
        .collect_files()?
        .into_iter()
        .map(|(path, content)| ScanFile { path, content })
        .collect();
    Ok(scan_files(files, options))
}
