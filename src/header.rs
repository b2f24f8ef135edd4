//! Story and task header parsing
//!
//! Task and story files open with a small line-oriented header block: a
//! `# Task:` or `# Story:` heading on the first line followed by
//! `Key: value` lines. The block ends at the first `## ` body heading or
//! after a bounded number of lines, whichever comes first. Everything
//! past that point is prose and never inspected.
//!
//! Example task file:
//!
//! ```text
//! # Task: IMP-101 Add retry logic
//! Status: todo
//! Story: checkout-flow
//! Created: 2025-06-01
//! Type: feature
//! Related: task:IMP-100, PR:#42
//!
//! ## Context
//! ...body...
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Sentinel used in `Story:` fields for tasks without a parent story
pub const NO_STORY: &str = "NONE";

/// Default number of leading lines scanned for header fields
pub const DEFAULT_MAX_LINES: usize = 40;

const STORY_MARKER: &str = "# Story:";
const TASK_MARKER: &str = "# Task:";
const BODY_MARKER: &str = "## ";

const STORY_REQUIRED: [&str; 3] = ["Slug:", "Status:", "Created:"];
const TASK_REQUIRED: [&str; 4] = ["Status:", "Story:", "Created:", "Type:"];

const RELATED_WARNING: &str = "unexpected Related token format";

/// Options controlling the header scan window
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Leading lines considered part of the header at most
    pub max_lines: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_lines: DEFAULT_MAX_LINES,
        }
    }
}

/// A parsed story header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryHeader {
    /// Display title; the `Title:` field wins over the heading text
    pub title: String,
    pub slug: String,
    /// Normalized (lowercased) status value
    pub status: String,
    pub created: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<String>,
    /// Original file content, kept for traceability
    #[serde(default)]
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

/// A parsed task header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskHeader {
    /// First whitespace-delimited token after `# Task:`
    pub id: String,
    /// Normalized (lowercased) status value
    pub status: String,
    /// Parent story slug, or the `NONE` sentinel
    pub story: String,
    pub created: String,
    /// Normalized (lowercased) task type, e.g. "feature" or "bug"
    #[serde(rename = "type")]
    pub kind: String,
    /// Cross-reference tokens from the `Related:` field
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    /// Original file content, kept for traceability
    #[serde(default)]
    pub raw: String,
    /// Non-fatal oddities noticed while parsing
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<PathBuf>,
}

impl TaskHeader {
    /// Parent story slug, unless the header used the `NONE` sentinel
    pub fn parent_slug(&self) -> Option<&str> {
        if self.story == NO_STORY {
            None
        } else {
            Some(self.story.as_str())
        }
    }
}

/// A parsed header: either a story or a task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Header {
    Story(StoryHeader),
    Task(TaskHeader),
}

/// Parse the header block of a markdown file.
///
/// Returns `Ok(None)` when the content does not open with a recognized
/// `# Task:` or `# Story:` marker; most files in a repository are plain
/// markdown and that is not an error. A recognized marker with a missing
/// required field is an error naming that field.
pub fn parse_header(content: &str, options: &ParseOptions) -> Result<Option<Header>> {
    let window = header_window(content, options.max_lines);
    let Some(first) = window.first() else {
        return Ok(None);
    };

    if let Some(rest) = first.strip_prefix(STORY_MARKER) {
        return parse_story(content, &window, rest).map(|story| Some(Header::Story(story)));
    }
    if let Some(rest) = first.strip_prefix(TASK_MARKER) {
        return parse_task(content, &window, rest).map(|task| Some(Header::Task(task)));
    }

    Ok(None)
}

/// Leading lines that make up the header: at most `max_lines`, stopping
/// before the first `## ` body heading.
fn header_window(content: &str, max_lines: usize) -> Vec<&str> {
    content
        .lines()
        .take(max_lines)
        .take_while(|line| !line.starts_with(BODY_MARKER))
        .collect()
}

/// Every required prefix must appear somewhere in the window.
fn require_fields(window: &[&str], required: &[&str]) -> Result<()> {
    for prefix in required {
        if !window.iter().any(|line| line.starts_with(prefix)) {
            return Err(Error::MissingHeaderField(
                prefix.trim_end_matches(':').to_string(),
            ));
        }
    }
    Ok(())
}

/// Collect `Key: value` lines into a map. Later occurrences of a key
/// overwrite earlier ones. Keys must be plain alphanumeric words.
fn field_map<'a>(window: &[&'a str]) -> HashMap<String, &'a str> {
    let mut fields = HashMap::new();
    for line in window.iter().skip(1) {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || !key.chars().all(|ch| ch.is_ascii_alphanumeric()) {
            continue;
        }
        fields.insert(key.to_string(), value.trim());
    }
    fields
}

fn optional_field(fields: &HashMap<String, &str>, key: &str) -> Option<String> {
    fields
        .get(key)
        .filter(|value| !value.is_empty())
        .map(|value| (*value).to_string())
}

fn parse_story(raw: &str, window: &[&str], heading_rest: &str) -> Result<StoryHeader> {
    require_fields(window, &STORY_REQUIRED)?;
    let fields = field_map(window);

    // Heading text is the title unless an explicit Title: overrides it
    let title = match optional_field(&fields, "Title") {
        Some(title) => title,
        None => heading_rest.trim().to_string(),
    };

    Ok(StoryHeader {
        title,
        slug: fields.get("Slug").copied().unwrap_or_default().to_string(),
        status: fields
            .get("Status")
            .copied()
            .unwrap_or_default()
            .to_lowercase(),
        created: fields
            .get("Created")
            .copied()
            .unwrap_or_default()
            .to_string(),
        owner: optional_field(&fields, "Owner"),
        area: optional_field(&fields, "Area"),
        raw: raw.to_string(),
        file_path: None,
    })
}

fn parse_task(raw: &str, window: &[&str], heading_rest: &str) -> Result<TaskHeader> {
    require_fields(window, &TASK_REQUIRED)?;
    let fields = field_map(window);

    let id = heading_rest
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_string();

    let mut warnings = Vec::new();
    let related = parse_related(fields.get("Related").copied(), &mut warnings);

    Ok(TaskHeader {
        id,
        status: fields
            .get("Status")
            .copied()
            .unwrap_or_default()
            .to_lowercase(),
        story: match fields.get("Story").copied() {
            Some(value) if !value.is_empty() => value.to_string(),
            _ => NO_STORY.to_string(),
        },
        created: fields
            .get("Created")
            .copied()
            .unwrap_or_default()
            .to_string(),
        kind: fields
            .get("Type")
            .copied()
            .unwrap_or_default()
            .to_lowercase(),
        related,
        owner: optional_field(&fields, "Owner"),
        raw: raw.to_string(),
        warnings,
        file_path: None,
    })
}

/// Split a `Related:` value on commas and whitespace. Tokens are kept
/// verbatim; one aggregate warning is recorded if any token does not look
/// like a known reference form (`task:`, `story:`, `PR:#`, `#123`).
fn parse_related(value: Option<&str>, warnings: &mut Vec<String>) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };

    let tokens: Vec<String> = value
        .split(|ch: char| ch.is_whitespace() || ch == ',')
        .filter(|token| !token.is_empty())
        .map(|token| token.to_string())
        .collect();

    if tokens.iter().any(|token| !is_reference_token(token)) {
        warnings.push(RELATED_WARNING.to_string());
    }

    tokens
}

fn is_reference_token(token: &str) -> bool {
    token.starts_with("task:")
        || token.starts_with("story:")
        || token.starts_with("PR:#")
        || token.starts_with('#')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task_content() -> String {
        [
            "# Task: IMP-101 Add retry logic",
            "Status: Todo",
            "Story: checkout-flow",
            "Created: 2025-06-01",
            "Type: Feature",
            "Related: task:IMP-100, PR:#42",
            "",
            "## Context",
            "",
            "Body text.",
        ]
        .join("\n")
    }

    fn parse(content: &str) -> Result<Option<Header>> {
        parse_header(content, &ParseOptions::default())
    }

    #[test]
    fn parses_full_task_header() {
        let header = parse(&task_content()).unwrap().unwrap();
        let Header::Task(task) = header else {
            panic!("expected task header");
        };

        assert_eq!(task.id, "IMP-101");
        assert_eq!(task.status, "todo");
        assert_eq!(task.story, "checkout-flow");
        assert_eq!(task.created, "2025-06-01");
        assert_eq!(task.kind, "feature");
        assert_eq!(task.related, vec!["task:IMP-100", "PR:#42"]);
        assert!(task.warnings.is_empty());
        assert_eq!(task.raw, task_content());
        assert_eq!(task.parent_slug(), Some("checkout-flow"));
    }

    #[test]
    fn parses_story_header_with_heading_title() {
        let content = "# Story: Checkout flow rework\nSlug: checkout-flow\nStatus: Active\nCreated: 2025-05-20\nOwner: dana\n\n## Goal\n";
        let header = parse(content).unwrap().unwrap();
        let Header::Story(story) = header else {
            panic!("expected story header");
        };

        assert_eq!(story.title, "Checkout flow rework");
        assert_eq!(story.slug, "checkout-flow");
        assert_eq!(story.status, "active");
        assert_eq!(story.created, "2025-05-20");
        assert_eq!(story.owner.as_deref(), Some("dana"));
        assert_eq!(story.area, None);
    }

    #[test]
    fn explicit_title_field_wins() {
        let content =
            "# Story: heading text\nTitle: Real title\nSlug: s1\nStatus: active\nCreated: 2025-01-01\n";
        let Some(Header::Story(story)) = parse(content).unwrap() else {
            panic!("expected story header");
        };
        assert_eq!(story.title, "Real title");
    }

    #[test]
    fn non_header_content_is_none() {
        assert_eq!(parse("# Notes from standup\n\nNothing here.\n").unwrap(), None);
        assert_eq!(parse("").unwrap(), None);
        assert_eq!(parse("plain text\nStatus: todo\n").unwrap(), None);
    }

    #[test]
    fn marker_must_start_the_file() {
        let content = "intro line\n# Task: IMP-1\nStatus: todo\nStory: NONE\nCreated: x\nType: chore\n";
        assert_eq!(parse(content).unwrap(), None);
    }

    #[test]
    fn missing_field_error_names_the_field() {
        let content = "# Task: IMP-102 Fix bug\nStatus: todo\nStory: NONE\nCreated: 2025-06-01\n";
        let err = parse(content).unwrap_err();
        match err {
            Error::MissingHeaderField(ref field) => assert_eq!(field, "Type"),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.to_string().contains("Type"));
    }

    #[test]
    fn each_missing_story_field_is_reported() {
        for missing in ["Slug:", "Status:", "Created:"] {
            let mut lines = vec!["# Story: title"];
            for field in ["Slug: s", "Status: active", "Created: 2025-01-01"] {
                if !field.starts_with(missing) {
                    lines.push(field);
                }
            }
            let content = lines.join("\n");
            let err = parse(&content).unwrap_err();
            match err {
                Error::MissingHeaderField(field) => {
                    assert_eq!(field, missing.trim_end_matches(':'));
                }
                other => panic!("unexpected error: {other:?}"),
            }
        }
    }

    #[test]
    fn fields_after_body_marker_are_ignored() {
        let content =
            "# Task: IMP-103 Late fields\nStatus: review\nStory: NONE\nCreated: 2025-06-01\nType: bug\n\n## Notes\nStatus: done\n";
        let Some(Header::Task(task)) = parse(content).unwrap() else {
            panic!("expected task header");
        };
        assert_eq!(task.status, "review");
    }

    #[test]
    fn required_field_after_body_marker_does_not_count() {
        let content = "# Task: IMP-104\nStatus: todo\nStory: NONE\nCreated: 2025-06-01\n\n## Body\nType: feature\n";
        let err = parse(content).unwrap_err();
        assert!(matches!(err, Error::MissingHeaderField(field) if field == "Type"));
    }

    #[test]
    fn window_is_bounded_by_max_lines() {
        let mut lines = vec!["# Task: IMP-105"];
        lines.push("Status: todo");
        lines.push("Story: NONE");
        lines.push("Created: 2025-06-01");
        let filler: Vec<String> = (0..40).map(|i| format!("Note{i}: x")).collect();
        lines.extend(filler.iter().map(String::as_str));
        lines.push("Type: feature");
        let content = lines.join("\n");

        let err = parse_header(&content, &ParseOptions { max_lines: 10 }).unwrap_err();
        assert!(matches!(err, Error::MissingHeaderField(field) if field == "Type"));

        let parsed = parse_header(&content, &ParseOptions { max_lines: 60 }).unwrap();
        assert!(matches!(parsed, Some(Header::Task(_))));
    }

    #[test]
    fn duplicate_keys_last_one_wins() {
        let content = "# Task: IMP-106\nStatus: todo\nStatus: done\nStory: NONE\nCreated: 2025-06-01\nType: chore\n";
        let Some(Header::Task(task)) = parse(content).unwrap() else {
            panic!("expected task header");
        };
        assert_eq!(task.status, "done");
    }

    #[test]
    fn status_and_type_are_normalized() {
        let content = "# Task: IMP-107\nStatus: IN-PROGRESS\nStory: NONE\nCreated: 2025-06-01\nType: BugFix\n";
        let Some(Header::Task(task)) = parse(content).unwrap() else {
            panic!("expected task header");
        };
        assert_eq!(task.status, "in-progress");
        assert_eq!(task.kind, "bugfix");
    }

    #[test]
    fn story_sentinel_maps_to_no_parent() {
        let content = "# Task: IMP-108\nStatus: todo\nStory: NONE\nCreated: 2025-06-01\nType: chore\n";
        let Some(Header::Task(task)) = parse(content).unwrap() else {
            panic!("expected task header");
        };
        assert_eq!(task.story, NO_STORY);
        assert_eq!(task.parent_slug(), None);
    }

    #[test]
    fn related_tokens_split_on_commas_and_whitespace() {
        let content = "# Task: IMP-109\nStatus: todo\nStory: NONE\nCreated: 2025-06-01\nType: chore\nRelated: task:A-1,story:checkout #12  PR:#7\n";
        let Some(Header::Task(task)) = parse(content).unwrap() else {
            panic!("expected task header");
        };
        assert_eq!(task.related, vec!["task:A-1", "story:checkout", "#12", "PR:#7"]);
        assert!(task.warnings.is_empty());
    }

    #[test]
    fn odd_related_tokens_warn_once_but_are_kept() {
        let content = "# Task: IMP-110\nStatus: todo\nStory: NONE\nCreated: 2025-06-01\nType: chore\nRelated: jira-123, weird!, task:A-1\n";
        let Some(Header::Task(task)) = parse(content).unwrap() else {
            panic!("expected task header");
        };
        // All tokens kept verbatim, one aggregate warning
        assert_eq!(task.related, vec!["jira-123", "weird!", "task:A-1"]);
        assert_eq!(task.warnings.len(), 1);
        assert!(task.warnings[0].contains("Related"));
    }

    #[test]
    fn task_id_is_first_token_of_heading() {
        let content = "# Task: IMP-111 Long descriptive title here\nStatus: todo\nStory: NONE\nCreated: 2025-06-01\nType: chore\n";
        let Some(Header::Task(task)) = parse(content).unwrap() else {
            panic!("expected task header");
        };
        assert_eq!(task.id, "IMP-111");
    }

    #[test]
    fn header_json_shape_is_tagged() {
        let Some(header) = parse(&task_content()).unwrap() else {
            panic!("expected header");
        };
        let value = serde_json::to_value(&header).unwrap();
        assert_eq!(value["kind"], "task");
        assert_eq!(value["id"], "IMP-101");
        assert_eq!(value["type"], "feature");
    }
}
