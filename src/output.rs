//! Human and JSON output for sb commands.
//!
//! Every command funnels through [`emit_success`] / [`emit_error`] so the
//! two modes stay in step: `--json` prints a stable `sb.v1` envelope for
//! tooling, the default mode prints the same facts as short labelled
//! sections.

use std::fmt;

use serde::Serialize;

use crate::board::Status;
use crate::error::{Error, Result};

pub const SCHEMA_VERSION: &str = "sb.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Wire envelope shared by every command's `--json` mode. Exactly one of
/// `data` and `error` is present, the other is skipped.
#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<ErrorBody<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    next_steps: Vec<String>,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    message: &'a str,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

/// Accumulator for the human-readable rendering of one command.
///
/// Sections render in a fixed order (summary, details, warnings, next
/// steps) and empty sections disappear, so callers push freely.
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    details: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            ..Self::default()
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.details.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.header)?;

        if !self.summary.is_empty() {
            write!(f, "\n\nSummary:")?;
            for (key, value) in &self.summary {
                if value.is_empty() {
                    write!(f, "\n- {key}")?;
                } else {
                    write!(f, "\n- {key}: {value}")?;
                }
            }
        }

        for (title, items) in [
            ("Details", &self.details),
            ("Warnings", &self.warnings),
            ("Next steps", &self.next_steps),
        ] {
            if items.is_empty() {
                continue;
            }
            write!(f, "\n\n{title}:")?;
            for item in items {
                write!(f, "\n- {item}")?;
            }
        }

        Ok(())
    }
}

fn print_json<T: Serialize>(payload: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        return print_json(&Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data: Some(data),
            error: None,
            warnings: human.map(|h| h.warnings.clone()).unwrap_or_default(),
            next_steps: human.map(|h| h.next_steps.clone()).unwrap_or_default(),
        });
    }

    if !options.quiet {
        if let Some(human) = human {
            println!("{human}");
        }
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = error_next_steps(err);

    if json {
        let message = err.to_string();
        let payload: Envelope<'_, ()> = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            data: None,
            error: Some(ErrorBody {
                message: &message,
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            }),
            warnings: Vec::new(),
            next_steps,
        };
        return print_json(&payload);
    }

    eprintln!("error: {err}");
    if let Some(hint) = next_steps.first() {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// Best-effort command name for error envelopes, recovered from argv
/// before clap gets a chance to reject it.
pub fn infer_command_name_from_args() -> String {
    let mut args = std::env::args().skip(1);
    let mut next_word = || args.find(|arg| !arg.starts_with('-'));

    let Some(command) = next_word() else {
        return "sb".to_string();
    };

    // Only `task` and `op` nest subcommands
    if matches!(command.as_str(), "task" | "op") {
        if let Some(sub) = next_word() {
            return format!("{command} {sub}");
        }
    }

    command
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        3 => "conflict",
        _ => "operation_failed",
    }
}

fn error_next_steps(err: &Error) -> Vec<String> {
    match err {
        Error::BoardNotFound(_) => vec!["sb init".to_string()],
        Error::BaselineMissing(_) => vec!["sb snapshot".to_string()],
        Error::Conflict { .. } => vec!["sb diff".to_string(), "sb snapshot".to_string()],
        Error::TaskNotFound(_) => vec!["sb task list".to_string()],
        Error::UnsupportedStatus(_) => {
            let targets: Vec<&str> = Status::ACTIVE.iter().map(|s| s.as_str()).collect();
            vec![format!("use one of: {}", targets.join(", "))]
        }
        Error::InvalidConfig(_) => vec!["fix .sb.toml then retry".to_string()],
        _ => Vec::new(),
    }
}
