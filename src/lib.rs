//! sb - Storyboard Library
//!
//! This library provides the core functionality for the sb CLI tool:
//! markdown task boards built from plain files.
//!
//! # Core Concepts
//!
//! - **Headers**: tasks and stories are markdown files whose first lines
//!   carry `Field: value` pairs under a `# Task:` or `# Story:` heading
//! - **Board Model**: tasks bucketed into Kanban columns with a fixed
//!   status vocabulary and sticky, user-curated ordering
//! - **Baseline**: a retained board snapshot diffed against the tree and
//!   used for conflict detection when committing batched moves
//! - **Operation Log**: per-operation JSON records enabling undo
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.sb.toml`
//! - `error`: Error types and result aliases
//! - `header`: Story/task header parsing
//! - `scan`: Batch parsing of a board tree with per-file error isolation
//! - `board`: Status vocabulary, board model building, move application
//! - `diff`: Board-to-board comparison
//! - `history`: In-memory baseline plus undo stack for embedders
//! - `store`: File-system task store (locate, move, rename, baseline)
//! - `save`: Baseline-checked batch commit
//! - `oplog`: Operation log records and undo support
//! - `lock`: File locking and atomic operations for concurrency safety

pub mod board;
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod header;
pub mod history;
pub mod lock;
pub mod oplog;
pub mod output;
pub mod save;
pub mod scan;
pub mod store;
pub mod undo;

pub use error::{Error, Result};
