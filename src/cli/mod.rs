//! Command-line interface for sb
//!
//! This module defines the CLI structure using clap derive macros.
//! Each subcommand is defined in its own submodule.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::error::Result;
use crate::store::TaskStore;

mod board;
mod init;
mod mv;
mod op;
mod save;
mod scan;
mod task;

/// sb - Storyboard
///
/// A CLI for markdown task boards: story and task headers in plain
/// files, scanned into Kanban columns, moved between statuses, and
/// committed in conflict-checked batches.
#[derive(Parser, Debug)]
#[command(name = "sb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the board root (defaults to current directory)
    #[arg(long, global = true, env = "SB_ROOT")]
    pub root: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a board root (status directories, story tree, local state)
    Init,

    /// Parse every task and story file and report what was found
    Scan,

    /// Task queries
    #[command(subcommand)]
    Task(TaskCommands),

    /// Show the board columns
    Board,

    /// Capture the current board as the baseline snapshot
    Snapshot,

    /// Compare the tree against the baseline snapshot
    Diff,

    /// Move a task to a new status
    Mv {
        /// Task identifier
        id: String,

        /// Target status: todo, in-progress, review, done
        to: String,
    },

    /// Apply a staged batch of moves, checked against the baseline
    Save {
        /// JSON file holding the staged moves: a list of {"id", "to"} pairs
        #[arg(long)]
        moves: PathBuf,

        /// Skip the baseline conflict check
        #[arg(long)]
        force: bool,
    },

    /// Operation log
    #[command(subcommand)]
    Op(OpCommands),

    /// Undo the last recorded operation
    Undo {
        /// Specific operation ID to undo
        #[arg(long)]
        op: Option<String>,
    },
}

/// Task subcommands
#[derive(Subcommand, Debug)]
pub enum TaskCommands {
    /// List tasks
    List {
        /// Filter by status
        #[arg(long)]
        status: Option<String>,

        /// Filter by story slug
        #[arg(long)]
        story: Option<String>,
    },

    /// Show one task in full
    Show {
        /// Task identifier
        id: String,
    },
}

/// Operation log subcommands
#[derive(Subcommand, Debug)]
pub enum OpCommands {
    /// Show recent operations
    Log {
        /// Maximum entries to show
        #[arg(long, default_value = "20")]
        limit: usize,
    },
}

/// Resolve the board root from the global flag or the current directory
pub(crate) fn resolve_root(root: Option<PathBuf>) -> Result<PathBuf> {
    match root {
        Some(path) => Ok(path),
        None => Ok(std::env::current_dir()?),
    }
}

/// Open an initialized store at the resolved root
pub(crate) fn open_store(root: Option<PathBuf>) -> Result<(TaskStore, Config)> {
    let root = resolve_root(root)?;
    let config = Config::load_from_root(&root);
    let store = TaskStore::with_config(root, &config);
    store.ensure_initialized()?;
    Ok((store, config))
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => init::run(init::InitOptions {
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Scan => scan::run(scan::ScanOptions {
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Task(cmd) => match cmd {
                TaskCommands::List { status, story } => task::run_list(task::ListOptions {
                    status,
                    story,
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
                TaskCommands::Show { id } => task::run_show(task::ShowOptions {
                    id,
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Board => board::run_board(board::BoardOptions {
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Snapshot => board::run_snapshot(board::SnapshotOptions {
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Diff => board::run_diff(board::DiffOptions {
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Mv { id, to } => mv::run(mv::MvOptions {
                id,
                to,
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Save { moves, force } => save::run(save::SaveOptions {
                moves,
                force,
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
            Commands::Op(cmd) => match cmd {
                OpCommands::Log { limit } => op::run_log(op::LogOptions {
                    limit,
                    root: self.root,
                    json: self.json,
                    quiet: self.quiet,
                }),
            },
            Commands::Undo { op } => op::run_undo(op::UndoOptions {
                op,
                root: self.root,
                json: self.json,
                quiet: self.quiet,
            }),
        }
    }
}
