//! sb init command implementation
//!
//! Creates the status directories, the story tree, the local state dir,
//! and a default config file.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::{emit_success, HumanOutput, OutputOptions};
use crate::store::{self, TaskStore};

pub struct InitOptions {
    pub root: Option<PathBuf>,
    pub json: bool,
    pub quiet: bool,
}

#[derive(serde::Serialize)]
struct InitReport {
    root: PathBuf,
    created: Vec<String>,
    config_written: bool,
    gitignore_updated: bool,
}

pub fn run(options: InitOptions) -> Result<()> {
    let root = super::resolve_root(options.root)?;
    std::fs::create_dir_all(&root)?;

    let config_written = ensure_config(&root)?;
    let config = Config::load_from_root(&root);
    let store = TaskStore::with_config(&root, &config);

    let created_paths = store.init_layout()?;
    let gitignore_updated = store::ensure_gitignore(&root)?;

    let created: Vec<String> = created_paths
        .iter()
        .map(|path| {
            path.strip_prefix(&root)
                .unwrap_or(path)
                .display()
                .to_string()
        })
        .collect();

    let report = InitReport {
        root: root.clone(),
        created: created.clone(),
        config_written,
        gitignore_updated,
    };

    let header = if created.is_empty() && !config_written {
        "sb init: nothing to do".to_string()
    } else {
        "sb init: board ready".to_string()
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("root", root.display().to_string());
    human.push_summary(
        "created",
        if created.is_empty() {
            "none".to_string()
        } else {
            created.join(", ")
        },
    );
    if config_written {
        human.push_summary("config", ".sb.toml");
    }
    if gitignore_updated {
        human.push_summary("updated", ".gitignore");
    }
    human.push_next_step("add task files under tasks/<status>/");
    human.push_next_step("sb scan");

    emit_success(
        OutputOptions {
            json: options.json,
            quiet: options.quiet,
        },
        "init",
        &report,
        Some(&human),
    )
}

fn ensure_config(root: &std::path::Path) -> Result<bool> {
    let config_path = root.join(".sb.toml");
    if config_path.exists() {
        if !config_path.is_file() {
            return Err(Error::OperationFailed(format!(
                ".sb.toml exists but is not a file: {}",
                config_path.display()
            )));
        }
        return Ok(false);
    }

    Config::default().save(&config_path)?;
    Ok(true)
}
