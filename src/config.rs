//! Configuration loading and management
//!
//! Handles parsing of `.sb.toml` board configuration files.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::header::ParseOptions;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory layout configuration
    #[serde(default)]
    pub paths: PathsConfig,

    /// Header parser configuration
    #[serde(default)]
    pub parser: ParserConfig,

    /// Undo history configuration
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            parser: ParserConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

/// Directory names under the board root
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory holding the status-partitioned active task dirs
    #[serde(default = "default_tasks_dir")]
    pub tasks: String,

    /// Directory holding the story tree (backlog tasks live here)
    #[serde(default = "default_stories_dir")]
    pub stories: String,
}

fn default_tasks_dir() -> String {
    "tasks".to_string()
}

fn default_stories_dir() -> String {
    "stories".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tasks: default_tasks_dir(),
            stories: default_stories_dir(),
        }
    }
}

/// Header parser tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Leading lines scanned for header fields
    #[serde(default = "default_max_lines")]
    pub max_lines: usize,
}

fn default_max_lines() -> usize {
    crate::header::DEFAULT_MAX_LINES
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_lines: default_max_lines(),
        }
    }
}

/// Undo history tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Snapshots retained on the in-memory undo stack
    #[serde(default = "default_history_limit")]
    pub limit: usize,
}

fn default_history_limit() -> usize {
    crate::history::DEFAULT_HISTORY_LIMIT
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            limit: default_history_limit(),
        }
    }
}

impl Config {
    /// Load configuration from a `.sb.toml` file
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from the board root, or return defaults
    pub fn load_from_root(root: &Path) -> Self {
        let config_path = root.join(".sb.toml");
        if config_path.exists() {
            Self::load(&config_path).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> crate::error::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parser options derived from this configuration
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            max_lines: self.parser.max_lines,
        }
    }

    fn validate(&self) -> crate::error::Result<()> {
        validate_dir_name(&self.paths.tasks, "paths.tasks")?;
        validate_dir_name(&self.paths.stories, "paths.stories")?;
        if self.paths.tasks == self.paths.stories {
            return Err(crate::error::Error::InvalidConfig(
                "paths.tasks and paths.stories must differ".to_string(),
            ));
        }
        if self.parser.max_lines == 0 {
            return Err(crate::error::Error::InvalidConfig(
                "parser.max_lines must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_dir_name(name: &str, field: &str) -> crate::error::Result<()> {
    if name.trim().is_empty() {
        return Err(crate::error::Error::InvalidConfig(format!(
            "{field}: directory name cannot be empty"
        )));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(crate::error::Error::InvalidConfig(format!(
            "{field}: '{name}' must be a plain directory name"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn defaults_are_expected() {
        let cfg = Config::default();
        assert_eq!(cfg.paths.tasks, "tasks");
        assert_eq!(cfg.paths.stories, "stories");
        assert_eq!(cfg.parser.max_lines, 40);
        assert_eq!(cfg.history.limit, 50);
    }

    #[test]
    fn load_parses_overrides() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".sb.toml");
        let content = r#"
[paths]
tasks = "work"
stories = "epics"

[parser]
max_lines = 20

[history]
limit = 10
"#;
        fs::write(&path, content.trim()).expect("write config");

        let cfg = Config::load(&path).expect("load config");
        assert_eq!(cfg.paths.tasks, "work");
        assert_eq!(cfg.paths.stories, "epics");
        assert_eq!(cfg.parser.max_lines, 20);
        assert_eq!(cfg.history.limit, 10);
    }

    #[test]
    fn nested_dir_name_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".sb.toml");
        fs::write(&path, "[paths]\ntasks = \"a/b\"\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn zero_max_lines_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".sb.toml");
        fs::write(&path, "[parser]\nmax_lines = 0\n").expect("write config");

        let err = Config::load(&path).expect_err("invalid config");
        match err {
            crate::error::Error::InvalidConfig(_) => {}
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn load_from_root_defaults_when_missing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from_root(dir.path());
        assert_eq!(cfg.paths.tasks, "tasks");
    }

    #[test]
    fn load_from_root_reads_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join(".sb.toml");
        fs::write(&path, "[paths]\ntasks = \"cards\"").expect("write config");

        let cfg = Config::load_from_root(dir.path());
        assert_eq!(cfg.paths.tasks, "cards");
    }

    #[test]
    fn save_writes_toml() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("out.toml");
        let cfg = Config::default();
        cfg.save(&path).expect("save config");

        let written = fs::read_to_string(&path).expect("read config");
        assert!(written.contains("tasks = \"tasks\""));
    }
}
