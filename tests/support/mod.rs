use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::TempDir;

pub struct TestBoard {
    dir: TempDir,
}

impl TestBoard {
    /// Empty root with no board layout
    pub fn bare() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    /// Root with the standard directory layout already created
    pub fn with_layout() -> Self {
        let board = Self::bare();
        for status in ["todo", "in-progress", "review", "done"] {
            fs::create_dir_all(board.path().join("tasks").join(status)).expect("layout");
        }
        fs::create_dir_all(board.path().join("stories")).expect("layout");
        board
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    /// Task file in an active status directory
    pub fn write_task(&self, status: &str, id: &str, slug: &str) -> PathBuf {
        self.write_file(
            &format!("tasks/{status}/{id}-{slug}.md"),
            &task_content(id, status),
        )
    }

    /// Backlog task nested in the story tree
    pub fn write_story_task(&self, story_dir: &str, id: &str, status: &str) -> PathBuf {
        self.write_file(
            &format!("stories/{story_dir}/{id}-notes.md"),
            &task_content(id, status),
        )
    }

    pub fn write_story(&self, story_dir: &str, slug: &str) -> PathBuf {
        self.write_file(
            &format!("stories/{story_dir}/story.md"),
            &format!("# Story: {slug}\nSlug: {slug}\nStatus: active\nCreated: 2025-04-01\n"),
        )
    }

    pub fn read_rel(&self, rel_path: &str) -> String {
        fs::read_to_string(self.dir.path().join(rel_path)).expect("read file")
    }

    pub fn exists(&self, rel_path: &str) -> bool {
        self.dir.path().join(rel_path).exists()
    }

    /// sb command rooted at this board
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("sb").expect("binary");
        cmd.arg("--root").arg(self.dir.path());
        cmd
    }
}

pub fn task_content(id: &str, status: &str) -> String {
    format!(
        "# Task: {id} Example work\n\
         Status: {status}\n\
         Story: NONE\n\
         Created: 2025-05-01\n\
         Type: feature\n\
         \n\
         ## Context\n\
         \n\
         Body text.\n"
    )
}

/// Parse a command's stdout as the JSON envelope
pub fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap_or_else(|err| {
        panic!(
            "stdout is not JSON ({err}): {}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}
