//! Common test utilities for ferry integration tests.
//!
//! - `TestEnv`: isolated project and config directories, plus a runner for
//!   the `ferry` binary with a scrubbed environment
//! - `site_tree`: a small local tree to deploy

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

/// Result of running a ferry CLI command
#[derive(Debug)]
pub struct TestResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl TestResult {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Combine stdout and stderr
    pub fn combined_output(&self) -> String {
        format!("{}\n{}", self.stdout, self.stderr)
    }

    /// Parse every stdout line as JSON
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.stdout
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                serde_json::from_str(line)
                    .unwrap_or_else(|e| panic!("not JSON: {line:?} ({e})"))
            })
            .collect()
    }
}

/// Isolated environment: a project directory and an empty user config dir
pub struct TestEnv {
    pub project_root: TempDir,
    pub config_home: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            project_root: TempDir::new().unwrap(),
            config_home: TempDir::new().unwrap(),
        }
    }

    pub fn project_path(&self, relative: &str) -> PathBuf {
        self.project_root.path().join(relative)
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.project_path(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    /// Write the user-level config (`$XDG_CONFIG_HOME/ferry/config.toml`)
    pub fn write_user_config(&self, content: &str) {
        let dir = self.config_home.path().join("ferry");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.toml"), content).unwrap();
    }

    pub fn run(&self, args: &[&str]) -> TestResult {
        self.run_with_env(args, &[])
    }

    /// Run ferry from the project root. Inherited `FERRY_*`, `INPUT_*` and
    /// CI variables are removed so the host environment cannot leak in.
    pub fn run_with_env(&self, args: &[&str], env_vars: &[(&str, &str)]) -> TestResult {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_ferry"));
        cmd.args(args)
            .current_dir(self.project_root.path())
            .env("XDG_CONFIG_HOME", self.config_home.path())
            .env("NO_COLOR", "1")
            .env_remove("GITHUB_ACTIONS")
            .env_remove("RUST_LOG");
        for (key, _) in std::env::vars() {
            if key.starts_with("FERRY_") || key.starts_with("INPUT_") {
                cmd.env_remove(key);
            }
        }
        for (key, value) in env_vars {
            cmd.env(key, value);
        }

        let output = cmd.output().expect("failed to run ferry");
        TestResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
    }
}

/// `dist/index.html`, `dist/css/site.css`, `dist/debug.log`, `notes/todo.txt`
pub fn site_tree(root: &Path) {
    for (rel, content) in [
        ("dist/index.html", "<h1>hello</h1>"),
        ("dist/css/site.css", "body{}"),
        ("dist/debug.log", "trace"),
        ("notes/todo.txt", "ship it"),
    ] {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
}

/// Render a path for use inside action text
pub fn quoted(path: &Path) -> String {
    format!("\"{}\"", path.display())
}
