// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! User-defined shell tasks

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use crate::config::ShellTaskConfig;
use crate::errors::BuildError;
use crate::pipeline::{Task, TaskOutput};
use crate::transformers::run_shell;

/// A `tasks:` entry from sitepipe.yaml, run from the project root.
///
/// A non-zero exit fails the step with `ToolFailed`.
pub struct ShellTask {
    config: ShellTaskConfig,
    working_dir: PathBuf,
    description: String,
}

impl ShellTask {
    pub fn new(config: ShellTaskConfig, working_dir: &Path) -> Self {
        let description = config
            .description
            .clone()
            .unwrap_or_else(|| format!("{} -c '{}'", config.shell, config.command));

        Self {
            config,
            working_dir: working_dir.to_path_buf(),
            description,
        }
    }
}

#[async_trait]
impl Task for ShellTask {
    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self) -> Result<TaskOutput, BuildError> {
        let output = run_shell(&self.config.shell, &self.config.command, &self.working_dir)
            .await?
            .into_result(&self.config.shell)?;

        for line in output.stdout.lines() {
            tracing::info!(target: "sitepipe::shell", "{}", line);
        }

        Ok(TaskOutput::done())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(command: &str) -> ShellTaskConfig {
        ShellTaskConfig {
            command: command.to_string(),
            shell: "sh".to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_shell_task_runs_in_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        let shell = ShellTask::new(task("echo copied > marker.txt"), dir.path());

        shell.run().await.unwrap();
        let marker = std::fs::read_to_string(dir.path().join("marker.txt")).unwrap();
        assert_eq!(marker.trim(), "copied");
    }

    #[tokio::test]
    async fn test_shell_task_failure() {
        let dir = tempfile::tempdir().unwrap();
        let shell = ShellTask::new(task("exit 2"), dir.path());

        assert!(matches!(
            shell.run().await,
            Err(BuildError::ToolFailed { status: 2, .. })
        ));
    }

    #[test]
    fn test_default_description() {
        let shell = ShellTask::new(task("cp -r a b"), Path::new("."));
        assert_eq!(shell.description(), "sh -c 'cp -r a b'");
    }
}
