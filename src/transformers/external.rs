// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! External tools
//!
//! Runs preprocessors, linters and shell tasks as child processes.

use std::path::{Path, PathBuf};
use tokio::process::Command;

use crate::config::ExternalCommand;
use crate::errors::BuildError;

/// Placeholder replaced by the input path in tool arguments
pub const FILE_PLACEHOLDER: &str = "{file}";

/// Captured result of a finished process
#[derive(Debug, Clone)]
pub struct ToolOutput {
    pub success: bool,
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    fn from_output(output: std::process::Output) -> Self {
        Self {
            success: output.status.success(),
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        }
    }

    /// Turn a non-zero exit into `ToolFailed`
    pub fn into_result(self, tool: &str) -> Result<Self, BuildError> {
        if self.success {
            Ok(self)
        } else {
            let stderr = self.stderr.trim();
            Err(BuildError::ToolFailed {
                tool: tool.to_string(),
                status: self.status,
                stderr: (!stderr.is_empty()).then(|| stderr.to_string()),
            })
        }
    }
}

/// A resolved external program
#[derive(Debug, Clone)]
pub struct ExternalTool {
    name: String,
    program: PathBuf,
    args: Vec<String>,
}

impl ExternalTool {
    /// Locate the program on PATH
    pub fn locate(command: &ExternalCommand) -> Result<Self, BuildError> {
        let program =
            which::which(&command.program).map_err(|_| BuildError::tool_not_found(&command.program))?;

        Ok(Self {
            name: command.program.clone(),
            program,
            args: command.args.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the arguments take a single `{file}`, so the tool must run
    /// once per input
    pub fn per_file(&self) -> bool {
        self.args.iter().any(|a| a.contains(FILE_PLACEHOLDER))
    }

    /// Build the argument list for `files`.
    ///
    /// Each `{file}` placeholder expands to the first file; callers with
    /// several inputs run a `per_file` tool once per file. Without a
    /// placeholder every file is appended.
    pub fn args_for(&self, files: &[PathBuf]) -> Vec<String> {
        if self.per_file() {
            let file = files
                .first()
                .map(|f| f.display().to_string())
                .unwrap_or_default();
            self.args
                .iter()
                .map(|a| a.replace(FILE_PLACEHOLDER, &file))
                .collect()
        } else {
            self.args
                .iter()
                .cloned()
                .chain(files.iter().map(|f| f.display().to_string()))
                .collect()
        }
    }

    /// Run the tool on `files` from `working_dir`
    pub async fn run(&self, files: &[PathBuf], working_dir: &Path) -> Result<ToolOutput, BuildError> {
        let args = self.args_for(files);
        tracing::debug!(tool = %self.name, ?args, "running external tool");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(working_dir)
            .output()
            .await
            .map_err(|e| BuildError::ToolFailed {
                tool: self.name.clone(),
                status: -1,
                stderr: Some(e.to_string()),
            })?;

        Ok(ToolOutput::from_output(output))
    }
}

/// Run a shell command line
pub async fn run_shell(shell: &str, command: &str, working_dir: &Path) -> Result<ToolOutput, BuildError> {
    let output = Command::new(shell)
        .arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .output()
        .await
        .map_err(|e| BuildError::ToolFailed {
            tool: shell.to_string(),
            status: -1,
            stderr: Some(format!("Shell '{}' may not be available: {}", shell, e)),
        })?;

    Ok(ToolOutput::from_output(output))
}
