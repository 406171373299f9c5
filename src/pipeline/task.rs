// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! The unit of work a pipeline step runs

use async_trait::async_trait;
use std::path::PathBuf;

use crate::errors::BuildError;
use crate::lint::LintReport;

/// A named unit of work.
///
/// Tasks capture everything they need when constructed, so running one takes
/// no arguments. A task's future must not resolve before every file it
/// writes has been written and closed: the next step may read them.
#[async_trait]
pub trait Task: Send + Sync {
    /// One-line description shown by `sitepipe tasks`
    fn description(&self) -> &str;

    /// Run the task to completion
    async fn run(&self) -> Result<TaskOutput, BuildError>;
}

/// What a finished task reports back to the runner
#[derive(Debug, Default)]
pub struct TaskOutput {
    /// Files written by the task
    pub artifacts: Vec<PathBuf>,
    /// Findings, for lint tasks
    pub lint: Option<LintReport>,
}

impl TaskOutput {
    /// A task that finished without producing files
    pub fn done() -> Self {
        Self::default()
    }

    /// A task that wrote `artifacts`
    pub fn with_artifacts(artifacts: Vec<PathBuf>) -> Self {
        Self {
            artifacts,
            lint: None,
        }
    }

    /// A lint task's report
    pub fn with_lint(report: LintReport) -> Self {
        Self {
            artifacts: vec![],
            lint: Some(report),
        }
    }
}
