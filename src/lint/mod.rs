// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Linters for built output
//!
//! Linters read files that an earlier pipeline step produced and return a
//! [`LintReport`]. Whether findings abort the pipeline is decided by the
//! runner's lint policy, not by the linter.

mod builtin;
mod command;

pub use builtin::{MarkupLinter, ScriptLinter, StyleLinter};
pub use command::CommandLinter;

use async_trait::async_trait;
use colored::Colorize;
use std::path::PathBuf;

use crate::errors::BuildError;

/// Trait for linters
#[async_trait]
pub trait Linter: Send + Sync {
    /// Name shown in reports
    fn name(&self) -> &str;

    /// Lint the given files
    async fn lint(&self, files: &[PathBuf]) -> Result<LintReport, BuildError>;
}

/// Finding severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A single lint finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LintFinding {
    pub path: PathBuf,
    pub line: Option<usize>,
    pub severity: Severity,
    pub message: String,
}

impl std::fmt::Display for LintFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.line {
            Some(line) => write!(f, "{}:{}: {}", self.path.display(), line, self.message),
            None => write!(f, "{}: {}", self.path.display(), self.message),
        }
    }
}

/// Findings from one linter run
#[derive(Debug, Clone, Default)]
pub struct LintReport {
    pub linter: String,
    pub files_checked: usize,
    pub findings: Vec<LintFinding>,
}

impl LintReport {
    pub fn new(linter: &str) -> Self {
        Self {
            linter: linter.to_string(),
            ..Self::default()
        }
    }

    pub fn error(&mut self, path: impl Into<PathBuf>, line: Option<usize>, message: impl Into<String>) {
        self.push(path.into(), line, Severity::Error, message.into());
    }

    pub fn warning(&mut self, path: impl Into<PathBuf>, line: Option<usize>, message: impl Into<String>) {
        self.push(path.into(), line, Severity::Warning, message.into());
    }

    fn push(&mut self, path: PathBuf, line: Option<usize>, severity: Severity, message: String) {
        self.findings.push(LintFinding {
            path,
            line,
            severity,
            message,
        });
    }

    pub fn error_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .count()
    }

    pub fn warning_count(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Warning)
            .count()
    }

    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Print findings under the owning step
    pub fn print(&self) {
        println!(
            "    {} {}: {} error(s), {} warning(s) in {} file(s)",
            "⚠".yellow(),
            self.linter.bold(),
            self.error_count().to_string().red(),
            self.warning_count().to_string().yellow(),
            self.files_checked
        );

        for finding in &self.findings {
            let marker = match finding.severity {
                Severity::Error => "✗".red(),
                Severity::Warning => "⚠".yellow(),
            };
            println!("      {} {}", marker, finding.to_string().dimmed());
        }
    }
}
