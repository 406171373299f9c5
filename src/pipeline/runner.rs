// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Pipeline runner
//!
//! Runs a flat list of task names strictly in order and stops at the first
//! failure.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use colored::Colorize;

use super::{Task, TaskRegistry};
use crate::errors::BuildError;
use crate::lint::LintReport;
use crate::utils::create_spinner;

/// Pipeline run options
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Lint errors abort the pipeline
    pub strict_lint: bool,
    /// Only show what would be done
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
    /// Show a spinner while each step runs
    pub progress: bool,
}

/// Outcome of one step
#[derive(Debug)]
pub struct StepReport {
    pub task: String,
    pub duration: Duration,
    pub artifacts: Vec<PathBuf>,
    pub lint: Option<LintReport>,
}

/// Outcome of a successful run
#[derive(Debug, Default)]
pub struct PipelineReport {
    pub name: String,
    pub steps: Vec<StepReport>,
    pub duration: Duration,
}

impl PipelineReport {
    /// Lint errors across all steps
    pub fn lint_errors(&self) -> usize {
        self.steps
            .iter()
            .filter_map(|s| s.lint.as_ref())
            .map(|r| r.error_count())
            .sum()
    }

    /// Lint warnings across all steps
    pub fn lint_warnings(&self) -> usize {
        self.steps
            .iter()
            .filter_map(|s| s.lint.as_ref())
            .map(|r| r.warning_count())
            .sum()
    }

    /// Every file written during the run
    pub fn artifacts(&self) -> impl Iterator<Item = &PathBuf> {
        self.steps.iter().flat_map(|s| s.artifacts.iter())
    }
}

/// Sequential, fail-fast pipeline runner
pub struct PipelineRunner {
    registry: Arc<TaskRegistry>,
    options: RunOptions,
}

impl PipelineRunner {
    pub fn new(registry: Arc<TaskRegistry>, options: RunOptions) -> Self {
        Self { registry, options }
    }

    /// Run `steps` in order.
    ///
    /// Every name is resolved before anything runs, so an unknown task never
    /// leaves a half-built site behind.
    pub async fn run(&self, name: &str, steps: &[String]) -> Result<PipelineReport, BuildError> {
        let start = Instant::now();

        let tasks = steps
            .iter()
            .map(|step| Ok((step.as_str(), self.registry.resolve(step)?)))
            .collect::<Result<Vec<(&str, Arc<dyn Task>)>, BuildError>>()?;

        self.print_plan(name, &tasks);

        let mut report = PipelineReport {
            name: name.to_string(),
            ..PipelineReport::default()
        };

        if self.options.dry_run {
            return Ok(report);
        }

        for (step, task) in tasks {
            report.steps.push(self.run_step(step, task.as_ref()).await?);
        }

        report.duration = start.elapsed();
        println!();
        println!(
            "{}",
            format!(
                "Pipeline '{}' completed in {:.2}s",
                name,
                report.duration.as_secs_f64()
            )
            .green()
        );

        Ok(report)
    }

    /// Run a single task outside of a pipeline (watch rebuilds)
    pub async fn run_task(&self, name: &str) -> Result<StepReport, BuildError> {
        let task = self.registry.resolve(name)?;
        self.run_step(name, task.as_ref()).await
    }

    async fn run_step(&self, step: &str, task: &dyn Task) -> Result<StepReport, BuildError> {
        let start = Instant::now();
        tracing::debug!(task = step, "starting");

        let spinner = self.options.progress.then(|| create_spinner(step));
        if spinner.is_none() {
            print!("  {} {}...", "→".blue(), step);
            let _ = std::io::stdout().flush();
        }

        let result = task.run().await;
        let duration = start.elapsed();

        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                println!("\r  {} {} failed", "✗".red(), step.bold());
                tracing::debug!(task = step, error = %e, "failed");
                return Err(e.in_task(step));
            }
        };

        println!(
            "\r  {} {} ({:.2}s)",
            "✓".green(),
            step.bold(),
            duration.as_secs_f64()
        );

        if self.options.verbose {
            for artifact in &output.artifacts {
                println!("      {}", artifact.display().to_string().dimmed());
            }
        }

        if let Some(ref lint) = output.lint {
            if !lint.is_clean() {
                lint.print();
            }
            let errors = lint.error_count();
            if self.options.strict_lint && errors > 0 {
                return Err(BuildError::LintFailed {
                    task: step.to_string(),
                    errors,
                });
            }
        }

        Ok(StepReport {
            task: step.to_string(),
            duration,
            artifacts: output.artifacts,
            lint: output.lint,
        })
    }

    fn print_plan(&self, name: &str, tasks: &[(&str, Arc<dyn Task>)]) {
        println!();
        println!("{}: {}", "Pipeline".bold(), name);
        println!("{}", "═".repeat(50));
        println!(
            "Execution plan ({} step{}):",
            tasks.len(),
            if tasks.len() == 1 { "" } else { "s" }
        );
        println!();

        for (i, (step, task)) in tasks.iter().enumerate() {
            println!(
                "  {}. {} {}",
                i + 1,
                step.bold(),
                format!("({})", task.description()).dimmed()
            );
        }

        println!();
    }
}
