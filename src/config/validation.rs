// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Configuration validation
//!
//! Checks a loaded configuration against the registered tasks and the
//! filesystem. Used by `sitepipe check`; the runner performs the same
//! name resolution again before executing anything.

use std::collections::HashSet;
use std::path::Path;

use crate::config::SiteConfig;
use crate::pipeline::ExecutionPlan;
use crate::tasks::clean::check_pattern;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate a configuration.
    ///
    /// `task_names` are the tasks the registry knows about (built-in and
    /// user-defined).
    pub fn validate(config: &SiteConfig, root: &Path, task_names: &[&str]) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Err(e) = config.check_paths() {
            result.add_error(&e.to_string());
        }

        for pattern in &config.clean {
            if let Err(e) = check_pattern(pattern) {
                result.add_error(&e.to_string());
            }
        }

        Self::validate_pipelines(config, task_names, &mut result);
        Self::validate_watch(config, task_names, &mut result);
        Self::validate_files(config, root, &mut result);

        if config.styles.extension != "css" && config.styles.preprocessor.is_none() {
            result.add_warning(&format!(
                "Stylesheets use '.{}' but no preprocessor is configured; sources are parsed as plain CSS",
                config.styles.extension
            ));
        }

        result
    }

    fn validate_pipelines(config: &SiteConfig, task_names: &[&str], result: &mut ValidationResult) {
        let tasks: HashSet<&str> = task_names.iter().copied().collect();

        for name in config.tasks.keys() {
            if config.pipelines.contains_key(name) {
                result.add_error(&format!(
                    "Task '{}' has the same name as a pipeline",
                    name
                ));
            }
        }

        for (name, spec) in &config.pipelines {
            if spec.steps.is_empty() {
                result.add_warning(&format!("Pipeline '{}' has no steps", name));
            }

            if tasks.contains(name.as_str()) {
                result.add_error(&format!(
                    "Pipeline '{}' has the same name as a task",
                    name
                ));
            }

            for step in &spec.steps {
                if !tasks.contains(step.as_str()) && !config.pipelines.contains_key(step) {
                    result.add_error(&format!(
                        "Pipeline '{}': step '{}' is neither a task nor a pipeline",
                        name, step
                    ));
                }
            }

            if let Err(e) = ExecutionPlan::expand(&config.pipelines, name) {
                result.add_error(&e.to_string());
            }
        }
    }

    fn validate_watch(config: &SiteConfig, task_names: &[&str], result: &mut ValidationResult) {
        for binding in config.watch_bindings() {
            if let Err(e) = glob::Pattern::new(&binding.pattern) {
                result.add_error(&format!(
                    "Watch pattern '{}' is invalid: {}",
                    binding.pattern, e
                ));
            }

            if !task_names.contains(&binding.task.as_str()) {
                result.add_error(&format!(
                    "Watch pattern '{}' re-runs unknown task '{}'",
                    binding.pattern, binding.task
                ));
            }
        }
    }

    /// Filesystem checks that only produce warnings
    fn validate_files(config: &SiteConfig, root: &Path, result: &mut ValidationResult) {
        for (class, paths) in config.paths.iter() {
            if !root.join(&paths.src).is_dir() {
                result.add_warning(&format!(
                    "Source directory for {} does not exist: {}",
                    class,
                    paths.src.display()
                ));
            }
        }

        if config.project.is_none() && !root.join(&config.package).exists() {
            result.add_warning(&format!(
                "No {} and no 'project' section; banners will be empty",
                config.package.display()
            ));
        }
    }
}

/// Result of configuration validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
