// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Error types
//!
//! Every failure in sitepipe is a [`BuildError`]. Errors raised inside a
//! pipeline step are wrapped in [`BuildError::TaskFailed`] so the message
//! always names the step that broke.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sitepipe operations
pub type BuildResult<T> = Result<T, BuildError>;

/// Coarse error taxonomy used for reporting and exit decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad or inconsistent configuration; detected before work starts
    Configuration,
    /// A transformer or external tool failed on some source
    Transform,
    /// Lint findings escalated by strict mode
    Lint,
    /// Removing, reading or writing files failed
    FileSystem,
    /// Dev server or watcher failure
    Runtime,
}

impl ErrorCategory {
    /// Short label shown ahead of a failure message
    pub fn label(self) -> &'static str {
        match self {
            Self::Configuration => "configuration error",
            Self::Transform => "transform error",
            Self::Lint => "lint error",
            Self::FileSystem => "file system error",
            Self::Runtime => "runtime error",
        }
    }
}

/// Main error type for sitepipe
#[derive(Error, Debug, Diagnostic)]
pub enum BuildError {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(sitepipe::config_not_found),
        help("Create one with 'sitepipe init' or omit --config to use the defaults")
    )]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(sitepipe::invalid_config))]
    InvalidConfig {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Required path '{field}' is missing or empty")]
    #[diagnostic(
        code(sitepipe::missing_path),
        help("Every asset class needs both a 'src' and a 'dest' directory")
    )]
    MissingPath { field: String },

    #[error("Destination '{dest}' overlaps source '{src}'")]
    #[diagnostic(
        code(sitepipe::overlapping_paths),
        help("Output written inside a watched source tree would trigger endless rebuilds")
    )]
    OverlappingPaths { src: PathBuf, dest: PathBuf },

    #[error("Unknown task '{name}'")]
    #[diagnostic(code(sitepipe::unknown_task), help("Registered tasks: {available}"))]
    UnknownTask { name: String, available: String },

    #[error("Task '{name}' is already registered")]
    #[diagnostic(code(sitepipe::duplicate_task))]
    DuplicateTask { name: String },

    #[error("Unknown pipeline '{name}'")]
    #[diagnostic(code(sitepipe::unknown_pipeline), help("Defined pipelines: {available}"))]
    UnknownPipeline { name: String, available: String },

    #[error("Circular pipeline reference: {}", .pipelines.join(" → "))]
    #[diagnostic(
        code(sitepipe::circular_pipeline),
        help("A pipeline may include another pipeline, but not itself")
    )]
    CircularPipeline { pipelines: Vec<String> },

    // ─────────────────────────────────────────────────────────────────────────
    // Transform Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("{transformer} failed on {path}: {message}")]
    #[diagnostic(code(sitepipe::transform_failed))]
    TransformFailed {
        transformer: String,
        path: PathBuf,
        message: String,
    },

    #[error("Tool '{tool}' not found")]
    #[diagnostic(code(sitepipe::tool_not_found), help("{suggestion}"))]
    ToolNotFound { tool: String, suggestion: String },

    #[error("Tool '{tool}' exited with status {status}")]
    #[diagnostic(code(sitepipe::tool_failed))]
    ToolFailed {
        tool: String,
        status: i32,
        #[help]
        stderr: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Execution Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Task '{task}' failed")]
    #[diagnostic(code(sitepipe::task_failed))]
    TaskFailed {
        task: String,
        #[source]
        source: Box<BuildError>,
    },

    #[error("Task '{task}' reported {errors} lint error(s)")]
    #[diagnostic(
        code(sitepipe::lint_failed),
        help("Fix the reported findings or run without --strict")
    )]
    LintFailed { task: String, errors: usize },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to {action} '{path}': {message}")]
    #[diagnostic(code(sitepipe::filesystem))]
    FileSystem {
        action: &'static str,
        path: PathBuf,
        message: String,
    },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(sitepipe::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(sitepipe::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Runtime Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Dev server error: {message}")]
    #[diagnostic(code(sitepipe::server_error))]
    Server { message: String },

    #[error("Watch error: {message}")]
    #[diagnostic(code(sitepipe::watch_error))]
    Watch { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/Parse Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(sitepipe::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(sitepipe::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(sitepipe::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(sitepipe::toml_error))]
    Toml { message: String },

    #[error("Glob pattern error: {message}")]
    #[diagnostic(code(sitepipe::glob_error))]
    GlobPattern { message: String },
}

impl From<std::io::Error> for BuildError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for BuildError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for BuildError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for BuildError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<toml::ser::Error> for BuildError {
    fn from(e: toml::ser::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl From<glob::PatternError> for BuildError {
    fn from(e: glob::PatternError) -> Self {
        Self::GlobPattern { message: e.to_string() }
    }
}

impl BuildError {
    /// Map this error onto the reporting taxonomy.
    ///
    /// `TaskFailed` reports the category of the underlying cause.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigNotFound { .. }
            | Self::InvalidConfig { .. }
            | Self::MissingPath { .. }
            | Self::OverlappingPaths { .. }
            | Self::UnknownTask { .. }
            | Self::DuplicateTask { .. }
            | Self::UnknownPipeline { .. }
            | Self::CircularPipeline { .. }
            | Self::Yaml { .. }
            | Self::Json { .. }
            | Self::Toml { .. }
            | Self::GlobPattern { .. } => ErrorCategory::Configuration,
            Self::TransformFailed { .. } | Self::ToolNotFound { .. } | Self::ToolFailed { .. } => {
                ErrorCategory::Transform
            }
            Self::LintFailed { .. } => ErrorCategory::Lint,
            Self::FileSystem { .. }
            | Self::FileReadError { .. }
            | Self::FileWriteError { .. }
            | Self::Io { .. } => ErrorCategory::FileSystem,
            Self::Server { .. } | Self::Watch { .. } => ErrorCategory::Runtime,
            Self::TaskFailed { source, .. } => source.category(),
        }
    }

    /// Innermost cause, looking through `TaskFailed` wrappers
    pub fn root_cause(&self) -> &BuildError {
        match self {
            Self::TaskFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// One-line message that includes every wrapped cause, e.g.
    /// `Task 'css' failed: styles failed on main.css: Unexpected token`
    pub fn chain(&self) -> String {
        match self {
            Self::TaskFailed { source, .. } => format!("{}: {}", self, source.chain()),
            other => other.to_string(),
        }
    }

    /// Wrap this error with the name of the step that raised it
    pub fn in_task(self, task: &str) -> Self {
        Self::TaskFailed {
            task: task.to_string(),
            source: Box::new(self),
        }
    }

    /// Create an unknown task error listing what is registered
    pub fn unknown_task(name: &str, available: &[&str]) -> Self {
        Self::UnknownTask {
            name: name.to_string(),
            available: if available.is_empty() {
                "(none)".to_string()
            } else {
                available.join(", ")
            },
        }
    }

    /// Create a tool not found error with installation suggestion
    pub fn tool_not_found(tool: &str) -> Self {
        let suggestion = match tool {
            "jshint" | "csslint" | "htmlhint" => format!("Install it with: npm install -g {}", tool),
            "sass" => "Install Dart Sass: https://sass-lang.com/install".to_string(),
            _ => format!("Install {} and ensure it's in your PATH", tool),
        };

        Self::ToolNotFound {
            tool: tool.to_string(),
            suggestion,
        }
    }

    /// Create a read error for `path`
    pub fn read(path: impl Into<PathBuf>, e: std::io::Error) -> Self {
        Self::FileReadError {
            path: path.into(),
            error: e.to_string(),
        }
    }

    /// Create a write error for `path`
    pub fn write(path: impl Into<PathBuf>, e: std::io::Error) -> Self {
        Self::FileWriteError {
            path: path.into(),
            error: e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_failed_reports_cause_category() {
        let err = BuildError::TransformFailed {
            transformer: "styles".into(),
            path: PathBuf::from("app/main.css"),
            message: "Unexpected token".into(),
        }
        .in_task("css");

        assert_eq!(err.category(), ErrorCategory::Transform);
        assert_eq!(err.to_string(), "Task 'css' failed");
        assert!(matches!(err.root_cause(), BuildError::TransformFailed { .. }));
    }

    #[test]
    fn test_chain_names_step_and_cause() {
        let err = BuildError::TransformFailed {
            transformer: "styles".into(),
            path: PathBuf::from("app/assets/css/main.css"),
            message: "Unexpected token".into(),
        }
        .in_task("css");

        assert_eq!(
            err.chain(),
            "Task 'css' failed: styles failed on app/assets/css/main.css: Unexpected token"
        );
        assert_eq!(
            BuildError::Io { message: "boom".into() }.chain(),
            "IO error: boom"
        );
    }

    #[test]
    fn test_unknown_task_lists_available() {
        let err = BuildError::unknown_task("sass", &["css", "js"]);
        match err {
            BuildError::UnknownTask { name, available } => {
                assert_eq!(name, "sass");
                assert_eq!(available, "css, js");
            }
            _ => panic!("Expected UnknownTask"),
        }
    }

    #[test]
    fn test_circular_pipeline_message() {
        let err = BuildError::CircularPipeline {
            pipelines: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "Circular pipeline reference: a → b → a");
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
