// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use super::BuildError;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Pick a suggestion for an error, if one applies
    pub fn for_error(error: &BuildError) -> Option<Self> {
        match error.root_cause() {
            BuildError::ToolNotFound { tool, .. } => Some(Self::install_tool(tool)),
            BuildError::ConfigNotFound { .. } => Some(Self::create_config()),
            BuildError::UnknownTask { name, available } => {
                Some(Self::fix_unknown_task(name, available))
            }
            BuildError::OverlappingPaths { src, dest } => Some(Self::separate_paths(
                &src.display().to_string(),
                &dest.display().to_string(),
            )),
            _ => None,
        }
    }

    /// Suggest installing a missing tool
    pub fn install_tool(tool: &str) -> Self {
        match tool {
            "jshint" | "csslint" | "htmlhint" => Self {
                action: format!("Install {}", tool),
                steps: vec![
                    format!("{} is configured as an external linter", tool),
                    "Install it globally or remove the 'program' from the lint section".into(),
                ],
                commands: vec![
                    "# Using npm:".into(),
                    format!("npm install -g {}", tool),
                ],
            },
            "sass" => Self {
                action: "Install Dart Sass".into(),
                steps: vec![
                    "Sass is configured as the stylesheet preprocessor".into(),
                    "Choose an installation method below".into(),
                ],
                commands: vec![
                    "# Using npm:".into(),
                    "npm install -g sass".into(),
                    "".into(),
                    "# Using Homebrew (macOS/Linux):".into(),
                    "brew install sass/sass/sass".into(),
                ],
            },
            _ => Self {
                action: format!("Install {}", tool),
                steps: vec![format!("Install {} and ensure it's in your PATH", tool)],
                commands: vec![],
            },
        }
    }

    /// Suggest creating a configuration file
    pub fn create_config() -> Self {
        Self {
            action: "Create a sitepipe configuration".into(),
            steps: vec![
                "The configuration file passed with --config does not exist".into(),
                "Write the default layout and edit it to match your project".into(),
            ],
            commands: vec!["sitepipe init".into()],
        }
    }

    /// Suggest fixing a pipeline step that names no registered task
    pub fn fix_unknown_task(name: &str, available: &str) -> Self {
        Self {
            action: format!("Fix the reference to '{}'", name),
            steps: vec![
                format!("No task or pipeline is called '{}'", name),
                format!("Registered tasks: {}", available),
                "Check the 'steps' lists under 'pipelines' for typos".into(),
            ],
            commands: vec![
                "# List tasks and pipelines:".into(),
                "sitepipe tasks".into(),
            ],
        }
    }

    /// Suggest moving an output directory out of a source tree
    pub fn separate_paths(src: &str, dest: &str) -> Self {
        Self {
            action: "Move the destination out of the source tree".into(),
            steps: vec![
                format!("'{}' is written while '{}' is read and watched", dest, src),
                "Point every 'dest' at a directory outside all 'src' roots (e.g. _site/)".into(),
            ],
            commands: vec!["sitepipe check".into()],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_looks_through_task_failure() {
        let err = BuildError::tool_not_found("jshint").in_task("lint:js");
        let suggestion = RecoverySuggestion::for_error(&err).unwrap();
        assert_eq!(suggestion.action, "Install jshint");
        assert!(suggestion.to_string().contains("npm install -g jshint"));
    }

    #[test]
    fn test_linter_suggestion_names_config_field() {
        let suggestion = RecoverySuggestion::install_tool("csslint");
        assert!(suggestion.to_string().contains("remove the 'program'"));
    }

    #[test]
    fn test_no_suggestion_for_io() {
        let err = BuildError::Io { message: "boom".into() };
        assert!(RecoverySuggestion::for_error(&err).is_none());
    }
}
