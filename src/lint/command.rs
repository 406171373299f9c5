// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! External command linter (jshint, csslint, htmlhint, ...)

use async_trait::async_trait;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::{LintReport, Linter};
use crate::config::ExternalCommand;
use crate::errors::BuildError;
use crate::transformers::ExternalTool;

/// Runs an external linter and turns its output into findings.
///
/// Lines shaped like `file: line N, col M, message` become errors. Tools
/// whose arguments contain `{file}` run once per file. A
/// non-zero exit with no parseable lines becomes a single error carrying
/// the tool output. A missing tool is a warning, never a failure.
pub struct CommandLinter {
    command: ExternalCommand,
    working_dir: PathBuf,
    name: String,
}

impl CommandLinter {
    pub fn new(command: ExternalCommand, working_dir: PathBuf) -> Self {
        let name = command.program.clone();
        Self {
            command,
            working_dir,
            name,
        }
    }

    fn parse_output(output: &str, working_dir: &Path, report: &mut LintReport) -> usize {
        static FINDING: OnceLock<Regex> = OnceLock::new();
        let finding = FINDING.get_or_init(|| {
            Regex::new(r"^(.+?): line (\d+), col (\d+), (.+)$").expect("static pattern")
        });

        let mut parsed = 0;
        for line in output.lines() {
            if let Some(caps) = finding.captures(line.trim()) {
                let line_no = caps[2].parse().ok();
                report.error(working_dir.join(&caps[1]), line_no, caps[4].to_string());
                parsed += 1;
            }
        }
        parsed
    }
}

#[async_trait]
impl Linter for CommandLinter {
    fn name(&self) -> &str {
        &self.name
    }

    async fn lint(&self, files: &[PathBuf]) -> Result<LintReport, BuildError> {
        let mut report = LintReport::new(&self.name);

        let tool = match ExternalTool::locate(&self.command) {
            Ok(tool) => tool,
            Err(e) => {
                tracing::warn!(linter = %self.name, "{}", e);
                report.warning(
                    PathBuf::from(&self.name),
                    None,
                    format!("Linter '{}' is not installed; skipped", self.name),
                );
                return Ok(report);
            }
        };

        if files.is_empty() {
            return Ok(report);
        }

        let batches: Vec<&[PathBuf]> = if tool.per_file() {
            files.iter().map(std::slice::from_ref).collect()
        } else {
            vec![files]
        };

        for batch in batches {
            let output = tool.run(batch, &self.working_dir).await?;

            let mut parsed = Self::parse_output(&output.stdout, &self.working_dir, &mut report);
            parsed += Self::parse_output(&output.stderr, &self.working_dir, &mut report);

            if !output.success && parsed == 0 {
                let text = format!("{}{}", output.stdout, output.stderr);
                report.error(
                    batch[0].clone(),
                    None,
                    format!("{} exited with status {}: {}", self.name, output.status, text.trim()),
                );
            }
        }
        report.files_checked = files.len();

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_jshint_style_output() {
        let mut report = LintReport::new("jshint");
        let output = "_site/app.js: line 3, col 5, Missing semicolon.\n\n2 errors\n";
        let parsed = CommandLinter::parse_output(output, Path::new("/proj"), &mut report);

        assert_eq!(parsed, 1);
        assert_eq!(report.findings[0].line, Some(3));
        assert_eq!(report.findings[0].path, PathBuf::from("/proj/_site/app.js"));
        assert_eq!(report.findings[0].message, "Missing semicolon.");
    }

    #[tokio::test]
    async fn test_missing_linter_is_a_warning() {
        let linter = CommandLinter::new(
            ExternalCommand {
                program: "no-such-linter-77231".into(),
                args: vec![],
            },
            PathBuf::from("."),
        );

        let report = linter.lint(&[PathBuf::from("a.js")]).await.unwrap();
        assert_eq!(report.error_count(), 0);
        assert_eq!(report.warning_count(), 1);
    }

    #[tokio::test]
    async fn test_file_placeholder_lints_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let linter = CommandLinter::new(
            ExternalCommand {
                program: "sh".into(),
                args: vec![
                    "-c".into(),
                    r#"echo "$0: line 1, col 1, seen""#.into(),
                    "{file}".into(),
                ],
            },
            dir.path().to_path_buf(),
        );

        let files = [PathBuf::from("a.css"), PathBuf::from("b.css")];
        let report = linter.lint(&files).await.unwrap();

        assert_eq!(report.files_checked, 2);
        assert_eq!(report.error_count(), 2);
        let paths: Vec<_> = report.findings.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![dir.path().join("a.css"), dir.path().join("b.css")]);
    }

    #[tokio::test]
    async fn test_failing_linter_without_parseable_output() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.js");
        std::fs::write(&file, "x").unwrap();

        // `false` ignores its arguments and exits 1
        let linter = CommandLinter::new(
            ExternalCommand {
                program: "false".into(),
                args: vec![],
            },
            dir.path().to_path_buf(),
        );

        let report = linter.lint(&[file]).await.unwrap();
        assert_eq!(report.error_count(), 1);
    }
}
