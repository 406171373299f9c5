// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Built-in linters
//!
//! Small rule sets that need no external tooling. They are used whenever
//! no external linter is configured for an asset class.

use async_trait::async_trait;
use lightningcss::stylesheet::{ParserOptions, StyleSheet};
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock, RwLock};

use super::{LintReport, Linter};
use crate::errors::BuildError;

/// 1-based line number of a byte offset
fn line_of(content: &str, offset: usize) -> usize {
    content[..offset].matches('\n').count() + 1
}

async fn read(path: &Path) -> Result<String, BuildError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|e| BuildError::read(path, e))
}

/// Script rules: `debugger` statements (error), `eval` calls and trailing
/// whitespace (warning)
pub struct ScriptLinter;

impl ScriptLinter {
    fn check(path: &Path, content: &str, report: &mut LintReport) {
        static DEBUGGER: OnceLock<Regex> = OnceLock::new();
        static EVAL: OnceLock<Regex> = OnceLock::new();
        let debugger = DEBUGGER.get_or_init(|| Regex::new(r"\bdebugger\b").expect("static pattern"));
        let eval = EVAL.get_or_init(|| Regex::new(r"\beval\s*\(").expect("static pattern"));

        for (idx, line) in content.lines().enumerate() {
            let code = line.trim_start();
            if code.starts_with("//") || code.starts_with('*') || code.starts_with("/*") {
                continue;
            }

            if !code.is_empty() && code.len() != code.trim_end().len() {
                report.warning(path, Some(idx + 1), "Trailing whitespace");
            }

            if debugger.is_match(code) {
                report.error(path, Some(idx + 1), "Forgotten 'debugger' statement");
            }
            if eval.is_match(code) {
                report.warning(path, Some(idx + 1), "eval can be harmful");
            }
        }
    }
}

#[async_trait]
impl Linter for ScriptLinter {
    fn name(&self) -> &str {
        "script lint"
    }

    async fn lint(&self, files: &[PathBuf]) -> Result<LintReport, BuildError> {
        let mut report = LintReport::new(self.name());
        for path in files {
            let content = read(path).await?;
            Self::check(path, &content, &mut report);
            report.files_checked += 1;
        }
        Ok(report)
    }
}

/// Stylesheet rules: parser warnings (error), empty rules (warning)
pub struct StyleLinter;

impl StyleLinter {
    fn check(path: &Path, content: &str, report: &mut LintReport) {
        static EMPTY_RULE: OnceLock<Regex> = OnceLock::new();
        let empty_rule =
            EMPTY_RULE.get_or_init(|| Regex::new(r"([^{};]+)\{\s*\}").expect("static pattern"));

        let warnings = Arc::new(RwLock::new(Vec::new()));
        let options = ParserOptions {
            filename: path.display().to_string(),
            error_recovery: true,
            warnings: Some(warnings.clone()),
            ..ParserOptions::default()
        };

        if let Err(e) = StyleSheet::parse(content, options) {
            let line = e.loc.as_ref().map(|l| l.line as usize + 1);
            report.error(path, line, e.kind.to_string());
        }

        if let Ok(warnings) = warnings.read() {
            for warning in warnings.iter() {
                let line = warning.loc.as_ref().map(|l| l.line as usize + 1);
                report.error(path, line, warning.kind.to_string());
            }
        }

        for m in empty_rule.captures_iter(content) {
            let Some(selector) = m.get(1) else {
                continue;
            };
            let text = selector.as_str();
            let offset = selector.start() + (text.len() - text.trim_start().len());
            report.warning(
                path,
                Some(line_of(content, offset)),
                format!("Rule '{}' is empty", text.trim()),
            );
        }
    }
}

#[async_trait]
impl Linter for StyleLinter {
    fn name(&self) -> &str {
        "style lint"
    }

    async fn lint(&self, files: &[PathBuf]) -> Result<LintReport, BuildError> {
        let mut report = LintReport::new(self.name());
        for path in files {
            let content = read(path).await?;
            Self::check(path, &content, &mut report);
            report.files_checked += 1;
        }
        Ok(report)
    }
}

/// Markup rules: doctype first (error), unique ids (error), img alt (warning)
pub struct MarkupLinter;

impl MarkupLinter {
    fn check(path: &Path, content: &str, report: &mut LintReport) {
        static ID_ATTR: OnceLock<Regex> = OnceLock::new();
        static IMG_TAG: OnceLock<Regex> = OnceLock::new();
        static ALT_ATTR: OnceLock<Regex> = OnceLock::new();
        let id_attr = ID_ATTR.get_or_init(|| {
            Regex::new(r#"\sid\s*=\s*["']([^"']+)["']"#).expect("static pattern")
        });
        let img_tag = IMG_TAG.get_or_init(|| Regex::new(r"(?i)<img\b[^>]*>").expect("static pattern"));
        let alt_attr = ALT_ATTR.get_or_init(|| Regex::new(r"(?i)\salt\s*=").expect("static pattern"));

        if !content
            .trim_start()
            .to_ascii_lowercase()
            .starts_with("<!doctype html")
        {
            report.error(path, Some(1), "Doctype must be declared first");
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for m in id_attr.captures_iter(content) {
            let (Some(whole), Some(id)) = (m.get(0), m.get(1)) else {
                continue;
            };
            let line = line_of(content, whole.start());
            if let Some(first) = seen.get(id.as_str()) {
                report.error(
                    path,
                    Some(line),
                    format!("The id '{}' is already used on line {}", id.as_str(), first),
                );
            } else {
                seen.insert(id.as_str(), line);
            }
        }

        for tag in img_tag.find_iter(content) {
            if !alt_attr.is_match(tag.as_str()) {
                report.warning(
                    path,
                    Some(line_of(content, tag.start())),
                    "An alt attribute must be present on <img> elements",
                );
            }
        }
    }
}

#[async_trait]
impl Linter for MarkupLinter {
    fn name(&self) -> &str {
        "markup lint"
    }

    async fn lint(&self, files: &[PathBuf]) -> Result<LintReport, BuildError> {
        let mut report = LintReport::new(self.name());
        for path in files {
            let content = read(path).await?;
            Self::check(path, &content, &mut report);
            report.files_checked += 1;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lint::Severity;

    #[test]
    fn test_script_debugger_and_eval() {
        let mut report = LintReport::new("t");
        let source = "/*! banner */\nvar a = 1;\n  debugger;\n// debugger in a comment\nvar b = eval ('2');\n";
        ScriptLinter::check(Path::new("app.js"), source, &mut report);

        assert_eq!(report.error_count(), 1);
        assert_eq!(report.findings[0].line, Some(3));
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.findings[1].line, Some(5));
    }

    #[test]
    fn test_script_clean() {
        let mut report = LintReport::new("t");
        ScriptLinter::check(Path::new("app.js"), "var x = 1;\n", &mut report);
        assert!(report.is_clean());
    }

    #[test]
    fn test_script_trailing_whitespace() {
        let mut report = LintReport::new("t");
        ScriptLinter::check(Path::new("app.js"), "var x = 1;  \nvar y = 2;\n", &mut report);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.findings[0].line, Some(1));
    }

    #[test]
    fn test_style_empty_rule() {
        let mut report = LintReport::new("t");
        let css = "a { color: red; }\n\n.unused {\n}\n";
        StyleLinter::check(Path::new("site.css"), css, &mut report);

        assert_eq!(report.error_count(), 0);
        assert_eq!(report.warning_count(), 1);
        assert_eq!(report.findings[0].line, Some(3));
        assert!(report.findings[0].message.contains(".unused"));
    }

    #[test]
    fn test_markup_rules() {
        let mut report = LintReport::new("t");
        let html = "<html>\n<body>\n<div id=\"main\"></div>\n<p id='main'></p>\n<img src=\"a.png\">\n<img src=\"b.png\" alt=\"b\">\n</body></html>";
        MarkupLinter::check(Path::new("index.html"), html, &mut report);

        let errors: Vec<_> = report
            .findings
            .iter()
            .filter(|f| f.severity == Severity::Error)
            .collect();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].message.contains("Doctype"));
        assert_eq!(errors[1].line, Some(4));

        assert_eq!(report.warning_count(), 1);
    }

    #[test]
    fn test_markup_with_doctype_is_clean() {
        let mut report = LintReport::new("t");
        let html = "<!DOCTYPE html>\n<html><body><img src=\"a.png\" alt=\"\"></body></html>";
        MarkupLinter::check(Path::new("index.html"), html, &mut report);
        assert!(report.is_clean(), "{:?}", report.findings);
    }

    #[tokio::test]
    async fn test_lint_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.js");
        std::fs::write(&file, "debugger;\n").unwrap();

        let report = ScriptLinter.lint(&[file]).await.unwrap();
        assert_eq!(report.files_checked, 1);
        assert_eq!(report.error_count(), 1);
    }
}
