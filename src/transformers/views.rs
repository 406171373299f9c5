// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! View rendering
//!
//! Templates use two tags:
//!
//! - `<%= key %>` interpolates a context value
//! - `<%- include("path") %>` inlines another template, resolved against
//!   the views root
//!
//! Unknown keys and missing includes are errors, never empty strings.

use regex::Regex;
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

use super::{Artifact, SourceFile};
use crate::config::ProjectMeta;
use crate::errors::BuildError;

/// Maximum include nesting; deeper chains are treated as cycles
pub const MAX_INCLUDE_DEPTH: usize = 16;

/// Values available to `<%= key %>`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewContext {
    values: BTreeMap<String, String>,
}

impl ViewContext {
    pub fn new(base_url: &str, app_name: &str, project: &ProjectMeta) -> Self {
        let mut context = Self::default();
        context.insert("baseUrl", base_url);
        context.insert("appName", app_name);
        context.insert("name", &project.name);
        context.insert("version", &project.version);
        context.insert("description", &project.description);
        context.insert("homepage", &project.homepage);
        context
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }
}

/// Renders view templates into the destination tree
#[derive(Debug, Clone)]
pub struct ViewRenderer {
    root: PathBuf,
    dest: PathBuf,
    extension: String,
    context: ViewContext,
}

impl ViewRenderer {
    pub fn new(
        root: impl Into<PathBuf>,
        dest: impl Into<PathBuf>,
        extension: impl Into<String>,
        context: ViewContext,
    ) -> Self {
        Self {
            root: root.into(),
            dest: dest.into(),
            extension: extension.into(),
            context,
        }
    }

    /// Render each source to the same relative path under the destination
    pub fn render(&self, sources: &[SourceFile]) -> Result<Vec<Artifact>, BuildError> {
        sources
            .iter()
            .map(|source| {
                let html = self.render_template(&source.path, &source.content, 0)?;
                Ok(Artifact::new(self.dest.join(&source.relative), html))
            })
            .collect()
    }

    fn render_template(&self, path: &Path, template: &str, depth: usize) -> Result<String, BuildError> {
        static TAG: OnceLock<Regex> = OnceLock::new();
        static INCLUDE: OnceLock<Regex> = OnceLock::new();
        let tag = TAG.get_or_init(|| Regex::new(r"(?s)<%([=-])\s*(.*?)\s*%>").expect("static pattern"));
        let include = INCLUDE.get_or_init(|| {
            Regex::new(r#"^include\(\s*["']([^"']+)["']\s*\)$"#).expect("static pattern")
        });

        let failed = |message: String| BuildError::TransformFailed {
            transformer: "views".to_string(),
            path: path.to_path_buf(),
            message,
        };

        if depth > MAX_INCLUDE_DEPTH {
            return Err(failed(format!(
                "Includes nested deeper than {} levels (circular include?)",
                MAX_INCLUDE_DEPTH
            )));
        }

        let mut out = String::with_capacity(template.len());
        let mut last = 0;

        for caps in tag.captures_iter(template) {
            let (Some(whole), Some(kind), Some(body)) = (caps.get(0), caps.get(1), caps.get(2)) else {
                continue;
            };
            out.push_str(&template[last..whole.start()]);
            last = whole.end();

            match kind.as_str() {
                "=" => {
                    let key = body.as_str();
                    let value = self
                        .context
                        .get(key)
                        .ok_or_else(|| failed(format!("Unknown template key '{}'", key)))?;
                    out.push_str(value);
                }
                _ => {
                    let target = include
                        .captures(body.as_str())
                        .and_then(|c| c.get(1))
                        .ok_or_else(|| failed(format!("Unsupported tag '<%- {} %>'", body.as_str())))?;
                    let partial = self.resolve_include(target.as_str()).map_err(failed)?;
                    let content = std::fs::read_to_string(&partial).map_err(|e| {
                        failed(format!("Cannot include '{}': {}", target.as_str(), e))
                    })?;
                    out.push_str(&self.render_template(&partial, &content, depth + 1)?);
                }
            }
        }

        out.push_str(&template[last..]);
        Ok(out)
    }

    /// Resolve an include target against the views root
    fn resolve_include(&self, target: &str) -> Result<PathBuf, String> {
        let relative = Path::new(target);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if escapes {
            return Err(format!("Include '{}' must stay inside the views root", target));
        }

        let mut path = self.root.join(relative);
        if path.extension().is_none() {
            path.set_extension(&self.extension);
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn context() -> ViewContext {
        let project = ProjectMeta {
            name: "demo".into(),
            version: "1.2.0".into(),
            ..ProjectMeta::default()
        };
        ViewContext::new("http://0.0.0.0:6001", "myapp", &project)
    }

    fn page(root: &Path, relative: &str, content: &str) -> SourceFile {
        SourceFile {
            path: root.join(relative),
            relative: PathBuf::from(relative),
            content: content.to_string(),
        }
    }

    #[test]
    fn test_interpolation() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ViewRenderer::new(dir.path(), "out", "html", context());
        let source = page(
            dir.path(),
            "docs/index.html",
            r#"<script src="<%= baseUrl %>/assets/js/<%=appName%>.min.js"></script> v<%= version %>"#,
        );

        let artifacts = renderer.render(&[source]).unwrap();
        assert_eq!(artifacts[0].path, PathBuf::from("out/docs/index.html"));
        assert_eq!(
            artifacts[0].contents,
            r#"<script src="http://0.0.0.0:6001/assets/js/myapp.min.js"></script> v1.2.0"#
        );
    }

    #[test]
    fn test_unknown_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ViewRenderer::new(dir.path(), "out", "html", context());
        let source = page(dir.path(), "index.html", "<%= missing %>");

        match renderer.render(&[source]) {
            Err(BuildError::TransformFailed { path, message, .. }) => {
                assert_eq!(path, dir.path().join("index.html"));
                assert!(message.contains("missing"));
            }
            other => panic!("Expected TransformFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_include_partial() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("_partials")).unwrap();
        fs::write(dir.path().join("_partials/head.html"), "<title><%= name %></title>").unwrap();

        let renderer = ViewRenderer::new(dir.path(), "out", "html", context());
        let source = page(dir.path(), "index.html", r#"<head><%- include("_partials/head") %></head>"#);

        let artifacts = renderer.render(&[source]).unwrap();
        assert_eq!(artifacts[0].contents, "<head><title>demo</title></head>");
    }

    #[test]
    fn test_missing_include_fails() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ViewRenderer::new(dir.path(), "out", "html", context());
        let source = page(dir.path(), "index.html", r#"<%- include('_partials/nope.html') %>"#);
        assert!(matches!(
            renderer.render(&[source]),
            Err(BuildError::TransformFailed { .. })
        ));
    }

    #[test]
    fn test_circular_include_fails() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("_loop.html"), r#"<%- include("_loop") %>"#).unwrap();

        let renderer = ViewRenderer::new(dir.path(), "out", "html", context());
        let source = page(dir.path(), "index.html", r#"<%- include("_loop") %>"#);

        match renderer.render(&[source]) {
            Err(BuildError::TransformFailed { message, .. }) => assert!(message.contains("circular")),
            other => panic!("Expected TransformFailed, got {:?}", other),
        }
    }

    #[test]
    fn test_include_cannot_escape_root() {
        let dir = tempfile::tempdir().unwrap();
        let renderer = ViewRenderer::new(dir.path(), "out", "html", context());
        let source = page(dir.path(), "index.html", r#"<%- include("../secret") %>"#);
        assert!(renderer.render(&[source]).is_err());
    }
}
