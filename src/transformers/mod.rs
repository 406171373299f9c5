// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Asset transformers
//!
//! Each transformer is a plain function object from source files to output
//! [`Artifact`]s. Tasks collect sources, call a transformer, and write the
//! artifacts before returning, so a following step always sees complete
//! files on disk.

mod external;
mod images;
mod scripts;
pub mod sourcemap;
mod styles;
mod views;

pub use external::{run_shell, ExternalTool, ToolOutput, FILE_PLACEHOLDER};
pub use images::ImageCopier;
pub use scripts::ScriptBundler;
pub use styles::StyleCompiler;
pub use views::{ViewContext, ViewRenderer};

use std::path::{Path, PathBuf};

use crate::errors::BuildError;

/// A source file read from one of the source roots
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as found on disk
    pub path: PathBuf,
    /// Path relative to the source root
    pub relative: PathBuf,
    pub content: String,
}

/// A generated output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub contents: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// List files under `root` matching `pattern`, relative to `root`, in
/// lexical order.
///
/// Paths with any component starting with `private_prefix` are skipped. A
/// missing root yields an empty list.
pub fn find_files(
    root: &Path,
    pattern: &str,
    private_prefix: Option<&str>,
) -> Result<Vec<PathBuf>, BuildError> {
    if !root.is_dir() {
        tracing::warn!(root = %root.display(), "directory does not exist; nothing to do");
        return Ok(Vec::new());
    }

    let full = format!(
        "{}/{}",
        glob::Pattern::escape(&root.to_string_lossy()),
        pattern
    );

    let mut files = Vec::new();
    for entry in glob::glob(&full)? {
        let path = entry.map_err(|e| {
            let path = e.path().to_path_buf();
            BuildError::read(path, e.into_error())
        })?;
        if !path.is_file() {
            continue;
        }

        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };

        if let Some(prefix) = private_prefix {
            let private = relative
                .components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with(prefix));
            if private {
                continue;
            }
        }

        files.push(relative.to_path_buf());
    }

    files.sort();
    Ok(files)
}

/// Read every `*.extension` file under `root`, in lexical relative-path order
pub async fn collect_sources(
    root: &Path,
    extension: &str,
    private_prefix: Option<&str>,
) -> Result<Vec<SourceFile>, BuildError> {
    let pattern = format!("**/*.{}", extension);
    let mut sources = Vec::new();

    for relative in find_files(root, &pattern, private_prefix)? {
        let path = root.join(&relative);
        let content = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| BuildError::read(&path, e))?;
        sources.push(SourceFile {
            path,
            relative,
            content,
        });
    }

    Ok(sources)
}

/// Write artifacts to disk, creating parent directories
pub async fn write_artifacts(artifacts: &[Artifact]) -> Result<Vec<PathBuf>, BuildError> {
    let mut written = Vec::with_capacity(artifacts.len());

    for artifact in artifacts {
        if let Some(parent) = artifact.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| BuildError::write(parent, e))?;
        }
        tokio::fs::write(&artifact.path, &artifact.contents)
            .await
            .map_err(|e| BuildError::write(&artifact.path, e))?;
        written.push(artifact.path.clone());
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_collect_sources_lexical_order() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("lib")).unwrap();
        fs::write(dir.path().join("b.js"), "b").unwrap();
        fs::write(dir.path().join("a.js"), "a").unwrap();
        fs::write(dir.path().join("lib/c.js"), "c").unwrap();
        fs::write(dir.path().join("notes.txt"), "x").unwrap();

        let sources = collect_sources(dir.path(), "js", None).await.unwrap();
        let names: Vec<_> = sources.iter().map(|s| s.relative.clone()).collect();
        assert_eq!(
            names,
            vec![PathBuf::from("a.js"), PathBuf::from("b.js"), PathBuf::from("lib/c.js")]
        );
        assert_eq!(sources[0].content, "a");
    }

    #[tokio::test]
    async fn test_private_paths_excluded() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("_partials")).unwrap();
        fs::write(dir.path().join("index.html"), "").unwrap();
        fs::write(dir.path().join("_partials/head.html"), "").unwrap();
        fs::write(dir.path().join("_draft.html"), "").unwrap();

        let sources = collect_sources(dir.path(), "html", Some("_")).await.unwrap();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].relative, PathBuf::from("index.html"));
    }

    #[tokio::test]
    async fn test_missing_root_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let sources = collect_sources(&dir.path().join("nope"), "js", None)
            .await
            .unwrap();
        assert!(sources.is_empty());
    }

    #[tokio::test]
    async fn test_write_artifacts_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("deep/er/file.txt");
        let written = write_artifacts(&[Artifact::new(&out, "hi")]).await.unwrap();
        assert_eq!(written, vec![out.clone()]);
        assert_eq!(fs::read_to_string(out).unwrap(), "hi");
    }
}
