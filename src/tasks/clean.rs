// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Cleaner
//!
//! Removes build output and caches before a build. Patterns are globs
//! relative to the project root; anything that would reach outside the
//! root, or delete the root itself, is rejected up front.

use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use crate::errors::BuildError;
use crate::pipeline::{Task, TaskOutput};

/// Check that a clean pattern stays strictly inside the project root
pub fn check_pattern(pattern: &str) -> Result<(), BuildError> {
    let invalid = |reason: &str| BuildError::InvalidConfig {
        reason: format!("Clean pattern '{}' {}", pattern, reason),
        help: Some("Clean patterns are globs relative to the project root, e.g. '_site/*'".to_string()),
    };

    let trimmed = pattern.trim();
    if trimmed.is_empty() {
        return Err(invalid("is empty"));
    }

    let path = Path::new(trimmed);
    if path.is_absolute() || trimmed.starts_with('/') || trimmed.starts_with('\\') {
        return Err(invalid("must be relative"));
    }

    let mut meaningful = 0;
    for component in path.components() {
        match component {
            Component::ParentDir => return Err(invalid("escapes the project root")),
            Component::Prefix(_) | Component::RootDir => return Err(invalid("must be relative")),
            Component::CurDir => {}
            Component::Normal(part) => {
                let part = part.to_string_lossy();
                if meaningful == 0 && part.chars().all(|c| c == '*') {
                    return Err(invalid("would remove the whole project"));
                }
                meaningful += 1;
            }
        }
    }

    if meaningful == 0 {
        return Err(invalid("matches the project root"));
    }

    glob::Pattern::new(trimmed)?;
    Ok(())
}

/// Removes everything matched by the configured patterns
#[derive(Debug, Clone)]
pub struct Cleaner {
    root: PathBuf,
    patterns: Vec<String>,
}

impl Cleaner {
    /// Create a cleaner, rejecting unsafe patterns
    pub fn new(root: impl Into<PathBuf>, patterns: &[String]) -> Result<Self, BuildError> {
        for pattern in patterns {
            check_pattern(pattern)?;
        }

        Ok(Self {
            root: root.into(),
            patterns: patterns.to_vec(),
        })
    }

    /// Remove every match. Missing paths are not an error.
    ///
    /// Matches are collected before anything is deleted, so a recursive
    /// pattern never walks a directory it has already removed.
    pub async fn clean(&self) -> Result<Vec<PathBuf>, BuildError> {
        let mut matches = self.matches()?;
        matches.sort();
        matches.dedup();

        let mut removed: Vec<PathBuf> = Vec::new();
        for path in matches {
            if removed.iter().any(|gone| path.starts_with(gone)) {
                continue;
            }

            if remove(&path).await? {
                tracing::debug!(path = %path.display(), "removed");
                removed.push(path);
            }
        }

        Ok(removed)
    }

    fn matches(&self) -> Result<Vec<PathBuf>, BuildError> {
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        let mut matches = Vec::new();

        for pattern in &self.patterns {
            let full = format!("{}/{}", root, pattern.trim().trim_start_matches("./"));

            for entry in glob::glob(&full)? {
                match entry {
                    Ok(path) => matches.push(path),
                    Err(e) if e.error().kind() == ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(BuildError::FileSystem {
                            action: "read",
                            path: e.path().to_path_buf(),
                            message: e.error().to_string(),
                        })
                    }
                }
            }
        }

        Ok(matches)
    }
}

/// Remove a file or directory tree; `false` when it was already gone
async fn remove(path: &Path) -> Result<bool, BuildError> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(remove_failed(path, e)),
    };

    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(remove_failed(path, e)),
    }
}

fn remove_failed(path: &Path, e: std::io::Error) -> BuildError {
    BuildError::FileSystem {
        action: "remove",
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

#[async_trait]
impl Task for Cleaner {
    fn description(&self) -> &str {
        "Remove build output and caches"
    }

    async fn run(&self) -> Result<TaskOutput, BuildError> {
        let removed = self.clean().await?;
        tracing::info!(count = removed.len(), "cleaned");
        Ok(TaskOutput::done())
    }
}
