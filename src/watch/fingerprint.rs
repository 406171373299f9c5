// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Content fingerprints
//!
//! Editors and build steps often rewrite files without changing them. The
//! tracker remembers a BLAKE3 hash per path so such events can be dropped.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Last observed content hash per file
#[derive(Debug, Default)]
pub struct ContentTracker {
    hashes: HashMap<PathBuf, blake3::Hash>,
}

impl ContentTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current content of every file under `dir`
    pub fn prime(&mut self, dir: &Path) {
        let pattern = format!("{}/**/*", glob::Pattern::escape(&dir.to_string_lossy()));
        let Ok(entries) = glob::glob(&pattern) else {
            return;
        };

        for path in entries.flatten() {
            if let Ok(content) = std::fs::read(&path) {
                self.hashes.insert(path, blake3::hash(&content));
            }
        }
    }

    /// Whether `path` differs from what was last observed.
    ///
    /// Deleted files always count as changed. Directories never do; the
    /// events for the files inside them carry the change.
    pub fn changed(&mut self, path: &Path) -> bool {
        if path.is_dir() {
            return false;
        }

        match std::fs::read(path) {
            Ok(content) => {
                let hash = blake3::hash(&content);
                self.hashes.insert(path.to_path_buf(), hash) != Some(hash)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.hashes.remove(path);
                true
            }
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot fingerprint");
                true
            }
        }
    }

    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_unchanged_content_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a.js");
        fs::write(&file, "var a;").unwrap();

        let mut tracker = ContentTracker::new();
        tracker.prime(dir.path());
        assert_eq!(tracker.len(), 1);

        // Same bytes written again
        fs::write(&file, "var a;").unwrap();
        assert!(!tracker.changed(&file));

        fs::write(&file, "var b;").unwrap();
        assert!(tracker.changed(&file));
        assert!(!tracker.changed(&file));
    }

    #[test]
    fn test_new_and_deleted_files_count_as_changed() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("new.css");
        let mut tracker = ContentTracker::new();

        fs::write(&file, "a{}").unwrap();
        assert!(tracker.changed(&file));

        fs::remove_file(&file).unwrap();
        assert!(tracker.changed(&file));
        assert!(tracker.is_empty());
    }

    #[test]
    fn test_directories_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let mut tracker = ContentTracker::new();
        assert!(!tracker.changed(dir.path()));
    }
}
