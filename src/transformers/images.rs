// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Image copying

use std::path::PathBuf;

use super::find_files;
use crate::errors::BuildError;

/// Copies the image tree verbatim, preserving relative paths
#[derive(Debug, Clone)]
pub struct ImageCopier {
    src: PathBuf,
    dest: PathBuf,
}

impl ImageCopier {
    pub fn new(src: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
        }
    }

    /// Copy every file and return the written paths
    pub async fn copy(&self) -> Result<Vec<PathBuf>, BuildError> {
        let mut written = Vec::new();

        for relative in find_files(&self.src, "**/*", None)? {
            let from = self.src.join(&relative);
            let to = self.dest.join(&relative);

            if let Some(parent) = to.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| BuildError::write(parent, e))?;
            }
            tokio::fs::copy(&from, &to)
                .await
                .map_err(|e| BuildError::write(&to, e))?;
            written.push(to);
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_copy_preserves_tree() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("img");
        fs::create_dir_all(src.join("icons")).unwrap();
        fs::write(src.join("logo.png"), [0x89, 0x50, 0x4e, 0x47]).unwrap();
        fs::write(src.join("icons/star.svg"), "<svg/>").unwrap();

        let dest = dir.path().join("out/img");
        let written = ImageCopier::new(&src, &dest).copy().await.unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(fs::read(dest.join("logo.png")).unwrap(), vec![0x89, 0x50, 0x4e, 0x47]);
        assert!(dest.join("icons/star.svg").exists());
    }
}
