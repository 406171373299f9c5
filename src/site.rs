// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! A loaded site: project root, configuration and metadata

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ProjectMeta, SiteConfig, DEFAULT_CONFIG_FILE};
use crate::errors::{BuildError, BuildResult};
use crate::pipeline::{ExecutionPlan, TaskRegistry};
use crate::tasks::builtin_registry;
use crate::watch::WatchPlan;

/// Configuration file names tried, in order, when none is given
pub const CONFIG_CANDIDATES: [&str; 3] = [DEFAULT_CONFIG_FILE, "sitepipe.yml", "sitepipe.toml"];

/// Everything a command needs to know about the project
#[derive(Debug, Clone)]
pub struct Site {
    pub root: PathBuf,
    pub config: Arc<SiteConfig>,
    pub project: ProjectMeta,
    /// File the configuration came from; `None` means built-in defaults
    pub config_path: Option<PathBuf>,
}

impl Site {
    /// Load the site rooted at `root`
    pub fn load(root: &Path, explicit: Option<&Path>) -> BuildResult<Self> {
        let root = absolute(root)?;
        let (config, config_path) = read_config(&root, explicit)?;
        Ok(Self::new(root, config, config_path))
    }

    pub fn new(root: PathBuf, config: SiteConfig, config_path: Option<PathBuf>) -> Self {
        let project = load_project(&root, &config);
        Self {
            root,
            config: Arc::new(config),
            project,
            config_path,
        }
    }

    /// Registry of built-in and configured tasks
    pub fn registry(&self) -> BuildResult<TaskRegistry> {
        builtin_registry(&self.config, &self.project, &self.root)
    }

    /// Flattened steps of a named pipeline
    pub fn pipeline(&self, name: &str) -> BuildResult<ExecutionPlan> {
        ExecutionPlan::expand(&self.config.pipelines, name)
    }

    /// Plan for pipeline or task names given on the command line
    pub fn plan(&self, names: &[String]) -> BuildResult<ExecutionPlan> {
        ExecutionPlan::from_names(&self.config.pipelines, names)
    }

    /// Absolute directory served by the dev server
    pub fn served_dir(&self) -> PathBuf {
        self.root.join(self.config.served_dir())
    }

    pub fn watch_plan(&self) -> BuildResult<WatchPlan> {
        WatchPlan::new(
            &self.root,
            &self.config.watch_bindings(),
            self.config.served_dir(),
        )
    }
}

/// Read the configuration. An explicit path must exist; otherwise the
/// candidates are tried and the defaults used when none is present.
pub fn read_config(
    root: &Path,
    explicit: Option<&Path>,
) -> BuildResult<(SiteConfig, Option<PathBuf>)> {
    if let Some(path) = explicit {
        let path = root.join(path);
        let config = SiteConfig::from_file(&path)?;
        return Ok((config, Some(path)));
    }

    for candidate in CONFIG_CANDIDATES {
        let path = root.join(candidate);
        if path.is_file() {
            let config = SiteConfig::from_file(&path)?;
            tracing::debug!(path = %path.display(), "configuration loaded");
            return Ok((config, Some(path)));
        }
    }

    tracing::debug!("no configuration file; using defaults");
    let config = SiteConfig::default();
    config.check_paths()?;
    Ok((config, None))
}

fn load_project(root: &Path, config: &SiteConfig) -> ProjectMeta {
    let package = root.join(&config.package);
    if package.is_file() {
        match ProjectMeta::from_file(&package) {
            Ok(project) => return project,
            Err(e) => {
                tracing::warn!(path = %package.display(), error = %e, "ignoring unreadable package file")
            }
        }
    }

    config.project.clone().unwrap_or_default()
}

fn absolute(path: &Path) -> BuildResult<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|e| BuildError::read(".", e))?;
    Ok(cwd.join(path))
}
