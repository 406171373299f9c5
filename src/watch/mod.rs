// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Watch mode
//!
//! Maps filesystem changes to the single task bound to them. Source changes
//! rebuild exactly the matching task through the [`RebuildQueue`]; changes
//! under the served directory only tell browsers to reload.

mod fingerprint;
mod queue;

pub use fingerprint::ContentTracker;
pub use queue::{RebuildQueue, Trigger};

use colored::Colorize;
use notify::{RecursiveMode, Watcher as _};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::{mpsc, watch};

use crate::errors::BuildError;
use crate::server::ReloadHandle;

/// Quiet period before a batch of events is delivered
pub const DEBOUNCE: Duration = Duration::from_millis(150);

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// A glob pattern and the task it re-runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatchBinding {
    /// Glob relative to the project root
    pub pattern: String,
    pub task: String,
}

impl WatchBinding {
    pub fn new(pattern: impl Into<String>, task: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            task: task.into(),
        }
    }
}

/// What a single changed path asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    Rebuild(String),
    Reload,
}

/// Everything one debounced batch asks for
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Batch {
    pub tasks: BTreeSet<String>,
    pub reload: bool,
    pub changed: Vec<PathBuf>,
}

impl Batch {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && !self.reload
    }
}

/// Immutable mapping from paths to actions, built once when watching starts
#[derive(Debug)]
pub struct WatchPlan {
    root: PathBuf,
    canonical_root: Option<PathBuf>,
    bindings: Vec<(String, glob::Pattern, String)>,
    served: PathBuf,
    canonical_served: Option<PathBuf>,
}

impl WatchPlan {
    pub fn new(
        root: &Path,
        bindings: &[WatchBinding],
        served_dir: &Path,
    ) -> Result<Self, BuildError> {
        let bindings = bindings
            .iter()
            .map(|b| {
                let pattern = b.pattern.trim_start_matches("./").to_string();
                let compiled = glob::Pattern::new(&pattern)?;
                Ok((pattern, compiled, b.task.clone()))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let served = root.join(served_dir);

        Ok(Self {
            root: root.to_path_buf(),
            canonical_root: root.canonicalize().ok(),
            bindings,
            canonical_served: served.canonicalize().ok(),
            served,
        })
    }

    /// Tasks that have at least one binding
    pub fn tasks(&self) -> BTreeSet<String> {
        self.bindings.iter().map(|(_, _, t)| t.clone()).collect()
    }

    fn is_served(&self, path: &Path) -> bool {
        path.starts_with(&self.served)
            || self
                .canonical_served
                .as_ref()
                .is_some_and(|c| path.starts_with(c))
    }

    fn relative<'a>(&self, path: &'a Path) -> Option<&'a Path> {
        path.strip_prefix(&self.root).ok().or_else(|| {
            self.canonical_root
                .as_ref()
                .and_then(|c| path.strip_prefix(c).ok())
        })
    }

    /// Actions for one changed path. The served directory takes precedence
    /// so a build writing its output never triggers another build.
    pub fn actions_for(&self, path: &Path) -> Vec<WatchAction> {
        if self.is_served(path) {
            return vec![WatchAction::Reload];
        }

        let Some(relative) = self.relative(path) else {
            return Vec::new();
        };
        let candidate = relative.to_string_lossy().replace('\\', "/");
        let options = glob::MatchOptions {
            require_literal_separator: true,
            ..glob::MatchOptions::new()
        };

        let mut actions: Vec<WatchAction> = Vec::new();
        for (_, pattern, task) in &self.bindings {
            let action = WatchAction::Rebuild(task.clone());
            if pattern.matches_with(&candidate, options) && !actions.contains(&action) {
                actions.push(action);
            }
        }
        actions
    }

    /// Fold a batch of changed paths into tasks to rebuild and a reload flag.
    ///
    /// Paths whose content is unchanged since last seen are dropped.
    pub fn collect<I>(&self, paths: I, tracker: &mut ContentTracker) -> Batch
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let mut batch = Batch::default();

        for path in paths {
            let actions = self.actions_for(&path);
            if actions.is_empty() || !tracker.changed(&path) {
                continue;
            }

            for action in actions {
                match action {
                    WatchAction::Rebuild(task) => {
                        batch.tasks.insert(task);
                    }
                    WatchAction::Reload => batch.reload = true,
                }
            }
            batch.changed.push(path);
        }

        batch
    }

    /// Directories to watch: the literal prefix of every binding plus the
    /// served directory. Missing directories and nested roots are skipped.
    pub fn watch_roots(&self) -> Vec<PathBuf> {
        let mut candidates: Vec<PathBuf> = self
            .bindings
            .iter()
            .map(|(pattern, _, _)| self.root.join(literal_prefix(pattern)))
            .collect();
        candidates.push(self.served.clone());
        candidates.retain(|dir| dir.is_dir());
        candidates.sort();

        let mut roots: Vec<PathBuf> = Vec::new();
        for dir in candidates {
            if !roots.iter().any(|root| dir.starts_with(root)) {
                roots.push(dir);
            }
        }
        roots
    }
}

/// Leading components of `pattern` that contain no glob syntax. A pattern
/// without any glob syntax names a file, so its parent is returned.
fn literal_prefix(pattern: &str) -> PathBuf {
    let components: Vec<&str> = pattern.split('/').filter(|c| !c.is_empty()).collect();

    let literal = components
        .iter()
        .take_while(|c| !c.contains(GLOB_META))
        .count();

    let keep = if literal == components.len() {
        literal.saturating_sub(1)
    } else {
        literal
    };

    components[..keep].iter().collect()
}

/// Debounced filesystem watcher driving rebuilds and reloads
pub struct SourceWatcher {
    plan: WatchPlan,
    debounce: Duration,
    verbose: bool,
}

impl SourceWatcher {
    pub fn new(plan: WatchPlan, debounce: Duration, verbose: bool) -> Self {
        Self {
            plan,
            debounce,
            verbose,
        }
    }

    /// Watch until `shutdown` flips to true. The OS watchers are dropped
    /// before this returns.
    pub async fn run(
        self,
        queue: &RebuildQueue,
        reload: &ReloadHandle,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<(), BuildError> {
        let (tx, mut rx) = mpsc::unbounded_channel::<DebounceEventResult>();

        let mut debouncer = new_debouncer(self.debounce, move |result: DebounceEventResult| {
            let _ = tx.send(result);
        })
        .map_err(|e| BuildError::Watch {
            message: format!("failed to create file watcher: {}", e),
        })?;

        let roots = self.plan.watch_roots();
        if roots.is_empty() {
            tracing::warn!("no watched directory exists; only shutdown will end watch mode");
        }

        let mut tracker = ContentTracker::new();
        for root in &roots {
            debouncer
                .watcher()
                .watch(root, RecursiveMode::Recursive)
                .map_err(|e| BuildError::Watch {
                    message: format!("failed to watch {}: {}", root.display(), e),
                })?;
            tracker.prime(root);
            tracing::debug!(root = %root.display(), "watching");
        }

        println!(
            "Watching {} director{} for changes. Press {} to exit.",
            roots.len(),
            if roots.len() == 1 { "y" } else { "ies" },
            "Ctrl+C".cyan()
        );

        while !*shutdown.borrow() {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                received = rx.recv() => match received {
                    Some(Ok(events)) => {
                        let paths = events.into_iter().map(|e| e.path);
                        self.dispatch(paths, &mut tracker, queue, reload);
                    }
                    Some(Err(e)) => {
                        eprintln!("{}: {:?}", "Watch error".red(), e);
                    }
                    None => break,
                },
            }
        }

        drop(debouncer);
        tracing::debug!("file watchers released");
        Ok(())
    }

    fn dispatch<I>(
        &self,
        paths: I,
        tracker: &mut ContentTracker,
        queue: &RebuildQueue,
        reload: &ReloadHandle,
    ) -> Batch
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let batch = self.plan.collect(paths, tracker);
        if batch.is_empty() {
            return batch;
        }

        println!();
        println!("{}", "─".repeat(50).dimmed());
        println!(
            "{}: {} file(s) changed",
            "Change detected".yellow(),
            batch.changed.len()
        );
        if self.verbose {
            for path in &batch.changed {
                println!("  {}", path.display());
            }
        }

        for task in &batch.tasks {
            match queue.trigger(task) {
                Trigger::Queued => println!("  {} rebuilding {}", "→".blue(), task.bold()),
                Trigger::Coalesced => {
                    println!("  {} {} already queued", "→".blue(), task.bold())
                }
                Trigger::Unknown => tracing::warn!(task = %task, "no rebuild worker for task"),
            }
        }

        if batch.reload {
            let clients = reload.reload();
            tracing::debug!(clients, "reload broadcast");
        }

        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn bindings() -> Vec<WatchBinding> {
        vec![
            WatchBinding::new("app/scripts/**/*.js", "js"),
            WatchBinding::new("app/styles/**/*.css", "css"),
            WatchBinding::new("app/views/**/*.html", "views"),
        ]
    }

    fn project() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["app/scripts/lib", "app/styles", "app/views", "_site"] {
            fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        dir
    }

    #[test]
    fn test_change_rebuilds_only_bound_task() {
        let dir = project();
        let plan = WatchPlan::new(dir.path(), &bindings(), Path::new("_site")).unwrap();

        assert_eq!(
            plan.actions_for(&dir.path().join("app/scripts/lib/a.js")),
            vec![WatchAction::Rebuild("js".into())]
        );
        assert_eq!(
            plan.actions_for(&dir.path().join("app/styles/main.css")),
            vec![WatchAction::Rebuild("css".into())]
        );
        assert!(plan.actions_for(&dir.path().join("app/scripts/notes.txt")).is_empty());
        assert!(plan.actions_for(&dir.path().join("README.md")).is_empty());
    }

    #[test]
    fn test_served_dir_only_reloads() {
        let dir = project();
        let greedy = vec![WatchBinding::new("**/*.js", "js")];
        let plan = WatchPlan::new(dir.path(), &greedy, Path::new("_site")).unwrap();

        assert_eq!(
            plan.actions_for(&dir.path().join("_site/js/myapp.js")),
            vec![WatchAction::Reload]
        );
        assert_eq!(
            plan.actions_for(&dir.path().join("src/a.js")),
            vec![WatchAction::Rebuild("js".into())]
        );
    }

    #[test]
    fn test_unchanged_content_suppressed() {
        let dir = project();
        let file = dir.path().join("app/scripts/a.js");
        fs::write(&file, "var a;").unwrap();
        let plan = WatchPlan::new(dir.path(), &bindings(), Path::new("_site")).unwrap();

        let mut tracker = ContentTracker::new();
        tracker.prime(&dir.path().join("app"));

        let batch = plan.collect([file.clone()], &mut tracker);
        assert!(batch.is_empty());

        fs::write(&file, "var b;").unwrap();
        let batch = plan.collect([file.clone(), file.clone()], &mut tracker);
        assert_eq!(batch.tasks.into_iter().collect::<Vec<_>>(), vec!["js"]);
        assert!(!batch.reload);
    }

    #[test]
    fn test_watch_roots_deduplicated() {
        let dir = project();
        let mut all = bindings();
        all.push(WatchBinding::new("app/**/*.png", "img"));
        all.push(WatchBinding::new("missing/**/*.js", "js"));
        let plan = WatchPlan::new(dir.path(), &all, Path::new("_site")).unwrap();

        assert_eq!(
            plan.watch_roots(),
            vec![dir.path().join("_site"), dir.path().join("app")]
        );
    }

    #[test]
    fn test_literal_prefix() {
        assert_eq!(literal_prefix("app/scripts/**/*.js"), PathBuf::from("app/scripts"));
        assert_eq!(literal_prefix("app/{a,b}/x.js"), PathBuf::from("app"));
        assert_eq!(literal_prefix("app/index.html"), PathBuf::from("app"));
        assert_eq!(literal_prefix("**/*"), PathBuf::new());
    }

    #[test]
    fn test_invalid_binding_rejected() {
        let dir = project();
        let bad = vec![WatchBinding::new("app/[", "js")];
        assert!(WatchPlan::new(dir.path(), &bad, Path::new("_site")).is_err());
    }

    #[tokio::test]
    async fn test_dispatch_triggers_queue_and_reload() {
        let dir = project();
        let script = dir.path().join("app/scripts/a.js");
        let page = dir.path().join("_site/index.html");
        fs::write(&script, "var a;").unwrap();
        fs::write(&page, "<p>").unwrap();

        let plan = WatchPlan::new(dir.path(), &bindings(), Path::new("_site")).unwrap();
        let watcher = SourceWatcher::new(plan, DEBOUNCE, false);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let queue = {
            let seen = seen.clone();
            RebuildQueue::new(watcher.plan.tasks(), move |task| {
                let seen = seen.clone();
                async move { seen.lock().unwrap().push(task) }
            })
        };

        let reload = ReloadHandle::new();
        let mut listener = reload.subscribe();

        let batch = watcher.dispatch(
            vec![script, page],
            &mut ContentTracker::new(),
            &queue,
            &reload,
        );
        assert!(batch.reload);
        assert!(listener.try_recv().is_ok());

        queue.close().await;
        assert_eq!(*seen.lock().unwrap(), vec!["js"]);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let dir = project();
        let plan = WatchPlan::new(dir.path(), &bindings(), Path::new("_site")).unwrap();
        let runs = Arc::new(AtomicUsize::new(0));
        let queue = {
            let runs = runs.clone();
            RebuildQueue::new(plan.tasks(), move |_| {
                let runs = runs.clone();
                async move {
                    runs.fetch_add(1, Ordering::SeqCst);
                }
            })
        };

        let (tx, rx) = watch::channel(false);
        let reload = ReloadHandle::new();
        let watcher = SourceWatcher::new(plan, DEBOUNCE, false);

        let stop = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(true).unwrap();
        };
        let (result, ()) = tokio::join!(watcher.run(&queue, &reload, rx), stop);

        assert!(result.is_ok());
        queue.close().await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
