// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Task registry
//!
//! Maps task names to actions. Registration order carries no meaning;
//! ordering comes only from pipeline step lists.

use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::BuildError;
use crate::pipeline::Task;

/// Registry of named tasks
#[derive(Default)]
pub struct TaskRegistry {
    tasks: HashMap<String, Arc<dyn Task>>,
}

impl TaskRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a task under `name`
    pub fn register(&mut self, name: impl Into<String>, task: Arc<dyn Task>) -> Result<(), BuildError> {
        let name = name.into();
        if self.tasks.contains_key(&name) {
            return Err(BuildError::DuplicateTask { name });
        }

        tracing::debug!(task = %name, "registered task");
        self.tasks.insert(name, task);
        Ok(())
    }

    /// Look up a task by name
    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Task>, BuildError> {
        self.tasks
            .get(name)
            .cloned()
            .ok_or_else(|| BuildError::unknown_task(name, &self.names()))
    }

    /// Check whether a task is registered
    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Registered task names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tasks.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered tasks
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
