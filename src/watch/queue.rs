// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Per-task rebuild queue
//!
//! Each task name owns one worker and a one-slot channel. A trigger while
//! the worker is busy fills the slot, and triggers arriving while the slot
//! is full are folded into that pending run. A rebuild in flight is never
//! interrupted; different tasks rebuild independently.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

/// What happened to a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// A rebuild was scheduled
    Queued,
    /// A rebuild was already pending; this trigger folds into it
    Coalesced,
    /// No worker exists for the task
    Unknown,
}

/// Serializing, coalescing rebuild scheduler
pub struct RebuildQueue {
    senders: HashMap<String, mpsc::Sender<()>>,
    workers: Vec<JoinHandle<()>>,
}

impl RebuildQueue {
    /// Spawn one worker per task; `rebuild` runs a task by name
    pub fn new<I, F, Fut>(tasks: I, rebuild: F) -> Self
    where
        I: IntoIterator<Item = String>,
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let rebuild = Arc::new(rebuild);
        let mut senders = HashMap::new();
        let mut workers = Vec::new();

        for task in tasks {
            if senders.contains_key(&task) {
                continue;
            }

            let (tx, mut rx) = mpsc::channel::<()>(1);
            let rebuild = Arc::clone(&rebuild);
            let name = task.clone();

            workers.push(tokio::spawn(async move {
                while rx.recv().await.is_some() {
                    tracing::debug!(task = %name, "rebuild starting");
                    (*rebuild)(name.clone()).await;
                }
            }));
            senders.insert(task, tx);
        }

        Self { senders, workers }
    }

    /// Request a rebuild of `task`
    pub fn trigger(&self, task: &str) -> Trigger {
        let Some(sender) = self.senders.get(task) else {
            return Trigger::Unknown;
        };

        match sender.try_send(()) {
            Ok(()) => Trigger::Queued,
            Err(TrySendError::Full(())) => {
                tracing::debug!(task, "rebuild already pending; coalesced");
                Trigger::Coalesced
            }
            Err(TrySendError::Closed(())) => Trigger::Unknown,
        }
    }

    /// Stop accepting triggers and wait for queued rebuilds to finish
    pub async fn close(self) {
        drop(self.senders);
        for worker in self.workers {
            if let Err(e) = worker.await {
                tracing::warn!(error = %e, "rebuild worker panicked");
            }
        }
    }
}
