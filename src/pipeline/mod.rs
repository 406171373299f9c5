// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Tasks, pipelines and the sequential runner
//!
//! A pipeline is an ordered list of task names. The runner resolves every
//! name up front and then awaits each task in turn, stopping at the first
//! failure.

mod plan;
mod registry;
mod runner;
mod task;

pub use plan::{ExecutionPlan, PipelineSpec};
pub use registry::TaskRegistry;
pub use runner::{PipelineReport, PipelineRunner, RunOptions, StepReport};
pub use task::{Task, TaskOutput};
