// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! # sitepipe - static site build orchestrator
//!
//! `sitepipe` builds a small static site from four asset classes and serves
//! it with live reload.
//!
//! ## Features
//!
//! - **Named pipelines** - Flat, fail-fast sequences of tasks and pipelines
//! - **Asset transformers** - Script bundling, CSS compilation, view rendering, image copying
//! - **Source maps** - Plain and minified variants, each with a map
//! - **Linting** - Built-in checks or external linters, fatal only in strict mode
//! - **Watch mode** - A change rebuilds only the task bound to it
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a default configuration
//! sitepipe init
//!
//! # Build, serve and watch
//! sitepipe
//!
//! # Release build
//! sitepipe production
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod lint;
pub mod pipeline;
pub mod server;
pub mod site;
pub mod tasks;
pub mod transformers;
pub mod utils;
pub mod watch;

// Re-export commonly used types
pub use config::SiteConfig;
pub use errors::{BuildError, BuildResult};
pub use pipeline::{ExecutionPlan, PipelineRunner, TaskRegistry};
pub use site::Site;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
