// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for sitepipe.

pub mod build;
pub mod check;
pub mod clean;
pub mod init;
pub mod serve;
pub mod tasks;

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::errors::{BuildError, RecoverySuggestion};

/// Static site build orchestrator
///
/// Bundles scripts, compiles styles, renders views, copies images and serves
/// the result with live reload.
#[derive(Parser, Debug)]
#[clap(
    name = "sitepipe",
    version,
    about = "Static site build orchestrator with a live-reload dev server",
    long_about = None,
    after_help = "Examples:\n\
        sitepipe                        Build, serve and watch (same as 'serve')\n\
        sitepipe production             Clean, build and lint everything\n\
        sitepipe run css lint:css       Run single tasks in order\n\
        sitepipe tasks                  List tasks and pipelines\n\n\
        See 'sitepipe <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Configuration file (default: sitepipe.yaml, .yml or .toml)
    #[clap(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build everything, then serve and rebuild on change
    Serve {
        /// Address to bind (overrides server.host)
        #[clap(long)]
        host: Option<String>,

        /// Port to bind (overrides server.port)
        #[clap(short, long)]
        port: Option<u16>,

        /// Fail on lint errors
        #[clap(long)]
        strict: bool,
    },

    /// Clean, build and lint every asset class
    Production {
        /// Fail on lint errors
        #[clap(long)]
        strict: bool,

        /// Dry run (show what would be done)
        #[clap(long)]
        dry_run: bool,
    },

    /// Production build used as a CI check
    Test {
        /// Fail on lint errors
        #[clap(long)]
        strict: bool,

        /// Dry run (show what would be done)
        #[clap(long)]
        dry_run: bool,
    },

    /// Run pipelines or single tasks, in the order given
    Run {
        /// Task or pipeline names
        #[clap(required = true)]
        names: Vec<String>,

        /// Fail on lint errors
        #[clap(long)]
        strict: bool,

        /// Dry run (show what would be done)
        #[clap(long)]
        dry_run: bool,
    },

    /// Remove build output and caches
    Clean,

    /// Validate the configuration
    Check,

    /// List tasks and pipelines
    Tasks,

    /// Write a default sitepipe.yaml
    Init {
        /// Overwrite an existing file
        #[clap(short, long)]
        force: bool,
    },
}

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalArgs {
    pub verbose: bool,
    pub config: Option<PathBuf>,
    /// Draw spinners (stdout is a terminal)
    pub progress: bool,
}

/// Print a recovery suggestion, if any, and hand the error to miette
pub fn report(error: BuildError) -> miette::Report {
    if let Some(suggestion) = RecoverySuggestion::for_error(&error) {
        eprintln!();
        eprintln!("{}", "Suggestion:".yellow().bold());
        eprint!("{}", suggestion);
        eprintln!();
    }
    miette::Report::new(error)
}

/// Current working directory as the project root
pub(crate) fn project_root() -> miette::Result<PathBuf> {
    std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))
}
