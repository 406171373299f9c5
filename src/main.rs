// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! sitepipe - static site build orchestrator

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use sitepipe::cli::build::BuildArgs;
use sitepipe::cli::{Cli, Commands, GlobalArgs};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    sitepipe::utils::apply_color_preference();

    let default_filter = if cli.verbose {
        "sitepipe=debug"
    } else {
        "sitepipe=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    let global = GlobalArgs {
        verbose: cli.verbose,
        config: cli.config,
        progress: console::Term::stderr().is_term() && !cli.verbose,
    };

    let build = |strict, dry_run| BuildArgs {
        strict,
        dry_run,
        ..BuildArgs::default()
    };

    match cli.command {
        None => sitepipe::cli::build::run(vec!["default".into()], build(false, false), &global).await,
        Some(Commands::Serve { host, port, strict }) => {
            let args = BuildArgs {
                host,
                port,
                ..build(strict, false)
            };
            sitepipe::cli::build::run(vec!["serve".into()], args, &global).await
        }
        Some(Commands::Production { strict, dry_run }) => {
            sitepipe::cli::build::run(vec!["production".into()], build(strict, dry_run), &global)
                .await
        }
        Some(Commands::Test { strict, dry_run }) => {
            sitepipe::cli::build::run(vec!["test".into()], build(strict, dry_run), &global).await
        }
        Some(Commands::Run {
            names,
            strict,
            dry_run,
        }) => sitepipe::cli::build::run(names, build(strict, dry_run), &global).await,
        Some(Commands::Clean) => sitepipe::cli::clean::run(&global).await,
        Some(Commands::Check) => sitepipe::cli::check::run(&global).await,
        Some(Commands::Tasks) => sitepipe::cli::tasks::run(&global).await,
        Some(Commands::Init { force }) => sitepipe::cli::init::run(force, &global).await,
    }
}
