// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Build commands - run pipelines and tasks

use colored::Colorize;
use miette::Result;
use std::sync::Arc;

use super::{project_root, report, GlobalArgs};
use crate::config::ConfigValidator;
use crate::pipeline::{PipelineRunner, RunOptions};
use crate::site::{read_config, Site};

/// Flags of the build-like commands
#[derive(Debug, Clone, Default)]
pub struct BuildArgs {
    pub strict: bool,
    pub dry_run: bool,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Run pipelines or tasks by name. Serving pipelines hand over to the dev
/// server once the build succeeds.
pub async fn run(names: Vec<String>, args: BuildArgs, global: &GlobalArgs) -> Result<()> {
    let root = project_root()?;
    let (mut config, config_path) =
        read_config(&root, global.config.as_deref()).map_err(report)?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let strict = args.strict || config.lint.strict;
    let site = Site::new(root, config, config_path);
    let registry = site.registry().map_err(report)?;

    let validation = ConfigValidator::validate(&site.config, &site.root, &registry.names());
    if !validation.is_valid() {
        eprintln!("{}", "Configuration is invalid:".red().bold());
        for error in &validation.errors {
            eprintln!("  {} {}", "✗".red(), error);
        }
        return Err(miette::miette!("Run 'sitepipe check' for details"));
    }

    if validation.has_warnings() && global.verbose {
        eprintln!("{}", "Configuration warnings:".yellow().bold());
        for warning in &validation.warnings {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
        eprintln!();
    }

    let plan = site.plan(&names).map_err(report)?;
    let runner = Arc::new(PipelineRunner::new(
        Arc::new(registry),
        RunOptions {
            strict_lint: strict,
            dry_run: args.dry_run,
            verbose: global.verbose,
            progress: global.progress,
        },
    ));

    let result = runner.run(&plan.name, &plan.steps).await.map_err(report)?;

    let errors = result.lint_errors();
    let warnings = result.lint_warnings();
    if errors + warnings > 0 {
        println!(
            "Lint: {} error(s), {} warning(s)",
            errors.to_string().red(),
            warnings.to_string().yellow()
        );
    }

    if args.dry_run {
        println!("{}", "Dry run: nothing was executed.".dimmed());
        return Ok(());
    }

    if global.verbose {
        let written = result.artifacts().count();
        println!("{}", format!("{} file(s) written", written).dimmed());
    }

    if plan.serve {
        return super::serve::run(site, runner, global).await;
    }

    Ok(())
}
