// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Check command - validate the configuration

use colored::Colorize;
use miette::Result;

use super::{project_root, report, GlobalArgs};
use crate::config::ConfigValidator;
use crate::site::Site;
use crate::utils::{print_error, print_info, print_success, print_warning};

pub async fn run(global: &GlobalArgs) -> Result<()> {
    println!("{}", "Checking configuration...".bold());
    println!();

    let site = match Site::load(&project_root()?, global.config.as_deref()) {
        Ok(site) => site,
        Err(e) => {
            eprintln!("  {} Failed to load configuration", "✗".red());
            eprintln!();
            return Err(report(e));
        }
    };

    match site.config_path {
        Some(ref path) => print_success(&format!("Parsed {}", path.display())),
        None => print_info("No configuration file; using defaults"),
    }

    let registry = site.registry().map_err(report)?;
    let validation = ConfigValidator::validate(&site.config, &site.root, &registry.names());

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            print_error(error);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            print_warning(warning);
        }
    }

    if global.verbose {
        println!();
        println!("{}:", "Summary".bold());
        println!("  Tasks:     {}", registry.len());
        println!("  Pipelines: {}", site.config.pipeline_names().join(", "));
        println!("  Served:    {}", site.config.served_dir().display());
    }

    println!();

    if !validation.is_valid() {
        return Err(miette::miette!(
            "Configuration has {} error(s)",
            validation.errors.len()
        ));
    }

    println!("{}", "Configuration is valid.".green().bold());
    Ok(())
}
