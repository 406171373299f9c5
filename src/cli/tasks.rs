// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Tasks command - list tasks and pipelines

use colored::Colorize;
use miette::Result;

use super::{project_root, report, GlobalArgs};
use crate::site::Site;
use crate::utils::print_header;

pub async fn run(global: &GlobalArgs) -> Result<()> {
    let site = Site::load(&project_root()?, global.config.as_deref()).map_err(report)?;
    let registry = site.registry().map_err(report)?;

    print_header("Tasks");
    let mut names = registry.names();
    names.sort_unstable();
    for name in names {
        let task = registry.resolve(name).map_err(report)?;
        println!("  {:<12} {}", name.bold(), task.description().dimmed());
    }

    println!();
    print_header("Pipelines");
    for (name, spec) in &site.config.pipelines {
        let serving = if spec.serve { " (serves)" } else { "" };
        println!("  {:<12} {}{}", name.bold(), spec.steps.join(" → "), serving.cyan());

        if global.verbose {
            if let Some(ref description) = spec.description {
                println!("  {:<12} {}", "", description.dimmed());
            }
            if let Ok(plan) = site.pipeline(name) {
                println!("  {:<12} {}", "", plan.steps.join(", ").dimmed());
            }
        }
    }

    Ok(())
}
