// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Init command - write a default configuration

use colored::Colorize;
use miette::Result;
use std::path::Path;

use super::{project_root, report, GlobalArgs};
use crate::config::{SiteConfig, DEFAULT_CONFIG_FILE};
use crate::utils::print_success;

pub async fn run(force: bool, global: &GlobalArgs) -> Result<()> {
    let root = project_root()?;
    let path = root.join(
        global
            .config
            .as_deref()
            .unwrap_or(Path::new(DEFAULT_CONFIG_FILE)),
    );

    if path.exists() && !force {
        return Err(miette::miette!(
            "{} already exists. Use --force to overwrite it.",
            path.display()
        ));
    }

    let content = SiteConfig::default()
        .to_file_format(&path)
        .map_err(report)?;
    std::fs::write(&path, content)
        .map_err(|e| miette::miette!("Failed to write {}: {}", path.display(), e))?;

    print_success(&format!("Created {}", path.display()));
    println!();
    println!("Next steps:");
    println!("  1. Put sources under {}", "app/ (views) and app/assets/{js,css,img}".cyan());
    println!("  2. Run {} to build, serve and watch", "sitepipe".cyan());
    println!("  3. Run {} for a release build", "sitepipe production".cyan());

    Ok(())
}
