// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Clean command - remove build output

use colored::Colorize;
use miette::Result;

use super::{project_root, report, GlobalArgs};
use crate::site::Site;
use crate::tasks::Cleaner;
use crate::utils::print_success;

pub async fn run(global: &GlobalArgs) -> Result<()> {
    let site = Site::load(&project_root()?, global.config.as_deref()).map_err(report)?;
    let cleaner = Cleaner::new(&site.root, &site.config.clean).map_err(report)?;

    let removed = cleaner.clean().await.map_err(report)?;

    if removed.is_empty() {
        println!("{}", "Nothing to clean.".dimmed());
        return Ok(());
    }

    for path in &removed {
        let shown = path.strip_prefix(&site.root).unwrap_or(path);
        print_success(&shown.display().to_string());
    }
    println!("Removed {} path(s).", removed.len());

    Ok(())
}
