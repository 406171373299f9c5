// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Serve - dev server, watcher and rebuild workers

use colored::Colorize;
use miette::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;

use super::{report, GlobalArgs};
use crate::errors::BuildError;
use crate::pipeline::PipelineRunner;
use crate::server::DevServer;
use crate::site::Site;
use crate::watch::{RebuildQueue, SourceWatcher, DEBOUNCE};

/// Serve the built site and rebuild on change until Ctrl+C or SIGTERM.
///
/// Shutdown drops the watchers first, then drains the rebuild workers, then
/// stops the server.
pub async fn run(site: Site, runner: Arc<PipelineRunner>, global: &GlobalArgs) -> Result<()> {
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let shutdown_tx = Arc::new(shutdown_tx);

    {
        let shutdown_tx = Arc::clone(&shutdown_tx);
        tokio::spawn(async move {
            shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        });
    }

    let server = DevServer::new(&site.config.server, site.served_dir());
    let reload = server.reload_handle();
    let listener = server.bind().await.map_err(report)?;

    println!();
    println!(
        "{} {} at {}",
        "Serving".green().bold(),
        site.config.served_dir().display(),
        site.config.server.base_url().cyan()
    );

    let server_task = tokio::spawn(server.serve(listener, shutdown_rx.clone()));

    let plan = site.watch_plan().map_err(report)?;
    let queue = RebuildQueue::new(plan.tasks(), move |task| {
        let runner = Arc::clone(&runner);
        async move {
            if let Err(e) = runner.run_task(&task).await {
                eprintln!("{}", rebuild_failure(&e).red());
                tracing::debug!(task = %task, error = ?e, "rebuild failed");
            }
        }
    });

    let watcher = SourceWatcher::new(plan, DEBOUNCE, global.verbose);
    let watched = watcher.run(&queue, &reload, shutdown_rx).await;

    queue.close().await;
    let _ = shutdown_tx.send(true);

    match server_task.await {
        Ok(result) => result.map_err(report)?,
        Err(e) => return Err(miette::miette!("Dev server task failed: {}", e)),
    }

    watched.map_err(report)?;

    println!("{}", "Stopped.".dimmed());
    Ok(())
}

/// Watch-mode failure line: the category, the failing step and its cause
fn rebuild_failure(error: &BuildError) -> String {
    format!(
        "Rebuild failed ({}): {}",
        error.category().label(),
        error.chain()
    )
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_rebuild_failure_names_source_file() {
        let err = BuildError::TransformFailed {
            transformer: "styles".into(),
            path: PathBuf::from("app/assets/css/main.css"),
            message: "Unexpected token".into(),
        }
        .in_task("css");

        let line = rebuild_failure(&err);
        assert!(line.starts_with("Rebuild failed (transform error): Task 'css' failed"));
        assert!(line.contains("app/assets/css/main.css"));
        assert!(line.contains("Unexpected token"));
    }
}
