// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Built-in tasks
//!
//! Each task captures its inputs when the registry is built and writes its
//! outputs before its future resolves.

pub mod clean;
mod shell;

pub use clean::Cleaner;
pub use shell::ShellTask;

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{ExternalCommand, ProjectMeta, SiteConfig};
use crate::errors::BuildError;
use crate::lint::{CommandLinter, Linter, MarkupLinter, ScriptLinter, StyleLinter};
use crate::pipeline::{Task, TaskOutput, TaskRegistry};
use crate::transformers::{
    collect_sources, find_files, write_artifacts, ImageCopier, ScriptBundler, StyleCompiler,
    ViewContext, ViewRenderer,
};

pub const CLEAN: &str = "clean";
pub const SCRIPTS: &str = "js";
pub const LINT_SCRIPTS: &str = "lint:js";
pub const STYLES: &str = "css";
pub const LINT_STYLES: &str = "lint:css";
pub const VIEWS: &str = "views";
pub const LINT_MARKUP: &str = "lint:html";
pub const IMAGES: &str = "img";

/// Names of the tasks every site registers
pub const BUILTIN_TASKS: [&str; 8] = [
    CLEAN,
    SCRIPTS,
    LINT_SCRIPTS,
    STYLES,
    LINT_STYLES,
    VIEWS,
    LINT_MARKUP,
    IMAGES,
];

/// Build the registry of built-in and user-defined tasks.
///
/// Config paths are resolved against `root`.
pub fn builtin_registry(
    config: &SiteConfig,
    project: &ProjectMeta,
    root: &Path,
) -> Result<TaskRegistry, BuildError> {
    let paths = &config.paths;
    let banner = project.banner();
    let mut registry = TaskRegistry::new();

    registry.register(CLEAN, Arc::new(Cleaner::new(root, &config.clean)?))?;

    registry.register(
        SCRIPTS,
        Arc::new(ScriptTask {
            src: root.join(&paths.scripts.src),
            extension: config.scripts.extension.clone(),
            bundler: ScriptBundler::new(&config.filename, &banner, root.join(&paths.scripts.dest)),
        }),
    )?;

    registry.register(
        LINT_SCRIPTS,
        Arc::new(LintTask {
            description: "Lint the script bundle".to_string(),
            dir: root.join(&paths.scripts.dest),
            pattern: format!("{}.js", glob::Pattern::escape(&config.filename)),
            linter: linter_for(config.lint.scripts.as_ref(), root, Box::new(ScriptLinter)),
        }),
    )?;

    registry.register(
        STYLES,
        Arc::new(StyleTask {
            src: root.join(&paths.styles.src),
            extension: config.styles.extension.clone(),
            compiler: StyleCompiler::new(
                &config.filename,
                &banner,
                root.join(&paths.styles.dest),
                root,
                config.styles.preprocessor.clone(),
                &config.styles.browsers,
            )?,
        }),
    )?;

    registry.register(
        LINT_STYLES,
        Arc::new(LintTask {
            description: "Lint compiled stylesheets".to_string(),
            dir: root.join(&paths.styles.dest),
            pattern: "**/*.css".to_string(),
            linter: linter_for(config.lint.styles.as_ref(), root, Box::new(StyleLinter)),
        }),
    )?;

    let context = ViewContext::new(&config.server.base_url(), &config.filename, project);
    registry.register(
        VIEWS,
        Arc::new(ViewTask {
            src: root.join(&paths.views.src),
            extension: config.views.extension.clone(),
            private_prefix: config.views.private_prefix.clone(),
            renderer: ViewRenderer::new(
                root.join(&paths.views.src),
                root.join(&paths.views.dest),
                &config.views.extension,
                context,
            ),
        }),
    )?;

    registry.register(
        LINT_MARKUP,
        Arc::new(LintTask {
            description: "Lint rendered views".to_string(),
            dir: root.join(&paths.views.dest),
            pattern: "**/*.html".to_string(),
            linter: linter_for(config.lint.markup.as_ref(), root, Box::new(MarkupLinter)),
        }),
    )?;

    registry.register(
        IMAGES,
        Arc::new(ImageTask {
            copier: ImageCopier::new(root.join(&paths.images.src), root.join(&paths.images.dest)),
        }),
    )?;

    for (name, task) in &config.tasks {
        registry.register(name.as_str(), Arc::new(ShellTask::new(task.clone(), root)))?;
    }

    Ok(registry)
}

/// External linter when configured, built-in otherwise
fn linter_for(
    command: Option<&ExternalCommand>,
    root: &Path,
    builtin: Box<dyn Linter>,
) -> Box<dyn Linter> {
    match command {
        Some(command) => Box::new(CommandLinter::new(command.clone(), root.to_path_buf())),
        None => builtin,
    }
}

struct ScriptTask {
    src: PathBuf,
    extension: String,
    bundler: ScriptBundler,
}

#[async_trait]
impl Task for ScriptTask {
    fn description(&self) -> &str {
        "Bundle and minify scripts"
    }

    async fn run(&self) -> Result<TaskOutput, BuildError> {
        let sources = collect_sources(&self.src, &self.extension, None).await?;
        let artifacts = self.bundler.bundle(&sources)?;
        Ok(TaskOutput::with_artifacts(write_artifacts(&artifacts).await?))
    }
}

/// Stylesheets starting with this marker are partials, only reachable
/// through a preprocessor import
const STYLE_PARTIAL_PREFIX: &str = "_";

struct StyleTask {
    src: PathBuf,
    extension: String,
    compiler: StyleCompiler,
}

#[async_trait]
impl Task for StyleTask {
    fn description(&self) -> &str {
        "Compile, prefix and minify stylesheets"
    }

    async fn run(&self) -> Result<TaskOutput, BuildError> {
        let sources = collect_sources(&self.src, &self.extension, Some(STYLE_PARTIAL_PREFIX)).await?;
        let artifacts = self.compiler.compile(&sources).await?;
        Ok(TaskOutput::with_artifacts(write_artifacts(&artifacts).await?))
    }
}

struct ViewTask {
    src: PathBuf,
    extension: String,
    private_prefix: String,
    renderer: ViewRenderer,
}

#[async_trait]
impl Task for ViewTask {
    fn description(&self) -> &str {
        "Render views"
    }

    async fn run(&self) -> Result<TaskOutput, BuildError> {
        let prefix = (!self.private_prefix.is_empty()).then_some(self.private_prefix.as_str());
        let sources = collect_sources(&self.src, &self.extension, prefix).await?;
        let artifacts = self.renderer.render(&sources)?;
        Ok(TaskOutput::with_artifacts(write_artifacts(&artifacts).await?))
    }
}

struct ImageTask {
    copier: ImageCopier,
}

#[async_trait]
impl Task for ImageTask {
    fn description(&self) -> &str {
        "Copy images"
    }

    async fn run(&self) -> Result<TaskOutput, BuildError> {
        Ok(TaskOutput::with_artifacts(self.copier.copy().await?))
    }
}

/// Runs a linter over files already present in a destination directory
struct LintTask {
    description: String,
    dir: PathBuf,
    pattern: String,
    linter: Box<dyn Linter>,
}

#[async_trait]
impl Task for LintTask {
    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self) -> Result<TaskOutput, BuildError> {
        let files: Vec<PathBuf> = find_files(&self.dir, &self.pattern, None)?
            .into_iter()
            .map(|relative| self.dir.join(relative))
            .collect();

        let report = self.linter.lint(&files).await?;
        Ok(TaskOutput::with_lint(report))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellTaskConfig;
    use std::fs;

    fn project() -> ProjectMeta {
        ProjectMeta::from_json(
            r#"{"name":"demo","description":"Demo site","homepage":"https://demo.dev","author":"Ana <a@b.c> (https://ana.dev)"}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_registry_has_builtin_tasks() {
        let dir = tempfile::tempdir().unwrap();
        let registry = builtin_registry(&SiteConfig::default(), &project(), dir.path()).unwrap();

        for name in BUILTIN_TASKS {
            assert!(registry.contains(name), "{}", name);
        }
        assert_eq!(registry.len(), BUILTIN_TASKS.len());
    }

    #[test]
    fn test_shell_task_cannot_shadow_builtin() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.tasks.insert(
            "js".to_string(),
            ShellTaskConfig {
                command: "true".to_string(),
                shell: "sh".to_string(),
                description: None,
            },
        );

        assert!(matches!(
            builtin_registry(&config, &project(), dir.path()),
            Err(BuildError::DuplicateTask { .. })
        ));
    }

    #[tokio::test]
    async fn test_script_task_writes_bundle() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("app/assets/js")).unwrap();
        fs::write(root.join("app/assets/js/b.js"), "var b = 2;\n").unwrap();
        fs::write(root.join("app/assets/js/a.js"), "var a = 1;\n").unwrap();

        let registry = builtin_registry(&SiteConfig::default(), &project(), root).unwrap();
        let output = registry.resolve("js").unwrap().run().await.unwrap();
        assert_eq!(output.artifacts.len(), 4);

        let bundle = fs::read_to_string(root.join("_site/assets/js/myapp.js")).unwrap();
        assert!(bundle.starts_with("/*!\n * demo - Demo site\n"));
        assert!(bundle.contains(" * @author  : Ana | (https://ana.dev)\n"));
        assert!(bundle.find("var a").unwrap() < bundle.find("var b").unwrap());
    }

    #[tokio::test]
    async fn test_view_task_skips_partials() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("app/_layouts")).unwrap();
        fs::write(root.join("app/_layouts/foot.html"), "<footer><%= appName %></footer>").unwrap();
        fs::write(
            root.join("app/index.html"),
            "<!DOCTYPE html><body><%- include(\"_layouts/foot\") %></body>",
        )
        .unwrap();

        let registry = builtin_registry(&SiteConfig::default(), &project(), root).unwrap();
        registry.resolve("views").unwrap().run().await.unwrap();

        let html = fs::read_to_string(root.join("_site/index.html")).unwrap();
        assert_eq!(html, "<!DOCTYPE html><body><footer>myapp</footer></body>");
        assert!(!root.join("_site/_layouts").exists());
    }

    #[tokio::test]
    async fn test_style_task_preprocesses_and_skips_partials() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("app/assets/css/_mixins")).unwrap();
        fs::write(root.join("app/assets/css/main.scss"), "body { color: red; }\n").unwrap();
        fs::write(root.join("app/assets/css/_variables.scss"), ".variables { color: blue; }\n").unwrap();
        fs::write(root.join("app/assets/css/_mixins/grid.scss"), ".grid { display: flex; }\n").unwrap();

        let mut config = SiteConfig::default();
        config.styles.extension = "scss".to_string();
        config.styles.preprocessor = Some(ExternalCommand {
            program: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"cat "$0"; echo '.compiled { margin: 0; }'"#.to_string(),
                "{file}".to_string(),
            ],
        });

        let registry = builtin_registry(&config, &project(), root).unwrap();
        registry.resolve("css").unwrap().run().await.unwrap();

        let css = fs::read_to_string(root.join("_site/assets/css/myapp.css")).unwrap();
        assert!(css.contains("body"));
        assert_eq!(css.matches(".compiled").count(), 1);
        assert!(!css.contains(".variables"));
        assert!(!css.contains(".grid"));
    }

    #[tokio::test]
    async fn test_lint_task_reports_findings() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("_site")).unwrap();
        fs::write(root.join("_site/index.html"), "<html></html>").unwrap();

        let registry = builtin_registry(&SiteConfig::default(), &project(), root).unwrap();
        let output = registry.resolve("lint:html").unwrap().run().await.unwrap();

        let report = output.lint.unwrap();
        assert_eq!(report.files_checked, 1);
        assert_eq!(report.error_count(), 1);
    }
}
