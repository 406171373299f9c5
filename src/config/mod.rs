// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Site configuration
//!
//! Defines the schema for `sitepipe.yaml` (or `.toml`). The configuration is
//! loaded once, validated, and then shared read-only with every component.

mod project;
mod validation;

pub use project::{Author, ProjectMeta};
pub use validation::{ConfigValidator, ValidationResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use crate::errors::BuildError;
use crate::pipeline::PipelineSpec;
use crate::watch::WatchBinding;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "sitepipe.yaml";

/// Site configuration from sitepipe.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Base name of bundled artifacts (`<filename>.js`, `<filename>.min.css`)
    #[serde(default = "default_filename")]
    pub filename: String,

    /// Source and destination roots for each asset class
    pub paths: AssetPaths,

    /// Dev server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Metadata file read for the banner
    #[serde(default = "default_package_file")]
    pub package: PathBuf,

    /// Inline metadata used when the package file is absent
    #[serde(default)]
    pub project: Option<ProjectMeta>,

    /// Glob patterns removed before every build
    #[serde(default = "default_clean_patterns")]
    pub clean: Vec<String>,

    /// Lint policy and external linters
    #[serde(default)]
    pub lint: LintConfig,

    /// Script options
    #[serde(default)]
    pub scripts: ScriptOptions,

    /// Stylesheet options
    #[serde(default)]
    pub styles: StyleOptions,

    /// View options
    #[serde(default)]
    pub views: ViewOptions,

    /// User-defined shell tasks
    #[serde(default)]
    pub tasks: BTreeMap<String, ShellTaskConfig>,

    /// Named pipelines
    #[serde(default = "default_pipelines")]
    pub pipelines: BTreeMap<String, PipelineSpec>,

    /// Explicit watch bindings; derived from `paths` when omitted
    #[serde(default)]
    pub watch: Option<Vec<WatchBinding>>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            filename: default_filename(),
            paths: AssetPaths::default(),
            server: ServerConfig::default(),
            package: default_package_file(),
            project: None,
            clean: default_clean_patterns(),
            lint: LintConfig::default(),
            scripts: ScriptOptions::default(),
            styles: StyleOptions::default(),
            views: ViewOptions::default(),
            tasks: BTreeMap::new(),
            pipelines: default_pipelines(),
            watch: None,
        }
    }
}

impl SiteConfig {
    /// Load configuration from a YAML or TOML file and check the paths
    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        if !path.exists() {
            return Err(BuildError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| BuildError::read(path, e))?;

        let config = match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content)?,
            _ => Self::from_yaml(&content)?,
        };

        config.check_paths()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, BuildError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(source: &str) -> Result<Self, BuildError> {
        toml::from_str(source).map_err(Into::into)
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String, BuildError> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, BuildError> {
        toml::to_string_pretty(self).map_err(Into::into)
    }

    /// Serialize in the format `from_file` expects for `path`
    pub fn to_file_format(&self, path: &Path) -> Result<String, BuildError> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => self.to_toml(),
            _ => self.to_yaml(),
        }
    }

    /// Hard path checks run at load time.
    ///
    /// Every path field must be present and non-empty, and no destination
    /// may overlap any source root.
    pub fn check_paths(&self) -> Result<(), BuildError> {
        for (class, paths) in self.paths.iter() {
            if paths.src.as_os_str().is_empty() {
                return Err(BuildError::MissingPath {
                    field: format!("paths.{}.src", class),
                });
            }
            if paths.dest.as_os_str().is_empty() {
                return Err(BuildError::MissingPath {
                    field: format!("paths.{}.dest", class),
                });
            }
        }

        for (_, src) in self.paths.iter() {
            for (_, dest) in self.paths.iter() {
                if paths_overlap(&src.src, &dest.dest) {
                    return Err(BuildError::OverlappingPaths {
                        src: src.src.clone(),
                        dest: dest.dest.clone(),
                    });
                }
            }
        }

        if self.filename.trim().is_empty() {
            return Err(BuildError::MissingPath {
                field: "filename".to_string(),
            });
        }

        Ok(())
    }

    /// Directory served by the dev server
    pub fn served_dir(&self) -> &Path {
        self.server
            .root
            .as_deref()
            .unwrap_or(self.paths.views.dest.as_path())
    }

    /// Watch bindings, explicit or derived from the asset paths
    pub fn watch_bindings(&self) -> Vec<WatchBinding> {
        if let Some(ref bindings) = self.watch {
            return bindings.clone();
        }

        vec![
            WatchBinding::new(
                glob_under(&self.paths.scripts.src, &format!("**/*.{}", self.scripts.extension)),
                "js",
            ),
            WatchBinding::new(
                glob_under(&self.paths.styles.src, &format!("**/*.{}", self.styles.extension)),
                "css",
            ),
            WatchBinding::new(
                glob_under(&self.paths.views.src, &format!("**/*.{}", self.views.extension)),
                "views",
            ),
            WatchBinding::new(glob_under(&self.paths.images.src, "**/*"), "img"),
        ]
    }

    /// Names of all pipelines
    pub fn pipeline_names(&self) -> Vec<&str> {
        self.pipelines.keys().map(|s| s.as_str()).collect()
    }
}

/// Source/destination roots for the four asset classes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetPaths {
    pub scripts: PathConfig,
    pub styles: PathConfig,
    pub views: PathConfig,
    pub images: PathConfig,
}

impl AssetPaths {
    /// Iterate `(class name, paths)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &PathConfig)> {
        [
            ("scripts", &self.scripts),
            ("styles", &self.styles),
            ("views", &self.views),
            ("images", &self.images),
        ]
        .into_iter()
    }
}

impl Default for AssetPaths {
    fn default() -> Self {
        Self {
            scripts: PathConfig::new("app/assets/js", "_site/assets/js"),
            styles: PathConfig::new("app/assets/css", "_site/assets/css"),
            views: PathConfig::new("app", "_site"),
            images: PathConfig::new("app/assets/img", "_site/assets/img"),
        }
    }
}

/// Source and destination directory of one asset class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PathConfig {
    pub src: PathBuf,
    pub dest: PathBuf,
}

impl PathConfig {
    pub fn new(src: impl Into<PathBuf>, dest: impl Into<PathBuf>) -> Self {
        Self {
            src: src.into(),
            dest: dest.into(),
        }
    }
}

/// Dev server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Served directory; defaults to the views destination
    #[serde(default)]
    pub root: Option<PathBuf>,
}

impl ServerConfig {
    /// URL injected into views as `baseUrl`
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            root: None,
        }
    }
}

/// Lint policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LintConfig {
    /// Abort the pipeline when a linter reports errors
    #[serde(default)]
    pub strict: bool,

    /// External script linter (e.g. jshint)
    #[serde(default)]
    pub scripts: Option<ExternalCommand>,

    /// External stylesheet linter (e.g. csslint)
    #[serde(default)]
    pub styles: Option<ExternalCommand>,

    /// External markup linter (e.g. htmlhint)
    #[serde(default)]
    pub markup: Option<ExternalCommand>,
}

/// An external program plus arguments.
///
/// The placeholder `{file}` in `args` is replaced by the input path; without
/// a placeholder the path(s) are appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Script bundling options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptOptions {
    #[serde(default = "default_script_extension")]
    pub extension: String,
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            extension: default_script_extension(),
        }
    }
}

/// Stylesheet options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleOptions {
    #[serde(default = "default_style_extension")]
    pub extension: String,

    /// Command that turns one source file into CSS on stdout (e.g. `sass`)
    #[serde(default)]
    pub preprocessor: Option<ExternalCommand>,

    /// Minimum browser versions used for vendor prefixing, e.g. `chrome: 49`
    #[serde(default = "default_browsers")]
    pub browsers: BTreeMap<String, u32>,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            extension: default_style_extension(),
            preprocessor: None,
            browsers: default_browsers(),
        }
    }
}

/// View rendering options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ViewOptions {
    #[serde(default = "default_view_extension")]
    pub extension: String,

    /// Paths with a component starting with this prefix are not rendered
    #[serde(default = "default_private_prefix")]
    pub private_prefix: String,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            extension: default_view_extension(),
            private_prefix: default_private_prefix(),
        }
    }
}

/// A user-defined shell task
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ShellTaskConfig {
    /// Shell command to run
    pub command: String,

    /// Shell to use (bash, sh, etc.)
    #[serde(default = "default_shell")]
    pub shell: String,

    #[serde(default)]
    pub description: Option<String>,
}

fn default_filename() -> String {
    "myapp".to_string()
}

fn default_package_file() -> PathBuf {
    PathBuf::from("package.json")
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    6001
}

fn default_shell() -> String {
    "bash".to_string()
}

fn default_script_extension() -> String {
    "js".to_string()
}

fn default_style_extension() -> String {
    "css".to_string()
}

fn default_view_extension() -> String {
    "html".to_string()
}

fn default_private_prefix() -> String {
    "_".to_string()
}

fn default_clean_patterns() -> Vec<String> {
    vec![
        ".sass-cache".to_string(),
        ".tmp".to_string(),
        "_gh*".to_string(),
        "_site/*".to_string(),
    ]
}

fn default_browsers() -> BTreeMap<String, u32> {
    [
        ("chrome", 49),
        ("edge", 14),
        ("firefox", 45),
        ("ie", 11),
        ("ios_saf", 9),
        ("safari", 9),
    ]
    .into_iter()
    .map(|(name, version)| (name.to_string(), version))
    .collect()
}

fn default_pipelines() -> BTreeMap<String, PipelineSpec> {
    let build = [
        "clean", "js", "lint:js", "css", "lint:css", "views", "lint:html", "img",
    ];

    let mut pipelines = BTreeMap::new();
    pipelines.insert(
        "production".to_string(),
        PipelineSpec::new(build).with_description("Clean, build and lint every asset class"),
    );
    pipelines.insert(
        "test".to_string(),
        PipelineSpec::new(["production"]).with_description("Production build used as a CI check"),
    );
    pipelines.insert(
        "serve".to_string(),
        PipelineSpec::new(["production"])
            .serving()
            .with_description("Build, then serve and watch for changes"),
    );
    pipelines.insert("default".to_string(), PipelineSpec::new(["serve"]));
    pipelines
}

/// Join a glob onto a directory using forward slashes
fn glob_under(dir: &Path, pattern: &str) -> String {
    let dir = dir.to_string_lossy().replace('\\', "/");
    let dir = dir.trim_end_matches('/');
    if dir.is_empty() || dir == "." {
        pattern.to_string()
    } else {
        format!("{}/{}", dir, pattern)
    }
}

/// Lexically normalize a relative path: drop `.` and resolve `..` where possible
pub(crate) fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// True when one path equals or contains the other
pub(crate) fn paths_overlap(a: &Path, b: &Path) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    a.starts_with(&b) || b.starts_with(&a)
}
