// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Stylesheet compilation

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::external::ExternalTool;
use super::sourcemap::{relative_path, style_map_comment, Origin, SourceMapBuilder};
use super::{Artifact, SourceFile};
use crate::config::ExternalCommand;
use crate::errors::BuildError;

const CHARSET: &str = "@charset \"UTF-8\";\n";

/// Compiles stylesheets into `<filename>.css` and `<filename>.min.css`.
///
/// Sources go through the optional preprocessor, are parsed and prefixed by
/// lightningcss for the configured browsers, and are concatenated in
/// lexical order under the charset header and banner.
#[derive(Debug, Clone)]
pub struct StyleCompiler {
    filename: String,
    banner: String,
    dest: PathBuf,
    working_dir: PathBuf,
    preprocessor: Option<ExternalCommand>,
    targets: Targets,
}

/// One source after preprocessing and parsing
struct CompiledSheet {
    index: u32,
    plain: String,
    minified: String,
}

impl StyleCompiler {
    pub fn new(
        filename: impl Into<String>,
        banner: impl Into<String>,
        dest: impl Into<PathBuf>,
        working_dir: impl Into<PathBuf>,
        preprocessor: Option<ExternalCommand>,
        browsers: &BTreeMap<String, u32>,
    ) -> Result<Self, BuildError> {
        Ok(Self {
            filename: filename.into(),
            banner: banner.into(),
            dest: dest.into(),
            working_dir: working_dir.into(),
            preprocessor,
            targets: browser_targets(browsers)?,
        })
    }

    /// Compile `sources` into plain and minified outputs with their maps
    pub async fn compile(&self, sources: &[SourceFile]) -> Result<Vec<Artifact>, BuildError> {
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let tool = self
            .preprocessor
            .as_ref()
            .map(ExternalTool::locate)
            .transpose()?;

        let plain_name = format!("{}.css", self.filename);
        let min_name = format!("{}.min.css", self.filename);
        let mut plain_map = SourceMapBuilder::new(&plain_name);
        let mut min_map = SourceMapBuilder::new(&min_name);

        let mut sheets = Vec::with_capacity(sources.len());
        for source in sources {
            let css = match tool {
                Some(ref tool) => {
                    let output = tool
                        .run(&[source.path.clone()], &self.working_dir)
                        .await?
                        .into_result(tool.name())?;
                    output.stdout
                }
                None => source.content.clone(),
            };

            let relative = relative_path(&self.dest, &source.path);
            let index = plain_map.add_source(relative.clone());
            min_map.add_source(relative);

            let (plain, minified) = self.print(&source.path, &css)?;
            sheets.push(CompiledSheet {
                index,
                plain,
                minified,
            });
        }

        let header = format!("{}{}", CHARSET, self.banner);
        let header_lines = header.lines().count();

        let mut plain = header.clone();
        let mut minified = header;
        plain_map.push_unmapped(header_lines);
        min_map.push_unmapped(header_lines);

        for sheet in &sheets {
            for line in sheet.plain.lines().filter(|l| !l.trim().is_empty()) {
                plain.push_str(line);
                plain.push('\n');
                plain_map.push_line(Some(Origin::new(sheet.index, 0, 0)));
            }
            for line in sheet.minified.lines().filter(|l| !l.trim().is_empty()) {
                minified.push_str(line);
                minified.push('\n');
                min_map.push_line(Some(Origin::new(sheet.index, 0, 0)));
            }
        }

        plain.push_str(&style_map_comment(&format!("{}.map", plain_name)));
        minified.push_str(&style_map_comment(&format!("{}.map", min_name)));

        Ok(vec![
            Artifact::new(self.dest.join(&plain_name), plain),
            Artifact::new(self.dest.join(format!("{}.map", plain_name)), plain_map.build().to_json()?),
            Artifact::new(self.dest.join(&min_name), minified),
            Artifact::new(self.dest.join(format!("{}.map", min_name)), min_map.build().to_json()?),
        ])
    }

    /// Parse one sheet and print it expanded and minified
    fn print(&self, path: &Path, css: &str) -> Result<(String, String), BuildError> {
        let failed = |message: String| BuildError::TransformFailed {
            transformer: "styles".to_string(),
            path: path.to_path_buf(),
            message,
        };

        let options = ParserOptions {
            filename: path.display().to_string(),
            ..ParserOptions::default()
        };
        let mut sheet = StyleSheet::parse(css, options).map_err(|e| failed(e.to_string()))?;

        sheet
            .minify(MinifyOptions {
                targets: self.targets,
                ..MinifyOptions::default()
            })
            .map_err(|e| failed(e.to_string()))?;

        let plain = sheet
            .to_css(PrinterOptions {
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| failed(e.to_string()))?;

        let minified = sheet
            .to_css(PrinterOptions {
                minify: true,
                targets: self.targets,
                ..PrinterOptions::default()
            })
            .map_err(|e| failed(e.to_string()))?;

        Ok((plain.code, minified.code))
    }
}

/// Build lightningcss targets from `browser: major version` pairs
pub fn browser_targets(browsers: &BTreeMap<String, u32>) -> Result<Targets, BuildError> {
    let mut targets = Browsers::default();

    for (name, major) in browsers {
        let version = Some(major << 16);
        match name.as_str() {
            "android" => targets.android = version,
            "chrome" => targets.chrome = version,
            "edge" => targets.edge = version,
            "firefox" => targets.firefox = version,
            "ie" => targets.ie = version,
            "ios_saf" => targets.ios_saf = version,
            "opera" => targets.opera = version,
            "safari" => targets.safari = version,
            "samsung" => targets.samsung = version,
            other => {
                return Err(BuildError::InvalidConfig {
                    reason: format!("Unknown browser '{}' in styles.browsers", other),
                    help: Some(
                        "Known browsers: android, chrome, edge, firefox, ie, ios_saf, opera, safari, samsung"
                            .to_string(),
                    ),
                })
            }
        }
    }

    Ok(Targets::from(targets))
}
