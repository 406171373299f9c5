// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Version 3 source maps
//!
//! Maps are built one generated line at a time. Each mapped line gets a
//! single segment pointing at a source file, line and column; sources are
//! listed relative to the output directory and carry no embedded content.

use serde::Serialize;
use std::path::{Component, Path};

use crate::config::normalize;
use crate::errors::BuildError;

const BASE64: &[u8; 64] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Serialized source map
#[derive(Debug, Clone, Serialize)]
pub struct SourceMap {
    pub version: u8,
    pub file: String,
    pub sources: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> Result<String, BuildError> {
        serde_json::to_string(self).map_err(Into::into)
    }
}

/// Position in an original source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin {
    pub source: u32,
    pub line: u32,
    pub column: u32,
}

impl Origin {
    pub fn new(source: u32, line: u32, column: u32) -> Self {
        Self {
            source,
            line,
            column,
        }
    }
}

/// Line-by-line source map builder
#[derive(Debug, Clone)]
pub struct SourceMapBuilder {
    file: String,
    sources: Vec<String>,
    lines: Vec<Option<Origin>>,
}

impl SourceMapBuilder {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            sources: Vec::new(),
            lines: Vec::new(),
        }
    }

    /// Register a source and return its index
    pub fn add_source(&mut self, source: impl Into<String>) -> u32 {
        self.sources.push(source.into());
        (self.sources.len() - 1) as u32
    }

    /// Record the origin of the next generated line
    pub fn push_line(&mut self, origin: Option<Origin>) {
        self.lines.push(origin);
    }

    /// Record `count` generated lines with no origin (banners, headers)
    pub fn push_unmapped(&mut self, count: usize) {
        self.lines.extend(std::iter::repeat(None).take(count));
    }

    pub fn build(self) -> SourceMap {
        let mut mappings = String::new();
        let mut prev = Origin::new(0, 0, 0);

        for (idx, origin) in self.lines.iter().enumerate() {
            if idx > 0 {
                mappings.push(';');
            }
            if let Some(origin) = origin {
                // Generated column always starts at 0 on a fresh line
                encode_vlq(&mut mappings, 0);
                encode_vlq(&mut mappings, origin.source as i64 - prev.source as i64);
                encode_vlq(&mut mappings, origin.line as i64 - prev.line as i64);
                encode_vlq(&mut mappings, origin.column as i64 - prev.column as i64);
                prev = *origin;
            }
        }

        SourceMap {
            version: 3,
            file: self.file,
            sources: self.sources,
            names: Vec::new(),
            mappings,
        }
    }
}

/// Append one base64 VLQ value
fn encode_vlq(out: &mut String, value: i64) {
    let signed = if value < 0 {
        ((-value) << 1) | 1
    } else {
        value << 1
    };
    let mut vlq = signed as u64;

    loop {
        let mut digit = (vlq & 31) as usize;
        vlq >>= 5;
        if vlq > 0 {
            digit |= 32;
        }
        out.push(BASE64[digit] as char);
        if vlq == 0 {
            break;
        }
    }
}

/// Path of `to` relative to the directory `from_dir`, with forward slashes
pub fn relative_path(from_dir: &Path, to: &Path) -> String {
    let from = normalize(from_dir);
    let to = normalize(to);
    let from: Vec<Component> = from.components().collect();
    let to: Vec<Component> = to.components().collect();

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut parts: Vec<String> = vec!["..".to_string(); from.len() - common];
    parts.extend(
        to[common..]
            .iter()
            .map(|c| c.as_os_str().to_string_lossy().to_string()),
    );
    parts.join("/")
}

/// Trailing comment that links a script to its map
pub fn script_map_comment(map_file: &str) -> String {
    format!("//# sourceMappingURL={}\n", map_file)
}

/// Trailing comment that links a stylesheet to its map
pub fn style_map_comment(map_file: &str) -> String {
    format!("/*# sourceMappingURL={} */\n", map_file)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vlq(value: i64) -> String {
        let mut out = String::new();
        encode_vlq(&mut out, value);
        out
    }

    #[test]
    fn test_vlq_values() {
        assert_eq!(vlq(0), "A");
        assert_eq!(vlq(1), "C");
        assert_eq!(vlq(-1), "D");
        assert_eq!(vlq(15), "e");
        assert_eq!(vlq(16), "gB");
        assert_eq!(vlq(-17), "jB");
    }

    #[test]
    fn test_map_json() {
        let mut builder = SourceMapBuilder::new("out.js");
        let a = builder.add_source("a.js");
        let b = builder.add_source("b.js");
        builder.push_unmapped(1);
        builder.push_line(Some(Origin::new(a, 0, 0)));
        builder.push_line(Some(Origin::new(a, 1, 0)));
        builder.push_line(Some(Origin::new(b, 0, 0)));

        let json = builder.build().to_json().unwrap();
        insta::assert_snapshot!(json, @r###"{"version":3,"file":"out.js","sources":["a.js","b.js"],"names":[],"mappings":";AAAA;AACA;ACDA"}"###);
    }

    #[test]
    fn test_relative_path() {
        assert_eq!(
            relative_path(Path::new("_site/assets/js"), Path::new("app/assets/js/a.js")),
            "../../../app/assets/js/a.js"
        );
        assert_eq!(relative_path(Path::new("/p/out"), Path::new("/p/out/x.css")), "x.css");
    }
}
