// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Script bundling

use std::path::PathBuf;

use super::sourcemap::{relative_path, script_map_comment, Origin, SourceMapBuilder};
use super::{Artifact, SourceFile};
use crate::errors::BuildError;

/// Concatenates scripts into `<filename>.js` and `<filename>.min.js`.
///
/// The minified variant is a conservative compaction: every line is
/// trimmed, and blank lines and whole-line `//` comments are dropped.
/// Nothing is renamed or reflowed, so each output line still maps to one
/// source line.
#[derive(Debug, Clone)]
pub struct ScriptBundler {
    filename: String,
    banner: String,
    dest: PathBuf,
}

impl ScriptBundler {
    pub fn new(filename: impl Into<String>, banner: impl Into<String>, dest: impl Into<PathBuf>) -> Self {
        Self {
            filename: filename.into(),
            banner: banner.into(),
            dest: dest.into(),
        }
    }

    /// Bundle `sources` (already in lexical order) into plain and minified
    /// outputs with their maps. No sources means no outputs.
    pub fn bundle(&self, sources: &[SourceFile]) -> Result<Vec<Artifact>, BuildError> {
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let mut artifacts = self.render(sources, &format!("{}.js", self.filename), false)?;
        artifacts.extend(self.render(sources, &format!("{}.min.js", self.filename), true)?);
        Ok(artifacts)
    }

    fn render(&self, sources: &[SourceFile], name: &str, minify: bool) -> Result<Vec<Artifact>, BuildError> {
        let map_name = format!("{}.map", name);
        let mut map = SourceMapBuilder::new(name);
        let mut code = self.banner.clone();
        map.push_unmapped(self.banner.lines().count());

        for source in sources {
            let index = map.add_source(relative_path(&self.dest, &source.path));

            for (line_no, line) in source.content.lines().enumerate() {
                let (text, column) = if minify {
                    let trimmed = line.trim();
                    if trimmed.is_empty() || trimmed.starts_with("//") {
                        continue;
                    }
                    (trimmed, line.len() - line.trim_start().len())
                } else {
                    (line, 0)
                };

                code.push_str(text);
                code.push('\n');
                map.push_line(Some(Origin::new(index, line_no as u32, column as u32)));
            }
        }

        code.push_str(&script_map_comment(&map_name));

        Ok(vec![
            Artifact::new(self.dest.join(name), code),
            Artifact::new(self.dest.join(&map_name), map.build().to_json()?),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(relative: &str, content: &str) -> SourceFile {
        SourceFile {
            path: PathBuf::from("app/js").join(relative),
            relative: PathBuf::from(relative),
            content: content.to_string(),
        }
    }

    fn bundler() -> ScriptBundler {
        ScriptBundler::new("myapp", "/*! banner */\n", "out/js")
    }

    #[test]
    fn test_bundle_keeps_input_order() {
        let sources = vec![source("a.js", "var a = 1;"), source("b.js", "var b = 2;")];
        let artifacts = bundler().bundle(&sources).unwrap();

        let names: Vec<_> = artifacts.iter().map(|a| a.path.clone()).collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("out/js/myapp.js"),
                PathBuf::from("out/js/myapp.js.map"),
                PathBuf::from("out/js/myapp.min.js"),
                PathBuf::from("out/js/myapp.min.js.map"),
            ]
        );

        let plain = &artifacts[0].contents;
        assert!(plain.starts_with("/*! banner */\n"));
        let a = plain.find("var a").unwrap();
        let b = plain.find("var b").unwrap();
        assert!(a < b);
        assert!(plain.ends_with("//# sourceMappingURL=myapp.js.map\n"));
    }

    #[test]
    fn test_minified_drops_blank_and_comment_lines() {
        let sources = vec![source("a.js", "// header\n\n    var a = 1;\n")];
        let artifacts = bundler().bundle(&sources).unwrap();

        let min = &artifacts[2].contents;
        assert_eq!(min, "/*! banner */\nvar a = 1;\n//# sourceMappingURL=myapp.min.js.map\n");

        let map: serde_json::Value = serde_json::from_str(&artifacts[3].contents).unwrap();
        assert_eq!(map["sources"][0], "../../app/js/a.js");
        // banner line unmapped, then line 2 col 4 of a.js
        assert_eq!(map["mappings"], ";AAEI");
    }

    #[test]
    fn test_plain_map_is_line_accurate() {
        let sources = vec![source("a.js", "x;\ny;"), source("b.js", "z;")];
        let artifacts = bundler().bundle(&sources).unwrap();

        let map: serde_json::Value = serde_json::from_str(&artifacts[1].contents).unwrap();
        assert_eq!(map["file"], "myapp.js");
        assert_eq!(map["mappings"], ";AAAA;AACA;ACDA");
    }

    #[test]
    fn test_no_sources_no_outputs() {
        assert!(bundler().bundle(&[]).unwrap().is_empty());
    }
}
