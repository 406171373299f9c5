// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 sitepipe contributors

//! Project metadata and the artifact banner

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::BuildError;

/// Project metadata used for banners and view context.
///
/// Read from `package.json`; unknown fields are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectMeta {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub version: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub homepage: String,

    #[serde(default)]
    pub author: Author,
}

/// Author in either npm form: an object or `"Name <email> (url)"`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "AuthorField")]
pub struct Author {
    pub name: String,
    pub url: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum AuthorField {
    Text(String),
    Object {
        #[serde(default)]
        name: String,
        #[serde(default)]
        url: String,
    },
}

impl From<AuthorField> for Author {
    fn from(field: AuthorField) -> Self {
        match field {
            AuthorField::Object { name, url } => Self { name, url },
            AuthorField::Text(text) => Self::parse(&text),
        }
    }
}

impl Author {
    /// Parse the npm person shorthand `Name <email> (url)`
    pub fn parse(text: &str) -> Self {
        let url = Regex::new(r"\(([^)]*)\)")
            .ok()
            .and_then(|re| re.captures(text))
            .map(|c| c[1].trim().to_string())
            .unwrap_or_default();

        let name = text
            .split(['<', '('])
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        Self { name, url }
    }
}

impl ProjectMeta {
    /// Load metadata from a package.json-style file
    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        let content = std::fs::read_to_string(path).map_err(|e| BuildError::read(path, e))?;
        Self::from_json(&content)
    }

    /// Parse metadata from JSON
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        serde_json::from_str(json).map_err(Into::into)
    }

    /// Render the banner placed at the top of bundled artifacts
    pub fn banner(&self) -> String {
        [
            "/*!".to_string(),
            format!(" * {} - {}", self.name, self.description),
            " * ".to_string(),
            format!(" * @link    : {}", self.homepage),
            format!(" * @author  : {} | ({})", self.author.name, self.author.url),
            " **/".to_string(),
            " ".to_string(),
            String::new(),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_object() {
        let meta = ProjectMeta::from_json(
            r#"{"name":"demo","author":{"name":"Ana","url":"https://ana.dev"},"private":true}"#,
        )
        .unwrap();
        assert_eq!(meta.author.name, "Ana");
        assert_eq!(meta.author.url, "https://ana.dev");
    }

    #[test]
    fn test_author_shorthand() {
        let meta =
            ProjectMeta::from_json(r#"{"author":"Ana Lima <ana@x.io> (https://ana.dev)"}"#).unwrap();
        assert_eq!(meta.author.name, "Ana Lima");
        assert_eq!(meta.author.url, "https://ana.dev");
    }

    #[test]
    fn test_banner_shape() {
        let meta = ProjectMeta {
            name: "demo".into(),
            version: "1.0.0".into(),
            description: "A demo site".into(),
            homepage: "https://demo.dev".into(),
            author: Author {
                name: "Ana".into(),
                url: "https://ana.dev".into(),
            },
        };

        let banner = meta.banner();
        let lines: Vec<&str> = banner.lines().collect();
        assert_eq!(lines[0], "/*!");
        assert_eq!(lines[1], " * demo - A demo site");
        assert_eq!(lines[3], " * @link    : https://demo.dev");
        assert_eq!(lines[4], " * @author  : Ana | (https://ana.dev)");
        assert_eq!(lines[5], " **/");
        assert!(banner.ends_with(" \n"));
    }
}
