//! Configuration file loading for tessera.
//!
//! Reads `tessera.config.json` from a project directory and turns it into
//! engine options.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tessera_atelier::ScopeOptions;
use tessera_relief::{ParserOptions, WhitespaceStrategy};

/// Name of the configuration file.
pub const CONFIG_FILE: &str = "tessera.config.json";

/// Top-level tessera configuration.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TesseraConfig {
    /// JSON Schema reference (for editor autocompletion).
    #[serde(rename = "$schema", default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Template parsing configuration.
    #[serde(default)]
    pub template: TemplateConfig,
}

/// Configuration for template parsing.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TemplateConfig {
    /// Placeholder marker joined between static strings.
    ///
    /// Must not occur in any template's static text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,

    /// `"condense"` (default) or `"preserve"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whitespace: Option<WhitespaceStrategy>,

    /// Whether static comments are kept. Defaults to `true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<bool>,
}

impl TesseraConfig {
    /// Parser options with the configured overrides applied.
    pub fn parser_options(&self) -> ParserOptions {
        let mut options = ParserOptions::default();
        if let Some(marker) = &self.template.marker {
            options = options.with_marker(marker.as_str());
        }
        if let Some(whitespace) = self.template.whitespace {
            options = options.with_whitespace(whitespace);
        }
        if let Some(comments) = self.template.comments {
            options.comments = comments;
        }
        options
    }

    /// Engine options for a new scope.
    pub fn scope_options(&self) -> ScopeOptions {
        ScopeOptions {
            parser: self.parser_options(),
        }
    }
}

/// Load `tessera.config.json` from the given directory (or CWD if None).
///
/// A missing file yields the defaults. An unreadable or malformed file is
/// reported with a warning and also yields the defaults.
pub fn load_config(dir: Option<&Path>) -> TesseraConfig {
    let base = dir
        .map(|d| d.to_path_buf())
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default());
    let config_path = base.join(CONFIG_FILE);

    if !config_path.exists() {
        return TesseraConfig::default();
    }

    match std::fs::read_to_string(&config_path) {
        Ok(content) => match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
                TesseraConfig::default()
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read {}: {}", config_path.display(), e);
            TesseraConfig::default()
        }
    }
}

/// JSON Schema for `tessera.config.json`.
pub const TESSERA_CONFIG_SCHEMA: &str = r#"{
  "$schema": "http://json-schema.org/draft-07/schema#",
  "title": "Tessera Configuration",
  "description": "Configuration file for tessera template rendering",
  "type": "object",
  "properties": {
    "$schema": {
      "type": "string",
      "description": "JSON Schema reference for editor autocompletion"
    },
    "template": {
      "type": "object",
      "description": "Template parsing configuration",
      "properties": {
        "marker": {
          "type": "string",
          "minLength": 1,
          "description": "Placeholder marker joined between static strings. Must not occur in static template text."
        },
        "whitespace": {
          "enum": ["condense", "preserve"],
          "description": "Whitespace handling for static text"
        },
        "comments": {
          "type": "boolean",
          "description": "Whether static comments are kept"
        }
      },
      "additionalProperties": false
    }
  },
  "additionalProperties": false
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(Some(dir.path()));
        assert!(config.schema.is_none());
        assert!(config.template.marker.is_none());
        let options = config.parser_options();
        assert_eq!(options.marker, ParserOptions::default().marker);
        assert!(options.comments);
    }

    #[test]
    fn test_overrides_applied() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"{
              "$schema": "./schema.json",
              "template": { "marker": "@@slot@@", "whitespace": "preserve", "comments": false }
            }"#,
        )
        .unwrap();

        let config = load_config(Some(dir.path()));
        assert_eq!(config.schema.as_deref(), Some("./schema.json"));
        let options = config.scope_options().parser;
        assert_eq!(options.marker, "@@slot@@");
        assert_eq!(options.whitespace, WhitespaceStrategy::Preserve);
        assert!(!options.comments);
    }

    #[test]
    fn test_malformed_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "template": { "marker": 3 } }"#).unwrap();
        let config = load_config(Some(dir.path()));
        assert!(config.template.marker.is_none());

        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "template": { "markr": "x" } }"#).unwrap();
        let config = load_config(Some(dir.path()));
        assert!(config.template.marker.is_none());
    }

    #[test]
    fn test_schema_is_valid_json() {
        let schema: serde_json::Value = serde_json::from_str(TESSERA_CONFIG_SCHEMA).unwrap();
        assert_eq!(schema["title"], "Tessera Configuration");
    }
}
