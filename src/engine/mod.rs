//! Template engine: parses fragments and executes composed sets
//!
//! The engine knows nothing about directories or composition. It turns source
//! text into [`TemplateSet`]s and renders a set's root against JSON data.

mod exec;

use std::io::Write;

use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;
use crate::parser::{self, Delimiters, Document};
use crate::template::{TemplateError, TemplateSet};

/// Maximum nesting of template invocations during execution
pub const MAX_EXEC_DEPTH: usize = 256;

/// Errors that can occur while executing a composed set
#[derive(Debug, Error)]
pub enum ExecError {
    /// Invocation of a template that is not a member of the set
    #[error("template '{caller}' invokes undefined template '{name}'")]
    UndefinedTemplate { name: String, caller: String },

    /// Field lookup failed with `missingkey=error`
    #[error("no entry for key '{path}' in template '{template}'")]
    MissingKey { template: String, path: String },

    /// Invocations nested deeper than [`MAX_EXEC_DEPTH`]
    #[error("exceeded maximum template depth ({depth}) while invoking '{name}'")]
    RecursionLimit { name: String, depth: usize },

    /// Output could not be written
    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// What to do when a field lookup finds nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingKey {
    /// Print `<no value>`
    #[default]
    Default,
    /// Print nothing
    Zero,
    /// Fail execution
    Error,
}

/// Engine settings derived from configuration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineOptions {
    pub delimiters: Delimiters,
    pub missing_key: MissingKey,
}

impl EngineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the action delimiters
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }

    /// Apply a `key=value` option string such as `missingkey=error`
    pub fn with_option(mut self, option: &str) -> Result<Self, ConfigError> {
        let invalid = || ConfigError::InvalidOption {
            option: option.to_string(),
        };
        let (key, value) = option.split_once('=').ok_or_else(invalid)?;
        match (key.trim(), value.trim()) {
            ("missingkey", "default" | "invalid") => self.missing_key = MissingKey::Default,
            ("missingkey", "zero") => self.missing_key = MissingKey::Zero,
            ("missingkey", "error") => self.missing_key = MissingKey::Error,
            _ => return Err(invalid()),
        }
        Ok(self)
    }
}

/// Parses template source and executes composed sets
#[derive(Debug, Clone, Default)]
pub struct TemplateEngine {
    options: EngineOptions,
}

impl TemplateEngine {
    pub fn new(options: EngineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// Parse fragment source into a document
    pub fn parse(&self, name: &str, text: &str) -> Result<Document, TemplateError> {
        parser::parse(text, &self.options.delimiters).map_err(|errors| TemplateError::Parse {
            name: name.to_string(),
            text: text.to_string(),
            errors,
        })
    }

    /// Parse fragment source into a set rooted at `name`
    pub fn parse_set(&self, name: &str, text: &str) -> Result<TemplateSet, TemplateError> {
        let doc = self.parse(name, text)?;
        TemplateSet::from_document(name, doc)
    }

    /// Execute the set's root and return the output
    pub fn render(&self, set: &TemplateSet, data: &Value) -> Result<String, ExecError> {
        exec::Executor::new(set, self.options.missing_key).run_root(data)
    }

    /// Execute the set's root into `writer`
    ///
    /// Output is buffered, so nothing is written when execution fails.
    pub fn execute(
        &self,
        set: &TemplateSet,
        data: &Value,
        writer: &mut dyn Write,
    ) -> Result<(), ExecError> {
        let output = self.render(set, data)?;
        writer.write_all(output.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_option_parsing() {
        let opts = EngineOptions::new()
            .with_option("missingkey=error")
            .expect("Valid option");
        assert_eq!(opts.missing_key, MissingKey::Error);

        let opts = EngineOptions::new()
            .with_option("missingkey=zero")
            .expect("Valid option");
        assert_eq!(opts.missing_key, MissingKey::Zero);

        let opts = EngineOptions::new()
            .with_option("missingkey=invalid")
            .expect("Valid option");
        assert_eq!(opts.missing_key, MissingKey::Default);
    }

    #[test]
    fn test_unknown_option_rejected() {
        assert!(matches!(
            EngineOptions::new().with_option("missingkey=maybe"),
            Err(ConfigError::InvalidOption { .. })
        ));
        assert!(EngineOptions::new().with_option("strict").is_err());
    }

    #[test]
    fn test_parse_error_names_fragment() {
        let engine = TemplateEngine::default();
        let err = engine.parse_set("broken", "{{ template }}").unwrap_err();
        match err {
            TemplateError::Parse { name, text, errors } => {
                assert_eq!(name, "broken");
                assert_eq!(text, "{{ template }}");
                assert!(!errors.is_empty());
            }
            other => panic!("Expected Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_execute_writes_nothing_on_failure() {
        let engine = TemplateEngine::default();
        let set = engine
            .parse_set("page", r#"partial output {{template "missing"}}"#)
            .expect("Should parse");
        let mut out = Vec::new();
        let result = engine.execute(&set, &json!({}), &mut out);
        assert!(matches!(result, Err(ExecError::UndefinedTemplate { .. })));
        assert!(out.is_empty());
    }

    #[test]
    fn test_custom_delimiters() {
        let engine = TemplateEngine::new(
            EngineOptions::new().with_delimiters(Delimiters::new("<%", "%>")),
        );
        let set = engine
            .parse_set("page", "{{ not an action }} <% .Name %>")
            .expect("Should parse");
        let out = engine.render(&set, &json!({"Name": "Ada"})).expect("Should render");
        assert_eq!(out, "{{ not an action }} Ada");
    }
}
