//! Template Composer - composes layouts, views and partials into one template
//!
//! Fragments reference each other by name with `{{template "name"}}` and
//! `{{block "name"}}default{{end}}`. Composition starts from a base fragment,
//! discovers which names it needs, pulls the matching fragments from content
//! sets and partial sources, and repeats until every reference resolves.
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use template_composer::render;
//!
//! let out = render(
//!     r#"Hello {{block "body" .}}{{end}}"#,
//!     &[("body", "{{ .Name }}")],
//!     &json!({"Name": "World"}),
//! )
//! .unwrap();
//! assert_eq!(out, "Hello World");
//! ```

pub mod composer;
pub mod config;
pub mod engine;
pub mod error;
pub mod loader;
pub mod parser;
pub mod template;

pub use composer::{Composer, CompositionRequest};
pub use config::{CacheMode, ComposerConfig, ConfigError, TemplateRole};
pub use engine::{EngineOptions, ExecError, MissingKey, TemplateEngine};
pub use error::ParseError;
pub use parser::{parse, Document};
pub use template::{Composition, NamedTemplate, Resolution, TemplateError, TemplateSet};

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur anywhere between configuration and output
#[derive(Debug, Error)]
pub enum ComposeError {
    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Compose a layout with named content fragments and render it
///
/// The layout is named `layout`; each content is named as given. Contents are
/// also the only partial source, in order.
///
/// # Example
///
/// ```rust
/// use serde_json::Value;
/// use template_composer::render;
///
/// let out = render(
///     r#"<{{template "header"}}|{{block "body"}}default{{end}}>"#,
///     &[("header", "H"), ("body", "B")],
///     &Value::Null,
/// )
/// .unwrap();
/// assert_eq!(out, "<H|B>");
/// ```
pub fn render(
    layout: &str,
    contents: &[(&str, &str)],
    data: &Value,
) -> Result<String, ComposeError> {
    let engine = TemplateEngine::default();
    let base = engine.parse_set("layout", layout)?;
    let contents = contents
        .iter()
        .map(|(name, text)| engine.parse_set(name, text).map(Arc::new))
        .collect::<Result<Vec<_>, _>>()?;

    let composition = template::compose(base, &contents, &[])?;
    Ok(engine.render(&composition.set, data)?)
}
