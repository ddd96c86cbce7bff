//! Template sets and their composition
//!
//! A [`TemplateSet`] is one logical template: a root fragment plus every
//! sub-template it can invoke. Composition grows a base set by grafting in the
//! templates its members reference, taken from content sets and from ordered
//! [`CandidateSource`]s.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use template_composer::engine::TemplateEngine;
//! use template_composer::template::compose;
//!
//! let engine = TemplateEngine::default();
//! let layout = engine.parse_set("layout", r#"<{{template "body"}}>"#).unwrap();
//! let body = Arc::new(engine.parse_set("body", "Hello").unwrap());
//!
//! let composition = compose(layout, &[body], &[]).unwrap();
//! assert!(composition.set.contains("body"));
//! ```

mod error;
mod resolver;
mod scanner;
mod set;
mod source;

pub use error::TemplateError;
pub use resolver::{associate, compose, resolve_all, Composition, Resolution};
pub use scanner::{references, required_names, Reference};
pub use set::{NamedTemplate, TemplateSet};
pub use source::CandidateSource;
