//! Error types for loading and composing templates

use std::path::PathBuf;

use thiserror::Error;

use crate::ParseError;

/// Errors that can occur while loading, associating or resolving templates
#[derive(Debug, Error)]
pub enum TemplateError {
    /// Fragment source is malformed
    #[error("failed to parse template '{name}': {}", format_parse_errors(.errors))]
    Parse {
        name: String,
        /// Source text, kept for rendering diagnostics
        text: String,
        errors: Vec<ParseError>,
    },

    /// No candidate source could supply a required template
    #[error("template not found: {name}{}", required_by(.referenced_by))]
    Missing {
        name: String,
        referenced_by: Option<String>,
    },

    /// A fragment defines the same template twice
    #[error("duplicate definition of template '{name}' in '{fragment}'")]
    Duplicate { name: String, fragment: String },

    /// A located template file could not be read
    #[error("error reading template file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Composition request string is malformed
    #[error("invalid composition request '{request}': {reason}")]
    InvalidRequest { request: String, reason: String },
}

impl TemplateError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::Missing {
            name: name.into(),
            referenced_by: None,
        }
    }

    pub fn invalid_request(request: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRequest {
            request: request.into(),
            reason: reason.into(),
        }
    }

    /// Render parse errors against their source with ariadne
    ///
    /// Returns `None` for errors that carry no source context.
    pub fn report(&self) -> Option<String> {
        match self {
            TemplateError::Parse { name, text, errors } => Some(
                errors
                    .iter()
                    .map(|e| e.format(text, name))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            _ => None,
        }
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn required_by(referenced_by: &Option<String>) -> String {
    match referenced_by {
        Some(parent) => format!(" (required by '{}')", parent),
        None => String::new(),
    }
}
