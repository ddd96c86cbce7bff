//! Composition request strings
//!
//! A request is a comma-separated list such as `base=site,profile,sidebar`:
//! `base=` (or `layout=`) picks the layout, every bare token names a content
//! fragment.

use std::fmt;
use std::str::FromStr;

use crate::template::TemplateError;

/// Which template becomes the root of the composed set
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BaseSlot {
    /// Use the configured default layout
    #[default]
    Default,
    /// Use the named layout
    Named(String),
    /// No layout: the first content is the root
    Root,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CompositionRequest {
    pub base: BaseSlot,
    /// Content fragment names, in request order
    pub contents: Vec<String>,
}

impl CompositionRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = BaseSlot::Named(base.into());
        self
    }

    pub fn without_base(mut self) -> Self {
        self.base = BaseSlot::Root;
        self
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.contents.push(content.into());
        self
    }

    /// Parse a request string; a repeated `base=` replaces the earlier one
    pub fn parse(request: &str) -> Result<Self, TemplateError> {
        let mut parsed = Self::new();
        for token in request.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            match token.split_once('=') {
                Some((key, value)) => match key.trim() {
                    "base" | "layout" => {
                        parsed.base = match value.trim() {
                            "" => BaseSlot::Root,
                            name => BaseSlot::Named(name.to_string()),
                        };
                    }
                    other => {
                        return Err(TemplateError::invalid_request(
                            request,
                            format!("unknown key '{}'", other),
                        ))
                    }
                },
                None => parsed.contents.push(token.to_string()),
            }
        }
        Ok(parsed)
    }

    /// Name of the layout to compose into, if any
    pub fn base_name<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        match &self.base {
            BaseSlot::Named(name) => Some(name.as_str()),
            BaseSlot::Default => default,
            BaseSlot::Root => None,
        }
    }
}

impl FromStr for CompositionRequest {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for CompositionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = Vec::new();
        match &self.base {
            BaseSlot::Named(name) => parts.push(format!("base={}", name)),
            BaseSlot::Root => parts.push("base=".to_string()),
            BaseSlot::Default => {}
        }
        parts.extend(self.contents.iter().cloned());
        write!(f, "{}", parts.join(","))
    }
}
