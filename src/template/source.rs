//! Candidate sources consulted during resolution

use std::sync::Arc;

use super::error::TemplateError;
use super::set::{NamedTemplate, TemplateSet};

/// A provider that can answer "do you have a template named X?"
///
/// A miss is `Ok(None)` and lets resolution move on to the next source. Errors
/// are reserved for templates that exist but cannot be loaded.
pub trait CandidateSource {
    /// Short human-readable description, used in logs
    fn describe(&self) -> String;

    /// Look up a single template by name
    fn lookup(&self, name: &str) -> Result<Option<Arc<NamedTemplate>>, TemplateError>;

    /// Look up a whole fragment (its root plus its definitions) by name
    fn fragment(&self, _name: &str) -> Result<Option<Arc<TemplateSet>>, TemplateError> {
        Ok(None)
    }
}

impl CandidateSource for TemplateSet {
    fn describe(&self) -> String {
        format!("template set '{}'", self.root_name())
    }

    fn lookup(&self, name: &str) -> Result<Option<Arc<NamedTemplate>>, TemplateError> {
        Ok(self.get(name).cloned())
    }
}

/// Query sources in priority order; the first non-blank hit wins
pub(crate) fn lookup_first(
    sources: &[&dyn CandidateSource],
    name: &str,
) -> Result<Option<(Arc<NamedTemplate>, String)>, TemplateError> {
    for source in sources {
        match source.lookup(name)? {
            Some(found) if !found.is_blank() => return Ok(Some((found, source.describe()))),
            _ => continue,
        }
    }
    Ok(None)
}
