//! Directory-backed template sources
//!
//! Two [`CandidateSource`](crate::template::CandidateSource) implementations
//! read fragments from disk:
//!
//! - [`TemplatePool`] walks a directory once and keeps every fragment parsed;
//! - [`DirectorySource`] looks fragments up on demand and memoizes them for
//!   the lifetime of a single composition.

mod directory;
pub mod fs;
mod pool;

use std::path::PathBuf;

pub use directory::DirectorySource;
pub use fs::{contains_path, find_file, has_ext, strip_ext, walk_templates};
pub use pool::TemplatePool;

/// A template directory and its naming conventions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateDir {
    pub path: PathBuf,
    /// Template file extension, including the leading dot
    pub ext: Option<String>,
    /// Name fragments without their extension
    pub strip_ext: bool,
    /// Directories skipped while walking
    pub exclude: Vec<PathBuf>,
}

impl TemplateDir {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    pub fn with_ext(mut self, ext: impl Into<String>) -> Self {
        self.ext = Some(ext.into());
        self
    }

    pub fn with_strip_ext(mut self, strip: bool) -> Self {
        self.strip_ext = strip;
        self
    }

    pub fn with_exclude(mut self, dir: impl Into<PathBuf>) -> Self {
        self.exclude.push(dir.into());
        self
    }

    pub(crate) fn ext(&self) -> Option<&str> {
        self.ext.as_deref().filter(|e| !e.is_empty())
    }

    /// Names a request for `name` may match: the name itself, the name with
    /// the extension added, and the name with the extension removed
    pub(crate) fn candidate_names(&self, name: &str) -> Vec<String> {
        let mut names = vec![name.to_string()];
        if let Some(ext) = self.ext() {
            let cut = name.len().saturating_sub(ext.len());
            let stripped = name
                .get(cut..)
                .filter(|tail| cut > 0 && tail.eq_ignore_ascii_case(ext))
                .map(|_| &name[..cut]);
            match stripped {
                Some(stem) => names.push(stem.to_string()),
                None => names.push(format!("{}{}", name, ext)),
            }
        }
        names
    }
}
