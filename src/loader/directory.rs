//! On-demand directory lookups

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::engine::TemplateEngine;
use crate::template::{CandidateSource, NamedTemplate, TemplateError, TemplateSet};

use super::fs::{contains_path, find_file, is_safe_name, template_name};
use super::TemplateDir;

/// Reads fragments from a directory when they are first asked for
///
/// Each file is parsed at most once per source. Nothing is shared between
/// sources, so a fresh source sees the current contents of the directory.
pub struct DirectorySource<'e> {
    label: String,
    dir: TemplateDir,
    engine: &'e TemplateEngine,
    memo: RefCell<HashMap<String, Option<Arc<TemplateSet>>>>,
}

impl<'e> DirectorySource<'e> {
    pub fn new(label: impl Into<String>, dir: TemplateDir, engine: &'e TemplateEngine) -> Self {
        Self {
            label: label.into(),
            dir,
            engine,
            memo: RefCell::new(HashMap::new()),
        }
    }

    fn load(&self, name: &str) -> Result<Option<Arc<TemplateSet>>, TemplateError> {
        if !is_safe_name(name) {
            tracing::warn!(
                source = %self.label,
                name,
                "refusing template name outside its directory"
            );
            return Ok(None);
        }
        let Some(path) = find_file(&self.dir.path, name, self.dir.ext()) else {
            tracing::debug!(source = %self.label, name, "no template file");
            return Ok(None);
        };
        if self.is_excluded(&path) {
            tracing::debug!(source = %self.label, name, "template file is excluded");
            return Ok(None);
        }

        let text = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
            path: path.clone(),
            source,
        })?;
        let relative = path
            .strip_prefix(&self.dir.path)
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_else(|_| name.to_string());
        let fragment = template_name(&relative, self.dir.strip_ext);

        tracing::debug!(
            source = %self.label,
            fragment = %fragment,
            path = %path.display(),
            "loaded template file"
        );
        Ok(Some(Arc::new(self.engine.parse_set(&fragment, &text)?)))
    }

    fn is_excluded(&self, path: &Path) -> bool {
        path.ancestors()
            .skip(1)
            .take_while(|dir| *dir != self.dir.path.as_path())
            .any(|dir| contains_path(dir, &self.dir.exclude))
    }
}

impl CandidateSource for DirectorySource<'_> {
    fn describe(&self) -> String {
        format!("{} directory {}", self.label, self.dir.path.display())
    }

    fn lookup(&self, name: &str) -> Result<Option<Arc<NamedTemplate>>, TemplateError> {
        Ok(self.fragment(name)?.map(|set| set.root().clone()))
    }

    fn fragment(&self, name: &str) -> Result<Option<Arc<TemplateSet>>, TemplateError> {
        if let Some(cached) = self.memo.borrow().get(name) {
            return Ok(cached.clone());
        }
        let loaded = self.load(name)?;
        self.memo
            .borrow_mut()
            .insert(name.to_string(), loaded.clone());
        Ok(loaded)
    }
}
