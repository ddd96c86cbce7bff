//! Preloaded pools of parsed fragments

use std::collections::HashMap;
use std::sync::Arc;

use crate::engine::TemplateEngine;
use crate::template::{CandidateSource, NamedTemplate, TemplateError, TemplateSet};

use super::fs::{template_name, walk_templates};
use super::TemplateDir;

/// Every fragment of one kind, parsed up front
///
/// Fragments are kept in load order. Each member of each fragment (its root and
/// its `define` sections) is also indexed by name so that it can satisfy a
/// reference on its own; the first fragment to define a name wins.
#[derive(Debug, Default)]
pub struct TemplatePool {
    label: String,
    dir: TemplateDir,
    fragments: Vec<Arc<TemplateSet>>,
    by_name: HashMap<String, usize>,
    members: HashMap<String, Arc<NamedTemplate>>,
}

impl TemplatePool {
    /// Create an empty pool
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }

    /// Walk `dir` and parse every template file in it
    pub fn load_dir(
        label: impl Into<String>,
        dir: &TemplateDir,
        engine: &TemplateEngine,
    ) -> Result<Self, TemplateError> {
        let mut pool = Self::new(label);
        pool.dir = dir.clone();

        for entry in walk_templates(&dir.path, &dir.exclude, dir.ext()) {
            let (relative, path) = entry?;
            let text = std::fs::read_to_string(&path).map_err(|source| TemplateError::Io {
                path: path.clone(),
                source,
            })?;
            pool.add(&template_name(&relative, dir.strip_ext), &text, engine)?;
        }

        tracing::info!(
            pool = %pool.label,
            dir = %dir.path.display(),
            fragments = pool.fragments.len(),
            templates = pool.members.len(),
            "preloaded templates"
        );
        Ok(pool)
    }

    /// Parse `text` and add it as the fragment `name`
    pub fn add(
        &mut self,
        name: &str,
        text: &str,
        engine: &TemplateEngine,
    ) -> Result<(), TemplateError> {
        let set = engine.parse_set(name, text)?;
        self.insert(Arc::new(set));
        Ok(())
    }

    /// Add an already parsed fragment
    ///
    /// Returns false if a fragment with the same name is already present.
    pub fn insert(&mut self, set: Arc<TemplateSet>) -> bool {
        let name = set.root_name().to_string();
        if self.by_name.contains_key(&name) {
            tracing::warn!(pool = %self.label, fragment = %name, "duplicate fragment ignored");
            return false;
        }

        for (member, tmpl) in set.members() {
            if tmpl.is_blank() || self.members.contains_key(member) {
                continue;
            }
            self.members.insert(member.to_string(), tmpl.clone());
        }
        self.by_name.insert(name, self.fragments.len());
        self.fragments.push(set);
        true
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Fragment names in load order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fragments.iter().map(|set| set.root_name())
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Get a fragment by name, with or without its extension
    pub fn get(&self, name: &str) -> Option<&Arc<TemplateSet>> {
        self.dir
            .candidate_names(name)
            .iter()
            .find_map(|candidate| self.by_name.get(candidate))
            .map(|&index| &self.fragments[index])
    }

    /// Get an individual template by name, with or without its extension
    pub fn template(&self, name: &str) -> Option<&Arc<NamedTemplate>> {
        self.dir
            .candidate_names(name)
            .iter()
            .find_map(|candidate| self.members.get(candidate))
    }
}

impl CandidateSource for TemplatePool {
    fn describe(&self) -> String {
        format!("{} pool", self.label)
    }

    fn lookup(&self, name: &str) -> Result<Option<Arc<NamedTemplate>>, TemplateError> {
        Ok(self.template(name).cloned())
    }

    fn fragment(&self, name: &str) -> Result<Option<Arc<TemplateSet>>, TemplateError> {
        Ok(self.get(name).cloned())
    }
}
