//! Composition of layouts, views and partials
//!
//! The [`Composer`] ties configuration, sources and the engine together: it
//! turns a request such as `base=site,profile` into a fully resolved
//! [`TemplateSet`] and executes it.

mod request;

use std::io::Write;
use std::sync::Arc;

use serde_json::Value;

use crate::config::{CacheMode, ComposerConfig, TemplateRole};
use crate::engine::TemplateEngine;
use crate::loader::{DirectorySource, TemplatePool};
use crate::template::{self, CandidateSource, Composition, TemplateError, TemplateSet};
use crate::ComposeError;

pub use request::{BaseSlot, CompositionRequest};

/// In-memory fragments, one pool per kind
#[derive(Debug)]
struct Pools {
    layouts: TemplatePool,
    views: TemplatePool,
    partials: TemplatePool,
}

impl Pools {
    fn empty() -> Self {
        Self {
            layouts: TemplatePool::new("layouts"),
            views: TemplatePool::new("views"),
            partials: TemplatePool::new("partials"),
        }
    }

    fn preload(config: &ComposerConfig, engine: &TemplateEngine) -> Result<Self, TemplateError> {
        Ok(Self {
            layouts: load_pool(config, TemplateRole::Layouts, engine)?,
            views: load_pool(config, TemplateRole::Views, engine)?,
            partials: load_pool(config, TemplateRole::Partials, engine)?,
        })
    }

    fn pool_mut(&mut self, role: TemplateRole) -> &mut TemplatePool {
        match role {
            TemplateRole::Layouts => &mut self.layouts,
            TemplateRole::Views => &mut self.views,
            TemplateRole::Partials => &mut self.partials,
        }
    }
}

fn load_pool(
    config: &ComposerConfig,
    role: TemplateRole,
    engine: &TemplateEngine,
) -> Result<TemplatePool, TemplateError> {
    let label = role_label(role);
    match config.template_dir(role) {
        Some(dir) => TemplatePool::load_dir(label, &dir, engine),
        None => Ok(TemplatePool::new(label)),
    }
}

fn role_label(role: TemplateRole) -> &'static str {
    match role {
        TemplateRole::Layouts => "layouts",
        TemplateRole::Views => "views",
        TemplateRole::Partials => "partials",
    }
}

/// Composes and executes templates from configured directories
///
/// With [`CacheMode::PreloadOnce`] every directory is parsed when the composer
/// is built and compositions only clone shared trees. With [`CacheMode::None`]
/// each composition reads the directories afresh. Fragments registered with
/// [`Composer::add`] are consulted in both modes, after the directories.
#[derive(Debug)]
pub struct Composer {
    config: ComposerConfig,
    engine: TemplateEngine,
    pools: Pools,
}

impl Composer {
    pub fn new(config: ComposerConfig) -> Result<Self, ComposeError> {
        let engine = TemplateEngine::new(config.engine_options()?);
        let pools = match config.cache_mode {
            CacheMode::PreloadOnce => Pools::preload(&config, &engine)?,
            CacheMode::None => Pools::empty(),
        };
        Ok(Self {
            config,
            engine,
            pools,
        })
    }

    pub fn config(&self) -> &ComposerConfig {
        &self.config
    }

    pub fn engine(&self) -> &TemplateEngine {
        &self.engine
    }

    /// Re-read every configured directory
    ///
    /// Fragments registered with [`Composer::add`] are dropped.
    pub fn reload(&mut self) -> Result<(), TemplateError> {
        self.pools = match self.config.cache_mode {
            CacheMode::PreloadOnce => Pools::preload(&self.config, &self.engine)?,
            CacheMode::None => Pools::empty(),
        };
        Ok(())
    }

    /// Register a fragment from source text
    pub fn add(&mut self, role: TemplateRole, name: &str, text: &str) -> Result<(), TemplateError> {
        self.pools.pool_mut(role).add(name, text, &self.engine)
    }

    pub fn add_layout(&mut self, name: &str, text: &str) -> Result<(), TemplateError> {
        self.add(TemplateRole::Layouts, name, text)
    }

    pub fn add_view(&mut self, name: &str, text: &str) -> Result<(), TemplateError> {
        self.add(TemplateRole::Views, name, text)
    }

    pub fn add_partial(&mut self, name: &str, text: &str) -> Result<(), TemplateError> {
        self.add(TemplateRole::Partials, name, text)
    }

    /// Parse a request string and compose it
    pub fn compose(&self, request: &str) -> Result<Composition, TemplateError> {
        self.compose_request(&CompositionRequest::parse(request)?)
    }

    pub fn compose_request(
        &self,
        request: &CompositionRequest,
    ) -> Result<Composition, TemplateError> {
        match self.config.cache_mode {
            CacheMode::PreloadOnce => self.compose_from(
                request,
                &[&self.pools.layouts],
                &[&self.pools.views, &self.pools.partials],
                &[&self.pools.partials],
            ),
            CacheMode::None => {
                let layouts = self.directory_source(TemplateRole::Layouts);
                let views = self.directory_source(TemplateRole::Views);
                let partials = load_pool(&self.config, TemplateRole::Partials, &self.engine)?;

                let mut layout_sources: Vec<&dyn CandidateSource> = Vec::new();
                let mut content_sources: Vec<&dyn CandidateSource> = Vec::new();
                if let Some(layouts) = &layouts {
                    layout_sources.push(layouts);
                }
                layout_sources.push(&self.pools.layouts);
                if let Some(views) = &views {
                    content_sources.push(views);
                }
                content_sources.push(&self.pools.views);
                content_sources.push(&partials);
                content_sources.push(&self.pools.partials);

                self.compose_from(
                    request,
                    &layout_sources,
                    &content_sources,
                    &[&partials, &self.pools.partials],
                )
            }
        }
    }

    fn directory_source(&self, role: TemplateRole) -> Option<DirectorySource<'_>> {
        self.config
            .template_dir(role)
            .map(|dir| DirectorySource::new(role_label(role), dir, &self.engine))
    }

    fn compose_from(
        &self,
        request: &CompositionRequest,
        layouts: &[&dyn CandidateSource],
        contents: &[&dyn CandidateSource],
        partials: &[&dyn CandidateSource],
    ) -> Result<Composition, TemplateError> {
        let mut content_sets = Vec::with_capacity(request.contents.len());
        for token in &request.contents {
            let set = find_fragment(contents, token)?.ok_or_else(|| TemplateError::missing(token))?;
            content_sets.push(alias_root(set, token));
        }

        let base = match request.base_name(self.config.default_layout.as_deref()) {
            Some(name) => {
                let layout =
                    find_fragment(layouts, name)?.ok_or_else(|| TemplateError::missing(name))?;
                TemplateSet::clone(&layout)
            }
            None => match content_sets.first() {
                Some(first) => TemplateSet::clone(first),
                None => {
                    return Err(TemplateError::invalid_request(
                        request.to_string(),
                        "no layout and no content to use as the root",
                    ))
                }
            },
        };

        tracing::debug!(
            root = base.root_name(),
            contents = content_sets.len(),
            "composing request"
        );
        template::compose(base, &content_sets, partials)
    }

    /// Compose a request and render it to a string
    pub fn render(&self, request: &str, data: &Value) -> Result<String, ComposeError> {
        let composition = self.compose(request)?;
        Ok(self.engine.render(&composition.set, data)?)
    }

    /// Compose a request and execute it into `writer`
    ///
    /// Nothing is written unless composition and execution both succeed.
    pub fn execute(
        &self,
        writer: &mut dyn Write,
        request: &str,
        data: &Value,
    ) -> Result<(), ComposeError> {
        let composition = self.compose(request)?;
        self.engine.execute(&composition.set, data, writer)?;
        Ok(())
    }
}

fn find_fragment(
    sources: &[&dyn CandidateSource],
    name: &str,
) -> Result<Option<Arc<TemplateSet>>, TemplateError> {
    for source in sources {
        if let Some(found) = source.fragment(name)? {
            tracing::debug!(fragment = name, source = %source.describe(), "found fragment");
            return Ok(Some(found));
        }
    }
    Ok(None)
}

/// Make a content fragment reachable under the name it was requested by
///
/// A file found as `profile.tmpl` for the request `profile` is rooted at
/// `profile.tmpl`, but layouts invoke it as `profile`. A blank root cannot be
/// a member, so it is left unaliased; its definitions still associate.
fn alias_root(set: Arc<TemplateSet>, token: &str) -> Arc<TemplateSet> {
    if set.contains(token) {
        return set;
    }
    if set.root().is_blank() {
        tracing::warn!(
            fragment = set.root_name(),
            request = token,
            "fragment body is blank; not reachable under the requested name"
        );
        return set;
    }
    let mut aliased = TemplateSet::clone(&set);
    let root = aliased.root().clone();
    aliased.insert(token, root);
    Arc::new(aliased)
}
