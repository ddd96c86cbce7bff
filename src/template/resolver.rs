//! Template association and resolution
//!
//! Association grafts templates from a content set into a target set by
//! reference. Resolution repeats scan → lookup → graft against an ordered list
//! of candidate sources until no new names are needed.

use std::collections::HashSet;
use std::sync::Arc;

use crate::parser::ast::Tree;

use super::error::TemplateError;
use super::scanner;
use super::set::TemplateSet;
use super::source::{lookup_first, CandidateSource};

/// What a resolution run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    /// Scan passes performed
    pub passes: usize,
    /// Names grafted from content sets by direct association
    pub associated: Vec<String>,
    /// Names grafted from candidate sources, in order
    pub resolved: Vec<String>,
    /// Block names that fell back to their inline default
    pub defaulted: Vec<String>,
}

/// A composed set together with how it was resolved
#[derive(Debug, Clone)]
pub struct Composition {
    pub set: TemplateSet,
    pub resolution: Resolution,
}

/// Graft every template the target's root invokes that `content` defines
///
/// Names already in the target are left alone and names missing from `content`
/// are skipped, so calling this twice changes nothing the second time. Returns
/// the grafted names.
pub fn associate(target: &mut TemplateSet, content: &TemplateSet) -> Vec<String> {
    let mut grafted = Vec::new();
    for name in scanner::required_names(target.root().tree()) {
        if target.contains(&name) {
            continue;
        }
        if let Some(found) = content.get(&name) {
            if target.insert(&name, found.clone()) {
                tracing::debug!(
                    template = %name,
                    into = target.root_name(),
                    content = content.root_name(),
                    "associated template"
                );
                grafted.push(name);
            }
        }
    }
    grafted
}

/// Resolve every name reachable from the target's root
///
/// The first pass scans the root; later passes scan only the trees the previous
/// pass reached, and each tree is scanned once. Members the root never reaches
/// are left unscanned. Each missing name is taken from the first source that
/// has it. A block whose name no source supplies keeps its own inline default,
/// which is scanned in turn but never becomes a member. Any other missing name
/// is an error.
pub fn resolve_all(
    target: &mut TemplateSet,
    sources: &[&dyn CandidateSource],
) -> Result<Resolution, TemplateError> {
    let mut resolution = Resolution::default();
    let root = target.root();
    let mut queued: HashSet<*const Tree> = HashSet::from([Arc::as_ptr(root.tree())]);
    let mut frontier: Vec<(String, Arc<Tree>)> =
        vec![(target.root_name().to_string(), root.tree().clone())];

    // Every pass scans at least one tree queued for the first time, so the
    // queue size bounds the number of passes even for cyclic references.
    while !frontier.is_empty() && resolution.passes < queued.len() {
        resolution.passes += 1;
        let mut next = Vec::new();

        for (invoker, tree) in frontier {
            for reference in scanner::references(&tree) {
                let name = reference.name;
                let reached = match target.get(&name) {
                    Some(member) => member.tree().clone(),
                    None => match lookup_first(sources, &name)? {
                        Some((found, source)) => {
                            target.insert(&name, found.clone());
                            tracing::debug!(
                                template = %name,
                                required_by = %invoker,
                                %source,
                                "resolved template"
                            );
                            resolution.resolved.push(name.clone());
                            found.tree().clone()
                        }
                        None => match reference.fallback {
                            Some(body) => {
                                tracing::debug!(template = %name, "using block default");
                                if !resolution.defaulted.contains(&name) {
                                    resolution.defaulted.push(name.clone());
                                }
                                body
                            }
                            None => {
                                return Err(TemplateError::Missing {
                                    name,
                                    referenced_by: Some(invoker),
                                })
                            }
                        },
                    },
                };
                if queued.insert(Arc::as_ptr(&reached)) {
                    next.push((name, reached));
                }
            }
        }

        frontier = next;
    }

    Ok(resolution)
}

/// Compose a base set with content sets and partial sources
///
/// Contents are associated first, in order, so they outrank partials. The
/// remaining names are then resolved against the contents followed by the
/// partial sources.
pub fn compose(
    mut base: TemplateSet,
    contents: &[Arc<TemplateSet>],
    partials: &[&dyn CandidateSource],
) -> Result<Composition, TemplateError> {
    let mut associated = Vec::new();
    for content in contents {
        associated.extend(associate(&mut base, content));
    }

    let mut sources: Vec<&dyn CandidateSource> = contents
        .iter()
        .map(|c| c.as_ref() as &dyn CandidateSource)
        .collect();
    sources.extend(partials.iter().copied());

    let mut resolution = resolve_all(&mut base, &sources)?;
    resolution.associated = associated;
    tracing::debug!(
        root = base.root_name(),
        members = base.len(),
        passes = resolution.passes,
        "composed template set"
    );

    Ok(Composition {
        set: base,
        resolution,
    })
}
