//! Dependency scanning: which templates does a tree invoke?

use std::sync::Arc;

use crate::parser::ast::{Node, Tree};

/// A template name invoked by a tree
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub name: String,
    /// Inline default body when the name is invoked through a `block`
    pub fallback: Option<Arc<Tree>>,
}

/// Collect the templates invoked by the root-level nodes of `tree`
///
/// Block bodies are not descended into; they are scanned separately if the
/// block's default ends up being used. Each name appears once, in order of
/// first invocation. If any invocation of a name is a block, the first such
/// block's body is kept as the fallback.
pub fn references(tree: &Tree) -> Vec<Reference> {
    let mut refs: Vec<Reference> = Vec::new();
    for spanned in &tree.nodes {
        let (name, fallback) = match &spanned.node {
            Node::Template(inv) => (inv.name.node.as_str(), None),
            Node::Block { invocation, body } => (invocation.name.node.as_str(), Some(body)),
            Node::Text(_) | Node::Print(_) => continue,
        };

        match refs.iter_mut().find(|r| r.name == name) {
            Some(existing) => {
                if existing.fallback.is_none() {
                    existing.fallback = fallback.cloned();
                }
            }
            None => refs.push(Reference {
                name: name.to_string(),
                fallback: fallback.cloned(),
            }),
        }
    }
    tracing::trace!(count = refs.len(), "scanned template references");
    refs
}

/// Names of the templates invoked by the root-level nodes of `tree`
pub fn required_names(tree: &Tree) -> Vec<String> {
    references(tree).into_iter().map(|r| r.name).collect()
}
