//! Named templates and the sets that hold them

use std::collections::HashMap;
use std::sync::Arc;

use crate::parser::ast::{Document, Tree};

use super::error::TemplateError;

/// A single parsed fragment: a name and its immutable tree
#[derive(Debug, Clone, PartialEq)]
pub struct NamedTemplate {
    name: String,
    tree: Arc<Tree>,
}

impl NamedTemplate {
    pub fn new(name: impl Into<String>, tree: impl Into<Arc<Tree>>) -> Self {
        Self {
            name: name.into(),
            tree: tree.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tree(&self) -> &Arc<Tree> {
        &self.tree
    }

    pub fn is_blank(&self) -> bool {
        self.tree.is_blank()
    }
}

/// One logical template: a root plus every sub-template associated with it
///
/// Members are kept in insertion order and shared by `Arc`, so cloning a set
/// or grafting a member into another set never copies a tree. Sets only grow.
#[derive(Debug, Clone)]
pub struct TemplateSet {
    root: String,
    order: Vec<String>,
    members: HashMap<String, Arc<NamedTemplate>>,
}

impl TemplateSet {
    /// Create a set holding only its root
    pub fn new(root: NamedTemplate) -> Self {
        let name = root.name().to_string();
        Self {
            root: name.clone(),
            order: vec![name.clone()],
            members: HashMap::from([(name, Arc::new(root))]),
        }
    }

    /// Build a set from a parsed fragment: the fragment body becomes the root and
    /// each `define` section becomes a member
    ///
    /// Blank definitions are dropped. A definition named after the fragment
    /// replaces a blank root.
    pub fn from_document(name: &str, doc: Document) -> Result<Self, TemplateError> {
        let mut root_tree = doc.root;
        let mut defined: Vec<NamedTemplate> = Vec::new();

        for def in doc.definitions {
            if def.body.is_blank() {
                continue;
            }
            let def_name = def.name.node;
            if def_name == name {
                if !root_tree.is_blank() {
                    return Err(TemplateError::Duplicate {
                        name: def_name,
                        fragment: name.to_string(),
                    });
                }
                root_tree = def.body;
                continue;
            }
            if defined.iter().any(|t| t.name() == def_name) {
                return Err(TemplateError::Duplicate {
                    name: def_name,
                    fragment: name.to_string(),
                });
            }
            defined.push(NamedTemplate::new(def_name, def.body));
        }

        let mut set = Self::new(NamedTemplate::new(name, root_tree));
        for tmpl in defined {
            let key = tmpl.name().to_string();
            set.insert(&key, Arc::new(tmpl));
        }
        Ok(set)
    }

    pub fn root(&self) -> &Arc<NamedTemplate> {
        &self.members[&self.root]
    }

    pub fn root_name(&self) -> &str {
        &self.root
    }

    /// Get a member by name
    pub fn get(&self, name: &str) -> Option<&Arc<NamedTemplate>> {
        self.members.get(name)
    }

    /// Check if a member exists
    pub fn contains(&self, name: &str) -> bool {
        self.members.contains_key(name)
    }

    /// Graft a template under `name`
    ///
    /// Returns false, leaving the set unchanged, when the name is already taken
    /// (first writer wins) or the template is blank.
    pub fn insert(&mut self, name: &str, template: Arc<NamedTemplate>) -> bool {
        if self.members.contains_key(name) || template.is_blank() {
            return false;
        }
        self.order.push(name.to_string());
        self.members.insert(name.to_string(), template);
        true
    }

    /// Member names in insertion order, root first
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Members in insertion order as `(name, template)` pairs
    pub fn members(&self) -> impl Iterator<Item = (&str, &Arc<NamedTemplate>)> {
        self.order
            .iter()
            .map(|name| (name.as_str(), &self.members[name]))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Always false: a set holds at least its root
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse, Delimiters};

    fn doc(source: &str) -> Document {
        parse(source, &Delimiters::default()).expect("Should parse")
    }

    #[test]
    fn test_new_set_holds_root() {
        let set = TemplateSet::new(NamedTemplate::new("layout", Tree::default()));
        assert_eq!(set.root_name(), "layout");
        assert!(set.contains("layout"));
        assert_eq!(set.len(), 1);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_from_document_collects_definitions() {
        let set = TemplateSet::from_document(
            "page",
            doc(r#"body{{define "a"}}A{{end}}{{define "b"}}B{{end}}"#),
        )
        .expect("Should build");
        assert_eq!(set.names().collect::<Vec<_>>(), vec!["page", "a", "b"]);
    }

    #[test]
    fn test_blank_definitions_dropped() {
        let set = TemplateSet::from_document("page", doc(r#"x{{define "empty"}}  {{end}}"#))
            .expect("Should build");
        assert!(!set.contains("empty"));
    }

    #[test]
    fn test_definition_replaces_blank_root() {
        let set = TemplateSet::from_document("page", doc(r#"{{define "page"}}P{{end}}"#))
            .expect("Should build");
        assert_eq!(set.len(), 1);
        assert!(!set.root().is_blank());
    }

    #[test]
    fn test_duplicate_definition_error() {
        let result =
            TemplateSet::from_document("page", doc(r#"{{define "a"}}1{{end}}{{define "a"}}2{{end}}"#));
        assert!(matches!(result, Err(TemplateError::Duplicate { name, .. }) if name == "a"));

        let result = TemplateSet::from_document("page", doc(r#"root{{define "page"}}P{{end}}"#));
        assert!(matches!(result, Err(TemplateError::Duplicate { .. })));
    }

    #[test]
    fn test_insert_first_writer_wins() {
        let mut set = TemplateSet::new(NamedTemplate::new("root", Tree::default()));
        let first = Arc::new(NamedTemplate::new("x", doc("first").root));
        let second = Arc::new(NamedTemplate::new("x", doc("second").root));

        assert!(set.insert("x", first.clone()));
        assert!(!set.insert("x", second));
        assert!(Arc::ptr_eq(set.get("x").unwrap(), &first));
    }

    #[test]
    fn test_insert_rejects_blank() {
        let mut set = TemplateSet::new(NamedTemplate::new("root", Tree::default()));
        let blank = Arc::new(NamedTemplate::new("x", doc(" \n ").root));
        assert!(!set.insert("x", blank));
        assert!(!set.contains("x"));
    }

    #[test]
    fn test_clone_shares_trees() {
        let set = TemplateSet::from_document("page", doc("hello")).expect("Should build");
        let copy = set.clone();
        assert!(Arc::ptr_eq(set.root(), copy.root()));
    }
}
