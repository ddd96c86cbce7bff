//! Syntax tree types for template fragments

use std::sync::Arc;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// AST node with source location
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// A value an action prints or passes to an invoked template
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// The current data value: `.`
    Dot,
    /// Field chain relative to the current value: `.User.Name`
    Field(Vec<String>),
    String(String),
    Number(f64),
    Bool(bool),
}

/// Invocation of a named template: `template "name" .Arg`
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub name: Spanned<String>,
    /// Data passed to the invoked template; the current value when absent
    pub operand: Option<Operand>,
}

/// Discriminator for [`Node`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Text,
    Print,
    Template,
    Block,
}

/// A node in a template's root-level sequence
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text
    Text(String),
    /// Print an operand: `{{ .Name }}`
    Print(Operand),
    /// Invoke a template that must be supplied by association
    Template(Invocation),
    /// Invoke a template, falling back to the inline body
    Block {
        invocation: Invocation,
        body: Arc<Tree>,
    },
}

impl Node {
    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Text(_) => NodeKind::Text,
            Node::Print(_) => NodeKind::Print,
            Node::Template(_) => NodeKind::Template,
            Node::Block { .. } => NodeKind::Block,
        }
    }

    /// Name of the template this node invokes, if it is an invocation node
    pub fn invoked_name(&self) -> Option<&str> {
        match self {
            Node::Template(inv) | Node::Block { invocation: inv, .. } => {
                Some(inv.name.node.as_str())
            }
            _ => None,
        }
    }
}

/// Parsed body of one named template
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tree {
    pub nodes: Vec<Spanned<Node>>,
}

impl Tree {
    pub fn new(nodes: Vec<Spanned<Node>>) -> Self {
        Self { nodes }
    }

    /// True when the tree has no nodes other than whitespace text
    pub fn is_blank(&self) -> bool {
        self.nodes.iter().all(|n| match &n.node {
            Node::Text(s) => s.trim().is_empty(),
            _ => false,
        })
    }
}

/// `{{define "name"}} ... {{end}}` section of a fragment
#[derive(Debug, Clone, PartialEq)]
pub struct Definition {
    pub name: Spanned<String>,
    pub body: Tree,
}

/// A parsed fragment: its own body plus the templates it defines
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub root: Tree,
    pub definitions: Vec<Definition>,
}
