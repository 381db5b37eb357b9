//! Compiled template representation

use std::fmt;

use crate::value::Value;

/// A compiled template
///
/// Templates are immutable once compiled and are shared by reference
/// (`Rc<Template>`); the same value may be registered in several registries.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub nodes: Vec<Node>,
}

impl Template {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    /// The template used for routes that register none: a bare `{{outlet}}`
    pub fn outlet_only() -> Self {
        Self::new(vec![Node::Mustache(Mustache::Outlet)])
    }

    /// Bare references whose meaning depends on the rendering registry
    ///
    /// These are the single-segment, argument-free invocations containing a
    /// dash: they may denote a helper, a component or a property.
    pub fn ambiguous_references(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Mustache(Mustache::Invoke(invocation)) if invocation.is_ambiguous() => {
                    Some(invocation.path.head())
                }
                _ => None,
            })
            .collect()
    }

    /// Names of partials referenced with a literal name
    pub fn partials(&self) -> Vec<&str> {
        self.nodes
            .iter()
            .filter_map(|node| match node {
                Node::Mustache(Mustache::Partial(Expr::Literal(Value::String(name)))) => {
                    Some(name.as_str())
                }
                _ => None,
            })
            .collect()
    }
}

/// One top-level piece of a template
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Mustache(Mustache),
}

/// The contents of a `{{ ... }}`
#[derive(Debug, Clone, PartialEq)]
pub enum Mustache {
    /// `{{outlet}}`: the slot for the next level of the outlet tree
    Outlet,
    /// `{{partial "name"}}`
    Partial(Expr),
    /// `{{mount "engine-name"}}`
    Mount(String),
    /// A property lookup, helper call or component invocation
    Invoke(Invocation),
}

/// A path with optional positional and named arguments
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub path: Path,
    pub params: Vec<Expr>,
    pub hash: Vec<(String, Expr)>,
}

impl Invocation {
    pub fn has_arguments(&self) -> bool {
        !self.params.is_empty() || !self.hash.is_empty()
    }

    /// Whether the rendering registry decides what this invocation means
    pub fn is_ambiguous(&self) -> bool {
        !self.has_arguments() && self.path.is_dashed_name()
    }
}

/// An argument expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Path(Path),
    Literal(Value),
}

/// A dotted property path such as `model.message`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub segments: Vec<String>,
}

impl Path {
    pub fn parse(source: &str) -> Self {
        Self {
            segments: source.split('.').map(str::to_string).collect(),
        }
    }

    pub fn head(&self) -> &str {
        self.segments.first().map(String::as_str).unwrap_or("")
    }

    /// Segments after an explicit leading `this`
    pub fn property_segments(&self) -> &[String] {
        match self.segments.split_first() {
            Some((first, rest)) if first == "this" => rest,
            _ => &self.segments,
        }
    }

    /// A single segment containing a dash, the shape of helper and component names
    pub fn is_dashed_name(&self) -> bool {
        self.segments.len() == 1 && self.segments[0].contains('-')
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}
