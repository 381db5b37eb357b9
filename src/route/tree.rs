//! The combined route tree and URL recognition

use std::collections::{BTreeMap, HashMap};

use crate::engine::EngineId;

/// Dynamic segment values keyed by segment name
pub type Params = BTreeMap<String, String>;

/// Index of a node in the route tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// One piece of a route's path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Static(String),
    Dynamic(String),
}

fn parse_segments(path: &str) -> Vec<Segment> {
    path.split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix(':') {
            Some(name) => Segment::Dynamic(name.to_string()),
            None => Segment::Static(s.to_string()),
        })
        .collect()
}

/// One node of the logical route tree
#[derive(Debug, Clone)]
pub struct RouteNode {
    pub id: NodeId,
    /// Qualified dotted name, unique across the whole tree
    pub name: String,
    /// Name inside the owning engine; `application` for engine roots
    pub local_name: String,
    pub segments: Vec<Segment>,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    pub owner: EngineId,
}

impl RouteNode {
    /// The root of an engine's route tree, or of the application itself
    pub fn is_engine_root(&self) -> bool {
        self.local_name == "application"
    }
}

/// A node of a recognized handler chain with its dynamic segment values
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerInfo {
    pub node: NodeId,
    pub params: Params,
}

/// The route tree spanning the application and all mounted engines
#[derive(Debug, Clone)]
pub struct RouteTree {
    nodes: Vec<RouteNode>,
    by_name: HashMap<String, NodeId>,
}

impl RouteTree {
    /// A tree with only the application root
    pub fn new(owner: EngineId) -> Self {
        let root = RouteNode {
            id: NodeId(0),
            name: "application".to_string(),
            local_name: "application".to_string(),
            segments: vec![],
            parent: None,
            children: vec![],
            owner,
        };
        let mut by_name = HashMap::new();
        by_name.insert(root.name.clone(), root.id);
        Self {
            nodes: vec![root],
            by_name,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn node(&self, id: NodeId) -> &RouteNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(name).copied()
    }

    /// Add a child route owned by the parent's engine
    pub fn add_route(&mut self, parent: NodeId, name: &str, path: Option<&str>) -> NodeId {
        let owner = self.node(parent).owner;
        let parent_node = self.node(parent);
        let local_name = if parent_node.is_engine_root() {
            name.to_string()
        } else {
            format!("{}.{}", parent_node.local_name, name)
        };
        self.insert(parent, name, local_name, path, owner)
    }

    /// Add the root node of an engine mounted under `parent`
    pub fn add_mount(&mut self, parent: NodeId, name: &str, path: Option<&str>, owner: EngineId) -> NodeId {
        self.insert(parent, name, "application".to_string(), path, owner)
    }

    fn insert(
        &mut self,
        parent: NodeId,
        name: &str,
        local_name: String,
        path: Option<&str>,
        owner: EngineId,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let qualified = self.child_name(parent, name);
        let node = RouteNode {
            id,
            name: qualified.clone(),
            local_name,
            segments: parse_segments(path.unwrap_or(name)),
            parent: Some(parent),
            children: vec![],
            owner,
        };
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);
        self.by_name.insert(qualified, id);
        id
    }

    /// Qualified name a child called `name` would get under `parent`
    pub fn child_name(&self, parent: NodeId, name: &str) -> String {
        if parent == self.root() {
            name.to_string()
        } else {
            format!("{}.{}", self.node(parent).name, name)
        }
    }

    /// Node ids from the root down to `id`
    pub fn lineage(&self, id: NodeId) -> Vec<NodeId> {
        let mut chain = vec![id];
        let mut current = self.node(id).parent;
        while let Some(parent) = current {
            chain.push(parent);
            current = self.node(parent).parent;
        }
        chain.reverse();
        chain
    }

    /// Map a URL path to the handler chain of the first route consuming it fully
    pub fn recognize(&self, path: &str) -> Option<Vec<HandlerInfo>> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let mut chain = vec![HandlerInfo {
            node: self.root(),
            params: Params::new(),
        }];
        if self.descend(self.root(), &segments, &mut chain) {
            Some(chain)
        } else {
            None
        }
    }

    fn descend(&self, id: NodeId, remaining: &[&str], chain: &mut Vec<HandlerInfo>) -> bool {
        if remaining.is_empty() {
            return true;
        }
        for child in &self.node(id).children {
            let node = self.node(*child);
            let Some((params, rest)) = match_segments(&node.segments, remaining) else {
                continue;
            };
            chain.push(HandlerInfo {
                node: *child,
                params,
            });
            if self.descend(*child, rest, chain) {
                return true;
            }
            chain.pop();
        }
        false
    }

    /// Build the URL path for `id`, filling dynamic segments from `params`
    pub fn generate(&self, id: NodeId, params: &Params) -> Result<String, String> {
        let mut path = String::new();
        for node in self.lineage(id) {
            for segment in &self.node(node).segments {
                path.push('/');
                match segment {
                    Segment::Static(s) => path.push_str(s),
                    Segment::Dynamic(name) => match params.get(name) {
                        Some(value) => path.push_str(value),
                        None => return Err(name.clone()),
                    },
                }
            }
        }
        if path.is_empty() {
            path.push('/');
        }
        Ok(path)
    }
}

fn match_segments<'a, 'b>(segments: &[Segment], remaining: &'b [&'a str]) -> Option<(Params, &'b [&'a str])> {
    if segments.len() > remaining.len() {
        return None;
    }
    let mut params = Params::new();
    for (segment, actual) in segments.iter().zip(remaining) {
        match segment {
            Segment::Static(expected) if expected == actual => {}
            Segment::Static(_) => return None,
            Segment::Dynamic(name) => {
                params.insert(name.clone(), actual.to_string());
            }
        }
    }
    Some((params, &remaining[segments.len()..]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_tree() -> RouteTree {
        let mut tree = RouteTree::new(EngineId(0));
        let blog = tree.add_mount(tree.root(), "blog", None, EngineId(1));
        let post = tree.add_route(blog, "post", Some("/post/:post_id"));
        tree.add_route(post, "comments", None);
        tree
    }

    #[test]
    fn test_qualified_and_local_names() {
        let tree = blog_tree();
        let comments = tree.node(tree.find("blog.post.comments").expect("Should exist"));
        assert_eq!(comments.local_name, "post.comments");
        assert_eq!(comments.owner, EngineId(1));

        let blog = tree.node(tree.find("blog").expect("Should exist"));
        assert!(blog.is_engine_root());
        assert_eq!(blog.local_name, "application");
    }

    #[test]
    fn test_recognize_nested_url() {
        let tree = blog_tree();
        let chain = tree.recognize("/blog/post/7/comments").expect("Should match");
        let names: Vec<&str> = chain.iter().map(|h| tree.node(h.node).name.as_str()).collect();
        assert_eq!(names, vec!["application", "blog", "blog.post", "blog.post.comments"]);
        assert_eq!(chain[2].params.get("post_id").map(String::as_str), Some("7"));
    }

    #[test]
    fn test_recognize_root_and_unknown() {
        let tree = blog_tree();
        assert_eq!(tree.recognize("/").map(|c| c.len()), Some(1));
        assert!(tree.recognize("/nope").is_none());
    }

    #[test]
    fn test_generate_requires_params() {
        let tree = blog_tree();
        let comments = tree.find("blog.post.comments").unwrap();
        assert_eq!(tree.generate(comments, &Params::new()), Err("post_id".to_string()));

        let mut params = Params::new();
        params.insert("post_id".to_string(), "7".to_string());
        assert_eq!(tree.generate(comments, &params).as_deref(), Ok("/blog/post/7/comments"));
        assert_eq!(tree.generate(tree.root(), &params).as_deref(), Ok("/"));
    }
}
