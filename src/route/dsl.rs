//! Route map DSL
//!
//! ```
//! use engine_router::RouteMap;
//!
//! let map = RouteMap::build(|map| {
//!     map.route_with("post", |post| {
//!         post.route("comments");
//!         post.route("likes");
//!     });
//!     map.mount("chat");
//! });
//! assert_eq!(map.entries().len(), 2);
//! ```

/// One declaration in a route map
#[derive(Debug, Clone, PartialEq)]
pub enum RouteEntry {
    /// A child route, optionally with nested children
    Route {
        name: String,
        path: Option<String>,
        children: RouteMap,
    },
    /// A mount point for a named engine
    Mount {
        engine: String,
        alias: Option<String>,
        path: Option<String>,
    },
}

/// A declarative route map
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RouteMap {
    entries: Vec<RouteEntry>,
}

impl RouteMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map with a closure
    pub fn build(f: impl FnOnce(&mut RouteMap)) -> Self {
        let mut map = Self::new();
        f(&mut map);
        map
    }

    /// Add a leaf route; its URL segment is its name
    pub fn route(&mut self, name: impl Into<String>) -> &mut Self {
        self.entries.push(RouteEntry::Route {
            name: name.into(),
            path: None,
            children: RouteMap::new(),
        });
        self
    }

    /// Add a route with nested children
    pub fn route_with(&mut self, name: impl Into<String>, f: impl FnOnce(&mut RouteMap)) -> &mut Self {
        self.entries.push(RouteEntry::Route {
            name: name.into(),
            path: None,
            children: RouteMap::build(f),
        });
        self
    }

    /// Add a route with an explicit path such as `/post/:post_id`
    pub fn route_at(
        &mut self,
        name: impl Into<String>,
        path: impl Into<String>,
        f: impl FnOnce(&mut RouteMap),
    ) -> &mut Self {
        self.entries.push(RouteEntry::Route {
            name: name.into(),
            path: Some(path.into()),
            children: RouteMap::build(f),
        });
        self
    }

    /// Splice the named engine's route tree at this point
    pub fn mount(&mut self, engine: impl Into<String>) -> &mut Self {
        self.entries.push(RouteEntry::Mount {
            engine: engine.into(),
            alias: None,
            path: None,
        });
        self
    }

    /// Mount an engine under a different route name and path
    pub fn mount_as(
        &mut self,
        engine: impl Into<String>,
        alias: impl Into<String>,
        path: Option<String>,
    ) -> &mut Self {
        self.entries.push(RouteEntry::Mount {
            engine: engine.into(),
            alias: Some(alias.into()),
            path,
        });
        self
    }

    pub fn entries(&self) -> &[RouteEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
