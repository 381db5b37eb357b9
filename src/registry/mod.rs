//! Registry for storing and resolving named artifacts
//!
//! Every engine, the host application included, owns exactly one registry.
//! Lookups are local: a template, route or controller registered inside an
//! engine is invisible to its host and vice versa, even under the same name.
//! The optional fallback is only consulted for kinds explicitly whitelisted
//! when the registry is constructed, and structural kinds can never be.

mod artifact;

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

use crate::controller::ControllerDefinition;
use crate::engine::EngineDefinition;
use crate::route::RouteDefinition;
use crate::template::Template;

pub use artifact::{Artifact, ComponentDefinition, HelperDefinition};

/// Errors that can occur during registry operations
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    /// Nothing registered under the key
    #[error("{key} is not registered in '{owner}'")]
    NotFound { owner: String, key: Key },

    /// A registry key that could not be parsed
    #[error("invalid registry key '{key}'")]
    InvalidKey { key: String },

    /// Structural kinds must always resolve locally
    #[error("kind '{kind}' cannot fall back to a parent registry")]
    FallbackNotAllowed { kind: Kind },
}

/// The closed set of artifact kinds a registry can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Template,
    Route,
    Controller,
    Component,
    Helper,
    Engine,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Template => "template",
            Kind::Route => "route",
            Kind::Controller => "controller",
            Kind::Component => "component",
            Kind::Helper => "helper",
            Kind::Engine => "engine",
        }
    }

    /// Kinds tied to route ownership; these never resolve through a fallback
    pub fn is_structural(&self) -> bool {
        matches!(self, Kind::Template | Kind::Route | Kind::Controller)
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "template" => Ok(Kind::Template),
            "route" => Ok(Kind::Route),
            "controller" => Ok(Kind::Controller),
            "component" => Ok(Kind::Component),
            "helper" => Ok(Kind::Helper),
            "engine" => Ok(Kind::Engine),
            other => Err(RegistryError::InvalidKey {
                key: other.to_string(),
            }),
        }
    }
}

/// A `(kind, name)` pair, displayed as `kind:name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Key {
    pub kind: Kind,
    pub name: String,
}

impl Key {
    pub fn new(kind: Kind, name: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.name)
    }
}

impl FromStr for Key {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || RegistryError::InvalidKey { key: s.to_string() };
        let (kind, name) = s.split_once(':').ok_or_else(invalid)?;
        if name.is_empty() {
            return Err(invalid());
        }
        let kind = kind.parse().map_err(|_| invalid())?;
        Ok(Key::new(kind, name))
    }
}

/// Registry of artifacts owned by one engine
#[derive(Debug, Default)]
pub struct Registry {
    owner: String,
    entries: HashMap<Key, Artifact>,
    fallback: Option<Rc<Registry>>,
    fallback_kinds: BTreeSet<Kind>,
}

impl Registry {
    /// Create a new empty registry for the named owner
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// Attach a fallback registry consulted only for the given kinds
    pub fn with_fallback(
        mut self,
        fallback: Rc<Registry>,
        kinds: impl IntoIterator<Item = Kind>,
    ) -> Result<Self, RegistryError> {
        let kinds: BTreeSet<Kind> = kinds.into_iter().collect();
        if let Some(kind) = kinds.iter().find(|k| k.is_structural()) {
            return Err(RegistryError::FallbackNotAllowed { kind: *kind });
        }
        self.fallback = Some(fallback);
        self.fallback_kinds = kinds;
        Ok(self)
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Register an artifact; its type determines the kind
    ///
    /// Registering an existing key replaces the previous artifact.
    pub fn register(&mut self, name: impl Into<String>, artifact: impl Into<Artifact>) -> &mut Self {
        let artifact = artifact.into();
        let key = Key::new(artifact.kind(), name);
        if self.entries.contains_key(&key) {
            tracing::debug!(owner = %self.owner, %key, "replacing registration");
        }
        self.entries.insert(key, artifact);
        self
    }

    /// Copy an artifact registered in another registry under the same key
    pub fn copy_from(&mut self, source: &Registry, key: &Key) -> Result<(), RegistryError> {
        let artifact = source.require(key.kind, &key.name)?.clone();
        self.entries.insert(key.clone(), artifact);
        Ok(())
    }

    /// Check for a local registration, ignoring any fallback
    pub fn has(&self, kind: Kind, name: &str) -> bool {
        self.entries.contains_key(&Key::new(kind, name))
    }

    /// Resolve an artifact: local first, then the fallback for whitelisted kinds
    pub fn lookup(&self, kind: Kind, name: &str) -> Option<&Artifact> {
        let key = Key::new(kind, name);
        match self.entries.get(&key) {
            Some(artifact) => Some(artifact),
            None if self.fallback_kinds.contains(&kind) => self
                .fallback
                .as_deref()
                .and_then(|fallback| fallback.lookup(kind, name)),
            None => None,
        }
    }

    /// Resolve an artifact that must exist
    pub fn require(&self, kind: Kind, name: &str) -> Result<&Artifact, RegistryError> {
        self.lookup(kind, name).ok_or_else(|| RegistryError::NotFound {
            owner: self.owner.clone(),
            key: Key::new(kind, name),
        })
    }

    pub fn template(&self, name: &str) -> Option<Rc<Template>> {
        match self.lookup(Kind::Template, name) {
            Some(Artifact::Template(template)) => Some(template.clone()),
            _ => None,
        }
    }

    pub fn route(&self, name: &str) -> Option<&RouteDefinition> {
        match self.lookup(Kind::Route, name) {
            Some(Artifact::Route(route)) => Some(route),
            _ => None,
        }
    }

    pub fn controller(&self, name: &str) -> Option<&ControllerDefinition> {
        match self.lookup(Kind::Controller, name) {
            Some(Artifact::Controller(controller)) => Some(controller),
            _ => None,
        }
    }

    pub fn component(&self, name: &str) -> Option<&ComponentDefinition> {
        match self.lookup(Kind::Component, name) {
            Some(Artifact::Component(component)) => Some(component),
            _ => None,
        }
    }

    pub fn helper(&self, name: &str) -> Option<&HelperDefinition> {
        match self.lookup(Kind::Helper, name) {
            Some(Artifact::Helper(helper)) => Some(helper),
            _ => None,
        }
    }

    pub fn engine(&self, name: &str) -> Result<&EngineDefinition, RegistryError> {
        match self.require(Kind::Engine, name)? {
            Artifact::Engine(engine) => Ok(engine),
            _ => Err(RegistryError::NotFound {
                owner: self.owner.clone(),
                key: Key::new(Kind::Engine, name),
            }),
        }
    }

    /// Layout registered for a component as `template:components/<name>`
    pub fn component_layout(&self, name: &str) -> Option<Rc<Template>> {
        self.template(&format!("components/{}", name))
    }
}
