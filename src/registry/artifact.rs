//! Artifacts held by a registry

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use super::Kind;
use crate::controller::ControllerDefinition;
use crate::engine::EngineDefinition;
use crate::route::RouteDefinition;
use crate::template::Template;
use crate::value::Value;

/// A registered artifact; the variant fixes its [`Kind`]
#[derive(Debug, Clone)]
pub enum Artifact {
    Template(Rc<Template>),
    Route(RouteDefinition),
    Controller(ControllerDefinition),
    Component(ComponentDefinition),
    Helper(HelperDefinition),
    Engine(EngineDefinition),
}

impl Artifact {
    pub fn kind(&self) -> Kind {
        match self {
            Artifact::Template(_) => Kind::Template,
            Artifact::Route(_) => Kind::Route,
            Artifact::Controller(_) => Kind::Controller,
            Artifact::Component(_) => Kind::Component,
            Artifact::Helper(_) => Kind::Helper,
            Artifact::Engine(_) => Kind::Engine,
        }
    }
}

impl From<Template> for Artifact {
    fn from(template: Template) -> Self {
        Artifact::Template(Rc::new(template))
    }
}

impl From<Rc<Template>> for Artifact {
    fn from(template: Rc<Template>) -> Self {
        Artifact::Template(template)
    }
}

impl From<RouteDefinition> for Artifact {
    fn from(route: RouteDefinition) -> Self {
        Artifact::Route(route)
    }
}

impl From<ControllerDefinition> for Artifact {
    fn from(controller: ControllerDefinition) -> Self {
        Artifact::Controller(controller)
    }
}

impl From<ComponentDefinition> for Artifact {
    fn from(component: ComponentDefinition) -> Self {
        Artifact::Component(component)
    }
}

impl From<HelperDefinition> for Artifact {
    fn from(helper: HelperDefinition) -> Self {
        Artifact::Helper(helper)
    }
}

impl From<EngineDefinition> for Artifact {
    fn from(engine: EngineDefinition) -> Self {
        Artifact::Engine(engine)
    }
}

/// A component: default properties plus an optional layout
///
/// Without a layout, the component renders `template:components/<name>`
/// from the registry that resolved the invocation.
#[derive(Debug, Clone, Default)]
pub struct ComponentDefinition {
    pub properties: BTreeMap<String, Value>,
    pub layout: Option<Rc<Template>>,
}

impl ComponentDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn property(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// Use a compiled layout; the same value may be shared by several components
    pub fn layout(mut self, layout: impl Into<Rc<Template>>) -> Self {
        self.layout = Some(layout.into());
        self
    }
}

type HelperFn = dyn Fn(&[Value], &BTreeMap<String, Value>) -> Value;

/// A helper: a function of positional and named arguments
#[derive(Clone)]
pub struct HelperDefinition(Rc<HelperFn>);

impl HelperDefinition {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&[Value], &BTreeMap<String, Value>) -> Value + 'static,
    {
        Self(Rc::new(f))
    }

    pub fn call(&self, params: &[Value], hash: &BTreeMap<String, Value>) -> Value {
        (self.0)(params, hash)
    }
}

impl fmt::Debug for HelperDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("HelperDefinition(..)")
    }
}
