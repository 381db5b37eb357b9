//! Engines: isolated units that own a registry and optionally a route sub-tree
//!
//! The host application is itself an engine (always id 0). Every other engine
//! is created from an [`EngineDefinition`] registered under the `engine:` kind
//! in its parent's registry. Construction runs the definition's init hook on a
//! fresh registry and only then freezes it; nothing can be registered into an
//! engine after that.
//!
//! Routable engines are instantiated when the route tree is built, once per
//! `mount` in a route map. Routeless engines are instantiated the first time a
//! `{{mount "name"}}` renders and are cached per host engine.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::rc::Rc;

use crate::controller::Controller;
use crate::registry::{Key, Kind, Registry, RegistryError};
use crate::route::{RouteHandler, RouteMap, RouteNode};
use crate::template::Template;

/// Index of an engine instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EngineId(pub(crate) usize);

impl EngineId {
    /// The host application
    pub const HOST: EngineId = EngineId(0);
}

impl fmt::Display for EngineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "engine#{}", self.0)
    }
}

type EngineInit = dyn Fn(&mut Registry);

/// A registered engine: how to populate its registry and its route map
#[derive(Clone, Default)]
pub struct EngineDefinition {
    init: Option<Rc<EngineInit>>,
    routes: Option<RouteMap>,
    dependencies: Vec<Key>,
    module_based: Option<bool>,
}

impl EngineDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate the engine's registry; runs once per instance
    pub fn init(mut self, f: impl Fn(&mut Registry) + 'static) -> Self {
        self.init = Some(Rc::new(f));
        self
    }

    /// The route sub-tree spliced in under each mount point
    pub fn routes(mut self, routes: RouteMap) -> Self {
        self.routes = Some(routes);
        self
    }

    /// Copy a registration from the parent registry into each instance
    pub fn depends_on(mut self, key: Key) -> Self {
        self.dependencies.push(key);
        self
    }

    /// Override the application's resolver setting for this engine
    pub fn module_based(mut self, enabled: bool) -> Self {
        self.module_based = Some(enabled);
        self
    }

    pub fn route_map(&self) -> Option<&RouteMap> {
        self.routes.as_ref()
    }
}

impl fmt::Debug for EngineDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineDefinition")
            .field("init", &self.init.is_some())
            .field("routes", &self.routes)
            .field("dependencies", &self.dependencies)
            .field("module_based", &self.module_based)
            .finish()
    }
}

/// Settings every engine instance inherits from the application
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    pub module_based: bool,
    pub fallback_kinds: BTreeSet<Kind>,
}

/// A constructed engine with a frozen registry
pub struct EngineInstance {
    id: EngineId,
    name: String,
    registry: Rc<Registry>,
    parent: Option<EngineId>,
    mount: Option<String>,
    module_based: bool,
    default_template: Rc<Template>,
    controllers: RefCell<HashMap<String, Rc<RefCell<Controller>>>>,
    handlers: RefCell<HashMap<String, Rc<RouteHandler>>>,
    mounted: RefCell<HashMap<String, EngineId>>,
}

impl EngineInstance {
    fn new(
        id: EngineId,
        name: &str,
        registry: Registry,
        parent: Option<EngineId>,
        mount: Option<String>,
        module_based: bool,
    ) -> Self {
        Self {
            id,
            name: name.to_string(),
            registry: Rc::new(registry),
            parent,
            mount,
            module_based,
            default_template: Rc::new(Template::outlet_only()),
            controllers: RefCell::new(HashMap::new()),
            handlers: RefCell::new(HashMap::new()),
            mounted: RefCell::new(HashMap::new()),
        }
    }

    pub fn id(&self) -> EngineId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn parent(&self) -> Option<EngineId> {
        self.parent
    }

    /// Qualified name of the mount node; `None` for routeless engines and the host
    pub fn mount_point(&self) -> Option<&str> {
        self.mount.as_deref()
    }

    /// Whether sibling substates (`post_error`) are looked up
    pub fn is_module_based(&self) -> bool {
        self.module_based
    }

    /// The controller singleton for a local name, created on first use
    pub fn controller_for(&self, local_name: &str) -> Rc<RefCell<Controller>> {
        let mut controllers = self.controllers.borrow_mut();
        if let Some(controller) = controllers.get(local_name) {
            return controller.clone();
        }
        let controller = match self.registry.controller(local_name) {
            Some(definition) => definition.instantiate(local_name),
            None => Controller::generated(local_name),
        };
        tracing::trace!(engine = %self.name, controller = local_name, "controller created");
        let controller = Rc::new(RefCell::new(controller));
        controllers.insert(local_name.to_string(), controller.clone());
        controller
    }

    /// The route handler singleton for a node owned by this engine
    pub fn route_handler(&self, node: &RouteNode) -> Rc<RouteHandler> {
        self.handlers
            .borrow_mut()
            .entry(node.local_name.clone())
            .or_insert_with(|| {
                let definition = self.registry.route(&node.local_name).cloned().unwrap_or_default();
                Rc::new(RouteHandler::new(&node.name, definition))
            })
            .clone()
    }

    /// Route handlers created so far
    pub fn handlers(&self) -> Vec<Rc<RouteHandler>> {
        self.handlers.borrow().values().cloned().collect()
    }

    /// The template for a local name, or the shared `{{outlet}}` default
    pub fn template_for(&self, local_name: &str) -> Rc<Template> {
        self.registry
            .template(local_name)
            .unwrap_or_else(|| self.default_template.clone())
    }

    /// Whether a substate is defined under a local name
    pub fn has_substate(&self, local_name: &str) -> bool {
        self.registry.has(Kind::Template, local_name) || self.registry.has(Kind::Route, local_name)
    }
}

impl fmt::Debug for EngineInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineInstance")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("mount", &self.mount)
            .field("module_based", &self.module_based)
            .finish_non_exhaustive()
    }
}

/// Arena of every engine instance in one application
#[derive(Debug)]
pub struct Engines {
    settings: EngineSettings,
    instances: RefCell<Vec<Rc<EngineInstance>>>,
}

impl Engines {
    /// Start the arena with the host application's registry
    pub fn new(host: Registry, settings: EngineSettings) -> Self {
        let host = EngineInstance::new(EngineId::HOST, "application", host, None, None, settings.module_based);
        Self {
            settings,
            instances: RefCell::new(vec![Rc::new(host)]),
        }
    }

    pub fn host(&self) -> Rc<EngineInstance> {
        self.get(EngineId::HOST)
    }

    pub fn get(&self, id: EngineId) -> Rc<EngineInstance> {
        self.instances.borrow()[id.0].clone()
    }

    pub fn all(&self) -> Vec<Rc<EngineInstance>> {
        self.instances.borrow().clone()
    }

    /// Construct an engine registered as `engine:<name>` in the parent's registry
    pub fn instantiate(
        &self,
        parent: EngineId,
        name: &str,
        mount: Option<String>,
    ) -> Result<Rc<EngineInstance>, RegistryError> {
        let parent = self.get(parent);
        let definition = parent.registry.engine(name)?.clone();

        let mut registry = Registry::new(name);
        if !self.settings.fallback_kinds.is_empty() {
            registry = registry.with_fallback(parent.registry.clone(), self.settings.fallback_kinds.iter().copied())?;
        }
        for key in &definition.dependencies {
            registry.copy_from(&parent.registry, key)?;
        }
        if let Some(init) = &definition.init {
            init(&mut registry);
        }

        let mut instances = self.instances.borrow_mut();
        let id = EngineId(instances.len());
        let module_based = definition.module_based.unwrap_or(self.settings.module_based);
        tracing::debug!(engine = name, %id, parent = %parent.id, mount = ?mount, "engine initialized");
        let instance = Rc::new(EngineInstance::new(id, name, registry, Some(parent.id), mount, module_based));
        instances.push(instance.clone());
        Ok(instance)
    }

    /// The routeless engine mounted by name inside `host`, created once
    pub fn mount_routeless(&self, host: EngineId, name: &str) -> Result<Rc<EngineInstance>, RegistryError> {
        let parent = self.get(host);
        let existing = parent.mounted.borrow().get(name).copied();
        if let Some(id) = existing {
            return Ok(self.get(id));
        }
        let instance = self.instantiate(host, name, None)?;
        parent.mounted.borrow_mut().insert(name.to_string(), instance.id);
        Ok(instance)
    }
}
