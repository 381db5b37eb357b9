//! The router: combined route tree, current state and transitions
//!
//! At most one transition is current. Starting a new one aborts the previous
//! transition, which then stops at its next hook boundary and applies
//! nothing; its callers are handed to the new transition.
//!
//! Entering hooks run parent to child starting at the pivot, the first node
//! that differs from the active chain. Once every hook has resolved, exiting
//! routes are deactivated child to parent, entering routes are activated
//! parent to child, and a new outlet chain is queued for rendering.

mod substate;
mod transition;
mod url;

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use thiserror::Error;

use crate::config::{AppConfig, VisitOptions};
use crate::engine::{EngineId, Engines};
use crate::outlet::{build_chain, OutletSpec, OutletTree, Reconciliation};
use crate::registry::RegistryError;
use crate::render::{RenderError, Renderer};
use crate::route::{HandlerInfo, HookError, HookKind, NodeId, Params, RouteEntry, RouteMap, RouteTree, Segment};
use crate::runloop::{RenderJob, RenderQueue, Scheduler};
use crate::value::Value;

pub use substate::{Substate, SubstateKind};
pub use transition::{Navigation, Transition, TransitionState};
pub use url::Url;

/// Errors reported to the caller of a navigation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransitionError {
    #[error("no route matches '{url}'")]
    UnrecognizedUrl { url: String },

    #[error("no route named '{name}'")]
    UnknownRoute { name: String },

    #[error("route '{route}' needs a value for ':{param}'")]
    MissingParameter { route: String, param: String },

    /// A hook rejected; `substate` names the error substate that rendered, if any
    #[error("{hook} hook of '{route}' rejected: {reason}")]
    HookRejected {
        route: String,
        hook: HookKind,
        reason: HookError,
        substate: Option<String>,
    },

    /// The router was torn down before the navigation settled
    #[error("transition was abandoned")]
    Abandoned,
}

#[derive(Debug, Clone)]
struct ActiveRoute {
    info: HandlerInfo,
    model: Value,
}

#[derive(Debug, Default)]
struct RouterState {
    active: Vec<ActiveRoute>,
    path: Option<String>,
    query: BTreeMap<String, String>,
    current_url: Option<String>,
    current: Option<Rc<Transition>>,
    outlets: OutletTree,
    output: String,
    next_id: u64,
}

/// Owns the route tree and the one current transition of an application
#[derive(Debug)]
pub struct Router {
    tree: RouteTree,
    engines: Rc<Engines>,
    config: AppConfig,
    scheduler: Scheduler,
    renders: RenderQueue,
    state: RefCell<RouterState>,
}

impl Router {
    /// Build the combined route tree, instantiating every mounted engine
    pub fn new(
        engines: Rc<Engines>,
        routes: &RouteMap,
        config: AppConfig,
        scheduler: Scheduler,
    ) -> Result<Self, RegistryError> {
        let mut tree = RouteTree::new(EngineId::HOST);
        let root = tree.root();
        splice(&mut tree, &engines, root, routes)?;
        tracing::debug!(routes = tree.len(), engines = engines.all().len(), "route tree built");
        Ok(Self {
            tree,
            engines,
            config,
            scheduler,
            renders: RenderQueue::new(),
            state: RefCell::new(RouterState::default()),
        })
    }

    pub fn tree(&self) -> &RouteTree {
        &self.tree
    }

    pub fn engines(&self) -> &Engines {
        &self.engines
    }

    /// Navigate to a URL
    pub fn visit(self: &Rc<Self>, url: &str, options: VisitOptions) -> Navigation {
        let url = Url::parse(self.config.strip_root(url));
        match self.tree.recognize(&url.path) {
            Some(target) => self.start(target, url.path, url.query, options.should_render),
            None => Navigation::failed(TransitionError::UnrecognizedUrl { url: url.path }),
        }
    }

    /// Navigate to a named route, reusing active dynamic segments
    pub fn transition_to(self: &Rc<Self>, name: &str) -> Navigation {
        self.transition_with_params(name, Params::new())
    }

    /// Navigate to a named route with explicit dynamic segment values
    pub fn transition_with_params(self: &Rc<Self>, name: &str, params: Params) -> Navigation {
        match self.plan(name, params) {
            Ok((target, path)) => {
                let query = self.state.borrow().query.clone();
                self.start(target, path, query, true)
            }
            Err(error) => Navigation::failed(error),
        }
    }

    /// Resolve a route name to a handler chain and its URL path
    fn plan(&self, name: &str, mut params: Params) -> Result<(Vec<HandlerInfo>, String), TransitionError> {
        let id = self.tree.find(name).ok_or_else(|| TransitionError::UnknownRoute {
            name: name.to_string(),
        })?;
        {
            let state = self.state.borrow();
            for active in &state.active {
                for (key, value) in &active.info.params {
                    params.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
        }
        let path = self
            .tree
            .generate(id, &params)
            .map_err(|param| TransitionError::MissingParameter {
                route: name.to_string(),
                param,
            })?;
        let target = self
            .tree
            .lineage(id)
            .into_iter()
            .map(|node| HandlerInfo {
                node,
                params: self
                    .tree
                    .node(node)
                    .segments
                    .iter()
                    .filter_map(|segment| match segment {
                        Segment::Dynamic(key) => params.get(key).map(|v| (key.clone(), v.clone())),
                        Segment::Static(_) => None,
                    })
                    .collect(),
            })
            .collect();
        Ok((target, path))
    }

    fn start(
        self: &Rc<Self>,
        target: Vec<HandlerInfo>,
        path: String,
        query: BTreeMap<String, String>,
        should_render: bool,
    ) -> Navigation {
        let (waiter, navigation) = Navigation::pending();
        let transition = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            let transition = Rc::new(Transition::new(id, target, path, query, should_render));
            transition.add_waiter(waiter);
            if let Some(previous) = state.current.replace(transition.clone()) {
                if previous.is_pending() {
                    tracing::debug!(aborted = previous.id(), by = id, "transition superseded");
                    transition.supersede(&previous);
                }
            }
            transition
        };
        self.scheduler.schedule(transition::drive(self.clone(), transition));
        navigation
    }

    /// Replace a transition that redirected from inside a hook
    fn redirect(self: &Rc<Self>, from: &Rc<Transition>, route: &str) {
        let is_current = self
            .state
            .borrow()
            .current
            .as_ref()
            .is_some_and(|current| Rc::ptr_eq(current, from));
        if !is_current {
            return;
        }
        match self.plan(route, Params::new()) {
            Ok((target, path)) => {
                let navigation = self.start(target, path, from.query().clone(), from.should_render());
                // The caller handles were adopted by the redirect target
                drop(navigation);
            }
            Err(error) => {
                self.clear_current(from);
                from.settle(Err(error));
            }
        }
    }

    /// Index of the first node that differs from the active chain, and the
    /// models of the nodes above it
    pub(crate) fn retained_models(&self, target: &[HandlerInfo]) -> (usize, Vec<Value>) {
        let state = self.state.borrow();
        let pivot = pivot(&state.active, target);
        let models = state.active[..pivot].iter().map(|a| a.model.clone()).collect();
        (pivot, models)
    }

    /// Copy query values into the query-param properties of the target's controllers
    pub(crate) fn sync_query_params(&self, transition: &Transition) {
        for info in transition.target() {
            let node = self.tree.node(info.node);
            let controller = self.engines.get(node.owner).controller_for(&node.local_name);
            let mut controller = controller.borrow_mut();
            let names: Vec<String> = controller.query_params().to_vec();
            for name in names {
                match transition.query().get(&name) {
                    Some(value) => controller.set(name, value.as_str()),
                    None => controller.reset(&name),
                }
            }
        }
    }

    /// Render the nearest loading substate while a hook is pending
    pub(crate) fn enter_loading(&self, transition: &Transition, index: usize, pivot: usize, models: &[Value]) {
        if !transition.should_render() || transition.is_aborted() {
            return;
        }
        let target = transition.target();
        let Some(found) = substate::find(&self.tree, &self.engines, target, index, SubstateKind::Loading, Some(pivot))
        else {
            return;
        };
        tracing::debug!(substate = %found.name, "entering loading substate");
        let mut specs = self.specs(&target[..found.depth], &models[..found.depth]);
        specs.push(substate_spec(&found, Value::Null));
        self.renders.schedule(RenderJob::Replace(build_chain(&specs, &self.engines)));
    }

    /// Make `chain` the active chain: exit, enter, set up controllers, queue a render
    pub(crate) fn finalize(
        &self,
        transition: &Transition,
        chain: &[HandlerInfo],
        models: &[Value],
        substate: Option<(&Substate, Value)>,
    ) {
        let previous = std::mem::take(&mut self.state.borrow_mut().active);
        let pivot = pivot(&previous, chain);

        for exiting in previous[pivot..].iter().rev() {
            let node = self.tree.node(exiting.info.node);
            self.engines.get(node.owner).route_handler(node).deactivate();
        }
        for entering in &chain[pivot..] {
            let node = self.tree.node(entering.node);
            self.engines.get(node.owner).route_handler(node).activate();
        }
        for (info, model) in chain.iter().zip(models) {
            let node = self.tree.node(info.node);
            let controller = self.engines.get(node.owner).controller_for(&node.local_name);
            controller.borrow_mut().set("model", model.clone());
        }

        let entering_substate = substate.is_some();
        let mut specs = self.specs(chain, models);
        if let Some((found, model)) = substate {
            let controller = self.engines.get(found.engine).controller_for(&found.local_name);
            controller.borrow_mut().set("model", model.clone());
            specs.push(substate_spec(found, model));
        }

        {
            let mut state = self.state.borrow_mut();
            state.active = chain
                .iter()
                .zip(models)
                .map(|(info, model)| ActiveRoute {
                    info: info.clone(),
                    model: model.clone(),
                })
                .collect();
            // An error substate keeps the URL of the last committed transition
            if !entering_substate {
                state.path = Some(transition.path().to_string());
            }
        }
        if !entering_substate {
            self.refresh_url();
        }
        self.clear_current(transition);

        if transition.should_render() {
            self.renders.schedule(RenderJob::Replace(build_chain(&specs, &self.engines)));
        }
    }

    /// Handle a hook rejection: enter an error substate or leave everything as is
    pub(crate) fn reject(
        &self,
        transition: &Transition,
        index: usize,
        hook: HookKind,
        error: HookError,
        models: Vec<Value>,
    ) {
        let target = transition.target();
        let route = self.tree.node(target[index].node).name.clone();
        let found = if transition.should_render() {
            substate::find(&self.tree, &self.engines, target, index, SubstateKind::Error, None)
        } else {
            None
        };

        match &found {
            Some(found) => {
                tracing::debug!(%route, substate = %found.name, "entering error substate");
                let depth = found.depth;
                self.finalize(
                    transition,
                    &target[..depth],
                    &models[..depth],
                    Some((found, error.reason().clone())),
                );
            }
            None => {
                tracing::warn!(%route, %hook, reason = %error, "unhandled rejection");
                self.clear_current(transition);
            }
        }

        transition.settle(Err(TransitionError::HookRejected {
            route,
            hook,
            reason: error,
            substate: found.map(|s| s.name),
        }));
    }

    fn clear_current(&self, transition: &Transition) {
        let mut state = self.state.borrow_mut();
        if state.current.as_ref().is_some_and(|c| c.id() == transition.id()) {
            state.current = None;
        }
    }

    fn specs(&self, chain: &[HandlerInfo], models: &[Value]) -> Vec<OutletSpec> {
        chain
            .iter()
            .zip(models)
            .map(|(info, model)| {
                let node = self.tree.node(info.node);
                OutletSpec {
                    route: node.name.clone(),
                    engine: node.owner,
                    local_name: node.local_name.clone(),
                    model: model.clone(),
                }
            })
            .collect()
    }

    /// Recompute the current URL from the active path and query-param controllers
    fn refresh_url(&self) {
        let mut state = self.state.borrow_mut();
        let Some(path) = state.path.clone() else {
            return;
        };
        let mut query = Vec::new();
        for active in &state.active {
            let node = self.tree.node(active.info.node);
            let controller = self.engines.get(node.owner).controller_for(&node.local_name);
            query.extend(controller.borrow().changed_query_params());
        }
        state.query = query.iter().cloned().collect();
        state.current_url = Some(url::format(&self.config.with_root(&path), &query));
    }

    /// Set a property on the controller of an active route
    ///
    /// Query-param properties rewrite the current URL. Either way the
    /// output is re-rendered on the next flush.
    pub fn set(&self, route: &str, key: &str, value: Value) -> Result<(), TransitionError> {
        let node = {
            let state = self.state.borrow();
            state
                .active
                .iter()
                .map(|active| self.tree.node(active.info.node))
                .find(|node| node.name == route)
                .ok_or_else(|| TransitionError::UnknownRoute {
                    name: route.to_string(),
                })?
        };
        let controller = self.engines.get(node.owner).controller_for(&node.local_name);
        let is_query_param = {
            let mut controller = controller.borrow_mut();
            controller.set(key, value);
            controller.is_query_param(key)
        };
        if is_query_param {
            self.refresh_url();
            tracing::debug!(url = ?self.current_url(), "query param changed");
        }
        self.renders.schedule(RenderJob::Refresh);
        Ok(())
    }

    /// Apply queued render work
    pub fn flush(&self) -> Result<Option<Reconciliation>, RenderError> {
        let Some(job) = self.renders.take() else {
            return Ok(None);
        };
        let mut state = self.state.borrow_mut();
        let reconciliation = match job {
            RenderJob::Replace(root) => Some(state.outlets.replace(root)),
            RenderJob::Refresh => None,
        };
        let output = match state.outlets.root() {
            Some(root) => Renderer::new(&self.engines).render(root)?,
            None => String::new(),
        };
        tracing::trace!(bytes = output.len(), "render flushed");
        state.output = output;
        Ok(reconciliation)
    }

    /// The most recently flushed markup
    pub fn output(&self) -> String {
        self.state.borrow().output.clone()
    }

    pub fn current_url(&self) -> Option<String> {
        self.state.borrow().current_url.clone()
    }

    /// Qualified names of the active routes, root first
    pub fn active_routes(&self) -> Vec<String> {
        self.state
            .borrow()
            .active
            .iter()
            .map(|active| self.tree.node(active.info.node).name.clone())
            .collect()
    }

    pub fn is_transitioning(&self) -> bool {
        self.state.borrow().current.as_ref().is_some_and(|c| c.is_pending())
    }

    /// Exit every active route, then destroy every route handler
    pub fn teardown(&self) {
        let active = {
            let mut state = self.state.borrow_mut();
            if let Some(current) = state.current.take() {
                current.abandon();
            }
            state.outlets.clear();
            state.output.clear();
            state.current_url = None;
            state.path = None;
            std::mem::take(&mut state.active)
        };
        for route in active.iter().rev() {
            let node = self.tree.node(route.info.node);
            self.engines.get(node.owner).route_handler(node).deactivate();
        }
        let handlers: Vec<_> = self.engines.all().iter().flat_map(|engine| engine.handlers()).collect();
        for handler in &handlers {
            handler.begin_destroy();
        }
        for handler in &handlers {
            handler.finish_destroy();
        }
        tracing::debug!(handlers = handlers.len(), "router torn down");
    }
}

fn pivot(active: &[ActiveRoute], target: &[HandlerInfo]) -> usize {
    active
        .iter()
        .zip(target)
        .take_while(|(active, info)| active.info == **info)
        .count()
}

fn substate_spec(found: &Substate, model: Value) -> OutletSpec {
    OutletSpec {
        route: found.name.clone(),
        engine: found.engine,
        local_name: found.local_name.clone(),
        model,
    }
}

/// Add a route map under `parent`, instantiating engines for mount points
fn splice(tree: &mut RouteTree, engines: &Engines, parent: NodeId, map: &RouteMap) -> Result<(), RegistryError> {
    let owner = tree.node(parent).owner;
    for entry in map.entries() {
        match entry {
            RouteEntry::Route { name, path, children } => {
                let id = tree.add_route(parent, name, path.as_deref());
                splice(tree, engines, id, children)?;
            }
            RouteEntry::Mount { engine, alias, path } => {
                let name = alias.as_deref().unwrap_or(engine);
                let routes = engines.get(owner).registry().engine(engine)?.route_map().cloned();
                let instance = engines.instantiate(owner, engine, Some(tree.child_name(parent, name)))?;
                let id = tree.add_mount(parent, name, path.as_deref(), instance.id());
                if let Some(routes) = routes {
                    splice(tree, engines, id, &routes)?;
                }
            }
        }
    }
    Ok(())
}
