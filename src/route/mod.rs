//! Route definitions, hooks and handler instances
//!
//! A route is described by a [`RouteDefinition`]: an explicit set of hook
//! closures, registered as `route:<name>` in the registry of the engine that
//! owns the route. The router instantiates one [`RouteHandler`] per route per
//! engine instance and invokes the hooks on it.

mod dsl;
mod tree;

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture};
use thiserror::Error;

use crate::value::Value;

pub use dsl::{RouteEntry, RouteMap};
pub use tree::{HandlerInfo, NodeId, Params, RouteNode, RouteTree, Segment};

/// A hook rejection: the hook's future failed or the hook failed synchronously
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", reason.message())]
pub struct HookError {
    reason: Value,
}

impl HookError {
    /// Reject with an error-shaped reason carrying `message`
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            reason: Value::error(message),
        }
    }

    /// Reject with an arbitrary reason
    pub fn from_value(reason: Value) -> Self {
        Self { reason }
    }

    /// The rejection reason; error substates receive it as their model
    pub fn reason(&self) -> &Value {
        &self.reason
    }
}

/// The result of a model hook: ready now, or pending on a future
pub enum HookOutcome {
    Ready(Result<Value, HookError>),
    Pending(LocalBoxFuture<'static, Result<Value, HookError>>),
}

impl HookOutcome {
    pub fn resolve(value: impl Into<Value>) -> Self {
        HookOutcome::Ready(Ok(value.into()))
    }

    pub fn reject(error: impl Into<HookError>) -> Self {
        HookOutcome::Ready(Err(error.into()))
    }

    pub fn future<F>(future: F) -> Self
    where
        F: Future<Output = Result<Value, HookError>> + 'static,
    {
        HookOutcome::Pending(future.boxed_local())
    }
}

impl fmt::Debug for HookOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookOutcome::Ready(result) => f.debug_tuple("Ready").field(result).finish(),
            HookOutcome::Pending(_) => f.write_str("Pending(..)"),
        }
    }
}

impl From<()> for HookOutcome {
    fn from(_: ()) -> Self {
        HookOutcome::resolve(Value::Null)
    }
}

impl From<Value> for HookOutcome {
    fn from(value: Value) -> Self {
        HookOutcome::resolve(value)
    }
}

impl From<Result<Value, HookError>> for HookOutcome {
    fn from(result: Result<Value, HookError>) -> Self {
        HookOutcome::Ready(result)
    }
}

/// The entering hooks, in the order they run for each route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookKind {
    BeforeModel,
    Model,
    AfterModel,
}

impl HookKind {
    pub const ENTERING: [HookKind; 3] = [HookKind::BeforeModel, HookKind::Model, HookKind::AfterModel];
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            HookKind::BeforeModel => "beforeModel",
            HookKind::Model => "model",
            HookKind::AfterModel => "afterModel",
        })
    }
}

/// What an entering hook can see of the transition
#[derive(Debug)]
pub struct HookContext {
    route: String,
    params: Params,
    query: BTreeMap<String, String>,
    model: Value,
    parent_model: Value,
    redirect: RefCell<Option<String>>,
}

impl HookContext {
    pub(crate) fn new(
        route: &str,
        params: Params,
        query: BTreeMap<String, String>,
        model: Value,
        parent_model: Value,
    ) -> Self {
        Self {
            route: route.to_string(),
            params,
            query,
            model,
            parent_model,
            redirect: RefCell::new(None),
        }
    }

    /// Qualified name of the route being entered
    pub fn route(&self) -> &str {
        &self.route
    }

    /// A dynamic segment value
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).map(String::as_str)
    }

    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// The resolved model; only set for `after_model`
    pub fn model(&self) -> &Value {
        &self.model
    }

    /// The model of the nearest ancestor route
    pub fn parent_model(&self) -> &Value {
        &self.parent_model
    }

    /// Redirect: abandon this transition in favour of one to `route`
    pub fn transition_to(&self, route: impl Into<String>) {
        *self.redirect.borrow_mut() = Some(route.into());
    }

    pub(crate) fn take_redirect(&self) -> Option<String> {
        self.redirect.borrow_mut().take()
    }
}

type ModelHookFn = dyn Fn(&HookContext) -> HookOutcome;
type LifecycleHookFn = dyn Fn(&RouteHandler);

/// The hooks of one route
#[derive(Clone, Default)]
pub struct RouteDefinition {
    before_model: Option<Rc<ModelHookFn>>,
    model: Option<Rc<ModelHookFn>>,
    after_model: Option<Rc<ModelHookFn>>,
    activate: Option<Rc<LifecycleHookFn>>,
    deactivate: Option<Rc<LifecycleHookFn>>,
}

fn model_hook<F, O>(f: F) -> Rc<ModelHookFn>
where
    F: Fn(&HookContext) -> O + 'static,
    O: Into<HookOutcome>,
{
    Rc::new(move |ctx: &HookContext| f(ctx).into())
}

impl RouteDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn before_model<F, O>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext) -> O + 'static,
        O: Into<HookOutcome>,
    {
        self.before_model = Some(model_hook(f));
        self
    }

    pub fn model<F, O>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext) -> O + 'static,
        O: Into<HookOutcome>,
    {
        self.model = Some(model_hook(f));
        self
    }

    pub fn after_model<F, O>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext) -> O + 'static,
        O: Into<HookOutcome>,
    {
        self.after_model = Some(model_hook(f));
        self
    }

    pub fn activate(mut self, f: impl Fn(&RouteHandler) + 'static) -> Self {
        self.activate = Some(Rc::new(f));
        self
    }

    pub fn deactivate(mut self, f: impl Fn(&RouteHandler) + 'static) -> Self {
        self.deactivate = Some(Rc::new(f));
        self
    }

    fn hook(&self, kind: HookKind) -> Option<&Rc<ModelHookFn>> {
        match kind {
            HookKind::BeforeModel => self.before_model.as_ref(),
            HookKind::Model => self.model.as_ref(),
            HookKind::AfterModel => self.after_model.as_ref(),
        }
    }
}

impl fmt::Debug for RouteDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteDefinition")
            .field("before_model", &self.before_model.is_some())
            .field("model", &self.model.is_some())
            .field("after_model", &self.after_model.is_some())
            .field("activate", &self.activate.is_some())
            .field("deactivate", &self.deactivate.is_some())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Alive,
    Destroying,
    Destroyed,
}

/// A route instance: the receiver of a route's hooks
#[derive(Debug)]
pub struct RouteHandler {
    name: String,
    definition: RouteDefinition,
    lifecycle: Cell<Lifecycle>,
}

impl RouteHandler {
    pub(crate) fn new(name: &str, definition: RouteDefinition) -> Self {
        Self {
            name: name.to_string(),
            definition,
            lifecycle: Cell::new(Lifecycle::Alive),
        }
    }

    /// Qualified route name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_destroying(&self) -> bool {
        self.lifecycle.get() == Lifecycle::Destroying
    }

    pub fn is_destroyed(&self) -> bool {
        self.lifecycle.get() == Lifecycle::Destroyed
    }

    /// Run one entering hook; routes without the hook resolve with the
    /// incoming model (`Null` before `model` has run)
    pub(crate) fn run(&self, kind: HookKind, ctx: &HookContext) -> HookOutcome {
        match self.definition.hook(kind) {
            Some(hook) => hook(ctx),
            None => HookOutcome::resolve(ctx.model().clone()),
        }
    }

    pub(crate) fn activate(&self) {
        if let Some(hook) = &self.definition.activate {
            hook(self);
        }
    }

    pub(crate) fn deactivate(&self) {
        if let Some(hook) = &self.definition.deactivate {
            hook(self);
        }
    }

    pub(crate) fn begin_destroy(&self) {
        if self.lifecycle.get() == Lifecycle::Alive {
            self.lifecycle.set(Lifecycle::Destroying);
        }
    }

    pub(crate) fn finish_destroy(&self) {
        self.lifecycle.set(Lifecycle::Destroyed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> HookContext {
        HookContext::new("blog.post", Params::new(), BTreeMap::new(), Value::Null, Value::Null)
    }

    #[test]
    fn test_missing_hook_resolves_with_incoming_model() {
        let handler = RouteHandler::new("blog", RouteDefinition::new());
        match handler.run(HookKind::Model, &ctx()) {
            HookOutcome::Ready(Ok(Value::Null)) => {}
            other => panic!("Expected ready null, got {:?}", other),
        }
    }

    #[test]
    fn test_unit_returning_hook_resolves_null() {
        let handler = RouteHandler::new("blog", RouteDefinition::new().model(|_| ()));
        assert!(matches!(
            handler.run(HookKind::Model, &ctx()),
            HookOutcome::Ready(Ok(Value::Null))
        ));
    }

    #[test]
    fn test_rejecting_hook() {
        let handler = RouteHandler::new(
            "blog.post",
            RouteDefinition::new().model(|_| HookOutcome::reject(HookError::new("Oh, noes!"))),
        );
        match handler.run(HookKind::Model, &ctx()) {
            HookOutcome::Ready(Err(err)) => assert_eq!(err.to_string(), "Oh, noes!"),
            other => panic!("Expected rejection, got {:?}", other),
        }
    }

    #[test]
    fn test_lifecycle_flags() {
        let handler = RouteHandler::new("blog", RouteDefinition::new());
        assert!(!handler.is_destroying() && !handler.is_destroyed());
        handler.begin_destroy();
        assert!(handler.is_destroying());
        handler.finish_destroy();
        assert!(handler.is_destroyed() && !handler.is_destroying());
    }

    #[test]
    fn test_redirect_is_recorded() {
        let context = ctx();
        context.transition_to("blog.post.likes");
        assert_eq!(context.take_redirect().as_deref(), Some("blog.post.likes"));
        assert!(context.take_redirect().is_none());
    }
}
