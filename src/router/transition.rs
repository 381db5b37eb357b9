//! One navigation attempt and the task that drives it

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

use futures::channel::oneshot;

use super::{Router, TransitionError};
use crate::route::{HandlerInfo, HookContext, HookError, HookKind, HookOutcome};
use crate::value::Value;

/// Lifecycle of a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Pending,
    Resolved,
    Rejected,
    Aborted,
}

type Waiter = oneshot::Sender<Result<(), TransitionError>>;

/// An in-flight navigation
#[derive(Debug)]
pub struct Transition {
    id: u64,
    target: Vec<HandlerInfo>,
    path: String,
    query: BTreeMap<String, String>,
    should_render: bool,
    state: Cell<TransitionState>,
    waiters: RefCell<Vec<Waiter>>,
}

impl Transition {
    pub(crate) fn new(
        id: u64,
        target: Vec<HandlerInfo>,
        path: String,
        query: BTreeMap<String, String>,
        should_render: bool,
    ) -> Self {
        Self {
            id,
            target,
            path,
            query,
            should_render,
            state: Cell::new(TransitionState::Pending),
            waiters: RefCell::new(Vec::new()),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The handler chain being entered, root first
    pub fn target(&self) -> &[HandlerInfo] {
        &self.target
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query(&self) -> &BTreeMap<String, String> {
        &self.query
    }

    pub fn should_render(&self) -> bool {
        self.should_render
    }

    pub fn state(&self) -> TransitionState {
        self.state.get()
    }

    pub fn is_pending(&self) -> bool {
        self.state.get() == TransitionState::Pending
    }

    pub fn is_aborted(&self) -> bool {
        self.state.get() == TransitionState::Aborted
    }

    pub(crate) fn add_waiter(&self, waiter: Waiter) {
        self.waiters.borrow_mut().push(waiter);
    }

    /// Supersede `previous`: abort it and take over its callers
    pub(crate) fn supersede(&self, previous: &Transition) {
        previous.state.set(TransitionState::Aborted);
        let adopted = std::mem::take(&mut *previous.waiters.borrow_mut());
        self.waiters.borrow_mut().extend(adopted);
    }

    /// Abort without a successor; callers see the navigation abandoned
    pub(crate) fn abandon(&self) {
        self.state.set(TransitionState::Aborted);
        self.waiters.borrow_mut().clear();
    }

    pub(crate) fn settle(&self, result: Result<(), TransitionError>) {
        self.state.set(match result {
            Ok(()) => TransitionState::Resolved,
            Err(_) => TransitionState::Rejected,
        });
        for waiter in self.waiters.borrow_mut().drain(..) {
            // A dropped navigation handle is not an error
            let _ = waiter.send(result.clone());
        }
    }
}

/// The caller's handle on a navigation; settles with the transition that
/// finally resolves or rejects, which may be a later one that superseded it
#[derive(Debug)]
#[must_use = "navigations do nothing unless the run loop is driven"]
pub struct Navigation {
    receiver: oneshot::Receiver<Result<(), TransitionError>>,
}

impl Navigation {
    pub(crate) fn pending() -> (Waiter, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self { receiver })
    }

    /// A navigation that has already failed
    pub(crate) fn failed(error: TransitionError) -> Self {
        let (sender, navigation) = Self::pending();
        let _ = sender.send(Err(error));
        navigation
    }
}

impl Future for Navigation {
    type Output = Result<(), TransitionError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(result)) => Poll::Ready(result),
            Poll::Ready(Err(oneshot::Canceled)) => Poll::Ready(Err(TransitionError::Abandoned)),
            Poll::Pending => Poll::Pending,
        }
    }
}

/// How the hook phase of a transition ended
pub(crate) enum Step {
    Aborted,
    Redirect(String),
    Resolved(Vec<Value>),
    Rejected {
        index: usize,
        hook: HookKind,
        error: HookError,
        models: Vec<Value>,
    },
}

/// Run a transition to completion on the run loop
pub(crate) async fn drive(router: Rc<Router>, transition: Rc<Transition>) {
    if transition.is_aborted() {
        return;
    }
    tracing::debug!(id = transition.id(), path = transition.path(), "transition started");

    match run_hooks(&router, &transition).await {
        Step::Aborted => {
            tracing::trace!(id = transition.id(), "aborted transition stopped");
        }
        Step::Redirect(route) => {
            tracing::debug!(id = transition.id(), to = %route, "redirecting");
            router.redirect(&transition, &route);
        }
        Step::Resolved(models) => {
            router.finalize(&transition, transition.target(), &models, None);
            tracing::debug!(id = transition.id(), "transition resolved");
            transition.settle(Ok(()));
        }
        Step::Rejected {
            index,
            hook,
            error,
            models,
        } => {
            router.reject(&transition, index, hook, error, models);
        }
    }
}

async fn run_hooks(router: &Rc<Router>, transition: &Transition) -> Step {
    let (pivot, mut models) = router.retained_models(transition.target());
    router.sync_query_params(transition);

    for (index, info) in transition.target().iter().enumerate().skip(pivot) {
        let node = router.tree().node(info.node);
        let handler = router.engines().get(node.owner).route_handler(node);
        let parent_model = models.last().cloned().unwrap_or_default();
        let mut model = Value::Null;

        for kind in HookKind::ENTERING {
            let incoming = match kind {
                HookKind::AfterModel => model.clone(),
                _ => Value::Null,
            };
            let ctx = HookContext::new(
                &node.name,
                info.params.clone(),
                transition.query().clone(),
                incoming,
                parent_model.clone(),
            );
            tracing::trace!(route = %node.name, hook = %kind, "running hook");

            let result = match handler.run(kind, &ctx) {
                HookOutcome::Ready(result) => result,
                HookOutcome::Pending(mut future) => match futures::poll!(&mut future) {
                    Poll::Ready(result) => result,
                    Poll::Pending => {
                        router.enter_loading(transition, index, pivot, &models);
                        future.await
                    }
                },
            };

            if transition.is_aborted() {
                return Step::Aborted;
            }
            if let Some(route) = ctx.take_redirect() {
                return Step::Redirect(route);
            }
            match result {
                Ok(value) if kind == HookKind::Model => model = value,
                Ok(_) => {}
                Err(error) => {
                    return Step::Rejected {
                        index,
                        hook: kind,
                        error,
                        models,
                    }
                }
            }
        }
        models.push(model);
    }
    Step::Resolved(models)
}
