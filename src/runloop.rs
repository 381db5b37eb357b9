//! The single-threaded task queue and the coalesced render queue
//!
//! Transitions run as tasks on a [`LocalPool`]. Nothing runs until the
//! application drives the pool with `settle` or `block_on`; render requests
//! made while tasks run are coalesced and flushed once afterwards.

use std::cell::RefCell;
use std::future::Future;

use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use crate::outlet::OutletState;

/// Owns the task queue
#[derive(Debug)]
pub struct RunLoop {
    pool: LocalPool,
}

impl Default for RunLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl RunLoop {
    pub fn new() -> Self {
        Self { pool: LocalPool::new() }
    }

    pub fn spawner(&self) -> Scheduler {
        Scheduler {
            spawner: self.pool.spawner(),
        }
    }

    /// Run every task until none can make progress
    pub fn run_until_stalled(&mut self) {
        self.pool.run_until_stalled();
    }

    /// Run tasks until `future` completes
    pub fn run_until<F: Future>(&mut self, future: F) -> F::Output {
        self.pool.run_until(future)
    }
}

/// Handle for scheduling tasks onto the run loop
#[derive(Debug, Clone)]
pub struct Scheduler {
    spawner: LocalSpawner,
}

impl Scheduler {
    /// Queue a task; it first runs on the next drive of the loop
    pub fn schedule(&self, task: impl Future<Output = ()> + 'static) {
        if let Err(err) = self.spawner.spawn_local(task) {
            tracing::warn!(%err, "run loop is shut down; task dropped");
        }
    }
}

/// A pending change to the rendered output
#[derive(Debug)]
pub enum RenderJob {
    /// Install a new outlet chain
    Replace(Option<OutletState>),
    /// Re-render the current chain, e.g. after a property change
    Refresh,
}

/// Coalesces render requests between flushes
#[derive(Debug, Default)]
pub struct RenderQueue {
    pending: RefCell<Option<RenderJob>>,
}

impl RenderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a render; a replacement supersedes anything queued before it
    pub fn schedule(&self, job: RenderJob) {
        let mut pending = self.pending.borrow_mut();
        match (&*pending, &job) {
            (Some(RenderJob::Replace(_)), RenderJob::Refresh) => {}
            _ => *pending = Some(job),
        }
    }

    pub fn take(&self) -> Option<RenderJob> {
        self.pending.borrow_mut().take()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.borrow().is_none()
    }
}
