//! The outlet tree: the render-side mirror of the active handler chain
//!
//! Each level records which engine renders it, so ambiguous references in
//! its template resolve against that engine's registry. The tree is rebuilt
//! from scratch for every rendered transition; [`OutletTree::replace`]
//! compares the new chain with the previous one level by level.

use std::cell::RefCell;
use std::rc::Rc;

use crate::controller::Controller;
use crate::engine::{EngineId, Engines};
use crate::template::Template;
use crate::value::Value;

/// One rendered level
#[derive(Debug, Clone)]
pub struct OutletState {
    /// Qualified route name, or the substate name for substates
    pub route: String,
    /// The engine whose registry renders this level
    pub engine: EngineId,
    pub template: Rc<Template>,
    pub controller: Rc<RefCell<Controller>>,
    pub model: Value,
    pub child: Option<Box<OutletState>>,
}

impl OutletState {
    /// Depth of the chain starting here
    pub fn depth(&self) -> usize {
        1 + self.child.as_ref().map_or(0, |child| child.depth())
    }

    /// Iterate the chain from this level down
    pub fn levels(&self) -> impl Iterator<Item = &OutletState> {
        std::iter::successors(Some(self), |state| state.child.as_deref())
    }

    fn same_level(&self, other: &OutletState) -> bool {
        self.route == other.route
            && self.engine == other.engine
            && Rc::ptr_eq(&self.template, &other.template)
            && Rc::ptr_eq(&self.controller, &other.controller)
            && self.model == other.model
    }
}

/// What one level of the outlet chain resolves from
#[derive(Debug, Clone, PartialEq)]
pub struct OutletSpec {
    pub route: String,
    pub engine: EngineId,
    pub local_name: String,
    pub model: Value,
}

/// Build a linked chain of outlet states, resolving templates and controllers
/// through each level's own engine
pub fn build_chain(specs: &[OutletSpec], engines: &Engines) -> Option<OutletState> {
    specs.iter().rev().fold(None, |child, spec| {
        let engine = engines.get(spec.engine);
        Some(OutletState {
            route: spec.route.clone(),
            engine: spec.engine,
            template: engine.template_for(&spec.local_name),
            controller: engine.controller_for(&spec.local_name),
            model: spec.model.clone(),
            child: child.map(Box::new),
        })
    })
}

/// Which depths survived a rebuild
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciliation {
    pub retained: Vec<usize>,
    pub replaced: Vec<usize>,
}

/// The current outlet chain
#[derive(Debug, Default)]
pub struct OutletTree {
    root: Option<OutletState>,
}

impl OutletTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<&OutletState> {
        self.root.as_ref()
    }

    /// Install a freshly built chain and report which depths match the old one
    ///
    /// Once a depth differs, everything below it counts as replaced.
    pub fn replace(&mut self, root: Option<OutletState>) -> Reconciliation {
        let mut reconciliation = Reconciliation::default();
        let old: Vec<&OutletState> = self.root.iter().flat_map(|r| r.levels()).collect();
        let new: Vec<&OutletState> = root.iter().flat_map(|r| r.levels()).collect();

        let mut diverged = false;
        for (depth, level) in new.iter().enumerate() {
            let same = !diverged && old.get(depth).is_some_and(|previous| previous.same_level(level));
            if same {
                reconciliation.retained.push(depth);
            } else {
                diverged = true;
                reconciliation.replaced.push(depth);
            }
        }
        for depth in new.len()..old.len() {
            reconciliation.replaced.push(depth);
        }

        tracing::trace!(
            retained = reconciliation.retained.len(),
            replaced = reconciliation.replaced.len(),
            "outlet tree reconciled"
        );
        self.root = root;
        reconciliation
    }

    pub fn clear(&mut self) {
        self.root = None;
    }
}
