//! Loading and error substate lookup
//!
//! Starting at the node that is waiting or rejected, the lookup walks
//! `(child, parent)` pairs toward the root. For each pair it first tries the
//! child's sibling substate (`post_error`, or `application_error` for an
//! engine root) in the child's engine, then the parent's child substate
//! (`post.error`, or `error` below an engine root) in the parent's engine.
//! Sibling substates are only considered for module-based engines. Either
//! form renders at the child's depth.

use std::fmt;

use crate::engine::{EngineId, Engines};
use crate::route::{HandlerInfo, RouteTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubstateKind {
    Loading,
    Error,
}

impl fmt::Display for SubstateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SubstateKind::Loading => "loading",
            SubstateKind::Error => "error",
        })
    }
}

/// A substate found for a chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substate {
    /// Qualified name, as reported to callers
    pub name: String,
    pub engine: EngineId,
    /// Registry name inside `engine`
    pub local_name: String,
    /// Index in the chain the substate renders at
    pub depth: usize,
}

/// Find the nearest substate for `chain[origin]`
///
/// With `stop_at`, the walk ends after the pair whose child is at that index.
pub fn find(
    tree: &RouteTree,
    engines: &Engines,
    chain: &[HandlerInfo],
    origin: usize,
    kind: SubstateKind,
    stop_at: Option<usize>,
) -> Option<Substate> {
    for depth in (0..=origin.min(chain.len().saturating_sub(1))).rev() {
        let child = tree.node(chain[depth].node);
        let child_engine = engines.get(child.owner);

        if child_engine.is_module_based() {
            let local_name = if child.is_engine_root() {
                format!("application_{}", kind)
            } else {
                format!("{}_{}", child.local_name, kind)
            };
            if child_engine.has_substate(&local_name) {
                return Some(Substate {
                    name: format!("{}_{}", child.name, kind),
                    engine: child.owner,
                    local_name,
                    depth,
                });
            }
        }

        if depth > 0 {
            let parent = tree.node(chain[depth - 1].node);
            let parent_engine = engines.get(parent.owner);
            let local_name = if parent.is_engine_root() {
                kind.to_string()
            } else {
                format!("{}.{}", parent.local_name, kind)
            };
            if parent_engine.has_substate(&local_name) {
                let name = if parent.parent.is_none() {
                    kind.to_string()
                } else {
                    format!("{}.{}", parent.name, kind)
                };
                return Some(Substate {
                    name,
                    engine: parent.owner,
                    local_name,
                    depth,
                });
            }
        }

        if stop_at == Some(depth) {
            break;
        }
    }
    None
}
