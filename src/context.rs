// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Copy-on-write context.
//!
//! Every node the balancing engine allocates, mutates or frees passes
//! through a [`CowContext`]. The context knows which nodes belong to the
//! tree it serves and which are shared with some other live snapshot:
//!
//! - `Exclusive`: tracking is off, every node is owned and mutated in place
//! - `Tracked(set)`: only nodes whose id is in `set` are owned; an empty set
//!   means every node is shared
//!
//! [`CowContext::writable_node`] is the one primitive that turns the plain
//! split/insert/remove engine into a copy-on-write one.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::free_list::FreeList;
use crate::node::Node;
use crate::node::NodeId;

/// Which nodes a context may write to.
#[derive(Clone, Debug)]
pub(crate) enum Ownership {
    /// No sharing: every node is writable.
    Exclusive,
    /// Only the listed nodes are writable.
    Tracked(FxHashSet<NodeId>),
}

/// Outcome of [`CowContext::free_node`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FreeType {
    /// The node was owned and returned to the pool.
    Stored,
    /// The node was owned but the pool was full, so it was dropped.
    FreeListFull,
    /// The node is shared and was left alone.
    NotOwned,
}

/// Tracks node ownership for one tree and routes allocations to its pool.
pub(crate) struct CowContext<T> {
    ownership: Ownership,
    free_list: Arc<FreeList<T>>,
}

impl<T> CowContext<T> {
    /// Create a context that owns every node.
    pub(crate) fn new(free_list: Arc<FreeList<T>>) -> CowContext<T> {
        return CowContext {
            ownership: Ownership::Exclusive,
            free_list,
        };
    }

    pub(crate) fn free_list(&self) -> &Arc<FreeList<T>> {
        return &self.free_list;
    }

    /// Mark every existing node as shared.
    pub(crate) fn share_all(&mut self) {
        self.ownership = Ownership::Tracked(FxHashSet::default());
    }

    /// Mark every node as owned and stop tracking.
    pub(crate) fn unshare_all(&mut self) {
        self.ownership = Ownership::Exclusive;
    }

    #[inline]
    pub(crate) fn is_writable(&self, node: &Node<T>) -> bool {
        return match &self.ownership {
            Ownership::Exclusive => true,
            Ownership::Tracked(writables) => writables.contains(&node.id),
        };
    }

    /// Allocate a node owned by this context.
    pub(crate) fn new_node(&mut self) -> Node<T> {
        let node = self.free_list.new_node();
        if let Ownership::Tracked(writables) = &mut self.ownership {
            writables.insert(node.id);
        }
        return node;
    }

    /// Release a node that is no longer part of the tree.
    /// Shared nodes are left for their other owners.
    pub(crate) fn free_node(&mut self, node: Arc<Node<T>>) -> FreeType {
        if !self.is_writable(&node) {
            return FreeType::NotOwned;
        }
        if let Ownership::Tracked(writables) = &mut self.ownership {
            writables.remove(&node.id);
        }
        return match Arc::try_unwrap(node) {
            Ok(node) => {
                if self.free_list.free_node(node) {
                    FreeType::Stored
                } else {
                    FreeType::FreeListFull
                }
            }
            // Someone cloned a handle to it, so the last owner drops it.
            Err(_) => FreeType::NotOwned,
        };
    }
}

impl<T: Clone> CowContext<T> {
    /// Get a mutable view of `node`, copying it first if it is shared.
    ///
    /// The copy is shallow: items are cloned, child handles are shared until
    /// they are touched in turn.
    pub(crate) fn writable_node<'a>(&mut self, node: &'a mut Arc<Node<T>>) -> &'a mut Node<T> {
        if !self.is_writable(node) {
            let mut copy = self.new_node();
            copy.items.extend(node.items.iter().cloned());
            copy.children.extend(node.children.iter().cloned());
            trace!(from = ?node.id, to = ?copy.id, "copying shared node");
            *node = Arc::new(copy);
        }
        // Owned nodes have a single handle, so this does not clone.
        return Arc::make_mut(node);
    }
}
