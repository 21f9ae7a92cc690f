// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Deriving new snapshots from old ones.
//!
//! A [`Builder`] starts from a [`Snapshot`] and shares every node with it.
//! Each write copies only the nodes on its root-to-leaf path that the builder
//! does not own yet, so a run of writes after `set` or `build` copies fewer
//! and fewer nodes as the builder takes ownership of the hot paths.
//!
//! Operations:
//! - `set`: point the builder at a snapshot, sharing all of its nodes
//! - `build`: freeze the current state; all nodes become shared again
//! - `replace_or_insert`, `delete`, `delete_min`, `delete_max`, `clear`
//!
//! Reads go through `Deref<Target = Snapshot<T>>`.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use tracing::trace;

use crate::context::CowContext;
use crate::free_list::DEFAULT_FREE_LIST_SIZE;
use crate::free_list::FreeList;
use crate::node::Remove;
use crate::snapshot::Snapshot;

/// Builds [`Snapshot`] values by copy-on-write.
///
/// ```
/// use bough::{Builder, Snapshot};
///
/// let empty = Snapshot::new(2).unwrap();
/// let mut builder = Builder::new(&empty);
/// builder.replace_or_insert(1);
/// builder.replace_or_insert(2);
/// let first = builder.build();
///
/// builder.delete(&1);
/// let second = builder.build();
///
/// assert_eq!(first.len(), 2);
/// assert_eq!(second.len(), 1);
/// assert!(empty.is_empty());
/// ```
pub struct Builder<T> {
    tree: Snapshot<T>,
    ctx: CowContext<T>,
}

impl<T> Builder<T> {
    /// Create a builder starting from `tree`, with its own node pool.
    pub fn new(tree: &Snapshot<T>) -> Builder<T> {
        return Builder::with_free_list(tree, Arc::new(FreeList::new(DEFAULT_FREE_LIST_SIZE)));
    }

    /// Create a builder starting from `tree` that draws nodes from
    /// `free_list`.
    pub fn with_free_list(tree: &Snapshot<T>, free_list: Arc<FreeList<T>>) -> Builder<T> {
        let mut builder = Builder {
            tree: tree.clone(),
            ctx: CowContext::new(free_list),
        };
        builder.set(tree);
        return builder;
    }

    /// Point this builder at `tree`.
    ///
    /// The builder shares every node with `tree` afterwards; writes copy
    /// what they touch and never change `tree` itself.
    pub fn set(&mut self, tree: &Snapshot<T>) -> &mut Builder<T> {
        self.tree = tree.clone();
        if self.tree.has_root() {
            self.ctx.share_all();
        } else {
            // Nothing to share with an empty tree.
            self.ctx.unshare_all();
        }
        trace!(len = self.tree.len(), "builder set");
        return self;
    }

    /// Return a snapshot of the current state.
    ///
    /// Runs in constant time. The builder keeps working from the returned
    /// snapshot, sharing all of its nodes, so later writes never show up in
    /// it.
    pub fn build(&mut self) -> Snapshot<T> {
        let result = self.tree.clone();
        self.set(&result);
        trace!(len = result.len(), "builder build");
        return result;
    }

    /// Remove every item.
    ///
    /// With `add_nodes_to_free_list`, nodes this builder owns are returned to
    /// its pool (until the pool is full). Nodes still shared with a snapshot
    /// are left alone.
    pub fn clear(&mut self, add_nodes_to_free_list: bool) {
        self.tree.clear(add_nodes_to_free_list, &mut self.ctx);
        self.ctx.unshare_all();
    }

    /// The pool this builder allocates from.
    pub fn free_list(&self) -> &Arc<FreeList<T>> {
        return self.ctx.free_list();
    }
}

impl<T: Ord + Clone> Builder<T> {
    /// Insert `item`, returning the equal item it replaced, if any.
    pub fn replace_or_insert(&mut self, item: T) -> Option<T> {
        return self.tree.replace_or_insert(item, &mut self.ctx);
    }

    /// Remove and return the item equal to `key`.
    pub fn delete<Q>(&mut self, key: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        return self.tree.delete_item(Remove::Item(key), &mut self.ctx);
    }

    /// Remove and return the smallest item.
    pub fn delete_min(&mut self) -> Option<T> {
        return self.tree.delete_item(Remove::<T>::Min, &mut self.ctx);
    }

    /// Remove and return the largest item.
    pub fn delete_max(&mut self) -> Option<T> {
        return self.tree.delete_item(Remove::<T>::Max, &mut self.ctx);
    }
}

impl<T> Deref for Builder<T> {
    type Target = Snapshot<T>;

    fn deref(&self) -> &Snapshot<T> {
        return &self.tree;
    }
}

impl<T: fmt::Debug> fmt::Debug for Builder<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return fmt::Debug::fmt(&self.tree, f);
    }
}
