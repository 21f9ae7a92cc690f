// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! The tree value.
//!
//! A [`Snapshot`] is a degree, a length and an optional root. It owns no
//! allocation policy of its own: every mutating entry point takes the
//! [`CowContext`] of whoever is writing, which is how the same value serves
//! as the frozen result of [`Builder::build`](crate::Builder::build) and as
//! the working tree inside a [`Builder`](crate::Builder) or
//! [`BTree`](crate::BTree).
//!
//! Cloning a snapshot is O(1) and shares every node.

use std::borrow::Borrow;
use std::fmt;
use std::mem;
use std::sync::Arc;

use tracing::trace;

use crate::config;
use crate::config::check_degree;
use crate::context::CowContext;
use crate::context::FreeType;
use crate::error::Error;
use crate::error::Result;
use crate::iter::Direction;
use crate::iter::Iter;
use crate::iter::Walk;
use crate::node;
use crate::node::Node;
use crate::node::Remove;

/// An immutable B-tree.
///
/// Read it directly, or hand it to a [`Builder`](crate::Builder) to derive
/// new versions. Items are kept in `Ord` order and equal items are never
/// stored twice.
pub struct Snapshot<T> {
    degree: usize,
    length: usize,
    root: Option<Arc<Node<T>>>,
}

impl<T> Clone for Snapshot<T> {
    fn clone(&self) -> Self {
        return Snapshot {
            degree: self.degree,
            length: self.length,
            root: self.root.clone(),
        };
    }
}

impl<T> Snapshot<T> {
    /// Create an empty tree of the given degree.
    ///
    /// Every node except the root holds between `degree - 1` and
    /// `2 * degree - 1` items. Degrees below 2 or above
    /// [`MAX_DEGREE`](crate::MAX_DEGREE) are rejected.
    pub fn new(degree: usize) -> Result<Snapshot<T>> {
        check_degree(degree)?;
        return Ok(Snapshot {
            degree,
            length: 0,
            root: None,
        });
    }

    #[inline]
    pub(crate) fn max_items(&self) -> usize {
        return config::max_items(self.degree);
    }

    #[inline]
    pub(crate) fn min_items(&self) -> usize {
        return config::min_items(self.degree);
    }

    pub(crate) fn root(&self) -> Option<&Node<T>> {
        return self.root.as_deref();
    }

    pub(crate) fn has_root(&self) -> bool {
        return self.root.is_some();
    }

    /// The degree the tree was created with.
    pub fn degree(&self) -> usize {
        return self.degree;
    }

    /// Number of items in the tree.
    pub fn len(&self) -> usize {
        return self.length;
    }

    pub fn is_empty(&self) -> bool {
        return self.length == 0;
    }

    /// Look up the item equal to `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        return self.root()?.get(key);
    }

    /// Return true if an item equal to `key` is in the tree.
    pub fn has<Q>(&self, key: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        return self.get(key).is_some();
    }

    /// The smallest item, or `None` if the tree is empty.
    pub fn min(&self) -> Option<&T> {
        return node::min(self.root());
    }

    /// The largest item, or `None` if the tree is empty.
    pub fn max(&self) -> Option<&T> {
        return node::max(self.root());
    }

    /// Iterate over every item in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        return Iter::new(self.root(), self.length);
    }

    fn walk<Q, F>(
        &self,
        direction: Direction,
        start: Option<&Q>,
        stop: Option<&Q>,
        include_start: bool,
        mut visit: F,
    ) where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
        F: FnMut(&T) -> bool,
    {
        let Some(root) = self.root() else {
            return;
        };
        let walk = Walk {
            direction,
            start,
            stop,
            include_start,
        };
        root.walk(&walk, false, &mut visit);
    }

    /// Call `iterator` on every item in `[greater_or_equal, less_than)`, in
    /// ascending order, until it returns false.
    pub fn ascend_range<Q, F>(&self, greater_or_equal: &Q, less_than: &Q, iterator: F)
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
        F: FnMut(&T) -> bool,
    {
        self.walk(
            Direction::Ascend,
            Some(greater_or_equal),
            Some(less_than),
            true,
            iterator,
        );
    }

    /// Call `iterator` on every item below `pivot`, in ascending order, until
    /// it returns false.
    pub fn ascend_less_than<Q, F>(&self, pivot: &Q, iterator: F)
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
        F: FnMut(&T) -> bool,
    {
        self.walk(Direction::Ascend, None, Some(pivot), false, iterator);
    }

    /// Call `iterator` on every item at or above `pivot`, in ascending order,
    /// until it returns false.
    pub fn ascend_greater_or_equal<Q, F>(&self, pivot: &Q, iterator: F)
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
        F: FnMut(&T) -> bool,
    {
        self.walk(Direction::Ascend, Some(pivot), None, true, iterator);
    }

    /// Call `iterator` on every item in ascending order until it returns
    /// false.
    pub fn ascend<F>(&self, iterator: F)
    where
        T: Ord,
        F: FnMut(&T) -> bool,
    {
        self.walk::<T, F>(Direction::Ascend, None, None, false, iterator);
    }

    /// Call `iterator` on every item in `(greater_than, less_or_equal]`, in
    /// descending order, until it returns false.
    pub fn descend_range<Q, F>(&self, less_or_equal: &Q, greater_than: &Q, iterator: F)
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
        F: FnMut(&T) -> bool,
    {
        self.walk(
            Direction::Descend,
            Some(less_or_equal),
            Some(greater_than),
            true,
            iterator,
        );
    }

    /// Call `iterator` on every item at or below `pivot`, in descending
    /// order, until it returns false.
    pub fn descend_less_or_equal<Q, F>(&self, pivot: &Q, iterator: F)
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
        F: FnMut(&T) -> bool,
    {
        self.walk(Direction::Descend, Some(pivot), None, true, iterator);
    }

    /// Call `iterator` on every item above `pivot`, in descending order,
    /// until it returns false.
    pub fn descend_greater_than<Q, F>(&self, pivot: &Q, iterator: F)
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
        F: FnMut(&T) -> bool,
    {
        self.walk(Direction::Descend, None, Some(pivot), false, iterator);
    }

    /// Call `iterator` on every item in descending order until it returns
    /// false.
    pub fn descend<F>(&self, iterator: F)
    where
        T: Ord,
        F: FnMut(&T) -> bool,
    {
        self.walk::<T, F>(Direction::Descend, None, None, false, iterator);
    }

    /// Check every structural invariant of the tree.
    ///
    /// Verifies node fill bounds, child counts, strict ordering within and
    /// across nodes, uniform leaf depth, and that the stored length matches
    /// the number of items reachable from the root.
    pub fn validate(&self) -> Result<()>
    where
        T: Ord,
    {
        let count = match self.root() {
            None => 0,
            Some(root) => {
                let mut leaf_depth = None;
                root.check(
                    true,
                    self.min_items(),
                    self.max_items(),
                    None,
                    None,
                    0,
                    &mut leaf_depth,
                )?
            }
        };
        if count != self.length {
            return Err(Error::corrupted(format!(
                "length is {} but the tree holds {count} items",
                self.length
            )));
        }
        return Ok(());
    }

    /// Drop every item, optionally returning owned nodes to the pool.
    ///
    /// Harvesting walks owned nodes bottom-up and stops as soon as the pool
    /// is full. Shared nodes and everything below them are left alone, since
    /// a shared node never has an owned descendant.
    pub(crate) fn clear(&mut self, add_nodes_to_free_list: bool, ctx: &mut CowContext<T>) {
        if let Some(root) = self.root.take() {
            if add_nodes_to_free_list {
                let pooled_before = ctx.free_list().len();
                harvest(root, ctx);
                trace!(
                    pooled = ctx.free_list().len().saturating_sub(pooled_before),
                    "harvested nodes into free list"
                );
            }
        }
        self.length = 0;
    }
}

impl<T: Ord + Clone> Snapshot<T> {
    /// Insert `item`, returning the equal item it replaced, if any.
    pub(crate) fn replace_or_insert(&mut self, item: T, ctx: &mut CowContext<T>) -> Option<T> {
        let max_items = self.max_items();
        let mut root = match self.root.take() {
            Some(root) => root,
            None => {
                let mut root = ctx.new_node();
                root.items.push(item);
                self.root = Some(Arc::new(root));
                self.length += 1;
                return None;
            }
        };

        if root.items.len() >= max_items {
            let (middle, second) = ctx.writable_node(&mut root).split(max_items / 2, ctx);
            let mut new_root = ctx.new_node();
            new_root.items.push(middle);
            new_root.children.push(root);
            new_root.children.push(second);
            trace!(root = ?new_root.id, "split root");
            root = Arc::new(new_root);
        }

        let replaced = ctx.writable_node(&mut root).insert(item, max_items, ctx);
        self.root = Some(root);
        if replaced.is_none() {
            self.length += 1;
        }
        return replaced;
    }

    /// Remove the item chosen by `target`.
    pub(crate) fn delete_item<Q>(&mut self, target: Remove<'_, Q>, ctx: &mut CowContext<T>) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let min_items = self.min_items();
        let mut root = self.root.take()?;
        if root.items.is_empty() {
            self.root = Some(root);
            return None;
        }

        let removed = ctx.writable_node(&mut root).remove(target, min_items, ctx);

        if root.items.is_empty() && !root.is_leaf() {
            // A merge emptied the root, leaving one child to take its place.
            if let Some(child) = ctx.writable_node(&mut root).children.pop() {
                let old = mem::replace(&mut root, child);
                trace!(root = ?root.id, "collapsed root");
                ctx.free_node(old);
            }
        }

        self.root = Some(root);
        if removed.is_some() {
            self.length -= 1;
        }
        return removed;
    }

    /// Copy every node into fresh allocations from `ctx`.
    pub(crate) fn deep_copy(&self, ctx: &mut CowContext<T>) -> Snapshot<T> {
        let root = self.root().map(|root| Arc::new(root.deep_copy(ctx)));
        return Snapshot {
            degree: self.degree,
            length: self.length,
            root,
        };
    }
}

/// Return owned nodes under and including `node` to the pool.
/// Returns false once the pool is full.
fn harvest<T>(mut node: Arc<Node<T>>, ctx: &mut CowContext<T>) -> bool {
    if !ctx.is_writable(&node) {
        return true;
    }
    if let Some(inner) = Arc::get_mut(&mut node) {
        for child in inner.children.drain(..) {
            if !harvest(child, ctx) {
                return false;
            }
        }
    }
    return ctx.free_node(node) != FreeType::FreeListFull;
}

impl<T: fmt::Debug> fmt::Debug for Snapshot<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return f.debug_set().entries(self.iter()).finish();
    }
}

impl<'a, T> IntoIterator for &'a Snapshot<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        return self.iter();
    }
}
