// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! B-tree nodes and the balancing engine.
//!
//! Structure:
//! - Each node stores a sorted `Vec` of items and either no children (leaf)
//!   or exactly `items.len() + 1` children (internal)
//! - Children are reference-counted slots, so a node can be shared between
//!   several snapshots until a write forces a copy
//! - All node acquisition goes through a [`CowContext`], which decides
//!   whether a node may be mutated in place or has to be cloned first
//!
//! Rebalancing is top-down: insert splits a full child *before* descending
//! into it, and remove grows a minimal child *before* descending into it, so
//! the recursive call never has to fix up its parent afterwards.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering as AtomicOrdering;

use tracing::trace;

use crate::context::CowContext;
use crate::error::Error;
use crate::error::Result;

static NEXT_NODE_ID: AtomicU64 = AtomicU64::new(0);

/// Identity of a node allocation, used by the ownership set.
///
/// Minted fresh every time a node leaves the pool, so an id is never shared
/// by two live allocations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u64);

impl NodeId {
    pub(crate) fn next() -> NodeId {
        return NodeId(NEXT_NODE_ID.fetch_add(1, AtomicOrdering::Relaxed));
    }
}

/// A node in the tree.
///
/// Invariant: either `children` is empty, or
/// `children.len() == items.len() + 1`.
#[derive(Clone, Debug)]
pub(crate) struct Node<T> {
    pub(crate) id: NodeId,
    pub(crate) items: Vec<T>,
    pub(crate) children: Vec<Arc<Node<T>>>,
}

/// What a `remove` call should take out of a subtree.
pub(crate) enum Remove<'a, Q: ?Sized> {
    /// The item equal to the given key.
    Item(&'a Q),
    /// The smallest item.
    Min,
    /// The largest item.
    Max,
}

impl<Q: ?Sized> Clone for Remove<'_, Q> {
    fn clone(&self) -> Self {
        return *self;
    }
}

impl<Q: ?Sized> Copy for Remove<'_, Q> {}

impl<T> Node<T> {
    pub(crate) fn new() -> Node<T> {
        return Node {
            id: NodeId::next(),
            items: Vec::new(),
            children: Vec::new(),
        };
    }

    #[inline(always)]
    pub(crate) fn is_leaf(&self) -> bool {
        return self.children.is_empty();
    }

    /// Drop contents but keep the allocated capacity.
    pub(crate) fn clear(&mut self) {
        self.items.clear();
        self.children.clear();
    }

    /// Binary search for `key`.
    /// Returns `Ok(index)` if an equal item is stored at `index`, otherwise
    /// `Err(index)` with the position where it would be inserted, which is
    /// also the child slot to descend into.
    #[inline]
    pub(crate) fn find<Q>(&self, key: &Q) -> std::result::Result<usize, usize>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        return self.items.binary_search_by(|probe| probe.borrow().cmp(key));
    }

    /// Find the item equal to `key` in this subtree.
    pub(crate) fn get<Q>(&self, key: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut node = self;
        loop {
            match node.find(key) {
                Ok(i) => return Some(&node.items[i]),
                Err(i) => match node.children.get(i) {
                    Some(child) => node = child.as_ref(),
                    None => return None,
                },
            }
        }
    }

    /// Check every structural invariant of the subtree rooted here.
    /// Returns the number of items in the subtree.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn check<'a>(
        &'a self,
        is_root: bool,
        min_items: usize,
        max_items: usize,
        lower: Option<&'a T>,
        upper: Option<&'a T>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<usize>
    where
        T: Ord,
    {
        let len = self.items.len();
        if len > max_items {
            return Err(Error::corrupted(format!("node holds {len} items, max is {max_items}")));
        }
        if !is_root && len < min_items {
            return Err(Error::corrupted(format!("node holds {len} items, min is {min_items}")));
        }
        if self.items.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(Error::corrupted("items within a node are not strictly increasing"));
        }
        if let (Some(lower), Some(first)) = (lower, self.items.first()) {
            if first <= lower {
                return Err(Error::corrupted("item not greater than its left separator"));
            }
        }
        if let (Some(upper), Some(last)) = (upper, self.items.last()) {
            if last >= upper {
                return Err(Error::corrupted("item not less than its right separator"));
            }
        }

        if self.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(Error::corrupted(format!(
                        "leaf at depth {depth}, expected {expected}"
                    )));
                }
                Some(_) => {}
            }
            return Ok(len);
        }

        if len == 0 {
            return Err(Error::corrupted("internal node without items"));
        }
        if self.children.len() != len + 1 {
            return Err(Error::corrupted(format!(
                "internal node has {} children for {len} items",
                self.children.len()
            )));
        }

        let mut count = len;
        for (i, child) in self.children.iter().enumerate() {
            let child_lower = if i == 0 { lower } else { Some(&self.items[i - 1]) };
            let child_upper = if i == len { upper } else { Some(&self.items[i]) };
            count += child.check(
                false,
                min_items,
                max_items,
                child_lower,
                child_upper,
                depth + 1,
                leaf_depth,
            )?;
        }
        return Ok(count);
    }
}

impl<T: Ord + Clone> Node<T> {
    /// Split this node at `i`.
    /// The node keeps its first `i` items and `i + 1` children; the item at
    /// `i` and a new node holding everything after it are returned.
    pub(crate) fn split(&mut self, i: usize, ctx: &mut CowContext<T>) -> (T, Arc<Node<T>>) {
        let mut next = ctx.new_node();
        next.items.extend(self.items.drain(i + 1..));
        let item = self.items.remove(i);
        if !self.is_leaf() {
            next.children.extend(self.children.drain(i + 1..));
        }
        return (item, Arc::new(next));
    }

    /// Split child `i` if it is full.
    /// Returns whether a split happened.
    pub(crate) fn maybe_split_child(
        &mut self,
        i: usize,
        max_items: usize,
        ctx: &mut CowContext<T>,
    ) -> bool {
        if self.children[i].items.len() < max_items {
            return false;
        }
        let first = ctx.writable_node(&mut self.children[i]);
        let (item, second) = first.split(max_items / 2, ctx);
        self.items.insert(i, item);
        self.children.insert(i + 1, second);
        return true;
    }

    /// Insert `item` into the subtree rooted here, keeping every node at or
    /// below `max_items`. An equal item already present is replaced and
    /// returned.
    pub(crate) fn insert(&mut self, item: T, max_items: usize, ctx: &mut CowContext<T>) -> Option<T> {
        let mut i = match self.find(&item) {
            Ok(i) => return Some(mem::replace(&mut self.items[i], item)),
            Err(i) => i,
        };
        if self.is_leaf() {
            self.items.insert(i, item);
            return None;
        }
        if self.maybe_split_child(i, max_items, ctx) {
            match item.cmp(&self.items[i]) {
                // First half of the split.
                Ordering::Less => {}
                Ordering::Greater => i += 1,
                Ordering::Equal => return Some(mem::replace(&mut self.items[i], item)),
            }
        }
        let child = ctx.writable_node(&mut self.children[i]);
        return child.insert(item, max_items, ctx);
    }

    /// Remove an item from the subtree rooted here.
    ///
    /// The node itself must already be writable. Every child is grown to
    /// more than `min_items` before the call descends into it.
    pub(crate) fn remove<Q>(
        &mut self,
        target: Remove<'_, Q>,
        min_items: usize,
        ctx: &mut CowContext<T>,
    ) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut found = false;
        let i = match target {
            Remove::Max => {
                if self.is_leaf() {
                    return self.items.pop();
                }
                self.items.len()
            }
            Remove::Min => {
                if self.is_leaf() {
                    if self.items.is_empty() {
                        return None;
                    }
                    return Some(self.items.remove(0));
                }
                0
            }
            Remove::Item(key) => {
                let (i, hit) = match self.find(key) {
                    Ok(i) => (i, true),
                    Err(i) => (i, false),
                };
                if self.is_leaf() {
                    if hit {
                        return Some(self.items.remove(i));
                    }
                    return None;
                }
                found = hit;
                i
            }
        };

        if self.children[i].items.len() <= min_items {
            return self.grow_child_and_remove(i, target, min_items, ctx);
        }

        let child = ctx.writable_node(&mut self.children[i]);
        if found {
            // Replace the item with its in-order predecessor, the largest
            // item of the left child, which can spare one.
            let predecessor = child.remove(Remove::<Q>::Max, min_items, ctx)?;
            return Some(mem::replace(&mut self.items[i], predecessor));
        }
        return child.remove(target, min_items, ctx);
    }

    /// Grow child `i` so it holds more than `min_items`, then retry `remove`.
    ///
    /// Whether the item lives in this node or in the child, the fix is the
    /// same: borrow an item from the left sibling, else from the right
    /// sibling, else merge with a sibling. The retried call then always finds
    /// a child that can spare an item.
    pub(crate) fn grow_child_and_remove<Q>(
        &mut self,
        i: usize,
        target: Remove<'_, Q>,
        min_items: usize,
        ctx: &mut CowContext<T>,
    ) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        if i > 0 && self.children[i - 1].items.len() > min_items {
            self.steal_from_left(i, ctx);
        } else if i < self.items.len() && self.children[i + 1].items.len() > min_items {
            self.steal_from_right(i, ctx);
        } else {
            let i = if i >= self.items.len() { i - 1 } else { i };
            self.merge_children(i, ctx);
        }
        return self.remove(target, min_items, ctx);
    }

    /// Rotate the last item of child `i - 1` through separator `i - 1` into
    /// the front of child `i`.
    fn steal_from_left(&mut self, i: usize, ctx: &mut CowContext<T>) {
        let (left, right) = self.children.split_at_mut(i);
        let steal_from = ctx.writable_node(&mut left[i - 1]);
        let child = ctx.writable_node(&mut right[0]);
        if let Some(stolen) = steal_from.items.pop() {
            let separator = mem::replace(&mut self.items[i - 1], stolen);
            child.items.insert(0, separator);
            if let Some(grandchild) = steal_from.children.pop() {
                child.children.insert(0, grandchild);
            }
        }
    }

    /// Rotate the first item of child `i + 1` through separator `i` onto the
    /// end of child `i`.
    fn steal_from_right(&mut self, i: usize, ctx: &mut CowContext<T>) {
        let (left, right) = self.children.split_at_mut(i + 1);
        let child = ctx.writable_node(&mut left[i]);
        let steal_from = ctx.writable_node(&mut right[0]);
        let stolen = steal_from.items.remove(0);
        let separator = mem::replace(&mut self.items[i], stolen);
        child.items.push(separator);
        if !steal_from.is_leaf() {
            child.children.push(steal_from.children.remove(0));
        }
    }

    /// Fold separator `i` and child `i + 1` into child `i`, freeing the
    /// absorbed node.
    fn merge_children(&mut self, i: usize, ctx: &mut CowContext<T>) {
        let separator = self.items.remove(i);
        let mut absorbed = self.children.remove(i + 1);
        trace!(index = i, node = ?self.id, "merging children");

        let child = ctx.writable_node(&mut self.children[i]);
        child.items.push(separator);
        if ctx.is_writable(&absorbed) {
            // Owned outright, so the contents can be moved instead of cloned.
            let absorbed = Arc::make_mut(&mut absorbed);
            child.items.append(&mut absorbed.items);
            child.children.append(&mut absorbed.children);
        } else {
            child.items.extend(absorbed.items.iter().cloned());
            child.children.extend(absorbed.children.iter().cloned());
        }
        ctx.free_node(absorbed);
    }

    /// Copy the whole subtree into freshly allocated nodes.
    pub(crate) fn deep_copy(&self, ctx: &mut CowContext<T>) -> Node<T> {
        let mut copy = ctx.new_node();
        copy.items.extend(self.items.iter().cloned());
        for child in &self.children {
            let child = child.deep_copy(ctx);
            copy.children.push(Arc::new(child));
        }
        return copy;
    }
}

/// The smallest item in the subtree, if any.
pub(crate) fn min<T>(node: Option<&Node<T>>) -> Option<&T> {
    let mut node = node?;
    while let Some(child) = node.children.first() {
        node = child.as_ref();
    }
    return node.items.first();
}

/// The largest item in the subtree, if any.
pub(crate) fn max<T>(node: Option<&Node<T>>) -> Option<&T> {
    let mut node = node?;
    while let Some(child) = node.children.last() {
        node = child.as_ref();
    }
    return node.items.last();
}
