// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Ordered iteration.
//!
//! Two forms:
//! - `Node::walk`: a recursive, callback-driven walk that serves every
//!   ascend/descend range query. The callback returns `false` to stop.
//! - [`Iter`]: a lazy in-order cursor over a whole tree, kept as an explicit
//!   stack of `(node, index)` frames.

use std::borrow::Borrow;
use std::iter::FusedIterator;

use smallvec::SmallVec;

use crate::node::Node;

/// Walk direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Direction {
    Ascend,
    Descend,
}

/// Bounds and flags shared by every level of one walk.
pub(crate) struct Walk<'q, Q: ?Sized> {
    pub(crate) direction: Direction,
    /// First item to visit (inclusive only if `include_start`).
    pub(crate) start: Option<&'q Q>,
    /// Item at which the walk stops (always exclusive).
    pub(crate) stop: Option<&'q Q>,
    pub(crate) include_start: bool,
}

impl<T> Node<T> {
    /// Walk the subtree in `walk.direction`, calling `visit` on each item
    /// within bounds.
    ///
    /// `hit` records whether the walk has already passed its start bound,
    /// and is threaded through the recursion so a child can tell its parent.
    /// Returns `(hit, keep_going)`; once `keep_going` is false every
    /// enclosing call returns immediately.
    pub(crate) fn walk<Q, F>(&self, walk: &Walk<'_, Q>, mut hit: bool, visit: &mut F) -> (bool, bool)
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
        F: FnMut(&T) -> bool,
    {
        let mut keep_going;
        match walk.direction {
            Direction::Ascend => {
                let first = match walk.start {
                    Some(start) => self.find(start).unwrap_or_else(|i| i),
                    None => 0,
                };
                for i in first..self.items.len() {
                    let item = &self.items[i];
                    if let Some(child) = self.children.get(i) {
                        (hit, keep_going) = child.walk(walk, hit, visit);
                        if !keep_going {
                            return (hit, false);
                        }
                    }
                    if let Some(start) = walk.start {
                        if !walk.include_start && !hit && item.borrow() <= start {
                            hit = true;
                            continue;
                        }
                    }
                    hit = true;
                    if let Some(stop) = walk.stop {
                        if item.borrow() >= stop {
                            return (hit, false);
                        }
                    }
                    if !visit(item) {
                        return (hit, false);
                    }
                }
                if let Some(child) = self.children.last() {
                    (hit, keep_going) = child.walk(walk, hit, visit);
                    if !keep_going {
                        return (hit, false);
                    }
                }
            }
            Direction::Descend => {
                // Number of items at or below the start bound.
                let count = match walk.start {
                    Some(start) => match self.find(start) {
                        Ok(i) => i + 1,
                        Err(i) => i,
                    },
                    None => self.items.len(),
                };
                for i in (0..count).rev() {
                    let item = &self.items[i];
                    if let Some(start) = walk.start {
                        if item.borrow() >= start
                            && (!walk.include_start || hit || item.borrow() > start)
                        {
                            continue;
                        }
                    }
                    if let Some(child) = self.children.get(i + 1) {
                        (hit, keep_going) = child.walk(walk, hit, visit);
                        if !keep_going {
                            return (hit, false);
                        }
                    }
                    if let Some(stop) = walk.stop {
                        if item.borrow() <= stop {
                            return (hit, false);
                        }
                    }
                    hit = true;
                    if !visit(item) {
                        return (hit, false);
                    }
                }
                if let Some(child) = self.children.first() {
                    (hit, keep_going) = child.walk(walk, hit, visit);
                    if !keep_going {
                        return (hit, false);
                    }
                }
            }
        }
        return (hit, true);
    }
}

/// An ascending iterator over the items of a tree.
///
/// Created by [`Snapshot::iter`](crate::Snapshot::iter).
pub struct Iter<'a, T> {
    /// Path from the root to the next item; the index is the next item to
    /// yield within that node.
    stack: SmallVec<[(&'a Node<T>, usize); 16]>,
    remaining: usize,
}

impl<'a, T> Iter<'a, T> {
    pub(crate) fn new(root: Option<&'a Node<T>>, len: usize) -> Iter<'a, T> {
        let mut iter = Iter {
            stack: SmallVec::new(),
            remaining: len,
        };
        if let Some(root) = root {
            iter.push_leftmost(root);
        }
        return iter;
    }

    fn push_leftmost(&mut self, mut node: &'a Node<T>) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) => node = child.as_ref(),
                None => break,
            }
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        loop {
            let frame = self.stack.last_mut()?;
            let node: &'a Node<T> = frame.0;
            let index = frame.1;
            if index < node.items.len() {
                frame.1 += 1;
                if let Some(child) = node.children.get(index + 1) {
                    self.push_leftmost(child);
                }
                self.remaining -= 1;
                return Some(&node.items[index]);
            }
            self.stack.pop();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        return (self.remaining, Some(self.remaining));
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        return Iter {
            stack: self.stack.clone(),
            remaining: self.remaining,
        };
    }
}
