// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! A single-owner mutable B-tree.
//!
//! [`BTree`] runs the same engine as [`Builder`](crate::Builder) with
//! ownership tracking switched off: every node belongs to the tree and is
//! mutated in place. Nodes come from a [`FreeList`] that several trees may
//! share.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use crate::config::Config;
use crate::context::CowContext;
use crate::error::Result;
use crate::free_list::DEFAULT_FREE_LIST_SIZE;
use crate::free_list::FreeList;
use crate::node::Remove;
use crate::snapshot::Snapshot;

/// An ordered set of `T` stored in a B-tree.
///
/// ```
/// use bough::BTree;
///
/// let mut tree = BTree::new(4).unwrap();
/// for word in ["pear", "apple", "fig"] {
///     tree.replace_or_insert(word.to_string());
/// }
/// assert_eq!(tree.min().map(String::as_str), Some("apple"));
/// assert_eq!(tree.delete("fig"), Some("fig".to_string()));
///
/// let mut words = Vec::new();
/// tree.descend(|word| {
///     words.push(word.clone());
///     return true;
/// });
/// assert_eq!(words, ["pear", "apple"]);
/// ```
pub struct BTree<T> {
    tree: Snapshot<T>,
    ctx: CowContext<T>,
}

impl<T> BTree<T> {
    /// Create an empty tree of the given degree with its own pool.
    pub fn new(degree: usize) -> Result<BTree<T>> {
        return BTree::with_free_list(degree, Arc::new(FreeList::new(DEFAULT_FREE_LIST_SIZE)));
    }

    /// Create an empty tree of the given degree that draws nodes from
    /// `free_list`.
    pub fn with_free_list(degree: usize, free_list: Arc<FreeList<T>>) -> Result<BTree<T>> {
        return Ok(BTree {
            tree: Snapshot::new(degree)?,
            ctx: CowContext::new(free_list),
        });
    }

    /// Create an empty tree from `config`.
    pub fn with_config(config: &Config) -> Result<BTree<T>> {
        config.validate()?;
        let free_list = Arc::new(FreeList::new(config.free_list_size));
        return BTree::with_free_list(config.degree, free_list);
    }

    /// Remove every item.
    ///
    /// Without `add_nodes_to_free_list` this is O(1): the nodes are simply
    /// dropped. Otherwise nodes are returned to the pool until it is full,
    /// which costs O(pool size).
    pub fn clear(&mut self, add_nodes_to_free_list: bool) {
        self.tree.clear(add_nodes_to_free_list, &mut self.ctx);
    }

    /// The pool this tree allocates from.
    pub fn free_list(&self) -> &Arc<FreeList<T>> {
        return self.ctx.free_list();
    }
}

impl<T: Ord + Clone> BTree<T> {
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

/// Copies every node. The copy draws from, and frees into, the same pool.
impl<T: Ord + Clone> Clone for BTree<T> {
    fn clone(&self) -> Self {
        let mut ctx = CowContext::new(self.ctx.free_list().clone());
        let tree = self.tree.deep_copy(&mut ctx);
        return BTree { tree, ctx };
    }
}

impl<T: Ord + Clone> Extend<T> for BTree<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.replace_or_insert(item);
        }
    }
}

impl<T> Deref for BTree<T> {
    type Target = Snapshot<T>;

    fn deref(&self) -> &Snapshot<T> {
        return &self.tree;
    }
}

impl<T: fmt::Debug> fmt::Debug for BTree<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        return fmt::Debug::fmt(&self.tree, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn constructors_check_degree() {
        assert_eq!(BTree::<u8>::new(1).err(), Some(Error::InvalidDegree { degree: 1 }));
        let config = Config::new(0);
        assert!(BTree::<u8>::with_config(&config).is_err());
        assert_eq!(
            BTree::<u8>::new(usize::MAX).err(),
            Some(Error::InvalidDegree { degree: usize::MAX })
        );
        let huge_pool = Config::new(4).with_free_list_size(usize::MAX);
        assert!(BTree::<u8>::with_config(&huge_pool).is_ok());

        let tree = BTree::<u8>::with_config(&Config::new(3).with_free_list_size(7)).unwrap();
        assert_eq!(tree.degree(), 3);
        assert_eq!(tree.free_list().capacity(), 7);
    }

    #[test]
    fn clone_is_independent() {
        let mut tree = BTree::new(2).unwrap();
        tree.extend(0..30u32);
        let mut copy = tree.clone();
        copy.delete(&3);
        copy.replace_or_insert(99);
        tree.delete_max();

        assert_eq!(tree.len(), 29);
        assert!(tree.has(&3));
        assert!(!tree.has(&99));
        assert_eq!(copy.len(), 30);
        assert_eq!(copy.max(), Some(&99));
        assert!(Arc::ptr_eq(tree.free_list(), copy.free_list()));
        assert_eq!(tree.validate(), Ok(()));
        assert_eq!(copy.validate(), Ok(()));
    }

    #[test]
    fn merges_return_nodes_to_pool() {
        let mut tree = BTree::with_free_list(2, Arc::new(FreeList::new(64))).unwrap();
        tree.extend(0..40u32);
        assert!(tree.free_list().is_empty());
        for item in 0..40u32 {
            assert_eq!(tree.delete(&item), Some(item));
        }
        assert!(!tree.free_list().is_empty());
    }

    #[test]
    fn debug_renders_set() {
        let mut tree = BTree::new(2).unwrap();
        tree.extend([5u32, 1, 3]);
        assert_eq!(format!("{tree:?}"), "{1, 3, 5}");
    }
}
