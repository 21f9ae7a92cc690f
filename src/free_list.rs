// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! A bounded pool of reusable nodes.
//!
//! Repeated insert/delete cycles would otherwise allocate and drop the same
//! node vectors over and over. Freed nodes are cleared (keeping their vector
//! capacity) and parked here until the next allocation. The pool can be
//! shared by several trees, including trees written from different threads;
//! a single mutex guards push and pop and is never held while items are
//! dropped.

use std::fmt;

use parking_lot::Mutex;

use crate::node::Node;
use crate::node::NodeId;

/// Capacity of the pool created for a tree when none is supplied.
pub const DEFAULT_FREE_LIST_SIZE: usize = 32;

/// A free list of B-tree nodes.
pub struct FreeList<T> {
    inner: Mutex<Pool<T>>,
}

struct Pool<T> {
    /// Cleared nodes ready for reuse.
    nodes: Vec<Node<T>>,
    /// Maximum number of pooled nodes.
    capacity: usize,
    /// Number of nodes created because the pool was empty.
    allocated: usize,
}

impl<T> FreeList<T> {
    /// Create a free list holding at most `capacity` nodes.
    pub fn new(capacity: usize) -> FreeList<T> {
        return FreeList {
            inner: Mutex::new(Pool {
                nodes: Vec::new(),
                capacity,
                allocated: 0,
            }),
        };
    }

    /// Number of nodes currently pooled.
    pub fn len(&self) -> usize {
        return self.inner.lock().nodes.len();
    }

    /// Return true if no nodes are pooled.
    pub fn is_empty(&self) -> bool {
        return self.len() == 0;
    }

    /// Maximum number of nodes the pool keeps.
    pub fn capacity(&self) -> usize {
        return self.inner.lock().capacity;
    }

    /// Total number of nodes this pool has had to allocate fresh.
    pub fn allocated(&self) -> usize {
        return self.inner.lock().allocated;
    }

    /// Take a node from the pool, or allocate one if the pool is empty.
    /// The node always comes back with a fresh id.
    pub(crate) fn new_node(&self) -> Node<T> {
        let pooled = {
            let mut pool = self.inner.lock();
            let node = pool.nodes.pop();
            if node.is_none() {
                pool.allocated += 1;
            }
            node
        };
        return match pooled {
            Some(mut node) => {
                node.id = NodeId::next();
                node
            }
            None => Node::new(),
        };
    }

    /// Return a node to the pool.
    /// Returns false if the pool was full and the node was dropped.
    pub(crate) fn free_node(&self, mut node: Node<T>) -> bool {
        node.clear();
        let mut pool = self.inner.lock();
        if pool.nodes.len() < pool.capacity {
            pool.nodes.push(node);
            return true;
        }
        // Release the lock before the node is dropped.
        drop(pool);
        return false;
    }
}

impl<T> Default for FreeList<T> {
    fn default() -> Self {
        return FreeList::new(DEFAULT_FREE_LIST_SIZE);
    }
}

impl<T> fmt::Debug for FreeList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pool = self.inner.lock();
        return f
            .debug_struct("FreeList")
            .field("len", &pool.nodes.len())
            .field("capacity", &pool.capacity)
            .field("allocated", &pool.allocated)
            .finish();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn allocates_when_empty() {
        let free_list: FreeList<u32> = FreeList::new(4);
        assert!(free_list.is_empty());
        let a = free_list.new_node();
        let b = free_list.new_node();
        assert_ne!(a.id, b.id);
        assert_eq!(free_list.allocated(), 2);
    }

    #[test]
    fn reuses_freed_nodes() {
        let free_list: FreeList<u32> = FreeList::new(4);
        let mut node = free_list.new_node();
        node.items.extend([1, 2, 3]);
        let old_id = node.id;

        assert!(free_list.free_node(node));
        assert_eq!(free_list.len(), 1);

        let node = free_list.new_node();
        assert!(node.items.is_empty());
        assert!(node.items.capacity() >= 3);
        assert_ne!(node.id, old_id);
        assert_eq!(free_list.allocated(), 1);
        assert!(free_list.is_empty());
    }

    #[test]
    fn drops_nodes_beyond_capacity() {
        let free_list: FreeList<u32> = FreeList::new(1);
        let a = free_list.new_node();
        let b = free_list.new_node();
        assert!(free_list.free_node(a));
        assert!(!free_list.free_node(b));
        assert_eq!(free_list.len(), 1);
        assert_eq!(free_list.capacity(), 1);
    }

    #[test]
    fn huge_capacity_grows_on_demand() {
        let free_list: FreeList<u32> = FreeList::new(usize::MAX);
        assert_eq!(free_list.capacity(), usize::MAX);
        let a = free_list.new_node();
        let b = free_list.new_node();
        assert!(free_list.free_node(a));
        assert!(free_list.free_node(b));
        assert_eq!(free_list.len(), 2);
    }

    #[test]
    fn shared_between_threads() {
        let free_list: Arc<FreeList<u64>> = Arc::new(FreeList::new(64));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let free_list = free_list.clone();
                thread::spawn(move || {
                    for _ in 0..100 {
                        let node = free_list.new_node();
                        free_list.free_node(node);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(free_list.len() <= 4);
        assert!(free_list.allocated() <= 4);
    }
}
