// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Bough - An in-memory B-tree with copy-on-write snapshots.
//!
//! # Quick Start
//!
//! ```
//! use bough::{BTree, Builder, Snapshot};
//!
//! // A plain mutable tree
//! let mut tree = BTree::new(3).unwrap();
//! tree.extend(0..10);
//! assert_eq!(tree.delete_min(), Some(0));
//! assert_eq!(tree.len(), 9);
//!
//! // Cheap versions derived from a shared base
//! let mut builder = Builder::new(&Snapshot::new(3).unwrap());
//! builder.replace_or_insert("a");
//! let base = builder.build();
//! builder.replace_or_insert("b");
//! let next = builder.build();
//! assert_eq!(base.len(), 1);
//! assert_eq!(next.len(), 2);
//! ```
//!
//! # Layout
//!
//! - `node`: node storage and the top-down split/merge/steal engine
//! - [`iter`]: range walks and the in-order cursor
//! - [`free_list`]: the bounded node pool
//! - `context`: ownership tracking for copy-on-write
//! - [`Snapshot`], [`Builder`], [`BTree`]: the public trees

pub mod builder;
pub mod btree;
pub mod config;
pub(crate) mod context;
pub mod error;
pub mod free_list;
pub mod iter;
pub(crate) mod node;
pub mod snapshot;

pub use builder::Builder;
pub use btree::BTree;
pub use config::Config;
pub use config::DEFAULT_DEGREE;
pub use config::MAX_DEGREE;
pub use config::MIN_DEGREE;
pub use error::Error;
pub use error::Result;
pub use free_list::DEFAULT_FREE_LIST_SIZE;
pub use free_list::FreeList;
pub use iter::Iter;
pub use snapshot::Snapshot;
