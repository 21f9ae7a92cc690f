// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Tree configuration.
//!
//! The degree `t` fixes the fan-out for the lifetime of a tree: every
//! non-root node holds between `t - 1` and `2t - 1` items. The free list size
//! bounds how many unused nodes are kept around for reuse.

use tracing::debug;

use crate::error::Error;
use crate::error::Result;
use crate::free_list::DEFAULT_FREE_LIST_SIZE;

/// Degree used by [`Config::default`].
pub const DEFAULT_DEGREE: usize = 32;

/// Smallest degree a tree accepts.
pub const MIN_DEGREE: usize = 2;

/// Largest degree a tree accepts. Above it `2 * degree - 1` overflows.
pub const MAX_DEGREE: usize = usize::MAX / 2;

/// Construction parameters for a tree and its node pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Branching parameter `t`.
    pub degree: usize,
    /// Maximum number of nodes kept in the free list.
    pub free_list_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        return Config {
            degree: DEFAULT_DEGREE,
            free_list_size: DEFAULT_FREE_LIST_SIZE,
        };
    }
}

impl Config {
    /// Create a config with the given degree and the default pool size.
    pub fn new(degree: usize) -> Config {
        return Config { degree, ..Config::default() };
    }

    /// Set the free list capacity.
    pub fn with_free_list_size(mut self, free_list_size: usize) -> Config {
        self.free_list_size = free_list_size;
        return self;
    }

    /// Check that a tree can be built from this config.
    pub fn validate(&self) -> Result<()> {
        return check_degree(self.degree);
    }
}

/// Max number of items per node. `degree` must have passed `check_degree`.
#[inline]
pub(crate) fn max_items(degree: usize) -> usize {
    return degree * 2 - 1;
}

/// Min number of items per non-root node.
#[inline]
pub(crate) fn min_items(degree: usize) -> usize {
    return degree - 1;
}

pub(crate) fn check_degree(degree: usize) -> Result<()> {
    if !(MIN_DEGREE..=MAX_DEGREE).contains(&degree) {
        debug!(degree, "rejecting tree degree");
        return Err(Error::InvalidDegree { degree });
    }
    return Ok(());
}
