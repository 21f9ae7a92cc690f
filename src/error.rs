// model = "claude-opus-4-5"
// created = "2026-10-18"
// modified = "2026-10-18"
// driver = "Isaac Clayton"

//! Error types for tree construction and validation.
//!
//! Absence is never an error: lookups and deletes report a missing item as
//! `None`. The only fatal condition reachable through the public API is a
//! bad degree.

use thiserror::Error;

use crate::config::MAX_DEGREE;
use crate::config::MIN_DEGREE;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when building or checking a tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A tree needs at least 2-way branching, and `2 * degree - 1` must fit
    /// in a `usize`.
    #[error("invalid degree {degree}: must be between {} and {}", MIN_DEGREE, MAX_DEGREE)]
    InvalidDegree { degree: usize },

    /// A structural invariant does not hold.
    #[error("tree corrupted: {reason}")]
    Corrupted { reason: String },
}

impl Error {
    pub(crate) fn corrupted(reason: impl Into<String>) -> Error {
        return Error::Corrupted { reason: reason.into() };
    }
}
