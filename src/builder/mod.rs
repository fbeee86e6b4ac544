//! The structured path: assemble a query clause by clause, tracking the row
//! shape as construction history, then compile to canonical SQL text.
//!
//! Every construction call returns a new, independent value; nothing
//! previously returned is ever mutated, so a partially built query can be
//! branched freely. Table, join and sub-query names are validated on entry;
//! a successfully constructed builder always compiles.

use std::fmt::Display;

pub mod scope;
pub use scope::*;

pub mod query_builder;
pub use query_builder::*;

/// Construction-time validation failure. The structured API cannot produce a
/// malformed tree; these are the only ways to be turned away.
#[derive(Debug, Clone, PartialEq)]
pub enum BuilderError {
    UnknownTable(String),
    InvalidName(String),
    DuplicateCte(String),
    /// The dialect supports at most one join.
    JoinLimit,
    CteChainTooLong,
}

impl Display for BuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownTable(name) => write!(f, "unknown table '{name}'"),
            Self::InvalidName(name) => write!(f, "invalid name '{name}'"),
            Self::DuplicateCte(name) => write!(f, "duplicate sub-query name '{name}'"),
            Self::JoinLimit => write!(f, "the dialect supports a single two-table join"),
            Self::CteChainTooLong => write!(f, "too many chained sub-queries"),
        }
    }
}
