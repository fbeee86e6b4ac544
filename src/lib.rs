//! SQL front end for a fixed catalog of blockchain-indexing tables.
//!
//! Two cooperating jobs, no execution:
//!
//! - the text path ([`resolve_query_shape`]) statically determines the
//!   column names and wire kinds of a statement's result set, degrading to a
//!   permissive open row whenever the input leaves the dialect;
//! - the structured path ([`builder::QueryScope`]) assembles a query clause
//!   by clause, tracks the row shape as construction history, and compiles
//!   the tree back to canonical SQL text for a remote engine.

pub mod catalog;
pub use catalog::{QueryShape, ResolvedRow, ResponseType, RowShape, SchemaCatalog, TableSchema};

pub mod parser;
pub use parser::{normalize, resolve_query_shape, resolve_query_shape_with, ResolveOptions};

pub mod ast;

pub mod builder;
pub use builder::{BuilderError, QueryBuilder, QueryScope, TypedExpr};

pub mod abi;
pub use abi::{resolve_parameter, AbiEvent, AbiParam};
