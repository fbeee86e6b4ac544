use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::ResponseType;

/// Ordered alias -> kind mapping: the statically determined shape of one
/// result row. Produced by both the text path and the builder path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedRow {
    /// Map of output alias -> response kind, in selection order.
    pub columns: IndexMap<String, ResponseType>,
}

impl ResolvedRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a selection. A repeated alias keeps its original position but
    /// takes the newest kind (last write wins).
    pub fn insert(&mut self, alias: impl Into<String>, ty: ResponseType) {
        self.columns.insert(alias.into(), ty);
    }

    pub fn get(&self, alias: &str) -> Option<&ResponseType> {
        self.columns.get(alias)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The shape of a result row, or the permissive fallback when any stage of
/// the text path failed to recognize its input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowShape {
    /// Fully resolved: these aliases, these kinds, in this order.
    Known(ResolvedRow),
    /// Open record: unknown keys, unknown value kinds. Never an error.
    Open,
}

impl RowShape {
    pub fn is_open(&self) -> bool {
        matches!(self, RowShape::Open)
    }

    pub fn row(&self) -> Option<&ResolvedRow> {
        match self {
            RowShape::Known(row) => Some(row),
            RowShape::Open => None,
        }
    }
}

/// Response descriptor for a whole query: the engine returns
/// `{ result: [row, ...] }` where every row has this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryShape {
    pub result: RowShape,
}

impl QueryShape {
    pub fn known(row: ResolvedRow) -> Self {
        Self { result: RowShape::Known(row) }
    }

    pub fn open() -> Self {
        Self { result: RowShape::Open }
    }
}
