use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::catalog::{ResolvedRow, ResponseType};

/// Declared shape of one table: an ordered column name -> kind map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    pub name: String,
    /// Map of column name -> response kind, in declaration order.
    pub columns: IndexMap<String, ResponseType>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), columns: IndexMap::new() }
    }

    /// Build a schema from `(column, dialect type name)` declarations.
    ///
    /// Unparseable type names degrade to `Unknown` rather than failing the
    /// whole declaration.
    pub fn from_columns(name: &str, columns: &[(&str, &str)]) -> Self {
        let mut schema = TableSchema::new(name);
        for (column, type_name) in columns {
            let ty = ResponseType::parse(type_name).unwrap_or(ResponseType::Unknown);
            schema.columns.insert((*column).to_string(), ty);
        }
        schema
    }

    /// Build a virtual schema from a previously resolved row shape. Used to
    /// expose a chained sub-query (CTE) as a table.
    pub fn from_row(name: &str, row: &ResolvedRow) -> Self {
        Self { name: name.to_string(), columns: row.columns.clone() }
    }

    pub fn get(&self, column: &str) -> Option<&ResponseType> {
        self.columns.get(column)
    }

    /// Merge another table's schema into this one for a two-table join.
    ///
    /// Columns owned by a single side keep that side's kind; a name present on
    /// both sides takes the union of both kinds. Coverage is commutative.
    pub fn merge(&self, other: &TableSchema) -> TableSchema {
        self.merge_with(other, false)
    }

    /// Merge as [`merge`](Self::merge), but in strict mode a collision whose
    /// kinds disagree resolves to `Unknown` and logs the ambiguity instead of
    /// keeping the permissive union.
    pub fn merge_with(&self, other: &TableSchema, strict: bool) -> TableSchema {
        let mut merged = TableSchema::new(self.name.clone());
        for (column, ty) in &self.columns {
            let ty = match other.columns.get(column) {
                None => ty.clone(),
                Some(theirs) if theirs == ty => ty.clone(),
                Some(theirs) => {
                    if strict {
                        tracing::warn!(
                            column = %column,
                            left = %self.name,
                            right = %other.name,
                            "ambiguous unqualified column across joined tables"
                        );
                        ResponseType::Unknown
                    } else {
                        ResponseType::union(ty.clone(), theirs.clone())
                    }
                }
            };
            merged.columns.insert(column.clone(), ty);
        }
        for (column, ty) in &other.columns {
            if !merged.columns.contains_key(column) {
                merged.columns.insert(column.clone(), ty.clone());
            }
        }
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn left() -> TableSchema {
        TableSchema::from_columns("left", &[("id", "uint64"), ("tag", "string")])
    }

    fn right() -> TableSchema {
        TableSchema::from_columns("right", &[("id", "uint64"), ("tag", "hash"), ("extra", "bool")])
    }

    #[test]
    fn test_merge_keeps_single_owner_columns() {
        let merged = left().merge(&right());
        assert_eq!(merged.get("extra"), Some(&ResponseType::Boolean));
    }

    #[test]
    fn test_merge_agreeing_collision_stays_plain() {
        let merged = left().merge(&right());
        assert_eq!(merged.get("id"), Some(&ResponseType::NumericString));
    }

    #[test]
    fn test_merge_disagreeing_collision_unions() {
        let merged = left().merge(&right());
        let constituents = merged.get("tag").unwrap().constituents();
        assert_eq!(constituents.len(), 2);
        assert!(constituents.contains(&ResponseType::PlainString));
        assert!(constituents.contains(&ResponseType::HexString));
    }

    #[test]
    fn test_merge_coverage_is_commutative() {
        let ab = left().merge(&right());
        let ba = right().merge(&left());
        assert_eq!(ab.columns.len(), ba.columns.len());
        for (column, ty) in &ab.columns {
            let mut lhs = ty.constituents();
            let mut rhs = ba.get(column).unwrap().constituents();
            lhs.sort_by_key(|t| format!("{t:?}"));
            rhs.sort_by_key(|t| format!("{t:?}"));
            assert_eq!(lhs, rhs, "column {column}");
        }
    }

    #[test]
    fn test_strict_merge_flags_disagreeing_collision() {
        let merged = left().merge_with(&right(), true);
        assert_eq!(merged.get("tag"), Some(&ResponseType::Unknown));
        // agreeing collisions are untouched by strict mode
        assert_eq!(merged.get("id"), Some(&ResponseType::NumericString));
    }
}
