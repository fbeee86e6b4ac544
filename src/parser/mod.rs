//! The text path: raw SQL in, statically determined row shape out.
//!
//! Resolution is total. Any stage that fails to recognize its input converts
//! the whole output to the permissive open row; partial results are never
//! returned, and nothing here panics or surfaces an error to the caller.

use std::fmt::Display;

pub mod normalizer;
pub use normalizer::*;

pub mod splitter;

pub mod select_item;
pub use select_item::*;

pub mod table_resolver;
pub use table_resolver::*;

pub mod type_resolver;
pub use type_resolver::*;

use crate::catalog::{QueryShape, ResolvedRow, SchemaCatalog, TableSchema};
use crate::parser::splitter::{find_keyword, peel_ctes};

/// Why a statement degraded to the open row. Internal to the text path; the
/// public boundary logs it and returns the fallback.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    UnrecognizedTable(String),
    UnsupportedStatement(String),
    UnbalancedDelimiters,
    DepthExceeded,
}

impl Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnrecognizedTable(name) => write!(f, "unrecognized table '{name}'"),
            Self::UnsupportedStatement(what) => write!(f, "unsupported statement: {what}"),
            Self::UnbalancedDelimiters => write!(f, "unbalanced parentheses, brackets or quotes"),
            Self::DepthExceeded => write!(f, "nesting depth limit exceeded"),
        }
    }
}

/// Knobs for the text path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Resolve join column collisions with disagreeing types to `Unknown`
    /// (with a warning) instead of the permissive union.
    pub strict_collisions: bool,
}

/// Statically determine the result shape of one SQL statement.
///
/// Returns the ordered alias -> kind row wrapped as a query response
/// descriptor, or the open fallback when any stage fails to match the
/// dialect. Never an error, for any input.
pub fn resolve_query_shape(sql: &str, catalog: &SchemaCatalog) -> QueryShape {
    resolve_query_shape_with(sql, catalog, ResolveOptions::default())
}

/// As [`resolve_query_shape`], with explicit options.
pub fn resolve_query_shape_with(
    sql: &str,
    catalog: &SchemaCatalog,
    options: ResolveOptions,
) -> QueryShape {
    let text = normalize(sql);
    match resolve_statement(&text, catalog, options, 0) {
        Ok(row) => QueryShape::known(row),
        Err(error) => {
            tracing::debug!(%error, statement = %text, "degrading to the open row shape");
            QueryShape::open()
        }
    }
}

/// Sub-query recursion bound: a CTE body is itself a full statement.
const MAX_STATEMENT_DEPTH: usize = 16;

fn resolve_statement(
    text: &str,
    catalog: &SchemaCatalog,
    options: ResolveOptions,
    depth: usize,
) -> Result<ResolvedRow, ResolveError> {
    if depth > MAX_STATEMENT_DEPTH {
        return Err(ResolveError::DepthExceeded);
    }
    if text.is_empty() {
        return Err(ResolveError::UnsupportedStatement("empty statement".into()));
    }

    let (ctes, body) = peel_ctes(text)?;
    if ctes.is_empty() {
        return resolve_select(text, catalog, options);
    }

    // each named sub-query sees the catalog plus every earlier sub-query
    let mut scoped = catalog.clone();
    for (name, cte_body) in &ctes {
        let row = resolve_statement(cte_body, &scoped, options, depth + 1)?;
        scoped.register_virtual(TableSchema::from_row(name, &row));
    }
    resolve_select(&body, &scoped, options)
}

fn resolve_select(
    text: &str,
    catalog: &SchemaCatalog,
    options: ResolveOptions,
) -> Result<ResolvedRow, ResolveError> {
    let body = text
        .strip_prefix("select ")
        .ok_or_else(|| ResolveError::UnsupportedStatement("not a select statement".into()))?;

    if find_keyword(body, "union")?.is_some() {
        return Err(ResolveError::UnsupportedStatement("union".into()));
    }

    let from_at = find_keyword(body, "from")?
        .ok_or_else(|| ResolveError::UnsupportedStatement("missing from clause".into()))?;
    let select_clause = body[..from_at].trim();
    let tail = body[from_at + "from".len()..].trim();

    let schema = resolve_active_schema(tail, catalog, options.strict_collisions)?;

    let mut row = ResolvedRow::new();
    match parse_projection(select_clause)? {
        Projection::Star => {
            for column in schema.columns.keys() {
                row.insert(column.clone(), resolve_expr_type(column, &schema));
            }
        }
        Projection::Items(items) => {
            for item in items {
                row.insert(item.alias, resolve_expr_type(&item.expression, &schema));
            }
        }
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ResponseType, RowShape};

    fn shape(sql: &str) -> QueryShape {
        resolve_query_shape(sql, SchemaCatalog::base())
    }

    fn known(sql: &str) -> ResolvedRow {
        match shape(sql).result {
            RowShape::Known(row) => row,
            RowShape::Open => panic!("expected a known shape for: {sql}"),
        }
    }

    #[test]
    fn test_single_column() {
        let row = known("SELECT block_number FROM base.blocks");
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("block_number"), Some(&ResponseType::NumericString));
    }

    #[test]
    fn test_star_expands_the_whole_schema() {
        let row = known("SELECT * FROM base.events");
        assert_eq!(row.get("event_name"), Some(&ResponseType::PlainString));
        assert_eq!(
            row.get("topics"),
            Some(&ResponseType::Array(Box::new(ResponseType::HexString)))
        );
        assert_eq!(
            row.get("parameters"),
            Some(&ResponseType::Map(
                Box::new(ResponseType::PlainString),
                Box::new(ResponseType::Variant)
            ))
        );
    }

    #[test]
    fn test_two_table_join() {
        let row = known(
            "SELECT b.block_number, t.transaction_hash \
             FROM base.blocks b \
             JOIN base.transactions t ON b.block_number = t.block_number",
        );
        assert_eq!(row.len(), 2);
        assert_eq!(row.get("block_number"), Some(&ResponseType::NumericString));
        assert_eq!(row.get("transaction_hash"), Some(&ResponseType::HexString));
    }

    #[test]
    fn test_unknown_table_falls_back_to_open() {
        assert_eq!(shape("SELECT col FROM unknown_table").result, RowShape::Open);
    }

    #[test]
    fn test_totality_on_arbitrary_input() {
        for sql in [
            "",
            ";",
            "not sql at all",
            "DELETE FROM base.blocks",
            "SELECT FROM",
            "SELECT a FROM",
            "SELECT (((( FROM base.blocks",
            "SELECT a FROM base.blocks UNION SELECT b FROM base.events",
        ] {
            assert_eq!(shape(sql).result, RowShape::Open, "input: {sql:?}");
        }
    }

    #[test]
    fn test_aliases_casts_and_aggregates() {
        let row = known(
            "SELECT count(*) AS transfers, cast(amount as numeric) AS amount, \
             amount::string, min(block_number) FROM base.transfers",
        );
        assert_eq!(row.get("transfers"), Some(&ResponseType::NumericString));
        assert_eq!(row.get("amount"), Some(&ResponseType::NumericString));
        assert_eq!(row.get("amount::string"), Some(&ResponseType::PlainString));
        assert_eq!(row.get("min(block_number)"), Some(&ResponseType::NumericString));
    }

    #[test]
    fn test_map_parameter_projection() {
        let row = known("SELECT parameters['from'] FROM base.events WHERE event_name = 'Transfer'");
        assert_eq!(row.get("parameters['from']"), Some(&ResponseType::Variant));
    }

    #[test]
    fn test_join_collision_takes_the_union() {
        let catalog = SchemaCatalog::from_tables(
            "base",
            vec![
                TableSchema::from_columns("a", &[("shared", "uint256"), ("only_a", "bool")]),
                TableSchema::from_columns("b", &[("shared", "address"), ("only_b", "string")]),
            ],
        );
        let shape = resolve_query_shape("SELECT shared FROM a JOIN b ON only_a", &catalog);
        let row = shape.result.row().unwrap().clone();
        let constituents = row.get("shared").unwrap().constituents();
        assert!(constituents.contains(&ResponseType::NumericString));
        assert!(constituents.contains(&ResponseType::HexString));

        // reversed join order covers the same set
        let reversed = resolve_query_shape("SELECT shared FROM b JOIN a ON only_a", &catalog);
        let reversed_row = reversed.result.row().unwrap().clone();
        let mut lhs = constituents;
        let mut rhs = reversed_row.get("shared").unwrap().constituents();
        lhs.sort_by_key(|t| format!("{t:?}"));
        rhs.sort_by_key(|t| format!("{t:?}"));
        assert_eq!(lhs, rhs);
    }

    #[test]
    fn test_strict_mode_flags_collision() {
        let catalog = SchemaCatalog::from_tables(
            "base",
            vec![
                TableSchema::from_columns("a", &[("shared", "uint256"), ("key", "uint64")]),
                TableSchema::from_columns("b", &[("shared", "address"), ("key", "uint64")]),
            ],
        );
        let options = ResolveOptions { strict_collisions: true };
        let shape =
            resolve_query_shape_with("SELECT shared, key FROM a JOIN b ON key", &catalog, options);
        let row = shape.result.row().unwrap().clone();
        assert_eq!(row.get("shared"), Some(&ResponseType::Unknown));
        // agreeing types are untouched in strict mode
        assert_eq!(row.get("key"), Some(&ResponseType::NumericString));
    }

    #[test]
    fn test_cte_shape_is_visible_to_the_outer_query() {
        let row = known(
            "WITH hot AS (SELECT block_number AS height, gas_used FROM base.blocks) \
             SELECT height FROM hot",
        );
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("height"), Some(&ResponseType::NumericString));
    }

    #[test]
    fn test_cte_transitivity() {
        let row = known(
            "WITH a AS (SELECT block_number AS height FROM base.blocks), \
             b AS (SELECT height FROM a) \
             SELECT height FROM b",
        );
        assert_eq!(row.get("height"), Some(&ResponseType::NumericString));
    }

    #[test]
    fn test_unresolvable_cte_fails_the_whole_statement() {
        assert_eq!(
            shape("WITH a AS (SELECT x FROM nowhere) SELECT * FROM a").result,
            RowShape::Open
        );
    }

    #[test]
    fn test_unknown_expression_degrades_per_item_not_whole_query() {
        let row = known("SELECT block_number, gas_used + 1 FROM base.blocks");
        assert_eq!(row.get("block_number"), Some(&ResponseType::NumericString));
        assert_eq!(row.get("gas_used + 1"), Some(&ResponseType::Unknown));
    }
}
