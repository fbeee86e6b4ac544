use crate::catalog::{SchemaCatalog, TableSchema};
use crate::parser::splitter::{contains_top_level, find_keyword, keyword_positions};
use crate::parser::ResolveError;

/// Keywords that terminate a FROM or JOIN target.
const CLAUSE_KEYWORDS: &[&str] = &[
    "where", "group", "order", "limit", "having", "union", "join", "inner", "left", "right",
    "full", "cross",
];

/// A FROM/JOIN target as written: table name plus optional alias.
#[derive(Debug, Clone, PartialEq)]
pub struct TableTarget {
    pub name: String,
    pub alias: Option<String>,
}

/// Resolve everything after the top-level `from` keyword into the active
/// schema: the FROM table, merged with the single JOIN table when present.
/// More than one join is outside the dialect and fails the statement.
pub fn resolve_active_schema(
    tail: &str,
    catalog: &SchemaCatalog,
    strict: bool,
) -> Result<TableSchema, ResolveError> {
    let from_target = parse_target(&clause_text(tail)?)?;
    let from_schema = lookup(catalog, &from_target)?;

    let join_positions = keyword_positions(tail, "join")?;
    match join_positions.len() {
        0 => Ok(from_schema),
        1 => {
            let join_tail = &tail[join_positions[0] + "join".len()..];
            let join_target = parse_target(&clause_text(join_tail)?)?;
            let join_schema = lookup(catalog, &join_target)?;
            Ok(from_schema.merge_with(&join_schema, strict))
        }
        _ => Err(ResolveError::UnsupportedStatement(
            "multi-way joins beyond two tables".into(),
        )),
    }
}

/// The target text up to the next clause keyword (or `on`) or end of input.
fn clause_text(tail: &str) -> Result<String, ResolveError> {
    let mut end = tail.len();
    for keyword in CLAUSE_KEYWORDS.iter().chain(["on"].iter()) {
        if let Some(position) = find_keyword(tail, keyword)? {
            end = end.min(position);
        }
    }
    Ok(tail[..end].trim().to_string())
}

/// Parse `name`, `name alias` or `name as alias`, rejecting comma lists
/// (multi-table FROM is outside the dialect).
fn parse_target(text: &str) -> Result<TableTarget, ResolveError> {
    if text.is_empty() {
        return Err(ResolveError::UnsupportedStatement("missing table".into()));
    }
    if contains_top_level(text, ',')? {
        return Err(ResolveError::UnsupportedStatement("comma-separated tables".into()));
    }
    let tokens: Vec<&str> = text.split(' ').collect();
    match tokens.as_slice() {
        [name] => Ok(TableTarget { name: (*name).to_string(), alias: None }),
        [name, alias] => {
            Ok(TableTarget { name: (*name).to_string(), alias: Some((*alias).to_string()) })
        }
        [name, "as", alias] => {
            Ok(TableTarget { name: (*name).to_string(), alias: Some((*alias).to_string()) })
        }
        _ => Err(ResolveError::UnsupportedStatement(format!("table target '{text}'"))),
    }
}

fn lookup(catalog: &SchemaCatalog, target: &TableTarget) -> Result<TableSchema, ResolveError> {
    catalog
        .resolve(&target.name)
        .cloned()
        .ok_or_else(|| ResolveError::UnrecognizedTable(target.name.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ResponseType;

    #[test]
    fn test_bare_table() {
        let schema = resolve_active_schema("base.blocks", SchemaCatalog::base(), false).unwrap();
        assert_eq!(schema.get("block_number"), Some(&ResponseType::NumericString));
    }

    #[test]
    fn test_alias_is_stripped() {
        let schema = resolve_active_schema("base.blocks b", SchemaCatalog::base(), false).unwrap();
        assert!(schema.get("block_number").is_some());
        let schema =
            resolve_active_schema("base.blocks as b", SchemaCatalog::base(), false).unwrap();
        assert!(schema.get("block_number").is_some());
    }

    #[test]
    fn test_clause_keyword_terminates_target() {
        let schema = resolve_active_schema(
            "base.blocks where block_number > 5 limit 3",
            SchemaCatalog::base(),
            false,
        )
        .unwrap();
        assert!(schema.get("block_number").is_some());
    }

    #[test]
    fn test_join_merges_both_schemas() {
        let schema = resolve_active_schema(
            "base.blocks b join base.transactions t on b.block_number = t.block_number",
            SchemaCatalog::base(),
            false,
        )
        .unwrap();
        assert_eq!(schema.get("block_number"), Some(&ResponseType::NumericString));
        assert_eq!(schema.get("transaction_hash"), Some(&ResponseType::HexString));
    }

    #[test]
    fn test_unknown_table_is_an_error() {
        let result = resolve_active_schema("mempool", SchemaCatalog::base(), false);
        assert!(matches!(result, Err(ResolveError::UnrecognizedTable(name)) if name == "mempool"));
    }

    #[test]
    fn test_two_joins_are_unsupported() {
        let result = resolve_active_schema(
            "base.blocks b join base.transactions t on x join base.events e on y",
            SchemaCatalog::base(),
            false,
        );
        assert!(matches!(result, Err(ResolveError::UnsupportedStatement(_))));
    }

    #[test]
    fn test_comma_list_is_unsupported() {
        let result = resolve_active_schema("base.blocks, base.events", SchemaCatalog::base(), false);
        assert!(matches!(result, Err(ResolveError::UnsupportedStatement(_))));
    }
}
