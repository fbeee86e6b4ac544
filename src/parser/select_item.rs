use crate::parser::splitter::{keyword_positions, split_qualifier, split_top_level};
use crate::parser::ResolveError;

/// One projection entry: the expression text and its output alias. The alias
/// is always present, explicit or inferred.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectItem {
    pub expression: String,
    pub alias: String,
}

/// The parsed projection clause: either a star projection or the ordered
/// item list.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Star,
    Items(Vec<SelectItem>),
}

/// Parse the text between `SELECT` and `FROM`, already normalized. A leading
/// `distinct` keyword is skipped; an item that is exactly `*` makes the whole
/// projection a star.
pub fn parse_projection(clause: &str) -> Result<Projection, ResolveError> {
    let clause = clause.strip_prefix("distinct ").unwrap_or(clause).trim();
    if clause.is_empty() {
        return Err(ResolveError::UnsupportedStatement("empty select list".into()));
    }

    let mut items = Vec::new();
    for part in split_top_level(clause, ',')? {
        if part == "*" {
            return Ok(Projection::Star);
        }
        if part.is_empty() {
            return Err(ResolveError::UnsupportedStatement("empty select item".into()));
        }
        items.push(parse_item(&part)?);
    }
    Ok(Projection::Items(items))
}

fn parse_item(item: &str) -> Result<SelectItem, ResolveError> {
    if let Some((expression, alias)) = split_alias(item)? {
        return Ok(SelectItem { expression, alias });
    }
    Ok(SelectItem { expression: item.to_string(), alias: infer_alias(item) })
}

/// Locate the explicit alias boundary: the rightmost top-level ` as ` whose
/// right-hand remainder contains no further ` as `. A cast's internal `AS`
/// sits inside parens and is never top-level, so `cast(x as int) as y`
/// splits at the outer boundary.
fn split_alias(item: &str) -> Result<Option<(String, String)>, ResolveError> {
    let positions = keyword_positions(item, "as")?;
    for position in positions.into_iter().rev() {
        let remainder = item[position + 2..].trim();
        if remainder.contains(" as ") {
            continue;
        }
        let expression = item[..position].trim();
        if expression.is_empty() || remainder.is_empty() {
            continue;
        }
        return Ok(Some((expression.to_string(), remainder.to_string())));
    }
    Ok(None)
}

/// Infer an alias from the expression itself: strip a single leading
/// `<table>.` qualifier; a remainder with map indexing, casts or calls keeps
/// its full text verbatim, otherwise it is the bare column name.
fn infer_alias(expression: &str) -> String {
    match split_qualifier(expression) {
        Some((_, rest)) => rest.to_string(),
        None => expression.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items(clause: &str) -> Vec<SelectItem> {
        match parse_projection(clause).unwrap() {
            Projection::Items(items) => items,
            Projection::Star => panic!("unexpected star projection"),
        }
    }

    #[test]
    fn test_star_projection() {
        assert_eq!(parse_projection("*").unwrap(), Projection::Star);
        assert_eq!(parse_projection("block_number, *").unwrap(), Projection::Star);
    }

    #[test]
    fn test_explicit_alias() {
        let parsed = items("block_number as height");
        assert_eq!(parsed[0].expression, "block_number");
        assert_eq!(parsed[0].alias, "height");
    }

    #[test]
    fn test_cast_internal_as_is_not_an_alias() {
        let parsed = items("cast(value as numeric)");
        assert_eq!(parsed[0].expression, "cast(value as numeric)");
        assert_eq!(parsed[0].alias, "cast(value as numeric)");
    }

    #[test]
    fn test_rightmost_alias_wins_over_cast() {
        let parsed = items("cast(value as numeric) as amount");
        assert_eq!(parsed[0].expression, "cast(value as numeric)");
        assert_eq!(parsed[0].alias, "amount");
    }

    #[test]
    fn test_qualifier_stripped_from_inferred_alias() {
        let parsed = items("b.block_number, t.transaction_hash");
        assert_eq!(parsed[0].alias, "block_number");
        assert_eq!(parsed[1].alias, "transaction_hash");
    }

    #[test]
    fn test_bracketed_expression_keeps_full_text_as_alias() {
        let parsed = items("parameters['from'], count(*)");
        assert_eq!(parsed[0].alias, "parameters['from']");
        assert_eq!(parsed[1].alias, "count(*)");
    }

    #[test]
    fn test_commas_inside_brackets_do_not_split() {
        let parsed = items("f(a, b), parameters['x,y']");
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0].expression, "f(a, b)");
        assert_eq!(parsed[1].expression, "parameters['x,y']");
    }

    #[test]
    fn test_qualified_map_access_alias() {
        let parsed = items("e.parameters['from']");
        assert_eq!(parsed[0].alias, "parameters['from']");
    }
}
