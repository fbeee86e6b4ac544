//! Depth-aware text scanning shared by the whole text path.
//!
//! "Top level" always means outside `(...)` and `[...]` and outside single- or
//! double-quoted strings, so commas and keywords inside function calls,
//! casts or map indexing never split a clause.

use crate::parser::ResolveError;

/// Upper bound on bracket nesting. Deeper input degrades to the fallback
/// instead of recursing without limit.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Scanner state for one left-to-right pass.
struct Tracker {
    depth: usize,
    quote: Option<char>,
}

impl Tracker {
    fn new() -> Self {
        Self { depth: 0, quote: None }
    }

    fn top(&self) -> bool {
        self.depth == 0 && self.quote.is_none()
    }

    fn step(&mut self, ch: char) -> Result<(), ResolveError> {
        if let Some(quote) = self.quote {
            if ch == quote {
                self.quote = None;
            }
            return Ok(());
        }
        match ch {
            '\'' | '"' => self.quote = Some(ch),
            '(' | '[' => {
                self.depth += 1;
                if self.depth > MAX_NESTING_DEPTH {
                    return Err(ResolveError::DepthExceeded);
                }
            }
            ')' | ']' => {
                if self.depth == 0 {
                    return Err(ResolveError::UnbalancedDelimiters);
                }
                self.depth -= 1;
            }
            _ => {}
        }
        Ok(())
    }

    fn finish(self) -> Result<(), ResolveError> {
        if self.depth != 0 || self.quote.is_some() {
            return Err(ResolveError::UnbalancedDelimiters);
        }
        Ok(())
    }
}

/// Split at top-level occurrences of `separator`, trimming each part.
pub fn split_top_level(text: &str, separator: char) -> Result<Vec<String>, ResolveError> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut tracker = Tracker::new();
    for (i, ch) in text.char_indices() {
        if tracker.top() && ch == separator {
            parts.push(text[start..i].trim().to_string());
            start = i + ch.len_utf8();
            continue;
        }
        tracker.step(ch)?;
    }
    tracker.finish()?;
    parts.push(text[start..].trim().to_string());
    Ok(parts)
}

/// Whether `separator` occurs at top level.
pub fn contains_top_level(text: &str, separator: char) -> Result<bool, ResolveError> {
    Ok(split_top_level(text, separator)?.len() > 1)
}

fn is_word_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_'
}

/// Byte offsets of every top-level, word-bounded occurrence of `keyword`.
/// A preceding `.` also breaks the boundary, so `a.from` is a column, not a
/// clause keyword.
pub fn keyword_positions(text: &str, keyword: &str) -> Result<Vec<usize>, ResolveError> {
    let mut positions = Vec::new();
    let mut tracker = Tracker::new();
    for (i, ch) in text.char_indices() {
        if tracker.top() && text[i..].starts_with(keyword) {
            let before = text[..i].chars().next_back();
            let after = text[i + keyword.len()..].chars().next();
            let bounded_before = !matches!(before, Some(c) if is_word_char(c) || c == '.');
            let bounded_after = !matches!(after, Some(c) if is_word_char(c));
            if bounded_before && bounded_after {
                positions.push(i);
            }
        }
        tracker.step(ch)?;
    }
    tracker.finish()?;
    Ok(positions)
}

/// First top-level, word-bounded occurrence of `keyword`.
pub fn find_keyword(text: &str, keyword: &str) -> Result<Option<usize>, ResolveError> {
    Ok(keyword_positions(text, keyword)?.first().copied())
}

/// Whether the whole text scans to depth zero with all quotes closed.
pub fn is_balanced(text: &str) -> bool {
    let mut tracker = Tracker::new();
    for ch in text.chars() {
        if tracker.step(ch).is_err() {
            return false;
        }
    }
    tracker.finish().is_ok()
}

/// Byte offset of the `)` matching the `(` at `open`.
pub fn matching_paren(text: &str, open: usize) -> Result<usize, ResolveError> {
    let mut tracker = Tracker::new();
    for (i, ch) in text[open..].char_indices() {
        tracker.step(ch)?;
        if tracker.top() {
            return Ok(open + i);
        }
    }
    Err(ResolveError::UnbalancedDelimiters)
}

/// Non-empty name made of word characters, starting with a letter or `_`.
pub fn is_identifier(text: &str) -> bool {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {}
        _ => return false,
    }
    chars.all(is_word_char)
}

/// Split `<qualifier>.<rest>` at a top-level dot that precedes any bracket,
/// paren or quote. The qualifier must be a bare identifier, so `1.5` and
/// `cast(a.b as int)` are left alone.
pub fn split_qualifier(expr: &str) -> Option<(&str, &str)> {
    for (i, ch) in expr.char_indices() {
        match ch {
            '.' => {
                let qualifier = &expr[..i];
                if is_identifier(qualifier) {
                    return Some((qualifier, &expr[i + 1..]));
                }
                return None;
            }
            '(' | '[' | '\'' | '"' => return None,
            _ => {}
        }
    }
    None
}

/// Upper bound on the number of chained named sub-queries in one statement.
pub const MAX_CTE_CHAIN: usize = 16;

/// Peel a leading `with name as ( ... ) [, name2 as ( ... )]*` prefix.
///
/// Returns the `(name, body)` pairs in declaration order and the remaining
/// statement. Text without a `with` prefix passes through untouched.
pub fn peel_ctes(text: &str) -> Result<(Vec<(String, String)>, String), ResolveError> {
    if !text.starts_with("with ") {
        return Ok((Vec::new(), text.to_string()));
    }
    let mut rest = text["with ".len()..].trim_start();
    let mut ctes: Vec<(String, String)> = Vec::new();
    loop {
        if ctes.len() >= MAX_CTE_CHAIN {
            return Err(ResolveError::DepthExceeded);
        }
        let as_at = find_keyword(rest, "as")?.ok_or_else(|| {
            ResolveError::UnsupportedStatement("named sub-query without AS".into())
        })?;
        let name = rest[..as_at].trim();
        if !is_identifier(name) {
            return Err(ResolveError::UnsupportedStatement(format!(
                "invalid sub-query name '{name}'"
            )));
        }
        let after_as = rest[as_at + 2..].trim_start();
        if !after_as.starts_with('(') {
            return Err(ResolveError::UnsupportedStatement(
                "named sub-query without parenthesized body".into(),
            ));
        }
        let offset = rest.len() - after_as.len();
        let close = matching_paren(rest, offset)?;
        let body = rest[offset + 1..close].trim().to_string();
        if body.is_empty() {
            return Err(ResolveError::UnsupportedStatement("empty sub-query body".into()));
        }
        ctes.push((name.to_string(), body));

        let tail = rest[close + 1..].trim_start();
        match tail.strip_prefix(',') {
            Some(next) => rest = next.trim_start(),
            None => return Ok((ctes, tail.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_respects_nesting_and_quotes() {
        let parts =
            split_top_level("count(a, b), parameters['x,y'], cast(v as numeric)", ',').unwrap();
        assert_eq!(parts, ["count(a, b)", "parameters['x,y']", "cast(v as numeric)"]);
    }

    #[test]
    fn test_split_unbalanced_is_an_error() {
        assert!(split_top_level("count(a, b", ',').is_err());
        assert!(split_top_level("a)b", ',').is_err());
    }

    #[test]
    fn test_keyword_search_skips_nested_and_quoted_text() {
        let text = "x from_block, cast(a as b), 'keep from me' from base.blocks";
        let positions = keyword_positions(text, "from").unwrap();
        assert_eq!(positions.len(), 1);
        assert_eq!(&text[positions[0]..positions[0] + 4], "from");
        assert!(positions[0] > text.find("'keep").unwrap());
    }

    #[test]
    fn test_keyword_boundary_excludes_qualified_names() {
        assert!(keyword_positions("a.from + 1", "from").unwrap().is_empty());
        assert!(keyword_positions("fromage", "from").unwrap().is_empty());
    }

    #[test]
    fn test_matching_paren() {
        let text = "with a as (select (1) from t) select";
        let open = text.find('(').unwrap();
        assert_eq!(matching_paren(text, open).unwrap(), text.rfind(')').unwrap());
    }

    #[test]
    fn test_split_qualifier() {
        assert_eq!(split_qualifier("b.block_number"), Some(("b", "block_number")));
        assert_eq!(split_qualifier("e.parameters['from']"), Some(("e", "parameters['from']")));
        assert_eq!(split_qualifier("cast(a.b as int)"), None);
        assert_eq!(split_qualifier("1.5"), None);
        assert_eq!(split_qualifier("block_number"), None);
    }

    #[test]
    fn test_depth_limit() {
        let deep = format!("{}x{}", "(".repeat(40), ")".repeat(40));
        assert!(matches!(
            split_top_level(&deep, ','),
            Err(ResolveError::DepthExceeded)
        ));
    }

    #[test]
    fn test_peel_passthrough_without_with() {
        let (ctes, rest) = peel_ctes("select a from t").unwrap();
        assert!(ctes.is_empty());
        assert_eq!(rest, "select a from t");
    }

    #[test]
    fn test_peel_single_cte() {
        let (ctes, rest) =
            peel_ctes("with hot as (select a from t) select * from hot").unwrap();
        assert_eq!(ctes, [("hot".to_string(), "select a from t".to_string())]);
        assert_eq!(rest, "select * from hot");
    }

    #[test]
    fn test_peel_chained_ctes_with_nested_parens() {
        let (ctes, rest) = peel_ctes(
            "with a as (select count(x, y) from t), b as (select q from a) select * from b",
        )
        .unwrap();
        assert_eq!(ctes.len(), 2);
        assert_eq!(ctes[0].1, "select count(x, y) from t");
        assert_eq!(ctes[1].1, "select q from a");
        assert_eq!(rest, "select * from b");
    }

    #[test]
    fn test_peel_malformed_prefix_is_an_error() {
        assert!(peel_ctes("with a select * from t").is_err());
        assert!(peel_ctes("with a as (select x from t").is_err());
    }
}
