use crate::catalog::{ResponseType, TableSchema};
use crate::parser::splitter::{is_balanced, is_identifier, keyword_positions, split_qualifier};

/// Upper bound on expression recursion (nested qualifiers, casts, map access,
/// aggregate passthrough). Deeper expressions resolve to `Unknown`.
pub const MAX_EXPR_DEPTH: usize = 32;

/// Determine the semantic kind of one expression against the active schema.
///
/// The rules apply in order: exact column, qualified reference, map access,
/// both cast forms, aggregate return rules, and finally `Unknown`. Total on
/// all input; never an error.
pub fn resolve_expr_type(expression: &str, schema: &TableSchema) -> ResponseType {
    resolve_at_depth(expression.trim(), schema, 0)
}

fn resolve_at_depth(expression: &str, schema: &TableSchema, depth: usize) -> ResponseType {
    if depth > MAX_EXPR_DEPTH || expression.is_empty() {
        return ResponseType::Unknown;
    }

    // 1. exact column name
    if let Some(ty) = schema.get(expression) {
        return ty.clone();
    }

    // 2. qualified reference: strip the qualifier and retry
    if let Some((_, rest)) = split_qualifier(expression) {
        return resolve_at_depth(rest, schema, depth + 1);
    }

    // 3. map access with a quoted key
    if let Some((base, _key)) = split_map_access(expression) {
        return match resolve_at_depth(base, schema, depth + 1) {
            ResponseType::Map(_, value) => *value,
            _ => ResponseType::Unknown,
        };
    }

    // 4. cast(expr as type): the target type decides, the inner expression
    //    is ignored
    if let Some(type_name) = cast_type_name(expression) {
        return ResponseType::parse(type_name).unwrap_or(ResponseType::Unknown);
    }

    // 5. expr::type
    if let Some(type_name) = colon_cast_type_name(expression) {
        return ResponseType::parse(type_name).unwrap_or(ResponseType::Unknown);
    }

    // 6. aggregate return rules
    if let Some((name, inner)) = function_parts(expression) {
        return match name {
            "count" | "sum" => ResponseType::NumericString,
            "avg" => ResponseType::SmallInt,
            "min" | "max" => resolve_at_depth(inner.trim(), schema, depth + 1),
            _ => ResponseType::Unknown,
        };
    }

    // 7. fallback
    ResponseType::Unknown
}

/// `<col>['key']` / `<col>["key"]` -> (`<col>`, key). The final `]` must
/// close a bracket whose content is a quoted key.
fn split_map_access(expression: &str) -> Option<(&str, &str)> {
    if !expression.ends_with(']') {
        return None;
    }
    let open = opening_bracket_of_last(expression)?;
    let base = expression[..open].trim_end();
    let inside = expression[open + 1..expression.len() - 1].trim();
    let key = strip_quotes(inside)?;
    if base.is_empty() {
        return None;
    }
    Some((base, key))
}

/// Byte offset of the `[` matched by the expression's final `]`.
fn opening_bracket_of_last(expression: &str) -> Option<usize> {
    let mut stack: Vec<(char, usize)> = Vec::new();
    let mut quote: Option<char> = None;
    let last = expression.len() - 1;
    for (i, ch) in expression.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '[' | '(' => stack.push((ch, i)),
            ']' | ')' => {
                let (open_ch, open_at) = stack.pop()?;
                if i == last {
                    return (open_ch == '[' && ch == ']').then_some(open_at);
                }
            }
            _ => {}
        }
    }
    None
}

fn strip_quotes(text: &str) -> Option<&str> {
    if text.len() < 2 {
        return None;
    }
    for quote in ['\'', '"'] {
        if let Some(inner) = text.strip_prefix(quote).and_then(|t| t.strip_suffix(quote)) {
            return Some(inner);
        }
    }
    None
}

/// Target type of `cast(<expr> as <type>)`: the rightmost ` as ` at the top
/// level of the parenthesized body, so nested casts resolve to the outermost
/// target.
fn cast_type_name(expression: &str) -> Option<&str> {
    let body = expression.strip_prefix("cast(")?.strip_suffix(')')?;
    if !is_balanced(body) {
        return None;
    }
    let position = *keyword_positions(body, "as").ok()?.last()?;
    Some(body[position + 2..].trim())
}

/// Target type of `<expr>::<type>`: the rightmost top-level `::`.
fn colon_cast_type_name(expression: &str) -> Option<&str> {
    let mut split = None;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, ch) in expression.char_indices() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' => quote = Some(ch),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.checked_sub(1)?,
            ':' if depth == 0 && expression[i..].starts_with("::") => split = Some(i),
            _ => {}
        }
    }
    let position = split?;
    let target = expression[position + 2..].trim();
    let source = expression[..position].trim();
    (!source.is_empty() && is_identifier(target)).then_some(target)
}

/// `name(inner)` when the whole expression is one balanced call.
fn function_parts(expression: &str) -> Option<(&str, &str)> {
    let open = expression.find('(')?;
    let name = &expression[..open];
    if !is_identifier(name) || !expression.ends_with(')') {
        return None;
    }
    let inner = &expression[open + 1..expression.len() - 1];
    is_balanced(inner).then_some((name, inner))
}
