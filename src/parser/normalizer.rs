/// Bring raw SQL text into canonical form: lowercase, single-spaced, trimmed,
/// with one trailing statement terminator removed.
///
/// Total on all input; normalizing an already-normalized string is a no-op.
/// The case fold applies to the whole statement, string literals included;
/// the text path never interprets literal values.
pub fn normalize(text: &str) -> String {
    let folded = text.to_lowercase();
    let collapsed = folded.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.strip_suffix(';') {
        Some(stripped) => stripped.trim_end().to_string(),
        None => collapsed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_collapses_and_trims() {
        assert_eq!(
            normalize("  SELECT\tblock_number\r\nFROM   base.blocks ;"),
            "select block_number from base.blocks"
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t  "), "");
        assert_eq!(normalize(";"), "");
    }

    #[test]
    fn test_idempotent() {
        let once = normalize("SELECT   a,\n  b FROM t;");
        assert_eq!(normalize(&once), once);
    }
}
