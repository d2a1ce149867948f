use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("static regex must compile"));

static SKU_TOKEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z0-9-]{3,}$").expect("static regex must compile"));

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_space(s: &str) -> String {
    WHITESPACE_RE.replace_all(s, " ").trim().to_string()
}

/// Replace the Unicode dash family with an ASCII hyphen.
pub fn normalize_dashes(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' => '-',
            other => other,
        })
        .collect()
}

/// Canonical SKU key: trimmed and uppercased.
pub fn normalize_sku(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Canonical SKU key for an item-column token, dropping inner whitespace.
pub fn compact_sku(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// An item number is alphanumeric-or-dash, at least three long, and has a digit.
pub fn looks_like_sku(token: &str) -> bool {
    let compact = compact_sku(token);
    SKU_TOKEN_RE.is_match(&compact) && compact.chars().any(|c| c.is_ascii_digit())
}

/// True when the line carries no letters or digits at all (rules, bullets, dots).
pub fn is_punctuation_only(line: &str) -> bool {
    !line.chars().any(|c| c.is_alphanumeric())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_space() {
        assert_eq!(normalize_space("  Buy   20\tget 3 \n FREE "), "Buy 20 get 3 FREE");
    }

    #[test]
    fn test_normalize_dashes() {
        assert_eq!(normalize_dashes("FEB 1 \u{2013} FEB 27"), "FEB 1 - FEB 27");
        assert_eq!(normalize_dashes("MAR 5 \u{2014} 19"), "MAR 5 - 19");
    }

    #[test]
    fn test_sku_normalization() {
        assert_eq!(normalize_sku("  blm100 "), "BLM100");
        assert_eq!(compact_sku("lot 601"), "LOT601");
    }

    #[test]
    fn test_looks_like_sku() {
        assert!(looks_like_sku("LOT601"));
        assert!(looks_like_sku("ab-12"));
        assert!(!looks_like_sku("ABC"));
        assert!(!looks_like_sku("12"));
        assert!(!looks_like_sku("AB#12"));
    }

    #[test]
    fn test_is_punctuation_only() {
        assert!(is_punctuation_only("-----"));
        assert!(is_punctuation_only(". . ."));
        assert!(!is_punctuation_only("-- 5 --"));
    }
}
