//! Entity extraction
//!
//! Pulls at most one kanban code, route identifier or dock number out of free
//! text. Nothing here looks at a dataset; absence is a normal outcome and
//! means "fall back to the conversation context".

use once_cell::sync::Lazy;
use regex::Regex;

/// Interrogatives that can look like route names ("apa-2") and never are
pub const INTERROGATIVES: &[&str] = &[
    "apa",
    "siapa",
    "berapa",
    "bagaimana",
    "gimana",
    "mengapa",
    "kapan",
    "dimana",
    "kemana",
    "darimana",
];

/// Filler words that never name a supplier
const FILLER_WORDS: &[&str] = &[
    "yang", "untuk", "dari", "dengan", "saja", "tolong", "berikan", "tampilkan",
    "cari", "carikan", "semua", "data", "info", "informasi", "berapakah", "adalah",
    "please", "show", "what", "which", "from", "with",
];

static ROUTE_PATTERN: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[a-z][a-z0-9]*-[0-9]+$").ok());

static DOCK_PATTERN: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"dock\s*(\d+)\b").ok());

fn is_separator(c: char) -> bool {
    c.is_whitespace() || matches!(c, ',' | ';' | ':' | '.' | '?' | '!' | '(' | ')' | '"' | '\'')
}

/// Split on whitespace and sentence punctuation, keeping `-` inside tokens
pub fn tokenize(text: &str) -> Vec<&str> {
    text.split(is_separator).filter(|t| !t.is_empty()).collect()
}

/// First token containing a digit, uppercased
pub fn extract_kanban(text: &str) -> Option<String> {
    tokenize(text)
        .into_iter()
        .find(|t| t.chars().any(|c| c.is_ascii_digit()))
        .map(|t| t.to_uppercase())
}

/// First `<prefix>-<digits>` token of 4..=20 chars, uppercased
pub fn extract_route(text: &str) -> Option<String> {
    let pattern = ROUTE_PATTERN.as_ref()?;
    let lower = text.to_lowercase();

    tokenize(&lower)
        .into_iter()
        .filter(|t| !INTERROGATIVES.contains(t))
        .filter(|t| (4..=20).contains(&t.chars().count()))
        .find(|t| pattern.is_match(t))
        .map(|t| t.to_uppercase())
}

/// Dock number from "dock 43" / "dock43"; "dock 105D" is a kanban, not a dock
pub fn extract_dock(text: &str) -> Option<String> {
    let pattern = DOCK_PATTERN.as_ref()?;
    let lower = text.to_lowercase();
    pattern
        .captures(&lower)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Lowercased tokens long enough (4+ chars) to be part of a supplier name
pub fn supplier_tokens(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    tokenize(&lower)
        .into_iter()
        .filter(|t| t.chars().count() >= 4)
        .filter(|t| !t.chars().any(|c| c.is_ascii_digit()))
        .filter(|t| !INTERROGATIVES.contains(t) && !FILLER_WORDS.contains(t))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_kanban() {
        assert_eq!(extract_kanban("stok kanban 105D"), Some("105D".to_string()));
        assert_eq!(extract_kanban("supplier 105d?"), Some("105D".to_string()));
        assert_eq!(extract_kanban("berapa 2231 dan 105D"), Some("2231".to_string()));
        assert_eq!(extract_kanban("supplier"), None);
        assert_eq!(extract_kanban(""), None);
    }

    #[test]
    fn test_extract_route() {
        assert_eq!(extract_route("kapan kedatangan route RC16-02"), Some("RC16-02".to_string()));
        assert_eq!(extract_route("status abc-12?"), Some("ABC-12".to_string()));
        assert_eq!(extract_route("rute apa saja"), None);
        // digits first is not a route
        assert_eq!(extract_route("16571-0Y020"), None);
        assert_eq!(extract_route("a-1"), None);
        assert_eq!(extract_route("abc-12-3"), None);
    }

    #[test]
    fn test_extract_route_rejects_too_long() {
        assert_eq!(extract_route("abcdefghijklmnopqrs-123"), None);
    }

    #[test]
    fn test_extract_dock() {
        assert_eq!(extract_dock("berapa delivery di Dock 43"), Some("43".to_string()));
        assert_eq!(extract_dock("dock43"), Some("43".to_string()));
        assert_eq!(extract_dock("dock code 105D"), None);
        assert_eq!(extract_dock("dock 105D"), None);
    }

    #[test]
    fn test_supplier_tokens() {
        assert_eq!(
            supplier_tokens("part dari supplier Sugity apa saja"),
            vec!["part", "supplier", "sugity"]
        );
        assert!(supplier_tokens("105D abc").is_empty());
    }
}
