use std::sync::LazyLock;

use regex::Regex;

/// Trailing strength / dosage-form suffix: "tramadol 50mg", "aspirin 100 mg tabs".
/// Requires whitespace before the number so names containing digits stay intact.
static RE_STRENGTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(.+?)\s+\d+(?:[.,]\d+)?\s*(?:mg|mcg|µg|ug|g|ml|iu|units?)?(?:\s*(?:tab|tabs|tablets?|caps?|capsules?))?$",
    )
    .unwrap()
});

/// Lookup key for alias/display-name matching: trimmed, inner whitespace
/// collapsed, case-folded. Non-Latin scripts pass through unchanged apart
/// from whitespace handling.
pub fn normalize_token(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Remove a trailing strength token from an already normalized token.
/// Returns `None` when there is nothing to strip.
pub fn strip_strength(token: &str) -> Option<&str> {
    RE_STRENGTH
        .captures(token)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|name| !name.is_empty())
}

/// Canonical ids: non-empty, lower-case ASCII letters, digits, `_` or `-`,
/// starting with a letter.
pub fn is_canonical_id(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => chars
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'),
        _ => false,
    }
}

/// Order-independent key for an unordered pair.
pub fn pair_key(a: &str, b: &str) -> (String, String) {
    if a <= b {
        (a.to_string(), b.to_string())
    } else {
        (b.to_string(), a.to_string())
    }
}

/// Display form of a pair key, used as a rule id.
pub fn pair_label(a: &str, b: &str) -> String {
    let (x, y) = pair_key(a, b);
    format!("{x}+{y}")
}
