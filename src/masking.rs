//! Irreversible redaction of sensitive identifiers before they reach logs,
//! error messages, or configuration summaries.

/// Masks the middle of a sensitive string for safe display.
///
/// Values of 8 characters or fewer collapse to `***` entirely; longer values
/// keep their first and last 4 characters around a `***` core. Counting is in
/// characters, not bytes, so multi-byte input never splits a code point.
pub fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "***".to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}***{}", head, tail)
}
