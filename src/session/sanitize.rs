/// Keep only move-notation characters: ASCII letters and digits, apostrophe,
/// plus, minus and whitespace. Everything else is dropped.
pub fn sanitize_scramble(raw: &str) -> String {
    raw.chars()
        .filter(|&ch| {
            ch.is_ascii_alphanumeric() || matches!(ch, '\'' | '+' | '-') || ch.is_whitespace()
        })
        .collect()
}
