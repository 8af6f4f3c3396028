//! Small string helpers.

/// Keep at most `max` characters of `s`.
///
/// Counts `char`s, not bytes, so multi-byte text is never split mid-character.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_chars("short", 100), "short");
/// assert_eq!(truncate_chars("héllo", 2), "hé");
/// ```
pub fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
