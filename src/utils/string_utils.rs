//! UTF-8-safe string slicing, shared by the DOM simplifier and snippet picker.
//!
//! Prevents panics when truncating text containing multi-byte characters
//! (box-drawing symbols, emoji, and other non-ASCII Unicode).

/// Safely truncate a string to a maximum number of CHARACTERS (not bytes).
///
/// Respects UTF-8 character boundaries; never panics, even on multi-byte
/// characters.
///
/// # Examples
/// ```
/// # use scrapecraft_engine::utils::string_utils::safe_truncate_chars;
/// assert_eq!(safe_truncate_chars("Hello, World!", 5), "Hello");
/// assert_eq!(safe_truncate_chars("Hi", 100), "Hi");
/// ```
#[inline]
pub fn safe_truncate_chars(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        None => s,
        Some((byte_idx, _)) => &s[..byte_idx],
    }
}

/// Find a safe byte index for truncation, preferring word boundaries.
///
/// Finds the byte index of the last word boundary (whitespace or a
/// character in `boundary_chars`) within the first `max_chars` characters.
/// If no boundary is found, returns the byte index of the `max_chars`-th
/// character (or the string's length, if shorter).
///
/// # Examples
/// ```
/// # use scrapecraft_engine::utils::string_utils::safe_truncate_boundary;
/// let text = "Hello, wonderful world of Unicode!";
/// let idx = safe_truncate_boundary(text, 20, ",;:");
/// assert_eq!(&text[..idx], "Hello, wonderful");
/// ```
pub fn safe_truncate_boundary(s: &str, max_chars: usize, boundary_chars: &str) -> usize {
    let max_byte_idx = s
        .char_indices()
        .nth(max_chars)
        .map(|(idx, _)| idx)
        .unwrap_or(s.len());

    s[..max_byte_idx]
        .rfind(|c: char| c.is_whitespace() || boundary_chars.contains(c))
        .unwrap_or(max_byte_idx)
}
