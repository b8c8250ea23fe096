//! URL validation.

/// True iff `url` parses as an absolute URL with scheme `http` or `https`.
/// Rejects `data:`, `javascript:`, `mailto:`, and anything else outside
/// that scheme set, along with unparseable input.
#[must_use]
pub fn is_valid_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }

    match url::Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}
