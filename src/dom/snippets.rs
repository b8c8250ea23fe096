//! Snippet picker: short excerpts shown to the language model alongside the
//! simplified DOM, to ground its suggestion in real page text.

use crate::constants::{
    BLOCKED_CLASS_TOKENS, SNIPPET_BLOCKLIST_WINDOW_CHARS, SNIPPET_DEFAULT_MAX_CHARS,
    SNIPPET_DEFAULT_MAX_SNIPPETS, SNIPPET_MIN_PARAGRAPH_CHARS,
};
use crate::utils::string_utils::safe_truncate_boundary;
use std::sync::LazyLock;

static PARAGRAPH: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?is)<p\b[^>]*>(.*?)</p>").expect("valid regex"));

static TAG: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?s)<[^>]+>").expect("valid regex"));

static WHITESPACE_RUN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").expect("valid regex"));

const WORD_BOUNDARY_CHARS: &str = ".,;:!?-";

/// Picks up to `max_snippets` short excerpts from `<p>` elements, skipping
/// those whose preceding ~200-character window mentions a blocked class
/// token.
#[must_use]
pub fn snippets(html: &str, max_snippets: usize, max_chars: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for m in PARAGRAPH.find_iter(html) {
        if out.len() >= max_snippets {
            break;
        }

        let mut window_start = m.start().saturating_sub(SNIPPET_BLOCKLIST_WINDOW_CHARS);
        while !html.is_char_boundary(window_start) {
            window_start += 1;
        }
        let window = &html[window_start..m.start()];
        if mentions_blocked_class(window) {
            continue;
        }

        let caps = match PARAGRAPH.captures(&html[m.start()..m.end()]) {
            Some(c) => c,
            None => continue,
        };
        let inner = &caps[1];
        let text = visible_text(inner);
        if text.chars().count() < SNIPPET_MIN_PARAGRAPH_CHARS {
            continue;
        }

        let boundary = safe_truncate_boundary(&text, max_chars, WORD_BOUNDARY_CHARS);
        let snippet = text[..boundary].trim().to_string();
        if snippet.is_empty() || !seen.insert(snippet.clone()) {
            continue;
        }
        out.push(snippet);
    }

    out
}

/// Convenience wrapper using the documented defaults (3 snippets, 150 chars each).
#[must_use]
pub fn default_snippets(html: &str) -> Vec<String> {
    snippets(html, SNIPPET_DEFAULT_MAX_SNIPPETS, SNIPPET_DEFAULT_MAX_CHARS)
}

fn mentions_blocked_class(window: &str) -> bool {
    BLOCKED_CLASS_TOKENS
        .iter()
        .any(|token| window.contains(&format!("class=\"{token}")) || window.contains(&format!("class='{token}")) || window.contains(&format!(" {token} ")) || window.contains(&format!("\"{token}\"")))
}

fn visible_text(fragment: &str) -> String {
    let no_tags = TAG.replace_all(fragment, " ");
    WHITESPACE_RUN.replace_all(&no_tags, " ").trim().to_string()
}
