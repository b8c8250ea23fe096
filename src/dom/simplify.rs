//! DOM simplification for model prompts.
//!
//! A regex-based cleaner, not a full parse tree: candidates only ever feed
//! a language model summary, so precise DOM semantics are not required.

use crate::constants::{
    BLOCKED_CLASS_TOKENS, DOM_MAX_INPUT_BYTES, DOM_MAX_OUTPUT_CHARS, DOM_TEXT_NODE_MAX_CHARS,
};
use crate::utils::string_utils::safe_truncate_chars;
use std::sync::LazyLock;

static STRIPPED_ELEMENTS: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?is)<(script|style|noscript|svg|iframe)\b[^>]*>.*?</\1\s*>")
        .expect("valid regex")
});

static STRIPPED_SELF_CLOSING: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?is)<(script|style|noscript|svg|iframe)\b[^>]*/>").expect("valid regex")
});

static COMMENTS: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));

static TAG_WITH_CLASS: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"(?is)<([a-z][a-z0-9]*)\b[^>]*\bclass\s*=\s*["']([^"']*)["'][^>]*>"#)
        .expect("valid regex")
});

static TEXT_NODE: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r">([^<>]+)<").expect("valid regex"));

static WHITESPACE_RUN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").expect("valid regex"));

static BETWEEN_TAGS: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r">\s+<").expect("valid regex"));

const TRUNCATION_MARKER: &str = "…[truncated]";
const REMOVED_MARKER: &str = "<!--removed-->";

/// Compacts raw page HTML into a smaller, model-friendly approximation.
/// Input larger than 1 MiB is trimmed before any regex pass runs.
#[must_use]
pub fn simplify(html: &str) -> String {
    let bounded = bound_input(html);

    let no_comments = COMMENTS.replace_all(&bounded, "");
    let no_scripts = STRIPPED_ELEMENTS.replace_all(&no_comments, "");
    let no_self_closing = STRIPPED_SELF_CLOSING.replace_all(&no_scripts, "");
    let no_blocked_classes = remove_blocked_class_elements(&no_self_closing);
    let truncated_text_nodes = truncate_text_nodes(&no_blocked_classes);
    let collapsed = collapse_whitespace(&truncated_text_nodes);

    if collapsed.chars().count() > DOM_MAX_OUTPUT_CHARS {
        let mut out = safe_truncate_chars(&collapsed, DOM_MAX_OUTPUT_CHARS).to_string();
        out.push_str(TRUNCATION_MARKER);
        out
    } else {
        collapsed
    }
}

fn bound_input(html: &str) -> String {
    if html.len() <= DOM_MAX_INPUT_BYTES {
        return html.to_string();
    }
    let mut end = DOM_MAX_INPUT_BYTES;
    while !html.is_char_boundary(end) {
        end -= 1;
    }
    html[..end].to_string()
}

/// Replaces any opening tag whose `class` attribute carries a blocklisted
/// token with an inline marker. This only rewrites the *opening* tag found
/// by the regex; it does not attempt to locate or drop the matching
/// closing tag or descendants, which is an acceptable approximation for a
/// model-facing summary.
fn remove_blocked_class_elements(html: &str) -> String {
    TAG_WITH_CLASS
        .replace_all(html, |caps: &regex::Captures| {
            let classes = &caps[2];
            let is_blocked = classes
                .split_whitespace()
                .any(|token| BLOCKED_CLASS_TOKENS.contains(&token));
            if is_blocked {
                REMOVED_MARKER.to_string()
            } else {
                caps[0].to_string()
            }
        })
            .into_owned()
}

fn truncate_text_nodes(html: &str) -> String {
    TEXT_NODE
        .replace_all(html, |caps: &regex::Captures| {
            let text = &caps[1];
            if text.chars().count() > DOM_TEXT_NODE_MAX_CHARS {
                format!(">{}…<", safe_truncate_chars(text, DOM_TEXT_NODE_MAX_CHARS))
            } else {
                format!(">{text}<")
            }
        })
            .into_owned()
}

fn collapse_whitespace(html: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(html, " ");
    BETWEEN_TAGS.replace_all(&collapsed, "><").trim().to_string()
}
