//! Result formatter (C8).
//!
//! Shapes the validator's raw extracted fragment (plus the full rendered
//! page and chosen selector) into one of the five `OutputMode` shapes.
//! Sanitization is regex-based rather than a full parse tree, the same
//! approximation-is-fine-for-this-purpose idiom as [`crate::dom::simplify`]:
//! candidates here are already the single element an XPath matched, not
//! arbitrary page soup, so a whitelist pass over that fragment is cheap and
//! good enough.

use crate::options::OutputMode;
use crate::result::OutputData;
use crate::site_config::ExtractionMethod;
use std::sync::LazyLock;

/// Tags kept as-is by `cleaned_html`/`markdown`: block-level structural
/// tags, lists, tables, inline emphasis, anchors, images.
const ALLOWED_TAGS: &[&str] = &[
    "p", "div", "section", "article", "main", "header", "footer", "h1", "h2", "h3", "h4", "h5",
    "h6", "blockquote", "pre", "code", "br", "hr", "ul", "ol", "li", "table", "thead", "tbody",
    "tr", "td", "th", "em", "strong", "b", "i", "u", "a", "img", "span",
];

const REMOVED_ENTIRELY: &[&str] = &["script", "style", "noscript", "svg", "iframe"];

static SCRIPT_LIKE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?is)<(script|style|noscript|svg|iframe)\b[^>]*>.*?</\1\s*>")
        .expect("valid regex")
});
static SCRIPT_LIKE_SELF_CLOSING: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"(?is)<(script|style|noscript|svg|iframe)\b[^>]*/>").expect("valid regex")
});
static COMMENTS: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?s)<!--.*?-->").expect("valid regex"));
static OPEN_TAG: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?is)<([a-zA-Z][a-zA-Z0-9]*)\b([^>]*)>").expect("valid regex"));
static CLOSE_TAG: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?is)</([a-zA-Z][a-zA-Z0-9]*)\s*>").expect("valid regex"));
static HREF_ATTR: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"(?is)\bhref\s*=\s*["']([^"']*)["']"#).expect("valid regex")
});
static ANY_TAG: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"(?s)<[^>]+>").expect("valid regex"));
static WHITESPACE_RUN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new(r"\s+").expect("valid regex"));
static CLASS_ATTR: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"(?is)\bclass\s*=\s*["']([^"']*)["']"#).expect("valid regex")
});

/// Removes `<script>`/`<style>`/`<noscript>`/`<svg>`/`<iframe>` (with
/// content) and HTML comments, then strips any element whose `class`
/// attribute mentions a cleanup token, descendants included.
fn strip_unwanted(html: &str, cleanup_classes: &[String]) -> String {
    let no_comments = COMMENTS.replace_all(html, "");
    let no_scripts = SCRIPT_LIKE.replace_all(&no_comments, "");
    let no_self_closing = SCRIPT_LIKE_SELF_CLOSING.replace_all(&no_scripts, "");
    remove_by_class(&no_self_closing, cleanup_classes)
}

/// Removes elements (and their descendants) whose `class` attribute
/// contains one of `tokens`, tracking nesting depth of same-named tags so a
/// `<div class="ad"><div>nested</div></div>` is dropped wholesale rather
/// than leaving the inner `<div>` behind.
fn remove_by_class(html: &str, tokens: &[String]) -> String {
    if tokens.is_empty() {
        return html.to_string();
    }

    let mut out = String::with_capacity(html.len());
    let mut pos = 0;
    while pos < html.len() {
        let Some(m) = OPEN_TAG.find_at(html, pos) else {
            out.push_str(&html[pos..]);
            break;
        };
        out.push_str(&html[pos..m.start()]);

        let caps = OPEN_TAG.captures(&html[m.start()..m.end()]).expect("matched above");
        let tag_name = caps[1].to_lowercase();
        let attrs = &caps[2];
        let has_blocked_class = class_attr(attrs)
            .map(|classes| classes.split_whitespace().any(|c| tokens.iter().any(|t| t == c)))
            .unwrap_or(false);

        if !has_blocked_class {
            out.push_str(&html[m.start()..m.end()]);
            pos = m.end();
            continue;
        }

        // Skip past the matching close tag, tracking same-name nesting depth.
        let mut depth = 1usize;
        let mut scan = m.end();
        loop {
            let next_open = OPEN_TAG.find_at(html, scan);
            let next_close = CLOSE_TAG.find_at(html, scan);
            match (next_open, next_close) {
                (_, None) => {
                    scan = html.len();
                    break;
                }
                (Some(o), Some(c)) if o.start() < c.start() => {
                    if html[o.start()..o.end()]
                        .to_lowercase()
                        .starts_with(&format!("<{tag_name}"))
                    {
                        depth += 1;
                    }
                    scan = o.end();
                }
                (_, Some(c)) => {
                    let closed_name = CLOSE_TAG
                        .captures(&html[c.start()..c.end()])
                        .map(|cap| cap[1].to_lowercase())
                        .unwrap_or_default();
                    if closed_name == tag_name {
                        depth -= 1;
                        if depth == 0 {
                            scan = c.end();
                            break;
                        }
                    }
                    scan = c.end();
                }
            }
        }
        pos = scan;
    }
    out
}

fn class_attr(attrs: &str) -> Option<String> {
    CLASS_ATTR.captures(attrs).map(|c| c[1].to_string())
}

/// Unwraps any tag not in [`ALLOWED_TAGS`] (keeps inner content, drops the
/// markup) and strips `href` values whose scheme isn't `http`/`https`/
/// `mailto`.
fn sanitize_to_whitelist(html: &str) -> String {
    let stripped_hrefs = HREF_ATTR.replace_all(html, |caps: &regex::Captures| {
        let href = &caps[1];
        let scheme_ok = href.split(':').next().map_or(true, |scheme| {
            !href.contains(':')
                || matches!(scheme.to_lowercase().as_str(), "http" | "https" | "mailto")
        });
        if scheme_ok {
            caps[0].to_string()
        } else {
            String::new()
        }
    });

    let unwrapped_open = OPEN_TAG.replace_all(&stripped_hrefs, |caps: &regex::Captures| {
        let tag = caps[1].to_lowercase();
        if ALLOWED_TAGS.contains(&tag.as_str()) {
            caps[0].to_string()
        } else {
            String::new()
        }
    });
    let unwrapped = CLOSE_TAG.replace_all(&unwrapped_open, |caps: &regex::Captures| {
        let tag = caps[1].to_lowercase();
        if ALLOWED_TAGS.contains(&tag.as_str()) {
            caps[0].to_string()
        } else {
            String::new()
        }
    });
    unwrapped.into_owned()
}

fn visible_text(html: &str) -> String {
    let no_tags = ANY_TAG.replace_all(html, " ");
    WHITESPACE_RUN.replace_all(&no_tags, " ").trim().to_string()
}

/// Shapes one extraction outcome into the requested `OutputMode`.
/// `fragment_html` is the HTML matched by `selector`; `full_html` is the
/// whole rendered page, used only by `OutputMode::FullHtml`.
#[must_use]
pub fn format(
    mode: OutputMode,
    selector: &str,
    fragment_html: &str,
    full_html: &str,
    method: ExtractionMethod,
    cleanup_classes: &[String],
) -> OutputData {
    match mode {
        OutputMode::ContentOnly => {
            let cleaned = strip_unwanted(fragment_html, cleanup_classes);
            OutputData::ContentOnly { text: visible_text(&cleaned) }
        }
        OutputMode::CleanedHtml => {
            let cleaned = strip_unwanted(fragment_html, cleanup_classes);
            OutputData::CleanedHtml { html: sanitize_to_whitelist(&cleaned) }
        }
        OutputMode::Markdown => {
            let cleaned = strip_unwanted(fragment_html, cleanup_classes);
            let sanitized = sanitize_to_whitelist(&cleaned);
            let markdown = htmd::convert(&sanitized).unwrap_or_else(|_| visible_text(&sanitized));
            OutputData::Markdown { markdown }
        }
        OutputMode::FullHtml => OutputData::FullHtml { html: full_html.to_string() },
        OutputMode::MetadataOnly => OutputData::MetadataOnly {
            selector: selector.to_string(),
            content_length: visible_text(fragment_html).chars().count(),
            method,
        },
    }
}
