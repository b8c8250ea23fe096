//! XPath response parser.
//!
//! Turns a language model's free-form reply into an ordered, deduplicated
//! list of candidate XPath strings. Tries progressively looser strategies
//! and stops at the first that yields anything, since model replies are
//! nominally structured but not reliably so.

use std::sync::LazyLock;

static FENCED_BLOCK: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r"```(?:[a-zA-Z0-9_-]*\n)?([\s\S]*?)```").expect("valid regex")
});

static XPATH_SHAPE: LazyLock<regex::Regex> = LazyLock::new(|| {
    regex::Regex::new(r#"//[A-Za-z*][A-Za-z0-9_:.-]*(?:\[[^\[\]]*\])*(?:/[A-Za-z0-9_:.*\[\]@='" -]+)*"#)
        .expect("valid regex")
});

/// Parses candidate XPaths out of a model's raw reply.
///
/// Returns an empty vector if nothing plausible is found anywhere in the
/// text; an empty result is a valid outcome that the pipeline treats as a
/// model-discovery failure.
#[must_use]
pub fn parse_candidates(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Vec::new();
    }

    if let Some(list) = parse_string_array(trimmed) {
        if !list.is_empty() {
            return dedup_preserve_order(list);
        }
    }

    if let Some(caps) = FENCED_BLOCK.captures(trimmed) {
        let block = caps.get(1).map_or("", |m| m.as_str()).trim();
        if let Some(list) = parse_string_array(block) {
            if !list.is_empty() {
                return dedup_preserve_order(list);
            }
        }
    }

    let fallback: Vec<String> = XPATH_SHAPE
        .find_iter(trimmed)
        .map(|m| m.as_str().to_string())
        .collect();
    dedup_preserve_order(fallback)
}

/// Attempts to parse `text` as a JSON array of strings, covering both a
/// bare array and one embedded in a fenced block. Non-string elements are
/// silently discarded rather than failing the whole parse.
fn parse_string_array(text: &str) -> Option<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    let array = value.as_array()?;
    Some(
        array
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
    )
}

fn dedup_preserve_order(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_yields_empty() {
        assert!(parse_candidates("").is_empty());
        assert!(parse_candidates("   ").is_empty());
    }

    #[test]
    fn parses_bare_json_array() {
        let raw = r#"["//article", "//main//div[@class='body']"]"#;
        assert_eq!(
            parse_candidates(raw),
            vec!["//article".to_string(), "//main//div[@class='body']".to_string()]
        );
    }

    #[test]
    fn parses_fenced_json_array() {
        let raw = "Here are candidates:\n```json\n[\"//article\", \"//section\"]\n```\nHope that helps.";
        assert_eq!(
            parse_candidates(raw),
            vec!["//article".to_string(), "//section".to_string()]
        );
    }

    #[test]
    fn falls_back_to_regex_shape() {
        let raw = "I'd try //article/div[@class=\"content\"] as the best match.";
        let result = parse_candidates(raw);
        assert_eq!(result, vec!["//article/div[@class=\"content\"]".to_string()]);
    }

    #[test]
    fn non_strings_in_array_are_discarded() {
        let raw = r#"["//article", 42, null, "//main"]"#;
        assert_eq!(
            parse_candidates(raw),
            vec!["//article".to_string(), "//main".to_string()]
        );
    }

    #[test]
    fn deduplicates_preserving_first_seen_order() {
        let raw = r#"["//article", "//main", "//article"]"#;
        assert_eq!(
            parse_candidates(raw),
            vec!["//article".to_string(), "//main".to_string()]
        );
    }

    #[test]
    fn garbage_input_yields_empty() {
        assert!(parse_candidates("I don't see any good selector here.").is_empty());
    }

    #[test]
    fn prefers_structured_array_over_embedded_shapes() {
        let raw = r#"["//article"]"#;
        assert_eq!(parse_candidates(raw), vec!["//article".to_string()]);
    }
}
