//! Extraction validator (C5).
//!
//! Given a page handle and a candidate selector: (a) run the safety filter
//! before ever touching the browser port, (b) evaluate the selector, (c)
//! collect `ElementDetails` for scoring. Acceptance is a pure predicate over
//! the result, kept separate from evaluation so the strategy pipeline (C6)
//! can rank several evaluated candidates by score before deciding which one
//! (if any) clears the bar.

use crate::constants::{MAX_SELECTOR_LEN, SELECTOR_SAFE_CHARS};
use crate::error::EngineError;
use crate::ports::browser::{BrowserPort, ElementDetails, PageId};
use crate::scorer;

/// True iff `xpath` passes the length/charset safety filter: a candidate
/// selector longer than the configured maximum, or containing characters
/// outside the safety set, is rejected without ever invoking the browser
/// port.
#[must_use]
pub fn is_safe_selector(xpath: &str) -> bool {
    !xpath.is_empty()
        && xpath.len() <= MAX_SELECTOR_LEN
        && xpath.chars().all(|c| SELECTOR_SAFE_CHARS.contains(c))
}

/// Outcome of evaluating one candidate selector against a loaded page.
/// `details`/`fragment_html` are both `None` when the selector was unsafe,
/// matched nothing, or the browser port couldn't produce element metrics —
/// the caller scores this the same as a rejected candidate (missing
/// details scores as 0).
#[derive(Debug, Clone)]
pub struct CandidateEvaluation {
    pub xpath: String,
    pub details: Option<ElementDetails>,
    pub fragment_html: Option<String>,
}

/// Evaluates one candidate selector against a loaded page. Only returns
/// `Err` for a genuine port failure; an unsafe selector or empty match is
/// represented as `Ok` with `details: None` so the pipeline can still rank
/// it alongside other candidates.
pub async fn evaluate<B: BrowserPort>(
    browser: &B,
    page: &PageId,
    xpath: &str,
) -> Result<CandidateEvaluation, EngineError> {
    if !is_safe_selector(xpath) {
        return Ok(CandidateEvaluation {
            xpath: xpath.to_string(),
            details: None,
            fragment_html: None,
        });
    }

    let matched = browser
        .evaluate_selector(page, xpath)
        .await
        .map_err(EngineError::from_port)?;

    let Some(matches) = matched.filter(|m| !m.is_empty()) else {
        return Ok(CandidateEvaluation {
            xpath: xpath.to_string(),
            details: None,
            fragment_html: None,
        });
    };

    let details = browser
        .get_element_details(page, xpath)
        .await
        .map_err(EngineError::from_port)?;

    Ok(CandidateEvaluation {
        xpath: xpath.to_string(),
        fragment_html: details.as_ref().map(|_| matches[0].clone()),
        details,
    })
}

/// The acceptance bar: details present, text length
/// at or above the minimum, and score at or above the threshold.
#[must_use]
pub fn meets_acceptance_bar(
    details: Option<&ElementDetails>,
    min_content_chars: usize,
    min_score_threshold: f32,
) -> bool {
    let Some(details) = details else {
        return false;
    };
    details.text_length >= min_content_chars && scorer::score(details) >= min_score_threshold
}
