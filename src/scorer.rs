//! Candidate scorer: a weighted-sum heuristic over element metrics.

use crate::constants::MIN_CONTENT_CHARS;
use crate::ports::browser::ElementDetails;

/// Scores a candidate element's metrics in `[0, 1]`.
///
/// A pure function of its input: no I/O, no shared state. Contributions are
/// summed then clamped; they are not individually clamped, so e.g. a bad
/// `unwantedTagScore` can still drive the total below 0 before the final
/// clamp.
#[must_use]
pub fn score(details: &ElementDetails) -> f32 {
    let mut total = 0.0_f32;

    if details.text_length > MIN_CONTENT_CHARS {
        total += 0.30;
    }
    if details.link_density < 0.30 {
        total += 0.20;
    }
    if details.paragraph_count >= 3 {
        total += 0.15;
    }
    if details.heading_count >= 1 {
        total += 0.10;
    }
    if details.semantic_score > 0 {
        total += 0.15;
    }
    if details.dom_depth > 3 && details.dom_depth < 10 {
        total += 0.10;
    }
    if details.unwanted_tag_score > 0 {
        total -= 0.30;
    }

    total.clamp(0.0, 1.0)
}

/// Ranks `(xpath, details)` candidates by descending score, treating a
/// missing `details` as score 0. Stable: ties keep their input order.
pub fn rank<'a>(
    candidates: &'a [(String, Option<ElementDetails>)],
) -> Vec<(&'a str, f32)> {
    let mut scored: Vec<(&str, f32)> = candidates
        .iter()
        .map(|(xpath, details)| {
            let s = details.as_ref().map_or(0.0, score);
            (xpath.as_str(), s)
        })
            .collect();

    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    scored
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(overrides: impl FnOnce(&mut ElementDetails)) -> ElementDetails {
        let mut d = ElementDetails {
            xpath: "//article".to_string(),
            text_length: 0,
            link_density: 1.0,
            paragraph_count: 0,
            heading_count: 0,
            has_media: false,
            dom_depth: 0,
            semantic_score: 0,
            unwanted_tag_score: 0,
        };
        overrides(&mut d);
        d
    }

    #[test]
    fn empty_details_scores_zero() {
        let d = details(|_| {});
        assert_eq!(score(&d), 0.0);
    }

    #[test]
    fn ideal_candidate_scores_one() {
        let d = details(|d| {
            d.text_length = 201;
            d.link_density = 0.1;
            d.paragraph_count = 5;
            d.heading_count = 2;
            d.semantic_score = 1;
            d.dom_depth = 5;
        });
        assert_eq!(score(&d), 1.0);
    }

    #[test]
    fn unwanted_tag_drags_score_down() {
        let d = details(|d| {
            d.text_length = 201;
            d.link_density = 0.1;
            d.unwanted_tag_score = 1;
        });
        assert!((score(&d) - 0.20).abs() < f32::EPSILON);
    }

    #[test]
    fn score_never_negative() {
        let d = details(|d| {
            d.unwanted_tag_score = 1;
        });
        assert_eq!(score(&d), 0.0);
    }

    #[test]
    fn boundary_text_length_not_counted() {
        let d = details(|d| {
            d.text_length = MIN_CONTENT_CHARS;
        });
        assert_eq!(score(&d), 0.0);
    }

    #[test]
    fn dom_depth_boundaries_excluded() {
        let at_3 = details(|d| d.dom_depth = 3);
        let at_10 = details(|d| d.dom_depth = 10);
        assert_eq!(score(&at_3), 0.0);
        assert_eq!(score(&at_10), 0.0);
    }

    #[test]
    fn rank_sorts_descending_and_missing_is_zero() {
        let good = details(|d| {
            d.text_length = 300;
            d.link_density = 0.1;
            d.paragraph_count = 4;
        });
        let candidates = vec![
            ("//missing".to_string(), None),
            ("//good".to_string(), Some(good)),
        ];
        let ranked = rank(&candidates);
        assert_eq!(ranked[0].0, "//good");
        assert_eq!(ranked[1].0, "//missing");
        assert_eq!(ranked[1].1, 0.0);
    }

    #[test]
    fn rank_is_stable_on_ties() {
        let candidates = vec![
            ("//a".to_string(), None),
            ("//b".to_string(), None),
        ];
        let ranked = rank(&candidates);
        assert_eq!(ranked[0].0, "//a");
        assert_eq!(ranked[1].0, "//b");
    }
}
