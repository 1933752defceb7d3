use crate::dom::Dom;

use super::text::{contains_ci, distinct_lower, sentences};
use super::MatchCandidate;

/// Sentences containing any significant word of the target (an alphabetic
/// run of at least `min_word_chars`), up to `limit`, in document order
pub(super) fn find<D: Dom>(
    dom: &D,
    nodes: &[D::Node],
    target: &str,
    min_word_chars: usize,
    limit: usize,
) -> Vec<MatchCandidate<D::Node>> {
    let words = distinct_lower(
        target
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| w.chars().count() >= min_word_chars),
    );
    let mut candidates = Vec::new();
    if words.is_empty() {
        return candidates;
    }

    for node in nodes {
        let text = dom.text(node);
        for (s, e) in sentences(&text) {
            if words.iter().any(|w| contains_ci(&text[s..e], w)) {
                candidates.push(MatchCandidate::in_node(node, &text, s, e));
                if candidates.len() >= limit {
                    return candidates;
                }
            }
        }
    }

    candidates
}
