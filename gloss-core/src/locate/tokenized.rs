use crate::dom::Dom;

use super::text::{contains_ci, distinct_lower, enclosing_sentence, find_ci};
use super::MatchCandidate;

/// The single sentence sharing the most distinct tokens with the target.
/// Ties go to the sentence found first in document order.
pub(super) fn find<D: Dom>(
    dom: &D,
    nodes: &[D::Node],
    target: &str,
    min_token_chars: usize,
) -> Option<MatchCandidate<D::Node>> {
    let tokens = distinct_lower(
        target
            .split_whitespace()
            .filter(|t| t.chars().count() > min_token_chars),
    );
    if tokens.is_empty() {
        return None;
    }

    let mut best: Option<(usize, MatchCandidate<D::Node>)> = None;

    for node in nodes {
        let text = dom.text(node);
        for token in &tokens {
            let mut from = 0;
            while let Some((start, end)) = find_ci(&text, token, from) {
                from = end;

                let (s, e) = enclosing_sentence(&text, start, end);
                if s >= e {
                    continue;
                }

                let sentence = &text[s..e];
                let score = tokens.iter().filter(|t| contains_ci(sentence, t)).count();
                if best.as_ref().map_or(true, |(top, _)| score > *top) {
                    best = Some((score, MatchCandidate::in_node(node, &text, s, e)));
                }
            }
        }
    }

    best.map(|(_, candidate)| candidate)
}
