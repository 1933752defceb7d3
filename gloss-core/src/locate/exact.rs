use crate::dom::Dom;

use super::text::{nfc, raw_offset};
use super::MatchCandidate;

/// Literal, case-sensitive occurrences of the NFC-normalized target that
/// fall wholly inside one text node, in document order
pub(super) fn find<D: Dom>(
    dom: &D,
    nodes: &[D::Node],
    target: &str,
    limit: usize,
) -> Vec<MatchCandidate<D::Node>> {
    let needle = nfc(target);
    let mut candidates = Vec::new();
    if needle.trim().is_empty() || limit == 0 {
        return candidates;
    }

    for node in nodes {
        let raw = dom.text(node);
        let normalized = nfc(&raw);

        let mut from = 0;
        while let Some(pos) = normalized[from..].find(&needle) {
            let start = from + pos;
            let end = start + needle.len();
            from = end;

            let bounds = if normalized == raw {
                Some((start, end))
            } else {
                raw_offset(&raw, start).zip(raw_offset(&raw, end))
            };

            if let Some((s, e)) = bounds {
                candidates.push(MatchCandidate::in_node(node, &raw, s, e));
                if candidates.len() >= limit {
                    return candidates;
                }
            }
        }
    }

    candidates
}
