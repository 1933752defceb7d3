//! Text locator
//!
//! Maps a target quotation to candidate ranges in the rendered text using
//! progressively looser tiers: exact, tokenized, partial. A request that no
//! tier can place falls back to being reported, not shown.

mod exact;
mod partial;
mod text;
mod tokenized;

use serde::{Deserialize, Serialize};

use crate::dom::{Dom, DomRange};
use crate::model::MatchMethod;

/// Tunables for the matching tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchOptions {
    /// Occurrences the exact tier will mark for one request
    pub exact_candidate_limit: usize,
    /// Tokens must be longer than this many characters
    pub min_token_chars: usize,
    /// Minimum length of a "significant" word for the partial tier
    pub min_significant_word_chars: usize,
    pub partial_candidate_limit: usize,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            exact_candidate_limit: 3,
            min_token_chars: 3,
            min_significant_word_chars: 5,
            partial_candidate_limit: 10,
        }
    }
}

/// Matching tier that can produce candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Exact,
    Tokenized,
    Partial,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::Exact, Tier::Tokenized, Tier::Partial];

    pub fn method(&self) -> MatchMethod {
        match self {
            Tier::Exact => MatchMethod::Exact,
            Tier::Tokenized => MatchMethod::Tokenized,
            Tier::Partial => MatchMethod::Partial,
        }
    }
}

/// A located span and the document text it covers
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate<N> {
    pub range: DomRange<N>,
    pub matched_text: String,
}

impl<N: Clone + PartialEq> MatchCandidate<N> {
    fn in_node(node: &N, text: &str, start: usize, end: usize) -> Self {
        Self {
            range: DomRange::within(node.clone(), start, end),
            matched_text: text[start..end].to_string(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Locator {
    options: MatchOptions,
}

impl Locator {
    pub fn new(options: MatchOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Candidates for `target` produced by one tier over `nodes`, which must
    /// be the document's visible text nodes in document order.
    pub fn locate<D: Dom>(
        &self,
        dom: &D,
        nodes: &[D::Node],
        tier: Tier,
        target: &str,
    ) -> Vec<MatchCandidate<D::Node>> {
        let candidates = match tier {
            Tier::Exact => exact::find(dom, nodes, target, self.options.exact_candidate_limit),
            Tier::Tokenized => {
                tokenized::find(dom, nodes, target, self.options.min_token_chars)
                    .into_iter()
                    .collect()
            }
            Tier::Partial => partial::find(
                dom,
                nodes,
                target,
                self.options.min_significant_word_chars,
                self.options.partial_candidate_limit,
            ),
        };

        tracing::debug!(
            "{:?} tier found {} candidate(s) for {:?}",
            tier,
            candidates.len(),
            target
        );
        candidates
    }
}

#[cfg(all(test, feature = "html"))]
mod tests {
    use super::*;
    use crate::dom::{visible_text_nodes, ArenaDocument};

    const ARTICLE: &str = r#"<body><article>
        <p>The company's spokesperson said the layoffs were a "difficult but necessary" restructuring.</p>
        <p>Workers and community members were not consulted about the changes.</p>
        <div>Some other content here with <span>nested elements</span> in the text.</div>
    </article></body>"#;

    fn locate(tier: Tier, target: &str) -> Vec<String> {
        locate_in(ARTICLE, tier, target)
    }

    fn locate_in(html: &str, tier: Tier, target: &str) -> Vec<String> {
        let doc = ArenaDocument::parse_html(html);
        let nodes = visible_text_nodes(&doc);
        Locator::default()
            .locate(&doc, &nodes, tier, target)
            .into_iter()
            .map(|c| c.matched_text)
            .collect()
    }

    #[test]
    fn test_exact_finds_literal() {
        assert_eq!(
            locate(Tier::Exact, "difficult but necessary"),
            vec!["difficult but necessary"]
        );
    }

    #[test]
    fn test_exact_is_case_sensitive() {
        assert!(locate(Tier::Exact, "Difficult but necessary").is_empty());
    }

    #[test]
    fn test_exact_inside_nested_element() {
        assert_eq!(locate(Tier::Exact, "nested elements"), vec!["nested elements"]);
    }

    #[test]
    fn test_exact_does_not_cross_nodes() {
        assert!(locate(Tier::Exact, "with nested").is_empty());
    }

    #[test]
    fn test_tokenized_picks_best_sentence() {
        assert_eq!(
            locate(Tier::Tokenized, "workers community consulted"),
            vec!["Workers and community members were not consulted about the changes."]
        );
    }

    #[test]
    fn test_tokenized_scores_every_occurrence_in_a_node() {
        let html = "<p>Workers left. Community met. Consulted none. Workers, community consulted.</p>";
        assert_eq!(
            locate_in(html, Tier::Tokenized, "workers community consulted"),
            vec!["Workers, community consulted."]
        );
    }

    #[test]
    fn test_tokenized_needs_long_tokens() {
        assert!(locate(Tier::Tokenized, "the and a").is_empty());
    }

    #[test]
    fn test_partial_collects_sentences_with_significant_words() {
        let found = locate(Tier::Partial, "about changes");
        assert_eq!(
            found,
            vec!["Workers and community members were not consulted about the changes."]
        );
    }

    #[test]
    fn test_nothing_matches_nonsense() {
        for tier in Tier::ALL {
            assert!(locate(tier, "xyzqwerty123456 abcdefg789").is_empty());
        }
    }
}
