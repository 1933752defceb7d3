//! String helpers shared by the matching tiers
//!
//! All positions are byte offsets into the original (un-normalized,
//! un-lowercased) text so they can be used as range boundaries directly.

use unicode_normalization::UnicodeNormalization;

pub(crate) fn is_sentence_end(c: char) -> bool {
    matches!(c, '.' | '!' | '?')
}

pub(crate) fn nfc(text: &str) -> String {
    text.nfc().collect()
}

pub(crate) fn lower_chars(text: &str) -> Vec<char> {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// Byte offset in `raw` whose NFC prefix has length `normalized_offset`
pub(crate) fn raw_offset(raw: &str, normalized_offset: usize) -> Option<usize> {
    raw.char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(raw.len()))
        .find(|&i| raw[..i].nfc().map(char::len_utf8).sum::<usize>() == normalized_offset)
}

/// If `needle` (already lowercased) matches `hay` case-insensitively at
/// byte `at`, the byte offset where the match ends
pub(crate) fn match_ci_at(hay: &str, at: usize, needle: &[char]) -> Option<usize> {
    if needle.is_empty() {
        return None;
    }
    let mut matched = 0;
    for (offset, c) in hay[at..].char_indices() {
        for lc in c.to_lowercase() {
            if matched >= needle.len() || needle[matched] != lc {
                return None;
            }
            matched += 1;
        }
        if matched == needle.len() {
            return Some(at + offset + c.len_utf8());
        }
    }
    None
}

/// First case-insensitive occurrence of `needle` at or after `from`
pub(crate) fn find_ci(hay: &str, needle: &[char], from: usize) -> Option<(usize, usize)> {
    hay.get(from..)?
        .char_indices()
        .find_map(|(i, _)| match_ci_at(hay, from + i, needle).map(|end| (from + i, end)))
}

pub(crate) fn contains_ci(hay: &str, needle: &[char]) -> bool {
    find_ci(hay, needle, 0).is_some()
}

/// Shrink `start..end` to exclude surrounding whitespace
pub(crate) fn trim_span(text: &str, start: usize, end: usize) -> (usize, usize) {
    let slice = &text[start..end];
    let lead = slice.len() - slice.trim_start().len();
    let trimmed = slice.trim().len();
    (start + lead, start + lead + trimmed)
}

/// Sentence around `start..end`: from just after the previous terminator
/// (or the start of the text) through the next terminator (or the end),
/// trimmed.
pub(crate) fn enclosing_sentence(text: &str, start: usize, end: usize) -> (usize, usize) {
    let from = text[..start]
        .rfind(is_sentence_end)
        .map(|i| i + 1)
        .unwrap_or(0);
    let to = text[end..]
        .find(is_sentence_end)
        .map(|i| end + i + 1)
        .unwrap_or(text.len());
    trim_span(text, from, to)
}

/// Non-empty trimmed sentences of `text`
pub(crate) fn sentences(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut from = 0;
    for (i, c) in text.char_indices() {
        if is_sentence_end(c) {
            push_trimmed(text, from, i + 1, &mut spans);
            from = i + 1;
        }
    }
    if from < text.len() {
        push_trimmed(text, from, text.len(), &mut spans);
    }
    spans
}

fn push_trimmed(text: &str, start: usize, end: usize, spans: &mut Vec<(usize, usize)>) {
    let (s, e) = trim_span(text, start, end);
    if s < e {
        spans.push((s, e));
    }
}

/// Distinct lowercased items, first occurrence wins
pub(crate) fn distinct_lower<'a>(items: impl Iterator<Item = &'a str>) -> Vec<Vec<char>> {
    let mut out: Vec<Vec<char>> = Vec::new();
    for item in items {
        let lowered = lower_chars(item);
        if !out.contains(&lowered) {
            out.push(lowered);
        }
    }
    out
}
