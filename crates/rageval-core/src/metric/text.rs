//! Text helpers shared by the lexical metrics.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;

use regex::Regex;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "been", "but", "by", "did", "do", "does", "for",
    "from", "had", "has", "have", "he", "her", "his", "how", "i", "if", "in", "into", "is", "it",
    "its", "of", "on", "or", "she", "so", "than", "that", "the", "their", "them", "then", "there",
    "these", "they", "this", "those", "to", "was", "we", "were", "what", "when", "where", "which",
    "who", "whom", "why", "will", "with", "you", "your",
];

fn word_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").expect("static regex"))
}

fn sentence_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?\n]+").expect("static regex"))
}

fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.binary_search(&token).is_ok()
}

/// Lowercased word tokens, stop words removed.
pub fn content_tokens(text: &str) -> Vec<String> {
    word_re()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Distinct content tokens.
pub fn token_set(text: &str) -> HashSet<String> {
    content_tokens(text).into_iter().collect()
}

/// Sentences that contain at least one content token.
pub fn sentences(text: &str) -> Vec<&str> {
    sentence_re()
        .split(text)
        .map(str::trim)
        .filter(|s| !content_tokens(s).is_empty())
        .collect()
}

/// Share of `text`'s distinct content tokens present in `support`.
///
/// Returns 0.0 when `text` has no content tokens.
pub fn coverage(text: &str, support: &HashSet<String>) -> f64 {
    let tokens = token_set(text);
    if tokens.is_empty() {
        return 0.0;
    }
    let hit = tokens.iter().filter(|t| support.contains(*t)).count();
    hit as f64 / tokens.len() as f64
}

fn term_frequencies(text: &str) -> HashMap<String, f64> {
    let mut tf = HashMap::new();
    for token in content_tokens(text) {
        *tf.entry(token).or_insert(0.0) += 1.0;
    }
    tf
}

/// Cosine similarity of term-frequency vectors, in [0, 1].
pub fn cosine_similarity(a: &str, b: &str) -> f64 {
    let ta = term_frequencies(a);
    let tb = term_frequencies(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    let dot: f64 = ta
        .iter()
        .filter_map(|(t, wa)| tb.get(t).map(|wb| wa * wb))
        .sum();
    let norm_a = ta.values().map(|w| w * w).sum::<f64>().sqrt();
    let norm_b = tb.values().map(|w| w * w).sum::<f64>().sqrt();
    (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
}

/// Token-level F1 between a candidate and a reference (bag of tokens).
pub fn token_f1(candidate: &str, reference: &str) -> f64 {
    let cand = term_frequencies(candidate);
    let refr = term_frequencies(reference);
    if cand.is_empty() || refr.is_empty() {
        return 0.0;
    }
    let overlap: f64 = cand
        .iter()
        .filter_map(|(t, c)| refr.get(t).map(|r| c.min(*r)))
        .sum();
    if overlap == 0.0 {
        return 0.0;
    }
    let precision = overlap / cand.values().sum::<f64>();
    let recall = overlap / refr.values().sum::<f64>();
    2.0 * precision * recall / (precision + recall)
}
