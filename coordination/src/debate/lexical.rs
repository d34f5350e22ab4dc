//! Lexical helpers shared by the guardrails and the judge.
//!
//! Tokenisation is deliberately naive: lowercase, split on Unicode
//! whitespace, no stemming or punctuation stripping. Every overlap ratio in
//! the crate is computed over these word-sets, so changing the tokeniser
//! changes every threshold's meaning.

use std::collections::HashSet;

/// Lowercased whitespace tokens, in order, duplicates kept.
pub fn words(text: &str) -> Vec<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Distinct lowercased whitespace tokens.
pub fn word_set(text: &str) -> HashSet<String> {
    text.split_whitespace().map(str::to_lowercase).collect()
}

/// Number of tokens present in both sets.
pub fn shared_words(a: &HashSet<String>, b: &HashSet<String>) -> usize {
    a.intersection(b).count()
}

/// `|a ∩ b| / min(|a|, |b|)`, or `None` if either set is empty.
pub fn overlap_of_smaller(a: &HashSet<String>, b: &HashSet<String>) -> Option<f64> {
    let smaller = a.len().min(b.len());
    if smaller == 0 {
        return None;
    }
    Some(shared_words(a, b) as f64 / smaller as f64)
}

/// `|base ∩ other| / |base|`, or `None` if `base` is empty.
pub fn overlap_of_base(base: &HashSet<String>, other: &HashSet<String>) -> Option<f64> {
    if base.is_empty() {
        return None;
    }
    Some(shared_words(base, other) as f64 / base.len() as f64)
}

/// Length in characters (not bytes).
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}
