//! Lexical verification of semantic candidates
//!
//! Embedding similarity alone is too permissive, so every semantic candidate
//! must also share core terms with the query. The score is the F1 of the
//! core-term overlap.

use std::collections::HashSet;

use crate::text::{normalize, root_word, tokenize};

/// Modifiers that carry no identifying meaning on their own
pub const GENERIC_MODIFIERS: &[&str] = &[
    "loss",
    "of",
    "lack",
    "absence",
    "decrease",
    "increase",
    "reduced",
    "excessive",
    "severe",
    "mild",
    "chronic",
    "acute",
    "sudden",
    "gradual",
    "pain",
];

/// Words of this length or shorter are ignored
const MAX_IGNORED_LEN: usize = 2;

/// Precision/recall gate for semantic candidates
#[derive(Debug, Clone, Copy, Default)]
pub struct LexicalVerifier;

impl LexicalVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Core terms of a phrase: content words and their roots
    pub fn core_terms(text: &str) -> HashSet<String> {
        let normalized = normalize(text);
        let mut terms = HashSet::new();

        for word in tokenize(&normalized) {
            if GENERIC_MODIFIERS.contains(&word) || word.chars().count() <= MAX_IGNORED_LEN {
                continue;
            }
            terms.insert(word.to_string());
            let root = root_word(word);
            if root != word {
                terms.insert(root);
            }
        }

        terms
    }

    /// F1 of core-term overlap between query and symptom, in `[0, 1]`
    pub fn verify(&self, query: &str, symptom: &str) -> f64 {
        let query_terms = Self::core_terms(query);
        let symptom_terms = Self::core_terms(symptom);
        if query_terms.is_empty() || symptom_terms.is_empty() {
            return 0.0;
        }

        let overlap = query_terms.intersection(&symptom_terms).count();
        if overlap == 0 {
            return 0.0;
        }

        let precision = overlap as f64 / query_terms.len() as f64;
        let recall = overlap as f64 / symptom_terms.len() as f64;
        2.0 * precision * recall / (precision + recall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_terms() {
        let terms = LexicalVerifier::core_terms("Severe loss of hearing in ears");
        assert!(terms.contains("hearing"));
        assert!(terms.contains("hear"));
        assert!(terms.contains("ears"));
        assert!(terms.contains("ear"));
        assert!(!terms.contains("severe"));
        assert!(!terms.contains("loss"));
        assert!(!terms.contains("in"));
    }

    #[test]
    fn test_verify_identical() {
        let v = LexicalVerifier::new();
        assert!((v.verify("swelling of knee", "swelling of knee") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_verify_partial_overlap() {
        let v = LexicalVerifier::new();
        // query {burning, burn, eyes, eye}, symptom {burning, burn, feet}
        let score = v.verify("burning eyes", "burning feet");
        // overlap {burning, burn}: precision 2/4, recall 2/3
        let expected = 2.0 * 0.5 * (2.0 / 3.0) / (0.5 + 2.0 / 3.0);
        assert!((score - expected).abs() < 1e-9, "{}", score);
    }

    #[test]
    fn test_verify_rejects_disjoint_and_empty() {
        let v = LexicalVerifier::new();
        assert_eq!(v.verify("dizziness", "knee swelling"), 0.0);
        assert_eq!(v.verify("severe pain", "knee swelling"), 0.0);
        assert_eq!(v.verify("", "fever"), 0.0);
    }
}
