//! Per-call options and scoring constants

use serde::{Deserialize, Serialize};

/// Per-call retrieval options
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalOptions {
    /// Maximum number of matched symptoms kept (top-k)
    pub top_symptoms: usize,
    /// Maximum number of ranked entities returned (top-n)
    pub top_entities: usize,
    /// Minimum lexical score for a symptom match
    pub lexical_threshold: f64,
    /// Minimum semantic similarity for a semantic candidate
    pub semantic_threshold: f64,
    /// Minimum verification F1 for a semantic candidate to be kept
    pub verification_threshold: f64,
}

impl Default for RetrievalOptions {
    fn default() -> Self {
        Self {
            top_symptoms: 15,
            top_entities: 5,
            lexical_threshold: 0.45,
            semantic_threshold: 0.55,
            verification_threshold: 0.3,
        }
    }
}

/// Scoring constants of the aggregation stage
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScoringWeights {
    /// Lexical scores at or above this are high-confidence
    pub high_confidence_split: f64,
    /// Multiplier on high-confidence lexical scores
    pub exact_blend: f64,
    /// Weight of the semantic similarity in a verified candidate's score
    pub semantic_blend: f64,
    /// Weight of the verification F1 in a verified candidate's score
    pub verification_blend: f64,
    /// Multiplier on low-confidence lexical scores
    pub partial_blend: f64,
    pub exact_weight: f64,
    pub verified_weight: f64,
    pub partial_weight: f64,
    /// Upper bound of the diversity bonus
    pub diversity_cap: f64,
    /// Applied when an entity has more than one exact match
    pub multi_exact_multiplier: f64,
    /// Semantic candidates requested per wanted symptom
    pub semantic_overfetch: usize,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            high_confidence_split: 0.8,
            exact_blend: 1.0,
            semantic_blend: 0.6,
            verification_blend: 0.4,
            partial_blend: 0.7,
            exact_weight: 10.0,
            verified_weight: 5.0,
            partial_weight: 2.0,
            diversity_cap: 3.0,
            multi_exact_multiplier: 1.3,
            semantic_overfetch: 3,
        }
    }
}

/// Thresholds of the approximate index lookups
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FuzzyConfig {
    pub symptom_key_threshold: f64,
    pub entity_id_threshold: f64,
}

impl Default for FuzzyConfig {
    fn default() -> Self {
        Self {
            symptom_key_threshold: 0.85,
            entity_id_threshold: 0.90,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_options_fill_defaults() {
        let options: RetrievalOptions =
            serde_json::from_str(r#"{"top_entities": 3, "lexical_threshold": 0.6}"#).unwrap();
        assert_eq!(options.top_entities, 3);
        assert_eq!(options.lexical_threshold, 0.6);
        assert_eq!(options.top_symptoms, 15);
        assert_eq!(options.verification_threshold, 0.3);
    }
}
