//! Retrieval response types

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{is_empty_map, MatchCandidate};

/// Outcome of a retrieval call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStatus {
    Ok,
    EmptyQuery,
    NoMatch,
}

/// What happened to the semantic expansion stage for one query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticStage {
    /// Enough high-confidence lexical matches, no lookup needed
    NotNeeded,
    /// No semantic capability configured
    Disabled,
    /// Lookup ran and candidates went through verification
    Applied,
    /// Lookup failed or timed out; results are lexical-only
    Degraded,
}

/// Coarse confidence label for a ranked entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Medium,
}

/// One ranked entity with its full score breakdown
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RankedEntity {
    pub entity_id: String,
    pub name: String,
    pub matched_symptom_count: usize,
    pub total_symptoms: usize,
    pub match_percentage: f64,
    pub matched_symptoms: Vec<String>,
    pub all_symptoms: Vec<String>,
    pub weighted_score: f64,
    pub exact_count: usize,
    pub verified_count: usize,
    pub partial_count: usize,
    pub avg_match_quality: f64,
    pub confidence: Confidence,
    pub confidence_score: f64,
    #[serde(default, skip_serializing_if = "is_empty_map")]
    pub metadata: Map<String, Value>,
}

/// Full result of `retrieve`: matched symptoms and ranked entities together
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResponse {
    pub query: String,
    pub status: RetrievalStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub semantic: SemanticStage,
    pub matched_symptoms: Vec<MatchCandidate>,
    pub ranked_entities: Vec<RankedEntity>,
}

impl RetrievalResponse {
    pub fn empty_query(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            status: RetrievalStatus::EmptyQuery,
            message: Some("Query is empty. Describe one or more symptoms.".to_string()),
            semantic: SemanticStage::NotNeeded,
            matched_symptoms: Vec::new(),
            ranked_entities: Vec::new(),
        }
    }

    pub fn no_match(query: impl Into<String>, semantic: SemanticStage) -> Self {
        Self {
            query: query.into(),
            status: RetrievalStatus::NoMatch,
            message: Some("No matching symptoms found. Try rephrasing your query.".to_string()),
            semantic,
            matched_symptoms: Vec::new(),
            ranked_entities: Vec::new(),
        }
    }

    /// Check if the response carries any match
    pub fn is_match(&self) -> bool {
        self.status == RetrievalStatus::Ok
    }

    /// Name of the top-ranked entity, if any
    pub fn top_entity(&self) -> Option<&str> {
        self.ranked_entities.first().map(|e| e.name.as_str())
    }
}
