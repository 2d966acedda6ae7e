//! Entity types for the knowledge base

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::is_empty_map;

/// Entity in the knowledge base (e.g. a named point)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub name: String,
    #[serde(default)]
    pub symptoms: Vec<String>,
    /// Opaque metadata, passed through to responses unchanged
    #[serde(default, skip_serializing_if = "is_empty_map")]
    pub metadata: Map<String, Value>,
}

impl Entity {
    /// Create a new entity with no symptoms
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symptoms: Vec::new(),
            metadata: Map::new(),
        }
    }

    /// Create a new entity with symptoms
    pub fn with_symptoms<S: Into<String>>(name: impl Into<String>, symptoms: Vec<S>) -> Self {
        Self {
            name: name.into(),
            symptoms: symptoms.into_iter().map(Into::into).collect(),
            metadata: Map::new(),
        }
    }

    /// Normalized name, the entity's identity
    pub fn id(&self) -> String {
        crate::text::normalize(&self.name)
    }
}

/// Per-query aggregation of evidence for one entity
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ScoredEntity {
    pub entity_id: String,
    pub weighted_score: f64,
    pub total_score: f64,
    pub exact_count: usize,
    pub verified_count: usize,
    pub partial_count: usize,
    pub avg_match_quality: f64,
    pub matched_symptoms: Vec<String>,
}

impl ScoredEntity {
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            ..Self::default()
        }
    }

    /// Number of matched symptoms attributed to this entity
    pub fn matched_count(&self) -> usize {
        self.matched_symptoms.len()
    }
}
