//! Data types for symptom retrieval
//!
//! This module contains the core data structures shared by the matching
//! pipeline, the knowledge base loader and the stdio server.

mod entity;
mod error;
mod matching;
mod response;

pub use entity::{Entity, ScoredEntity};
pub use error::{RetrievalError, SemanticError};
pub use matching::{MatchCandidate, MatchMethod};
pub use response::{
    Confidence, RankedEntity, RetrievalResponse, RetrievalStatus, SemanticStage,
};

/// Result type for knowledge base and retrieval operations
pub type RetrievalResult<T> = Result<T, RetrievalError>;

/// Round to two decimal places (for percentages in responses)
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Check if metadata map is empty (for skip_serializing_if)
pub fn is_empty_map(val: &serde_json::Map<String, serde_json::Value>) -> bool {
    val.is_empty()
}
