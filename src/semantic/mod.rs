//! Optional semantic expansion
//!
//! The retriever only needs "nearest symptoms to this query". Anything that
//! can answer that implements [`SemanticBridge`]. The crate ships an
//! [`EmbeddingIndex`] that answers it from symptom vectors produced by any
//! [`Embedder`], and a dependency-free [`HashEmbedder`].

mod embedding;

pub use embedding::{cosine_similarity, EmbeddingIndex, HashEmbedder};

use crate::types::SemanticError;

/// Source of semantic symptom candidates
pub trait SemanticBridge: Send + Sync {
    /// Up to `k` vocabulary symptoms nearest to `query`, best first, with a
    /// similarity in `[0, 1]`
    fn nearest_symptoms(&self, query: &str, k: usize) -> Result<Vec<(String, f32)>, SemanticError>;
}

/// Text → vector capability
pub trait Embedder: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError>;
}

impl<T: SemanticBridge + ?Sized> SemanticBridge for std::sync::Arc<T> {
    fn nearest_symptoms(&self, query: &str, k: usize) -> Result<Vec<(String, f32)>, SemanticError> {
        (**self).nearest_symptoms(query, k)
    }
}
