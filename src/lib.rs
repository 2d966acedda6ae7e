//! Symptom Retrieval
//!
//! Matches free-text symptom descriptions against a small knowledge base of
//! named entities and returns a ranked, explainable list of candidates.
//!
//! # Pipeline
//!
//! - **Normalization**: lower-casing, punctuation stripping, root words
//! - **Synonyms**: canonical terms, phrase rewrites, context-dependent words
//! - **Lexical matching**: rule-ordered similarity with a body-region guard
//! - **Semantic expansion** (optional): nearest symptoms from any
//!   [`semantic::SemanticBridge`], re-checked by lexical verification
//! - **Scoring**: pool merging, weighted per-entity aggregation, ranking
//!   with a deterministic tie-break
//!
//! # Modules
//!
//! - `types`: Shared data structures, errors and result alias
//! - `text`: Normalization and tokenization
//! - `search`: Synonyms, lexical matcher, verifier, symptom/entity index
//! - `semantic`: Semantic capability traits and an in-memory vector index
//! - `retrieval`: The query pipeline and its options
//! - `knowledge_base`: Dataset and configuration loading
//! - `evaluation`: Top-k accuracy and MAP over labelled queries
//! - `protocol`: JSON-RPC types
//! - `server`: Stdio JSON-RPC server
//! - `utils`: Approximate key lookup
//!
//! # Example
//!
//! ```no_run
//! use symptom_retrieval::{KnowledgeBase, KnowledgeBaseConfig, RetrievalOptions};
//!
//! let config = KnowledgeBaseConfig::new("data/entity_symptoms.json");
//! let retriever = KnowledgeBase::load(&config).unwrap();
//! let response = retriever.retrieve("I have a headache", &RetrievalOptions::default());
//! for entity in &response.ranked_entities {
//!     println!("{} ({:?})", entity.name, entity.confidence);
//! }
//! ```

pub mod evaluation;
pub mod knowledge_base;
pub mod protocol;
pub mod retrieval;
pub mod search;
pub mod semantic;
pub mod server;
pub mod text;
pub mod types;
pub mod utils;

// Re-export commonly used items at crate root
pub use knowledge_base::{KnowledgeBase, KnowledgeBaseConfig, SemanticMode};
pub use retrieval::{FuzzyConfig, RetrievalOptions, Retriever, ScoringWeights};
pub use search::{LexicalMatcher, LexicalVerifier, SymptomEntityIndex, SynonymConfig, SynonymDictionary};
pub use semantic::{Embedder, EmbeddingIndex, HashEmbedder, SemanticBridge};
pub use server::QueryServer;
pub use types::{
    Confidence, Entity, MatchCandidate, MatchMethod, RankedEntity, RetrievalError, RetrievalResponse,
    RetrievalResult, RetrievalStatus, ScoredEntity, SemanticError, SemanticStage,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
