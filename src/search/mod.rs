//! Lexical matching over the symptom vocabulary
//!
//! This module provides the query-side matching stages through:
//! - Synonym canonicalization and phrase rewrites
//! - Body-region context guard
//! - Keyword extraction and lexical similarity scoring
//! - Core-term verification of semantic candidates
//! - Bidirectional symptom/entity index with fuzzy fallback

mod index;
mod lexical;
mod regions;
mod synonyms;
mod verify;

pub use index::{IndexBuilder, IndexStats, SymptomEntityIndex};
pub use lexical::{LexicalMatcher, KEYWORD_STOPWORDS};
pub use regions::{is_context_mismatch, is_pain_word, regions_in, BODY_REGIONS};
pub use synonyms::{
    PhraseRewrite, SynonymConfig, SynonymDictionary, SynonymGroup, CONTEXT_DEPENDENT_WORDS,
    DEFAULT_PHRASE_REWRITES, DEFAULT_SYNONYM_GROUPS,
};
pub use verify::{LexicalVerifier, GENERIC_MODIFIERS};
