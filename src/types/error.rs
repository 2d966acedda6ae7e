//! Error types

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading the knowledge base or its configuration.
///
/// Retrieval itself never fails: empty queries, missing matches and semantic
/// outages are reported through [`crate::types::RetrievalStatus`] and
/// [`crate::types::SemanticStage`] instead.
#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("dataset contains no symptoms")]
    EmptyDataset,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Errors from the optional semantic capability
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SemanticError {
    #[error("semantic capability unavailable")]
    Unavailable,

    #[error("semantic provider failed: {0}")]
    Provider(String),

    #[error("semantic lookup timed out after {0:?}")]
    Timeout(Duration),
}
