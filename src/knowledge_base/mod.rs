//! Knowledge Base - dataset loading
//!
//! Reads the entity dataset, the optional reverse symptom index and the
//! optional synonym configuration, and builds the immutable index and
//! dictionary a [`Retriever`] runs on. Construction is complete-or-fail.

mod loader;

pub use loader::{
    load_entities, load_symptom_index, load_synonyms, parse_entities, parse_symptom_index,
    read_json, split_list,
};

use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::retrieval::{Retriever, DEFAULT_SEMANTIC_TIMEOUT};
use crate::search::{SymptomEntityIndex, SynonymDictionary};
use crate::semantic::{EmbeddingIndex, HashEmbedder};
use crate::types::{RetrievalError, RetrievalResult};

pub const DEFAULT_ENTITY_FILE: &str = "data/entity_symptoms.json";

/// Which semantic capability the loaded retriever gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SemanticMode {
    #[default]
    Off,
    /// Built-in character n-gram embeddings over the vocabulary
    Ngram,
}

impl std::str::FromStr for SemanticMode {
    type Err = RetrievalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "off" | "none" => Ok(SemanticMode::Off),
            "ngram" => Ok(SemanticMode::Ngram),
            other => Err(RetrievalError::InvalidConfig(format!(
                "unknown semantic mode '{}' (expected off or ngram)",
                other
            ))),
        }
    }
}

/// Where the knowledge base comes from
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeBaseConfig {
    pub entity_file: Option<PathBuf>,
    pub index_file: Option<PathBuf>,
    pub synonym_file: Option<PathBuf>,
    pub semantic: SemanticMode,
    pub semantic_timeout: Duration,
}

impl KnowledgeBaseConfig {
    /// Config for a single entity file
    pub fn new(entity_file: impl Into<PathBuf>) -> Self {
        Self {
            entity_file: Some(entity_file.into()),
            index_file: None,
            synonym_file: None,
            semantic: SemanticMode::Off,
            semantic_timeout: DEFAULT_SEMANTIC_TIMEOUT,
        }
    }

    pub fn with_index_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.index_file = Some(path.into());
        self
    }

    pub fn with_synonym_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.synonym_file = Some(path.into());
        self
    }

    pub fn with_semantic(mut self, mode: SemanticMode) -> Self {
        self.semantic = mode;
        self
    }

    /// Read the configuration from `SYMPTOM_*` environment variables.
    ///
    /// Relative paths resolve against the current directory. The default
    /// entity file applies only when no reverse index file is configured.
    pub fn from_env() -> RetrievalResult<Self> {
        let current_dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        let resolve = |var: &str| {
            env::var(var)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .map(|v| resolve_path(&current_dir, &v))
        };

        let index_file = resolve("SYMPTOM_INDEX_FILE");
        let entity_file = resolve("SYMPTOM_ENTITY_FILE").or_else(|| {
            index_file
                .is_none()
                .then(|| current_dir.join(DEFAULT_ENTITY_FILE))
        });

        let semantic = match env::var("SYMPTOM_SEMANTIC") {
            Ok(mode) => mode.parse()?,
            Err(_) => SemanticMode::Off,
        };

        let semantic_timeout = match env::var("SYMPTOM_SEMANTIC_TIMEOUT_MS") {
            Ok(ms) => Duration::from_millis(ms.trim().parse().map_err(|_| {
                RetrievalError::InvalidConfig(format!("SYMPTOM_SEMANTIC_TIMEOUT_MS is not a number: '{}'", ms))
            })?),
            Err(_) => DEFAULT_SEMANTIC_TIMEOUT,
        };

        Ok(Self {
            entity_file,
            index_file,
            synonym_file: resolve("SYMPTOM_SYNONYM_FILE"),
            semantic,
            semantic_timeout,
        })
    }
}

fn resolve_path(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Loaded, immutable knowledge base
#[derive(Debug, Clone)]
pub struct KnowledgeBase {
    index: Arc<SymptomEntityIndex>,
    dictionary: Arc<SynonymDictionary>,
    semantic: SemanticMode,
    semantic_timeout: Duration,
}

impl KnowledgeBase {
    /// Load the knowledge base and build a retriever over it
    pub fn load(config: &KnowledgeBaseConfig) -> RetrievalResult<Retriever> {
        Self::open(config)?.retriever()
    }

    /// Load and index every configured file
    pub fn open(config: &KnowledgeBaseConfig) -> RetrievalResult<Self> {
        if config.entity_file.is_none() && config.index_file.is_none() {
            return Err(RetrievalError::InvalidConfig(
                "neither an entity file nor a symptom index file is configured".to_string(),
            ));
        }

        let mut builder = SymptomEntityIndex::builder();
        if let Some(path) = &config.entity_file {
            let entities = load_entities(path)?;
            info!(path = %path.display(), entities = entities.len(), "entity file loaded");
            for entity in entities {
                builder.add_entity(entity);
            }
        }
        if let Some(path) = &config.index_file {
            let pairs = load_symptom_index(path)?;
            info!(path = %path.display(), symptoms = pairs.len(), "symptom index file loaded");
            for (symptom, names) in &pairs {
                for name in names {
                    builder.add_mapping(symptom, name);
                }
            }
        }
        let index = builder.build()?;

        let dictionary = match &config.synonym_file {
            Some(path) => {
                let synonyms = load_synonyms(path)?;
                SynonymDictionary::from_config(&synonyms)
            }
            None => SynonymDictionary::new(),
        };

        let stats = index.stats();
        info!(
            symptoms = stats.symptom_count,
            entities = stats.entity_count,
            mappings = stats.mapping_count,
            synonym_groups = dictionary.group_count(),
            rewrites = dictionary.rewrite_count(),
            "knowledge base ready"
        );

        Ok(Self {
            index: Arc::new(index),
            dictionary: Arc::new(dictionary),
            semantic: config.semantic,
            semantic_timeout: config.semantic_timeout,
        })
    }

    pub fn index(&self) -> &SymptomEntityIndex {
        &self.index
    }

    pub fn dictionary(&self) -> &SynonymDictionary {
        &self.dictionary
    }

    /// Build a retriever sharing this knowledge base
    pub fn retriever(&self) -> RetrievalResult<Retriever> {
        let retriever = Retriever::new(Arc::clone(&self.index), Arc::clone(&self.dictionary))
            .with_semantic_timeout(self.semantic_timeout);

        match self.semantic {
            SemanticMode::Off => Ok(retriever),
            SemanticMode::Ngram => {
                let embeddings = EmbeddingIndex::build(HashEmbedder::default(), self.index.vocabulary())
                    .map_err(|e| RetrievalError::InvalidConfig(format!("semantic index: {}", e)))?;
                info!(symptoms = embeddings.len(), "n-gram semantic index built");
                Ok(retriever.with_semantic(Arc::new(embeddings)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semantic_mode_parse() {
        assert_eq!("".parse::<SemanticMode>().unwrap(), SemanticMode::Off);
        assert_eq!(" NGRAM ".parse::<SemanticMode>().unwrap(), SemanticMode::Ngram);
        assert!(matches!(
            "bert".parse::<SemanticMode>(),
            Err(RetrievalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_resolve_path() {
        let base = Path::new("/srv/app");
        assert_eq!(resolve_path(base, "data/a.json"), PathBuf::from("/srv/app/data/a.json"));
        assert_eq!(resolve_path(base, "/etc/a.json"), PathBuf::from("/etc/a.json"));
    }

    #[test]
    fn test_open_requires_a_source() {
        let config = KnowledgeBaseConfig {
            entity_file: None,
            ..KnowledgeBaseConfig::new("unused")
        };
        assert!(matches!(
            KnowledgeBase::open(&config),
            Err(RetrievalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let config = KnowledgeBaseConfig::new("/nonexistent/entity_symptoms.json");
        assert!(matches!(
            KnowledgeBase::open(&config),
            Err(RetrievalError::Io { .. })
        ));
    }
}
