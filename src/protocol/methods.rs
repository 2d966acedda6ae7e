//! Method parameter and result types of the query server

use serde::{Deserialize, Serialize};

use crate::retrieval::RetrievalOptions;
use crate::search::IndexStats;

/// Server identity reported by `ping`
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

impl ServerInfo {
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self::new(crate::NAME, crate::VERSION)
    }
}

/// `retrieve` params: the query plus any option override
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct RetrieveParams {
    pub query: String,
    #[serde(flatten)]
    pub options: RetrievalOptions,
}

/// `entities` params
#[derive(Deserialize, Serialize, Debug, Clone, Default)]
#[serde(default)]
pub struct EntitiesParams {
    pub offset: usize,
    pub limit: Option<usize>,
}

/// One entry of the `entities` result
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EntitySummary {
    pub id: String,
    pub name: String,
    pub symptom_count: usize,
}

/// `entities` result
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct EntitiesResult {
    pub total: usize,
    pub entities: Vec<EntitySummary>,
}

/// `stats` result
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StatsResult {
    #[serde(flatten)]
    pub index: IndexStats,
    pub synonym_groups: usize,
    pub phrase_rewrites: usize,
    pub semantic: bool,
}
