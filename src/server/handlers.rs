//! Request handlers for the query server
//!
//! Each handler turns optional JSON params into a JSON result or an
//! [`ErrorObject`]. Only `retrieve` needs the async runtime, so the server
//! calls it directly.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::protocol::{
    EntitiesParams, EntitiesResult, EntitySummary, ErrorObject, RetrieveParams, ServerInfo, StatsResult,
};
use crate::retrieval::Retriever;

pub type HandlerResult = Result<Value, ErrorObject>;

/// Deserialize params, treating absent params as an empty object
pub fn parse_params<T: DeserializeOwned>(params: Option<Value>) -> Result<T, ErrorObject> {
    let params = params.unwrap_or_else(|| json!({}));
    serde_json::from_value(params).map_err(|e| ErrorObject::invalid_params(e.to_string()))
}

pub fn retrieve_params(params: Option<Value>) -> Result<RetrieveParams, ErrorObject> {
    parse_params(params)
}

pub fn ping(info: &ServerInfo) -> HandlerResult {
    to_result(info)
}

pub fn entities(retriever: &Retriever, params: Option<Value>) -> HandlerResult {
    let params: EntitiesParams = parse_params(params)?;
    let index = retriever.index();

    let page = index
        .entities()
        .skip(params.offset)
        .take(params.limit.unwrap_or(usize::MAX))
        .map(|e| EntitySummary {
            id: e.id(),
            name: e.name.clone(),
            symptom_count: e.symptoms.len(),
        })
        .collect();

    to_result(&EntitiesResult {
        total: index.entity_count(),
        entities: page,
    })
}

pub fn stats(retriever: &Retriever) -> HandlerResult {
    let dictionary = retriever.dictionary();
    to_result(&StatsResult {
        index: retriever.index().stats(),
        synonym_groups: dictionary.group_count(),
        phrase_rewrites: dictionary.rewrite_count(),
        semantic: retriever.has_semantic(),
    })
}

pub fn to_result<T: serde::Serialize>(value: &T) -> HandlerResult {
    serde_json::to_value(value).map_err(|e| ErrorObject::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::protocol::error_codes;
    use crate::search::{SymptomEntityIndex, SynonymDictionary};
    use crate::types::Entity;

    fn retriever() -> Retriever {
        let index = SymptomEntityIndex::from_entities(vec![
            Entity::with_symptoms("B Point", vec!["fever"]),
            Entity::with_symptoms("A Point", vec!["chills", "cough"]),
        ])
        .unwrap();
        Retriever::new(Arc::new(index), Arc::new(SynonymDictionary::empty()))
    }

    #[test]
    fn test_entities_paging() {
        let r = retriever();
        let all = entities(&r, None).unwrap();
        assert_eq!(all["total"], 2);
        assert_eq!(all["entities"][0]["name"], "A Point");
        assert_eq!(all["entities"][0]["symptom_count"], 2);

        let page = entities(&r, Some(json!({"offset": 1, "limit": 5}))).unwrap();
        assert_eq!(page["entities"].as_array().unwrap().len(), 1);
        assert_eq!(page["entities"][0]["id"], "b point");
    }

    #[test]
    fn test_retrieve_params() {
        let params = retrieve_params(Some(json!({"query": "fever", "top_entities": 2}))).unwrap();
        assert_eq!(params.query, "fever");
        assert_eq!(params.options.top_entities, 2);
        assert_eq!(params.options.top_symptoms, 15);

        let err = retrieve_params(None).unwrap_err();
        assert_eq!(err.code, error_codes::INVALID_PARAMS);
    }

    #[test]
    fn test_stats() {
        let value = stats(&retriever()).unwrap();
        assert_eq!(value["symptom_count"], 3);
        assert_eq!(value["entity_count"], 2);
        assert_eq!(value["semantic"], false);
    }
}
