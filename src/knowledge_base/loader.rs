//! Dataset and synonym-config file formats
//!
//! Entity file: either an object `name -> [symptom]` (values may also be a
//! `;`/`,`-separated string, or `{"symptoms": [...], "metadata": {...}}`), or
//! an array of `{"name", "symptoms", "metadata"}` records.
//!
//! Reverse index file: an object `symptom -> [entity name]`, with the same
//! array-or-string values.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::search::SynonymConfig;
use crate::types::{Entity, RetrievalError, RetrievalResult};

/// Read and parse a JSON file
pub fn read_json(path: &Path) -> RetrievalResult<Value> {
    let content = fs::read_to_string(path).map_err(|source| RetrievalError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| RetrievalError::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Load entity records from an entity file
pub fn load_entities(path: &Path) -> RetrievalResult<Vec<Entity>> {
    parse_entities(read_json(path)?, path)
}

/// Load `(symptom, entity names)` pairs from a reverse index file
pub fn load_symptom_index(path: &Path) -> RetrievalResult<Vec<(String, Vec<String>)>> {
    parse_symptom_index(read_json(path)?, path)
}

/// Load a synonym configuration file
pub fn load_synonyms(path: &Path) -> RetrievalResult<SynonymConfig> {
    serde_json::from_value(read_json(path)?).map_err(|source| RetrievalError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn parse_entities(value: Value, path: &Path) -> RetrievalResult<Vec<Entity>> {
    match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(name, entry)| entity_from_entry(name, entry, path))
            .collect(),
        Value::Array(_) => serde_json::from_value(value).map_err(|source| RetrievalError::Json {
            path: path.to_path_buf(),
            source,
        }),
        _ => Err(invalid(path, "entity file must be an object or an array of records")),
    }
}

pub fn parse_symptom_index(value: Value, path: &Path) -> RetrievalResult<Vec<(String, Vec<String>)>> {
    let Value::Object(map) = value else {
        return Err(invalid(path, "symptom index must be an object"));
    };
    map.into_iter()
        .map(|(symptom, names)| {
            let names = string_list(names, path, &symptom)?;
            Ok((symptom, names))
        })
        .collect()
}

/// Split a `;`/`,`-separated list, dropping empty items
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split([';', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn entity_from_entry(name: String, entry: Value, path: &Path) -> RetrievalResult<Entity> {
    match entry {
        Value::Object(mut fields) => {
            let symptoms = match fields.remove("symptoms") {
                Some(value) => string_list(value, path, &name)?,
                None => Vec::new(),
            };
            let metadata = match fields.remove("metadata") {
                Some(Value::Object(m)) => m,
                Some(_) => return Err(invalid(path, &format!("metadata of '{}' must be an object", name))),
                None => Map::new(),
            };
            Ok(Entity {
                name,
                symptoms,
                metadata,
            })
        }
        other => {
            let symptoms = string_list(other, path, &name)?;
            Ok(Entity::with_symptoms(name, symptoms))
        }
    }
}

fn string_list(value: Value, path: &Path, key: &str) -> RetrievalResult<Vec<String>> {
    match value {
        Value::String(s) => Ok(split_list(&s)),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Ok(s),
                _ => Err(invalid(path, &format!("non-string item under '{}'", key))),
            })
            .collect(),
        Value::Null => Ok(Vec::new()),
        _ => Err(invalid(
            path,
            &format!("'{}' must map to an array or a separated string", key),
        )),
    }
}

fn invalid(path: &Path, message: &str) -> RetrievalError {
    RetrievalError::InvalidConfig(format!("{}: {}", path.display(), message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn p() -> &'static Path {
        Path::new("test.json")
    }

    #[test]
    fn test_split_list() {
        assert_eq!(split_list("A; B ,C;;"), vec!["A", "B", "C"]);
        assert!(split_list(" ; ").is_empty());
    }

    #[test]
    fn test_parse_entity_map_forms() {
        let value = json!({
            "Crown_Point": ["head ache", "dizziness"],
            "Knee Point": "knee swelling; stiffness",
            "Eye Point": {"symptoms": ["blurred vision"], "metadata": {"region": "head"}}
        });
        let mut entities = parse_entities(value, p()).unwrap();
        entities.sort_by(|a, b| a.name.cmp(&b.name));

        assert_eq!(entities[0].name, "Crown_Point");
        assert_eq!(entities[0].symptoms, vec!["head ache", "dizziness"]);
        assert_eq!(entities[1].metadata["region"], "head");
        assert_eq!(entities[2].symptoms, vec!["knee swelling", "stiffness"]);
    }

    #[test]
    fn test_parse_entity_records() {
        let value = json!([
            {"name": "Crown_Point", "symptoms": ["head ache"], "metadata": {"id": 7}},
            {"name": "Bare"}
        ]);
        let entities = parse_entities(value, p()).unwrap();
        assert_eq!(entities.len(), 2);
        assert_eq!(entities[0].metadata["id"], 7);
        assert!(entities[1].symptoms.is_empty());
    }

    #[test]
    fn test_parse_symptom_index() {
        let value = json!({"fever": ["A", "B"], "chills": "A, C"});
        let mut pairs = parse_symptom_index(value, p()).unwrap();
        pairs.sort();
        assert_eq!(pairs[0], ("chills".to_string(), vec!["A".to_string(), "C".to_string()]));
        assert_eq!(pairs[1].1, vec!["A", "B"]);
    }

    #[test]
    fn test_malformed_shapes_rejected() {
        assert!(matches!(
            parse_entities(json!(42), p()),
            Err(RetrievalError::InvalidConfig(_))
        ));
        assert!(matches!(
            parse_entities(json!({"A": [1, 2]}), p()),
            Err(RetrievalError::InvalidConfig(_))
        ));
        assert!(matches!(
            parse_symptom_index(json!(["fever"]), p()),
            Err(RetrievalError::InvalidConfig(_))
        ));
    }
}
