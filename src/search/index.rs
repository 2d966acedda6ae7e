//! Symptom ↔ entity index
//!
//! Bidirectional, read-only mapping between normalized symptoms and entity
//! ids, built once through [`IndexBuilder`]. Lookups that miss can fall back
//! to an approximate key match above a caller-supplied threshold.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::text::normalize;
use crate::types::{Entity, RetrievalError, RetrievalResult};
use crate::utils::best_match;

/// Read-only symptom/entity index
#[derive(Debug, Default, Clone)]
pub struct SymptomEntityIndex {
    /// symptom (normalized) → entity ids, in registration order
    symptom_to_entities: HashMap<String, Vec<String>>,

    /// entity id → entity record
    entity_map: HashMap<String, Entity>,

    /// symptom phrases as first seen, in registration order
    vocabulary: Vec<String>,

    /// sorted keys, for deterministic fuzzy lookups
    symptom_keys: Vec<String>,
    entity_ids: Vec<String>,
}

impl SymptomEntityIndex {
    /// Start building an index
    pub fn builder() -> IndexBuilder {
        IndexBuilder::default()
    }

    /// Build an index from entity records
    pub fn from_entities(entities: Vec<Entity>) -> RetrievalResult<Self> {
        let mut builder = Self::builder();
        for entity in entities {
            builder.add_entity(entity);
        }
        builder.build()
    }

    /// Entity ids mapped to a symptom (exact, after normalization)
    pub fn entities_for(&self, symptom: &str) -> Option<&[String]> {
        self.symptom_to_entities
            .get(&normalize(symptom))
            .map(Vec::as_slice)
    }

    /// Entity ids for a symptom, falling back to the closest symptom key
    /// scoring at least `threshold`
    pub fn resolve_symptom(&self, symptom: &str, threshold: f64) -> Option<&[String]> {
        let norm = normalize(symptom);
        if let Some(ids) = self.symptom_to_entities.get(&norm) {
            return Some(ids);
        }

        let keys = self.symptom_keys.iter().map(String::as_str);
        match best_match(&norm, keys, threshold) {
            Some((key, ratio)) => {
                debug!(symptom = %norm, key, ratio, "symptom resolved by fuzzy fallback");
                self.symptom_to_entities.get(key).map(Vec::as_slice)
            }
            None => {
                debug!(symptom = %norm, "symptom has no index entry, dropped");
                None
            }
        }
    }

    /// Entity record by id or name (exact, after normalization)
    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entity_map.get(&normalize(id))
    }

    /// Entity record, falling back to the closest entity id scoring at least
    /// `threshold`
    pub fn resolve_entity(&self, id: &str, threshold: f64) -> Option<&Entity> {
        let norm = normalize(id);
        if let Some(entity) = self.entity_map.get(&norm) {
            return Some(entity);
        }

        let ids = self.entity_ids.iter().map(String::as_str);
        let (best, ratio) = best_match(&norm, ids, threshold)?;
        debug!(entity = %norm, resolved = best, ratio, "entity resolved by fuzzy fallback");
        self.entity_map.get(best)
    }

    /// Symptoms of an entity (entity → symptom direction)
    pub fn symptoms_of(&self, id: &str) -> Option<&[String]> {
        self.entity(id).map(|e| e.symptoms.as_slice())
    }

    /// Symptom phrases in registration order
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    /// Entity records sorted by id
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entity_ids.iter().filter_map(|id| self.entity_map.get(id))
    }

    /// Check if an entity exists
    pub fn contains(&self, id: &str) -> bool {
        self.entity_map.contains_key(&normalize(id))
    }

    /// Number of distinct symptoms
    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    /// Number of entity records
    pub fn entity_count(&self) -> usize {
        self.entity_map.len()
    }

    /// Get index statistics
    pub fn stats(&self) -> IndexStats {
        let mut referenced: Vec<&String> = self.symptom_to_entities.values().flatten().collect();
        referenced.sort();
        referenced.dedup();

        IndexStats {
            symptom_count: self.vocabulary.len(),
            entity_count: self.entity_map.len(),
            mapping_count: self.symptom_to_entities.values().map(Vec::len).sum(),
            unresolved_entity_ids: referenced
                .into_iter()
                .filter(|id| !self.entity_map.contains_key(*id))
                .count(),
        }
    }
}

/// Index statistics
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct IndexStats {
    pub symptom_count: usize,
    pub entity_count: usize,
    pub mapping_count: usize,
    /// Entity ids referenced by symptoms without an entity record
    pub unresolved_entity_ids: usize,
}

/// Mutable builder; the only way to construct a [`SymptomEntityIndex`]
#[derive(Debug, Default)]
pub struct IndexBuilder {
    index: SymptomEntityIndex,
}

impl IndexBuilder {
    /// Add an entity record and map each of its symptoms to it.
    ///
    /// Records that normalize to the same id are merged.
    pub fn add_entity(&mut self, entity: Entity) -> &mut Self {
        let id = entity.id();
        if id.is_empty() {
            warn!(name = %entity.name, "entity with empty name skipped");
            return self;
        }

        for symptom in &entity.symptoms {
            self.add_mapping(symptom, &id);
        }

        match self.index.entity_map.get_mut(&id) {
            Some(existing) => {
                for symptom in entity.symptoms {
                    if !existing.symptoms.contains(&symptom) {
                        existing.symptoms.push(symptom);
                    }
                }
                existing.metadata.extend(entity.metadata);
            }
            None => {
                self.index.entity_map.insert(id, entity);
            }
        }
        self
    }

    /// Map a symptom phrase to an entity name
    pub fn add_mapping(&mut self, symptom: &str, entity_name: &str) -> &mut Self {
        let norm = normalize(symptom);
        let id = normalize(entity_name);
        if norm.is_empty() || id.is_empty() {
            return self;
        }

        if !self.index.symptom_to_entities.contains_key(&norm) {
            self.index.vocabulary.push(symptom.trim().to_string());
        }
        let ids = self.index.symptom_to_entities.entry(norm).or_default();
        if !ids.contains(&id) {
            ids.push(id);
        }
        self
    }

    /// Finish the index.
    ///
    /// Fails with [`RetrievalError::EmptyDataset`] when no symptom was
    /// registered. When no entity record was added at all, records are
    /// derived from the symptom → entity mappings.
    pub fn build(mut self) -> RetrievalResult<SymptomEntityIndex> {
        if self.index.vocabulary.is_empty() {
            return Err(RetrievalError::EmptyDataset);
        }

        if self.index.entity_map.is_empty() {
            self.derive_entities();
        }

        let mut index = self.index;
        index.symptom_keys = index.symptom_to_entities.keys().cloned().collect();
        index.symptom_keys.sort();
        index.entity_ids = index.entity_map.keys().cloned().collect();
        index.entity_ids.sort();

        let stats = index.stats();
        if stats.unresolved_entity_ids > 0 {
            warn!(
                unresolved = stats.unresolved_entity_ids,
                "symptoms reference entity ids without records; fuzzy fallback will apply"
            );
        }
        Ok(index)
    }

    fn derive_entities(&mut self) {
        let index = &mut self.index;
        for symptom in &index.vocabulary {
            let Some(ids) = index.symptom_to_entities.get(&normalize(symptom)) else {
                continue;
            };
            for id in ids {
                index
                    .entity_map
                    .entry(id.clone())
                    .or_insert_with(|| Entity::new(id.clone()))
                    .symptoms
                    .push(symptom.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_index() -> SymptomEntityIndex {
        SymptomEntityIndex::from_entities(vec![
            Entity::with_symptoms("Crown_Point", vec!["head ache", "dizziness"]),
            Entity::with_symptoms("Knee Point", vec!["knee swelling", "Dizziness"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_both_directions() {
        let index = sample_index();
        assert_eq!(index.entities_for("Head Ache!"), Some(&["crown point".to_string()][..]));
        assert_eq!(
            index.entities_for("dizziness").unwrap(),
            &["crown point".to_string(), "knee point".to_string()]
        );
        assert_eq!(index.symptoms_of("Crown_Point").unwrap().len(), 2);
        assert_eq!(index.len(), 3);
        assert_eq!(index.entity_count(), 2);
    }

    #[test]
    fn test_empty_dataset_fails() {
        let result = SymptomEntityIndex::from_entities(vec![Entity::new("Lonely")]);
        assert!(matches!(result, Err(RetrievalError::EmptyDataset)));
    }

    #[test]
    fn test_resolve_symptom_fuzzy() {
        let index = sample_index();
        assert!(index.resolve_symptom("head-ache", 0.85).is_some());
        assert!(index.resolve_symptom("tooth decay", 0.85).is_none());
    }

    #[test]
    fn test_resolve_entity_fuzzy() {
        let mut builder = SymptomEntityIndex::builder();
        builder.add_entity(Entity::with_symptoms("Thilartha Varmam", vec!["head ache"]));
        builder.add_mapping("fainting", "Thilartha Varmamm");
        let index = builder.build().unwrap();

        assert!(index.entity("thilartha varmamm").is_none());
        let resolved = index.resolve_entity("thilartha varmamm", 0.90).unwrap();
        assert_eq!(resolved.name, "Thilartha Varmam");
        assert!(index.resolve_entity("unrelated", 0.90).is_none());
        assert_eq!(index.stats().unresolved_entity_ids, 1);
    }

    #[test]
    fn test_reverse_only_derives_entities() {
        let mut builder = SymptomEntityIndex::builder();
        builder.add_mapping("fever", "Point A");
        builder.add_mapping("chills", "Point A");
        builder.add_mapping("fever", "Point B");
        let index = builder.build().unwrap();

        assert_eq!(index.entity_count(), 2);
        assert_eq!(index.symptoms_of("point a").unwrap(), &["fever", "chills"]);
        let names: Vec<&str> = index.entities().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["point a", "point b"]);
    }

    #[test]
    fn test_duplicate_entities_merge() {
        let index = SymptomEntityIndex::from_entities(vec![
            Entity::with_symptoms("Point", vec!["fever"]),
            Entity::with_symptoms("point", vec!["chills", "fever"]),
        ])
        .unwrap();
        assert_eq!(index.entity_count(), 1);
        assert_eq!(index.symptoms_of("POINT").unwrap(), &["fever", "chills"]);
    }
}
