//! Pool merging, entity aggregation and ranking

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::options::{FuzzyConfig, ScoringWeights};
use crate::search::SymptomEntityIndex;
use crate::text::normalize;
use crate::types::{round2, Confidence, MatchCandidate, MatchMethod, RankedEntity, ScoredEntity};

/// Scale of the weighted-score confidence normalization
const CONFIDENCE_SCALE: f64 = 5.0;

/// A semantic candidate that passed verification
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedCandidate {
    pub symptom: String,
    pub semantic_score: f64,
    pub verification_score: f64,
}

/// Turns per-pool symptom matches into ranked entities
#[derive(Debug, Clone, Copy)]
pub struct ScoringAggregator<'a> {
    index: &'a SymptomEntityIndex,
    weights: &'a ScoringWeights,
    fuzzy: FuzzyConfig,
}

impl<'a> ScoringAggregator<'a> {
    pub fn new(index: &'a SymptomEntityIndex, weights: &'a ScoringWeights, fuzzy: FuzzyConfig) -> Self {
        Self {
            index,
            weights,
            fuzzy,
        }
    }

    /// Merge the three pools into one list, best first, at most `top_k` long.
    ///
    /// Pools are applied in priority order (high lexical, verified semantic,
    /// low lexical); a symptom already taken by a higher pool is never
    /// overwritten. Equal scores keep pool order, then vocabulary order.
    pub fn merge(
        &self,
        high: &[(String, f64)],
        verified: &[VerifiedCandidate],
        low: &[(String, f64)],
        top_k: usize,
    ) -> Vec<MatchCandidate> {
        let w = self.weights;
        let mut seen = HashSet::new();
        let mut merged = Vec::with_capacity(high.len() + verified.len() + low.len());

        for (symptom, score) in high {
            if seen.insert(normalize(symptom)) {
                merged.push(MatchCandidate::new(
                    symptom.clone(),
                    score * w.exact_blend,
                    MatchMethod::LexicalExact,
                ));
            }
        }
        for candidate in verified {
            if seen.insert(normalize(&candidate.symptom)) {
                let score = w.semantic_blend * candidate.semantic_score
                    + w.verification_blend * candidate.verification_score;
                merged.push(MatchCandidate::new(
                    candidate.symptom.clone(),
                    score,
                    MatchMethod::SemanticVerified,
                ));
            }
        }
        for (symptom, score) in low {
            if seen.insert(normalize(symptom)) {
                merged.push(MatchCandidate::new(
                    symptom.clone(),
                    score * w.partial_blend,
                    MatchMethod::LexicalPartial,
                ));
            }
        }

        merged.sort_by(|a, b| b.score.total_cmp(&a.score));
        merged.truncate(top_k);
        merged
    }

    /// Accumulate per-entity evidence from matched symptoms.
    ///
    /// Keys are the entity ids found in the symptom index. Symptoms with no
    /// index entry (even after the fuzzy fallback) are dropped.
    pub fn aggregate(&self, matches: &[MatchCandidate], query_symptom_count: usize) -> Vec<ScoredEntity> {
        let w = self.weights;
        let mut scores: BTreeMap<&str, ScoredEntity> = BTreeMap::new();

        for candidate in matches {
            let Some(ids) = self
                .index
                .resolve_symptom(&candidate.symptom, self.fuzzy.symptom_key_threshold)
            else {
                continue;
            };

            for id in ids {
                let entry = scores
                    .entry(id.as_str())
                    .or_insert_with(|| ScoredEntity::new(id.clone()));
                entry.matched_symptoms.push(candidate.symptom.clone());
                entry.total_score += candidate.score;

                match candidate.method {
                    MatchMethod::LexicalExact => {
                        entry.exact_count += 1;
                        entry.weighted_score += candidate.score * w.exact_weight;
                    }
                    MatchMethod::SemanticVerified => {
                        entry.verified_count += 1;
                        entry.weighted_score += candidate.score * w.verified_weight;
                    }
                    MatchMethod::LexicalPartial => {
                        entry.partial_count += 1;
                        entry.weighted_score += candidate.score * w.partial_weight;
                    }
                }
            }
        }

        let divisor = query_symptom_count.max(1) as f64;
        scores
            .into_values()
            .map(|mut entry| {
                let count = entry.matched_count();
                if count > 1 {
                    entry.weighted_score += (count as f64 / divisor).min(1.0) * w.diversity_cap;
                }
                entry.avg_match_quality = entry.total_score / count.max(1) as f64;
                if entry.exact_count > 1 {
                    entry.weighted_score *= w.multi_exact_multiplier;
                }
                entry
            })
            .collect()
    }

    /// Rank entities and convert the best `top_n` to output records
    pub fn rank(
        &self,
        mut scored: Vec<ScoredEntity>,
        matches: &[MatchCandidate],
        top_n: usize,
    ) -> Vec<RankedEntity> {
        scored.sort_by(compare_rank);
        scored.truncate(top_n);

        scored
            .into_iter()
            .map(|entry| self.to_ranked(entry, matches))
            .collect()
    }

    fn to_ranked(&self, entry: ScoredEntity, matches: &[MatchCandidate]) -> RankedEntity {
        let record = self
            .index
            .resolve_entity(&entry.entity_id, self.fuzzy.entity_id_threshold);
        if record.is_none() {
            debug!(entity = %entry.entity_id, "entity id has no record, reported by id");
        }

        let (name, all_symptoms, metadata) = match record {
            Some(e) => (e.name.clone(), e.symptoms.clone(), e.metadata.clone()),
            None => (entry.entity_id.clone(), Vec::new(), Default::default()),
        };

        let matched = entry.matched_count();
        let total = all_symptoms.len();
        let match_percentage = if total > 0 {
            round2(100.0 * matched as f64 / total as f64)
        } else {
            0.0
        };

        let top_symptom_score = matches
            .iter()
            .filter(|m| entry.matched_symptoms.contains(&m.symptom))
            .map(|m| m.score)
            .fold(0.0_f64, f64::max);

        RankedEntity {
            confidence: if entry.exact_count > 0 {
                Confidence::High
            } else {
                Confidence::Medium
            },
            confidence_score: confidence_score(entry.weighted_score, top_symptom_score),
            entity_id: entry.entity_id,
            name,
            matched_symptom_count: matched,
            total_symptoms: total,
            match_percentage,
            matched_symptoms: entry.matched_symptoms,
            all_symptoms,
            weighted_score: entry.weighted_score,
            exact_count: entry.exact_count,
            verified_count: entry.verified_count,
            partial_count: entry.partial_count,
            avg_match_quality: entry.avg_match_quality,
            metadata,
        }
    }
}

/// Ranking order: exact count, matched count, weighted score, average match
/// quality (all descending), then entity id ascending
pub fn compare_rank(a: &ScoredEntity, b: &ScoredEntity) -> Ordering {
    b.exact_count
        .cmp(&a.exact_count)
        .then_with(|| b.matched_count().cmp(&a.matched_count()))
        .then_with(|| b.weighted_score.total_cmp(&a.weighted_score))
        .then_with(|| b.avg_match_quality.total_cmp(&a.avg_match_quality))
        .then_with(|| a.entity_id.cmp(&b.entity_id))
}

/// Map a weighted score to `[0, 1)`; falls back to the best symptom score
/// when the weighted score is not positive
pub fn confidence_score(weighted_score: f64, top_symptom_score: f64) -> f64 {
    if weighted_score > 0.0 {
        weighted_score / (weighted_score + CONFIDENCE_SCALE)
    } else if top_symptom_score > 0.0 {
        top_symptom_score / (top_symptom_score + 1.0)
    } else {
        0.0
    }
}
