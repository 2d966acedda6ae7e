//! Query pipeline
//!
//! [`Retriever`] ties the stages together: lexical matching, the optional
//! semantic expansion with lexical verification, pool merging, entity
//! aggregation and ranking. It holds only immutable state behind `Arc`, so a
//! single retriever can serve concurrent queries.

mod options;
mod scoring;

pub use options::{FuzzyConfig, RetrievalOptions, ScoringWeights};
pub use scoring::{compare_rank, confidence_score, ScoringAggregator, VerifiedCandidate};

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::search::{LexicalMatcher, LexicalVerifier, SymptomEntityIndex, SynonymDictionary};
use crate::semantic::SemanticBridge;
use crate::text::normalize;
use crate::types::{RetrievalResponse, RetrievalStatus, SemanticError, SemanticStage};

/// Default bound on one semantic lookup in [`Retriever::retrieve_async`]
pub const DEFAULT_SEMANTIC_TIMEOUT: Duration = Duration::from_millis(2000);

fn panic_message(payload: &(dyn Any + Send)) -> String {
    match payload.downcast_ref::<&str>() {
        Some(msg) => format!("provider panicked: {msg}"),
        None => match payload.downcast_ref::<String>() {
            Some(msg) => format!("provider panicked: {msg}"),
            None => "provider panicked".to_string(),
        },
    }
}

/// Lexical matches split at the high-confidence threshold
struct LexicalPools {
    high: Vec<(String, f64)>,
    low: Vec<(String, f64)>,
}

enum SemanticPlan<'a> {
    Skip(SemanticStage),
    Lookup(&'a Arc<dyn SemanticBridge>, usize),
}

/// Symptom → entity retriever
#[derive(Clone)]
pub struct Retriever {
    index: Arc<SymptomEntityIndex>,
    matcher: Arc<LexicalMatcher>,
    verifier: LexicalVerifier,
    semantic: Option<Arc<dyn SemanticBridge>>,
    weights: ScoringWeights,
    fuzzy: FuzzyConfig,
    semantic_timeout: Duration,
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("symptoms", &self.index.len())
            .field("entities", &self.index.entity_count())
            .field("semantic", &self.semantic.is_some())
            .field("weights", &self.weights)
            .field("fuzzy", &self.fuzzy)
            .field("semantic_timeout", &self.semantic_timeout)
            .finish()
    }
}

impl Retriever {
    /// Create a lexical-only retriever over an index
    pub fn new(index: Arc<SymptomEntityIndex>, dictionary: Arc<SynonymDictionary>) -> Self {
        let matcher = LexicalMatcher::new(index.vocabulary(), dictionary);
        Self {
            index,
            matcher: Arc::new(matcher),
            verifier: LexicalVerifier::new(),
            semantic: None,
            weights: ScoringWeights::default(),
            fuzzy: FuzzyConfig::default(),
            semantic_timeout: DEFAULT_SEMANTIC_TIMEOUT,
        }
    }

    /// Attach a semantic capability
    pub fn with_semantic(mut self, bridge: Arc<dyn SemanticBridge>) -> Self {
        self.semantic = Some(bridge);
        self
    }

    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    pub fn with_fuzzy(mut self, fuzzy: FuzzyConfig) -> Self {
        self.fuzzy = fuzzy;
        self
    }

    pub fn with_semantic_timeout(mut self, timeout: Duration) -> Self {
        self.semantic_timeout = timeout;
        self
    }

    pub fn index(&self) -> &SymptomEntityIndex {
        &self.index
    }

    pub fn matcher(&self) -> &LexicalMatcher {
        &self.matcher
    }

    pub fn dictionary(&self) -> &SynonymDictionary {
        self.matcher.dictionary()
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    pub fn has_semantic(&self) -> bool {
        self.semantic.is_some()
    }

    /// Answer a query.
    ///
    /// Never fails: empty queries, queries without matches and semantic
    /// outages are reported in the response. A provider that errors or
    /// panics degrades the query to lexical-only.
    ///
    /// The semantic call runs on the calling thread without a time bound;
    /// callers that need one use [`Retriever::retrieve_async`].
    pub fn retrieve(&self, query: &str, options: &RetrievalOptions) -> RetrievalResponse {
        let Some(pools) = self.lexical_stage(query, options) else {
            return RetrievalResponse::empty_query(query);
        };

        let (verified, stage) = match self.plan_semantic(&pools, options) {
            SemanticPlan::Skip(stage) => (Vec::new(), stage),
            SemanticPlan::Lookup(bridge, k) => {
                let result = panic::catch_unwind(AssertUnwindSafe(|| bridge.nearest_symptoms(query, k)))
                    .unwrap_or_else(|payload| Err(SemanticError::Provider(panic_message(&*payload))));
                self.semantic_stage(query, result, &pools, options)
            }
        };

        self.finish(query, &pools, &verified, stage, options)
    }

    /// Answer a query, running the semantic lookup on the blocking pool under
    /// the configured timeout.
    ///
    /// A lookup that fails, panics or times out degrades to lexical-only.
    pub async fn retrieve_async(&self, query: &str, options: &RetrievalOptions) -> RetrievalResponse {
        let Some(pools) = self.lexical_stage(query, options) else {
            return RetrievalResponse::empty_query(query);
        };

        let (verified, stage) = match self.plan_semantic(&pools, options) {
            SemanticPlan::Skip(stage) => (Vec::new(), stage),
            SemanticPlan::Lookup(bridge, k) => {
                let bridge = Arc::clone(bridge);
                let owned_query = query.to_string();
                let task = tokio::task::spawn_blocking(move || bridge.nearest_symptoms(&owned_query, k));

                let result = match tokio::time::timeout(self.semantic_timeout, task).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => Err(SemanticError::Provider(e.to_string())),
                    Err(_) => Err(SemanticError::Timeout(self.semantic_timeout)),
                };
                self.semantic_stage(query, result, &pools, options)
            }
        };

        self.finish(query, &pools, &verified, stage, options)
    }

    fn lexical_stage(&self, query: &str, options: &RetrievalOptions) -> Option<LexicalPools> {
        if normalize(query).is_empty() {
            return None;
        }

        let split = self.weights.high_confidence_split;
        let (high, low): (Vec<_>, Vec<_>) = self
            .matcher
            .find_matches(query, options.lexical_threshold)
            .into_iter()
            .partition(|(_, score)| *score >= split);

        debug!(query, high = high.len(), low = low.len(), "lexical stage");
        Some(LexicalPools { high, low })
    }

    fn plan_semantic(&self, pools: &LexicalPools, options: &RetrievalOptions) -> SemanticPlan<'_> {
        if pools.high.len() >= options.top_symptoms {
            return SemanticPlan::Skip(SemanticStage::NotNeeded);
        }
        match &self.semantic {
            Some(bridge) => {
                let k = options.top_symptoms.saturating_mul(self.weights.semantic_overfetch);
                SemanticPlan::Lookup(bridge, k)
            }
            None => SemanticPlan::Skip(SemanticStage::Disabled),
        }
    }

    fn semantic_stage(
        &self,
        query: &str,
        result: Result<Vec<(String, f32)>, SemanticError>,
        pools: &LexicalPools,
        options: &RetrievalOptions,
    ) -> (Vec<VerifiedCandidate>, SemanticStage) {
        let candidates = match result {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(query, error = %e, "semantic lookup failed, continuing lexical-only");
                return (Vec::new(), SemanticStage::Degraded);
            }
        };

        let high: Vec<String> = pools.high.iter().map(|(s, _)| normalize(s)).collect();
        let total = candidates.len();
        let verified: Vec<VerifiedCandidate> = candidates
            .into_iter()
            .map(|(symptom, score)| (symptom, f64::from(score)))
            .filter(|(_, score)| *score >= options.semantic_threshold)
            .filter(|(symptom, _)| !high.contains(&normalize(symptom)))
            .filter_map(|(symptom, semantic_score)| {
                let verification_score = self.verifier.verify(query, &symptom);
                (verification_score >= options.verification_threshold).then_some(VerifiedCandidate {
                    symptom,
                    semantic_score,
                    verification_score,
                })
            })
            .collect();

        debug!(query, candidates = total, verified = verified.len(), "semantic stage");
        (verified, SemanticStage::Applied)
    }

    fn finish(
        &self,
        query: &str,
        pools: &LexicalPools,
        verified: &[VerifiedCandidate],
        stage: SemanticStage,
        options: &RetrievalOptions,
    ) -> RetrievalResponse {
        let aggregator = ScoringAggregator::new(&self.index, &self.weights, self.fuzzy);

        let matches = aggregator.merge(&pools.high, verified, &pools.low, options.top_symptoms);
        if matches.is_empty() {
            debug!(query, "no matching symptoms");
            return RetrievalResponse::no_match(query, stage);
        }

        let query_symptoms = self.matcher.query_symptom_count(query);
        let scored = aggregator.aggregate(&matches, query_symptoms);
        let ranked = aggregator.rank(scored, &matches, options.top_entities);
        debug!(
            query,
            symptoms = matches.len(),
            entities = ranked.len(),
            "retrieval done"
        );

        RetrievalResponse {
            query: query.to_string(),
            status: RetrievalStatus::Ok,
            message: None,
            semantic: stage,
            matched_symptoms: matches,
            ranked_entities: ranked,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Entity, MatchMethod};

    struct FixedBridge(Result<Vec<(String, f32)>, SemanticError>);

    impl SemanticBridge for FixedBridge {
        fn nearest_symptoms(&self, _query: &str, _k: usize) -> Result<Vec<(String, f32)>, SemanticError> {
            self.0.clone()
        }
    }

    fn retriever() -> Retriever {
        let index = SymptomEntityIndex::from_entities(vec![
            Entity::with_symptoms("Alpha", vec!["fever", "chills"]),
            Entity::with_symptoms("Beta", vec!["fever", "night chills"]),
        ])
        .unwrap();
        Retriever::new(Arc::new(index), Arc::new(SynonymDictionary::empty()))
    }

    fn strict() -> RetrievalOptions {
        RetrievalOptions {
            lexical_threshold: 0.9,
            ..RetrievalOptions::default()
        }
    }

    #[test]
    fn test_two_exact_outrank_exact_plus_verified() {
        let bridge = FixedBridge(Ok(vec![("night chills".to_string(), 0.9)]));
        let r = retriever().with_semantic(Arc::new(bridge));

        let response = r.retrieve("fever chills", &strict());
        assert_eq!(response.status, RetrievalStatus::Ok);
        assert_eq!(response.semantic, SemanticStage::Applied);

        let ranked = &response.ranked_entities;
        assert_eq!(ranked[0].entity_id, "alpha");
        assert_eq!(ranked[0].exact_count, 2);
        assert_eq!(ranked[1].entity_id, "beta");
        assert_eq!((ranked[1].exact_count, ranked[1].verified_count), (1, 1));

        let night = response
            .matched_symptoms
            .iter()
            .find(|m| m.symptom == "night chills")
            .unwrap();
        assert_eq!(night.method, MatchMethod::SemanticVerified);
    }

    #[test]
    fn test_lexical_only_without_semantic() {
        let response = retriever().retrieve("fever chills", &strict());
        assert_eq!(response.semantic, SemanticStage::Disabled);
        assert!(response
            .matched_symptoms
            .iter()
            .all(|m| m.method != MatchMethod::SemanticVerified));
        assert_eq!(response.top_entity(), Some("Alpha"));
    }

    #[test]
    fn test_provider_error_degrades() {
        let bridge = FixedBridge(Err(SemanticError::Provider("offline".into())));
        let r = retriever().with_semantic(Arc::new(bridge));
        let response = r.retrieve("fever chills", &strict());
        assert_eq!(response.semantic, SemanticStage::Degraded);
        assert_eq!(response.top_entity(), Some("Alpha"));
    }

    struct PanickingBridge;

    impl SemanticBridge for PanickingBridge {
        fn nearest_symptoms(&self, _query: &str, _k: usize) -> Result<Vec<(String, f32)>, SemanticError> {
            panic!("provider crashed")
        }
    }

    #[test]
    fn test_provider_panic_degrades() {
        let r = retriever().with_semantic(Arc::new(PanickingBridge));
        let response = r.retrieve("fever chills", &strict());
        assert_eq!(response.status, RetrievalStatus::Ok);
        assert_eq!(response.semantic, SemanticStage::Degraded);
        assert_eq!(response.top_entity(), Some("Alpha"));
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(&"boom"), "provider panicked: boom");
        assert_eq!(panic_message(&String::from("bang")), "provider panicked: bang");
        assert_eq!(panic_message(&42_u8), "provider panicked");
    }

    #[test]
    fn test_unverified_candidates_are_dropped() {
        let bridge = FixedBridge(Ok(vec![("night chills".to_string(), 0.9)]));
        let r = retriever().with_semantic(Arc::new(bridge));
        let options = RetrievalOptions {
            verification_threshold: 0.99,
            ..strict()
        };
        let response = r.retrieve("fever chills", &options);
        assert_eq!(response.semantic, SemanticStage::Applied);
        assert!(response.matched_symptoms.iter().all(|m| m.symptom != "night chills"));
    }

    #[test]
    fn test_semantic_not_needed_when_lexical_fills_top_k() {
        let bridge = FixedBridge(Err(SemanticError::Unavailable));
        let r = retriever().with_semantic(Arc::new(bridge));
        let options = RetrievalOptions {
            top_symptoms: 1,
            ..strict()
        };
        let response = r.retrieve("fever", &options);
        assert_eq!(response.semantic, SemanticStage::NotNeeded);
        assert_eq!(response.matched_symptoms.len(), 1);
    }

    #[test]
    fn test_empty_and_unmatched_queries() {
        let r = retriever();
        let empty = r.retrieve("  ?! ", &RetrievalOptions::default());
        assert_eq!(empty.status, RetrievalStatus::EmptyQuery);
        assert!(empty.ranked_entities.is_empty());

        let none = r.retrieve("broken wrist", &RetrievalOptions::default());
        assert_eq!(none.status, RetrievalStatus::NoMatch);
        assert!(none.matched_symptoms.is_empty());
        assert!(none.ranked_entities.is_empty());
    }
}
