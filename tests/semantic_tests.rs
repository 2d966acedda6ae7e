//! Semantic stage tests: async lookups, timeouts and the n-gram index

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use symptom_retrieval::{
    Entity, EmbeddingIndex, HashEmbedder, KnowledgeBase, KnowledgeBaseConfig, MatchMethod,
    RetrievalOptions, RetrievalStatus, Retriever, SemanticBridge, SemanticError, SemanticMode,
    SemanticStage, SymptomEntityIndex, SynonymDictionary,
};

struct SlowBridge {
    delay: Duration,
    calls: AtomicUsize,
}

impl SemanticBridge for SlowBridge {
    fn nearest_symptoms(&self, _query: &str, _k: usize) -> Result<Vec<(String, f32)>, SemanticError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        Ok(vec![("night chills".to_string(), 0.9)])
    }
}

struct PanickingBridge;

impl SemanticBridge for PanickingBridge {
    fn nearest_symptoms(&self, _query: &str, _k: usize) -> Result<Vec<(String, f32)>, SemanticError> {
        panic!("provider crashed")
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

#[tokio::test]
async fn test_async_semantic_applied() {
    let bridge = Arc::new(SlowBridge {
        delay: Duration::ZERO,
        calls: AtomicUsize::new(0),
    });
    let r = retriever().with_semantic(bridge.clone());

    let response = r.retrieve_async("fever chills", &strict()).await;
    assert_eq!(response.semantic, SemanticStage::Applied);
    assert_eq!(bridge.calls.load(Ordering::SeqCst), 1);
    assert!(response
        .matched_symptoms
        .iter()
        .any(|m| m.symptom == "night chills" && m.method == MatchMethod::SemanticVerified));
}

#[tokio::test]
async fn test_async_timeout_degrades_to_lexical() {
    let bridge = Arc::new(SlowBridge {
        delay: Duration::from_millis(300),
        calls: AtomicUsize::new(0),
    });
    let r = retriever()
        .with_semantic(bridge)
        .with_semantic_timeout(Duration::from_millis(20));

    let response = r.retrieve_async("fever chills", &strict()).await;
    assert_eq!(response.status, RetrievalStatus::Ok);
    assert_eq!(response.semantic, SemanticStage::Degraded);
    assert!(response
        .matched_symptoms
        .iter()
        .all(|m| m.method == MatchMethod::LexicalExact));
    assert_eq!(response.top_entity(), Some("Alpha"));
}

#[tokio::test]
async fn test_async_provider_panic_degrades() {
    let r = retriever().with_semantic(Arc::new(PanickingBridge));
    let response = r.retrieve_async("fever chills", &strict()).await;
    assert_eq!(response.semantic, SemanticStage::Degraded);
    assert_eq!(response.top_entity(), Some("Alpha"));
}

#[tokio::test]
async fn test_async_matches_sync_without_semantic() {
    let r = retriever();
    let options = RetrievalOptions::default();
    let sync = r.retrieve("fever", &options);
    let async_response = r.retrieve_async("fever", &options).await;
    assert_eq!(sync, async_response);
}

#[test]
fn test_ngram_index_as_bridge() {
    let vocab = ["knee swelling", "blurred vision", "night chills"];
    let index = EmbeddingIndex::build(HashEmbedder::default(), &vocab).unwrap();
    let hits = index.nearest_symptoms("swollen knee", 3).unwrap();
    assert_eq!(hits[0].0, "knee swelling");
    assert!(hits.iter().all(|(_, s)| *s > 0.0 && *s <= 1.0));
}

#[test]
fn test_ngram_mode_from_knowledge_base() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("entities.json");
    std::fs::write(
        &path,
        r#"{"Knee_Point": ["knee swelling", "knee stiffness"], "Eye_Point": ["blurred vision"]}"#,
    )
    .unwrap();

    let config = KnowledgeBaseConfig::new(&path).with_semantic(SemanticMode::Ngram);
    let retriever = KnowledgeBase::load(&config).unwrap();
    assert!(retriever.has_semantic());

    let response = retriever.retrieve("blurred vision", &RetrievalOptions::default());
    assert_eq!(response.semantic, SemanticStage::Applied);
    assert_eq!(response.top_entity(), Some("Eye_Point"));
}
