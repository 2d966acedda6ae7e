//! In-memory embedding index

use rayon::prelude::*;
use tracing::debug;

use super::{Embedder, SemanticBridge};
use crate::text::{normalize, tokenize};
use crate::types::SemanticError;

/// Cosine similarity of two vectors; 0 on length mismatch or zero norm
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Character n-gram feature-hashing embedder.
///
/// Each word is padded (`#word#`), split into n-grams and hashed into a fixed
/// number of buckets; the result is L2-normalized. Captures spelling overlap
/// ("swollen" / "swelling"), not meaning.
#[derive(Debug, Clone, Copy)]
pub struct HashEmbedder {
    dimension: usize,
    ngram: usize,
}

impl HashEmbedder {
    pub const DEFAULT_DIMENSION: usize = 256;
    pub const DEFAULT_NGRAM: usize = 3;

    pub fn new(dimension: usize, ngram: usize) -> Self {
        Self {
            dimension: dimension.max(1),
            ngram: ngram.max(1),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    fn bucket(&self, gram: &[char]) -> usize {
        // FNV-1a
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for c in gram {
            let mut buf = [0u8; 4];
            for byte in c.encode_utf8(&mut buf).as_bytes() {
                hash ^= u64::from(*byte);
                hash = hash.wrapping_mul(0x0100_0000_01b3);
            }
        }
        (hash % self.dimension as u64) as usize
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSION, Self::DEFAULT_NGRAM)
    }
}

impl Embedder for HashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, SemanticError> {
        let mut vector = vec![0.0f32; self.dimension];
        let normalized = normalize(text);

        for word in tokenize(&normalized) {
            let padded: Vec<char> = std::iter::once('#')
                .chain(word.chars())
                .chain(std::iter::once('#'))
                .collect();
            if padded.len() < self.ngram {
                vector[self.bucket(&padded)] += 1.0;
                continue;
            }
            for gram in padded.windows(self.ngram) {
                vector[self.bucket(gram)] += 1.0;
            }
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

/// Symptom vectors searched by brute-force cosine similarity
#[derive(Debug)]
pub struct EmbeddingIndex<E> {
    embedder: E,
    symptoms: Vec<String>,
    vectors: Vec<Vec<f32>>,
}

impl<E: Embedder> EmbeddingIndex<E> {
    /// Embed every symptom of the vocabulary
    pub fn build<S: AsRef<str>>(embedder: E, symptoms: &[S]) -> Result<Self, SemanticError> {
        let mut names = Vec::with_capacity(symptoms.len());
        let mut vectors = Vec::with_capacity(symptoms.len());
        for symptom in symptoms {
            let symptom = symptom.as_ref();
            vectors.push(embedder.embed(symptom)?);
            names.push(symptom.to_string());
        }
        Self::from_vectors(embedder, names.into_iter().zip(vectors).collect())
    }

    /// Use precomputed symptom vectors; all must share one dimension
    pub fn from_vectors(embedder: E, entries: Vec<(String, Vec<f32>)>) -> Result<Self, SemanticError> {
        let dimension = entries.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((name, v)) = entries.iter().find(|(_, v)| v.len() != dimension) {
            return Err(SemanticError::Provider(format!(
                "vector for '{}' has dimension {}, expected {}",
                name,
                v.len(),
                dimension
            )));
        }

        let (symptoms, vectors) = entries.into_iter().unzip();
        Ok(Self {
            embedder,
            symptoms,
            vectors,
        })
    }

    pub fn len(&self) -> usize {
        self.symptoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symptoms.is_empty()
    }
}

impl<E: Embedder> SemanticBridge for EmbeddingIndex<E> {
    fn nearest_symptoms(&self, query: &str, k: usize) -> Result<Vec<(String, f32)>, SemanticError> {
        if k == 0 || self.symptoms.is_empty() {
            return Ok(Vec::new());
        }

        let query_vector = self.embedder.embed(query)?;
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .par_iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(&query_vector, v).clamp(0.0, 1.0)))
            .filter(|(_, score)| *score > 0.0)
            .collect();

        // stable: equal scores keep vocabulary order
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        debug!(query, candidates = scored.len(), "semantic neighbours computed");

        Ok(scored
            .into_iter()
            .map(|(i, score)| (self.symptoms[i].clone(), score))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }

    #[test]
    fn test_hash_embedder_is_normalized_and_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("Knee Swelling").unwrap();
        let b = embedder.embed("knee swelling").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), embedder.dimension());
        assert_eq!(HashEmbedder::new(64, 2).embed("fever").unwrap().len(), 64);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
        assert!(embedder.embed("").unwrap().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_spelling_overlap_scores_higher() {
        let embedder = HashEmbedder::default();
        let q = embedder.embed("swollen knee").unwrap();
        let near = embedder.embed("knee swelling").unwrap();
        let far = embedder.embed("blurred vision").unwrap();
        assert!(cosine_similarity(&q, &near) > cosine_similarity(&q, &far));
    }

    #[test]
    fn test_nearest_symptoms() {
        let vocab = ["blurred vision", "knee swelling", "knee stiffness"];
        let index = EmbeddingIndex::build(HashEmbedder::default(), &vocab).unwrap();
        assert_eq!(index.len(), 3);

        let hits = index.nearest_symptoms("swelling in the knee", 2).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].0, "knee swelling");
        assert!(hits[0].1 >= hits[1].1);
        assert!(index.nearest_symptoms("knee", 0).unwrap().is_empty());
    }

    #[test]
    fn test_from_vectors_rejects_mixed_dimensions() {
        let entries = vec![
            ("a".to_string(), vec![1.0, 0.0]),
            ("b".to_string(), vec![1.0]),
        ];
        let result = EmbeddingIndex::from_vectors(HashEmbedder::new(2, 3), entries);
        assert!(matches!(result, Err(SemanticError::Provider(_))));
    }
}
