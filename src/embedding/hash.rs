//! Deterministic feature-hashing embedder.
//!
//! Needs no network or model download. Similarity reflects shared words and
//! character trigrams, which is enough for offline use and tests.

use super::Embedder;
use crate::error::Result;
use async_trait::async_trait;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Embedder that hashes words and trigrams into a fixed number of buckets.
pub struct HashEmbedder {
    dimensions: usize,
    model_id: String,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model_id: format!("hash-{}", dimensions),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv1a(feature.as_bytes());
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; self.dimensions];
        let lowered = text.to_lowercase();

        for word in lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
        {
            self.add_feature(&mut vector, word, 1.0);
        }

        let chars: Vec<char> = lowered.chars().collect();
        for window in chars.windows(3) {
            let trigram: String = window.iter().collect();
            self.add_feature(&mut vector, &trigram, 0.5);
        }

        // Short punctuation-only text has no words or trigrams.
        if vector.iter().all(|v| *v == 0.0) {
            for c in chars.iter().filter(|c| !c.is_whitespace()) {
                self.add_feature(&mut vector, c.encode_utf8(&mut [0; 4]), 0.5);
            }
        }

        vector
    }
}

impl Default for HashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

#[async_trait]
impl Embedder for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vectorize(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vectorize(t)).collect())
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::cosine_similarity;

    #[tokio::test]
    async fn test_deterministic() {
        let embedder = HashEmbedder::default();
        let a = embedder.embed("The sky is blue").await.unwrap();
        let b = embedder.embed("The sky is blue").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
    }

    #[tokio::test]
    async fn test_similar_texts_score_higher() {
        let embedder = HashEmbedder::default();
        let query = embedder.embed("what colour is the sky").await.unwrap();
        let related = embedder.embed("the sky is blue today").await.unwrap();
        let unrelated = embedder.embed("invoices are due friday").await.unwrap();

        assert!(cosine_similarity(&query, &related) > cosine_similarity(&query, &unrelated));
    }

    #[tokio::test]
    async fn test_short_symbol_text_is_not_zero() {
        let embedder = HashEmbedder::default();
        let bang = embedder.embed("!!").await.unwrap();
        assert!(bang.iter().any(|v| *v != 0.0));

        let other = embedder.embed("The sky is blue").await.unwrap();
        assert!(cosine_similarity(&bang, &bang) > cosine_similarity(&bang, &other));
    }

    #[test]
    fn test_model_id() {
        assert_eq!(HashEmbedder::new(64).model_id(), "hash-64");
    }
}
