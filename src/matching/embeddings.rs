//! Embedding provider seam and similarity math
//!
//! Embedding generation is an external collaborator: the matcher only
//! requires determinism for identical text within a session. The built-in
//! `TokenHashEmbedder` is a dependency-free provider that hashes tokens
//! into a fixed-dimension bag vector, so the whole pipeline runs offline;
//! model-backed providers implement the same trait.

use crate::error::{ResumeOptimizerError, Result};
use unicode_segmentation::UnicodeSegmentation;

pub trait EmbeddingProvider: Send + Sync {
    /// Produce an embedding vector for the text. Must be deterministic for
    /// identical text within one session.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    fn dimension(&self) -> usize;
}

/// Cosine similarity of two vectors, clamped to [0, 1].
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f32> {
    if a.len() != b.len() {
        return Err(ResumeOptimizerError::Embedding(format!(
            "dimension mismatch: {} vs {}",
            a.len(),
            b.len()
        )));
    }
    if a.is_empty() {
        return Ok(0.0);
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }

    Ok((dot / (norm_a * norm_b)).clamp(0.0, 1.0))
}

/// Deterministic token-hash bag embedder.
pub struct TokenHashEmbedder {
    dimension: usize,
}

impl TokenHashEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    // FNV-1a; stable across runs and platforms, unlike the std hasher
    fn hash_token(token: &str) -> u64 {
        let mut hash: u64 = 0xcbf29ce484222325;
        for byte in token.as_bytes() {
            hash ^= *byte as u64;
            hash = hash.wrapping_mul(0x100000001b3);
        }
        hash
    }
}

impl Default for TokenHashEmbedder {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EmbeddingProvider for TokenHashEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];
        for word in text.unicode_words() {
            let token = word.to_lowercase();
            if token.len() < 2 {
                continue;
            }
            let hash = Self::hash_token(&token);
            let index = (hash % self.dimension as u64) as usize;
            // Second hash decides sign, spreading tokens across the space
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_is_deterministic() {
        let embedder = TokenHashEmbedder::default();
        let a = embedder.embed("python django postgresql").unwrap();
        let b = embedder.embed("python django postgresql").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_identical_text_has_similarity_one() {
        let embedder = TokenHashEmbedder::default();
        let v = embedder.embed("built rest apis with python and django").unwrap();
        let sim = cosine_similarity(&v, &v).unwrap();
        assert!((sim - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_related_text_scores_above_unrelated() {
        let embedder = TokenHashEmbedder::default();
        let req = embedder.embed("python django web development").unwrap();
        let related = embedder.embed("developed django applications in python").unwrap();
        let unrelated = embedder.embed("organized office supply inventory").unwrap();

        let related_sim = cosine_similarity(&req, &related).unwrap();
        let unrelated_sim = cosine_similarity(&req, &unrelated).unwrap();
        assert!(related_sim > unrelated_sim);
    }

    #[test]
    fn test_dimension_mismatch_is_error() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).is_err());
    }

    #[test]
    fn test_empty_text_embeds_to_zero_vector() {
        let embedder = TokenHashEmbedder::default();
        let v = embedder.embed("").unwrap();
        assert!(v.iter().all(|x| *x == 0.0));
        let sim = cosine_similarity(&v, &v).unwrap();
        assert_eq!(sim, 0.0);
    }
}
