//! Hybrid requirement-to-evidence matching
//!
//! Combines semantic embedding similarity with literal keyword overlap so
//! that paraphrased evidence is not missed (the pure-literal failure mode)
//! and generic language does not false-positive (the pure-semantic one).

pub mod bullets;
pub mod embeddings;
pub mod hybrid;

pub use bullets::{extract_bullets, ResumeBullet};
pub use embeddings::{cosine_similarity, EmbeddingProvider, TokenHashEmbedder};
pub use hybrid::{HybridMatcher, MatchKind, MatchReport, RequirementVerdict};
