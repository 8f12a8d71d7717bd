//! The hybrid matcher: per-requirement match verdicts
//!
//! For every job requirement, find the best-supporting resume bullet by
//! `hybrid = 0.6 * semantic + 0.4 * literal` and classify the result. A
//! match needs corroboration from at least one axis past its threshold;
//! anything under the hybrid cutoff is no match at all.

use crate::config::MatchingConfig;
use crate::matching::bullets::ResumeBullet;
use crate::matching::embeddings::{cosine_similarity, EmbeddingProvider};
use crate::model::job::JobRequirement;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Exactly one kind is assigned per requirement, per the threshold rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    None,
    Semantic,
    Literal,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementVerdict {
    pub requirement: JobRequirement,
    pub best_bullet: Option<ResumeBullet>,
    pub semantic_score: f32,
    pub literal_score: f32,
    pub hybrid_score: f32,
    pub kind: MatchKind,
}

impl RequirementVerdict {
    pub fn is_matched(&self) -> bool {
        self.kind != MatchKind::None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchReport {
    pub verdicts: Vec<RequirementVerdict>,
    /// matched / total requirements, 0.0 when there are no requirements.
    pub coverage: f32,
}

impl MatchReport {
    pub fn matched_count(&self) -> usize {
        self.verdicts.iter().filter(|v| v.is_matched()).count()
    }
}

pub struct HybridMatcher<'a> {
    config: MatchingConfig,
    provider: &'a dyn EmbeddingProvider,
    // Embeddings are cached per matcher so repeated texts cost one call
    cache: HashMap<String, Option<Vec<f32>>>,
}

impl<'a> HybridMatcher<'a> {
    pub fn new(config: MatchingConfig, provider: &'a dyn EmbeddingProvider) -> Self {
        Self {
            config,
            provider,
            cache: HashMap::new(),
        }
    }

    /// Match every requirement against the bullet set.
    pub fn match_requirements(
        &mut self,
        requirements: &[JobRequirement],
        bullets: &[ResumeBullet],
    ) -> MatchReport {
        let verdicts: Vec<RequirementVerdict> = requirements
            .iter()
            .map(|req| self.match_one(req, bullets))
            .collect();

        let coverage = if verdicts.is_empty() {
            0.0
        } else {
            verdicts.iter().filter(|v| v.is_matched()).count() as f32 / verdicts.len() as f32
        };

        debug!(
            "hybrid match: {}/{} requirements covered",
            verdicts.iter().filter(|v| v.is_matched()).count(),
            verdicts.len()
        );

        MatchReport { verdicts, coverage }
    }

    fn match_one(
        &mut self,
        requirement: &JobRequirement,
        bullets: &[ResumeBullet],
    ) -> RequirementVerdict {
        let mut best: Option<(usize, f32, f32, f32)> = None;

        for (index, bullet) in bullets.iter().enumerate() {
            let semantic = self.semantic_score(&requirement.text, &bullet.text);
            let literal = literal_score(requirement, &bullet.text);
            let hybrid = self.config.semantic_weight * semantic
                + self.config.literal_weight * literal;

            let better = match &best {
                Some((_, _, _, best_hybrid)) => hybrid > *best_hybrid,
                None => true,
            };
            if better {
                best = Some((index, semantic, literal, hybrid));
            }
        }

        match best {
            Some((index, semantic, literal, hybrid)) => {
                let kind = self.classify(semantic, literal, hybrid);
                RequirementVerdict {
                    requirement: requirement.clone(),
                    best_bullet: Some(bullets[index].clone()),
                    semantic_score: semantic,
                    literal_score: literal,
                    hybrid_score: hybrid,
                    kind,
                }
            }
            None => RequirementVerdict {
                requirement: requirement.clone(),
                best_bullet: None,
                semantic_score: 0.0,
                literal_score: 0.0,
                hybrid_score: 0.0,
                kind: MatchKind::None,
            },
        }
    }

    /// Threshold rules. Kinds partition: exactly one applies to any pair.
    fn classify(&self, semantic: f32, literal: f32, hybrid: f32) -> MatchKind {
        if hybrid < self.config.hybrid_cutoff {
            return MatchKind::None;
        }
        let semantic_hit = semantic >= self.config.semantic_threshold;
        let literal_hit = literal >= self.config.literal_threshold;
        match (semantic_hit, literal_hit) {
            (true, true) => MatchKind::Hybrid,
            (true, false) => MatchKind::Semantic,
            (false, true) => MatchKind::Literal,
            (false, false) => MatchKind::None,
        }
    }

    /// Embedding failure for either side degrades that pair to 0.0 rather
    /// than aborting the whole match.
    fn semantic_score(&mut self, requirement_text: &str, bullet_text: &str) -> f32 {
        let req_vec = self.embed_cached(requirement_text);
        let bullet_vec = self.embed_cached(bullet_text);
        match (req_vec, bullet_vec) {
            (Some(a), Some(b)) => cosine_similarity(&a, &b).unwrap_or(0.0),
            _ => 0.0,
        }
    }

    fn embed_cached(&mut self, text: &str) -> Option<Vec<f32>> {
        if let Some(cached) = self.cache.get(text) {
            return cached.clone();
        }
        let result = match self.provider.embed(text) {
            Ok(vector) => Some(vector),
            Err(e) => {
                debug!("embedding failed, scoring pair as 0.0: {}", e);
                None
            }
        };
        self.cache.insert(text.to_string(), result.clone());
        result
    }
}

/// Fraction of requirement keywords found verbatim (case-insensitive
/// substring) in the bullet text.
fn literal_score(requirement: &JobRequirement, bullet_text: &str) -> f32 {
    if requirement.keywords.is_empty() {
        return 0.0;
    }
    let haystack = bullet_text.to_lowercase();
    let found = requirement
        .keywords
        .iter()
        .filter(|k| haystack.contains(k.as_str()))
        .count();
    found as f32 / requirement.keywords.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::matching::embeddings::TokenHashEmbedder;
    use crate::model::job::{RequirementCategory, RequirementPriority};
    use crate::model::resume::SectionId;

    fn requirement(text: &str, keywords: &[&str]) -> JobRequirement {
        JobRequirement {
            text: text.to_string(),
            category: RequirementCategory::Technical,
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            priority: RequirementPriority::MustHave,
        }
    }

    fn bullet(text: &str) -> ResumeBullet {
        ResumeBullet {
            text: text.to_string(),
            section: Some(SectionId::Experience),
        }
    }

    /// Provider that always fails, for the degradation path.
    struct FailingEmbedder;
    impl EmbeddingProvider for FailingEmbedder {
        fn embed(&self, _text: &str) -> crate::error::Result<Vec<f32>> {
            Err(crate::error::ResumeOptimizerError::Embedding(
                "provider offline".to_string(),
            ))
        }
        fn dimension(&self) -> usize {
            0
        }
    }

    #[test]
    fn test_strong_literal_and_semantic_overlap_matches() {
        let embedder = TokenHashEmbedder::default();
        let mut matcher = HybridMatcher::new(Config::default().matching, &embedder);

        let reqs = vec![requirement(
            "experience with python and django development",
            &["python", "django", "development"],
        )];
        let bullets = vec![
            bullet("Led python and django development for the billing platform"),
            bullet("Organized the quarterly team offsite"),
        ];

        let report = matcher.match_requirements(&reqs, &bullets);
        assert_eq!(report.verdicts.len(), 1);
        let verdict = &report.verdicts[0];
        assert!(verdict.is_matched(), "verdict: {:?}", verdict);
        assert!(verdict.best_bullet.as_ref().unwrap().text.contains("billing"));
        assert_eq!(report.coverage, 1.0);
    }

    #[test]
    fn test_unrelated_bullets_do_not_match() {
        let embedder = TokenHashEmbedder::default();
        let mut matcher = HybridMatcher::new(Config::default().matching, &embedder);

        let reqs = vec![requirement(
            "kubernetes cluster administration",
            &["kubernetes", "cluster", "administration"],
        )];
        let bullets = vec![bullet("Filed expense reports for the sales department")];

        let report = matcher.match_requirements(&reqs, &bullets);
        assert_eq!(report.verdicts[0].kind, MatchKind::None);
        assert_eq!(report.coverage, 0.0);
    }

    #[test]
    fn test_embedding_failure_degrades_to_literal_only() {
        let embedder = FailingEmbedder;
        let mut matcher = HybridMatcher::new(Config::default().matching, &embedder);

        let reqs = vec![requirement(
            "python and django experience",
            &["python", "django"],
        )];
        let bullets = vec![bullet("Shipped python django services to production")];

        let report = matcher.match_requirements(&reqs, &bullets);
        let verdict = &report.verdicts[0];
        assert_eq!(verdict.semantic_score, 0.0);
        assert_eq!(verdict.literal_score, 1.0);
        // hybrid = 0.4 * 1.0 = 0.4, under the 0.65 cutoff
        assert_eq!(verdict.kind, MatchKind::None);
    }

    #[test]
    fn test_classification_partition() {
        let embedder = TokenHashEmbedder::default();
        let matcher = HybridMatcher::new(Config::default().matching, &embedder);

        // Sweep the score space: exactly one kind per point
        for semantic_step in 0..=10 {
            for literal_step in 0..=10 {
                let semantic = semantic_step as f32 / 10.0;
                let literal = literal_step as f32 / 10.0;
                let hybrid = 0.6 * semantic + 0.4 * literal;
                let kind = matcher.classify(semantic, literal, hybrid);

                if hybrid < 0.65 {
                    assert_eq!(kind, MatchKind::None);
                } else if semantic >= 0.70 && literal >= 0.5 {
                    assert_eq!(kind, MatchKind::Hybrid);
                } else if semantic >= 0.70 {
                    assert_eq!(kind, MatchKind::Semantic);
                } else if literal >= 0.5 {
                    assert_eq!(kind, MatchKind::Literal);
                } else {
                    assert_eq!(kind, MatchKind::None);
                }
            }
        }
    }

    #[test]
    fn test_no_requirements_yields_zero_coverage() {
        let embedder = TokenHashEmbedder::default();
        let mut matcher = HybridMatcher::new(Config::default().matching, &embedder);
        let report = matcher.match_requirements(&[], &[bullet("anything")]);
        assert_eq!(report.coverage, 0.0);
        assert!(report.verdicts.is_empty());
    }
}
