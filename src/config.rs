//! Configuration management for the resume optimizer
//!
//! All empirically-chosen scoring thresholds live here as named fields so
//! they can be reviewed and tuned without touching the engine.

use crate::error::{Result, ResumeOptimizerError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub scoring: ScoringConfig,
    pub matching: MatchingConfig,
    pub pipeline: PipelineConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Minimum job-description length (chars) before JD mode activates.
    pub jd_min_chars: usize,
    /// Matched-keyword ratio below which keyword/skills parameters are
    /// hard-capped at 20% of their maximum (domain mismatch).
    pub domain_mismatch_hard_cap: f32,
    /// Matched-keyword ratio below which the same parameters are capped
    /// at 50% of their maximum.
    pub domain_mismatch_soft_cap: f32,
    /// Phrases that classify a posting as entry-level and trigger tier
    /// weight redistribution. Empirically chosen; do not re-derive.
    pub fresher_keywords: Vec<String>,
    /// Target resume length band in characters (general mode).
    pub length_band_min: usize,
    pub length_band_max: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Weight of the semantic axis in the hybrid score.
    pub semantic_weight: f32,
    /// Weight of the literal axis in the hybrid score.
    pub literal_weight: f32,
    /// Hybrid score below this is no match at all.
    pub hybrid_cutoff: f32,
    /// Semantic similarity at or above this counts as semantic evidence.
    pub semantic_threshold: f32,
    /// Literal keyword fraction at or above this counts as literal evidence.
    pub literal_threshold: f32,
    /// Minimum length (chars) for a sentence-like line to count as a bullet.
    pub min_bullet_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Overall score at which the optimization loop stops early.
    pub target_score: u32,
    /// Maximum number of persisted sessions; oldest beyond this are evicted.
    pub max_sessions: usize,
    /// Sessions older than this many hours cannot be resumed.
    pub max_session_age_hours: i64,
    /// Storage directory for the JSON-file session backend.
    pub storage_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub format: OutputFormat,
    pub detailed: bool,
    pub color_output: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    Console,
    Json,
    Markdown,
    Csv,
}

impl Default for Config {
    fn default() -> Self {
        let storage_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("resume-optimizer")
            .join("sessions");

        Self {
            scoring: ScoringConfig {
                jd_min_chars: 50,
                domain_mismatch_hard_cap: 0.20,
                domain_mismatch_soft_cap: 0.40,
                fresher_keywords: vec![
                    "entry-level".to_string(),
                    "entry level".to_string(),
                    "0-1 years".to_string(),
                    "0 to 1 years".to_string(),
                    "fresher".to_string(),
                    "freshers".to_string(),
                    "recent graduate".to_string(),
                    "new grad".to_string(),
                ],
                length_band_min: 1500,
                length_band_max: 6500,
            },
            matching: MatchingConfig {
                semantic_weight: 0.6,
                literal_weight: 0.4,
                hybrid_cutoff: 0.65,
                semantic_threshold: 0.70,
                literal_threshold: 0.5,
                min_bullet_chars: 30,
            },
            pipeline: PipelineConfig {
                target_score: 85,
                max_sessions: 10,
                max_session_age_hours: 24,
                storage_dir,
            },
            output: OutputConfig {
                format: OutputFormat::Console,
                detailed: false,
                color_output: true,
            },
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content).map_err(|e| {
                ResumeOptimizerError::Configuration(format!("Failed to parse config: {}", e))
            })?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self).map_err(|e| {
            ResumeOptimizerError::Configuration(format!("Failed to serialize config: {}", e))
        })?;

        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
            .join("resume-optimizer")
            .join("config.toml")
    }

    pub fn ensure_storage_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.pipeline.storage_dir)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_thresholds() {
        let config = Config::default();
        assert_eq!(config.matching.hybrid_cutoff, 0.65);
        assert_eq!(config.matching.semantic_threshold, 0.70);
        assert_eq!(config.matching.literal_threshold, 0.5);
        assert_eq!(config.scoring.domain_mismatch_hard_cap, 0.20);
        assert_eq!(config.scoring.domain_mismatch_soft_cap, 0.40);
        assert_eq!(config.pipeline.max_sessions, 10);
        assert_eq!(config.pipeline.max_session_age_hours, 24);
    }

    #[test]
    fn test_axis_weights_sum_to_one() {
        let config = Config::default();
        let sum = config.matching.semantic_weight + config.matching.literal_weight;
        assert!((sum - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_config_round_trip() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let restored: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(restored.pipeline.target_score, config.pipeline.target_score);
        assert_eq!(restored.scoring.fresher_keywords, config.scoring.fresher_keywords);
    }
}
