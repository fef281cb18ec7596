//! Training configuration parsing from environment variables.
//!
//! Ensemble shape, train/test split and diagnostics depth.

use super::parse_var;
use crate::application::ml::forest::ForestParams;
use crate::application::ml::trainer::TrainingParams;
use anyhow::{Result, ensure};

/// Training environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingEnvConfig {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    pub test_fraction: f64,
    pub seed: u64,
    pub top_features: usize,
}

impl Default for TrainingEnvConfig {
    fn default() -> Self {
        Self {
            n_trees: 20,
            max_depth: 10,
            min_samples_split: 2,
            test_fraction: 0.2,
            seed: 42,
            top_features: 10,
        }
    }
}

impl TrainingEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            n_trees: parse_var(lookup, "TRAINING_N_TREES", defaults.n_trees)?,
            max_depth: parse_var(lookup, "TRAINING_MAX_DEPTH", defaults.max_depth)?,
            min_samples_split: parse_var(
                lookup,
                "TRAINING_MIN_SAMPLES_SPLIT",
                defaults.min_samples_split,
            )?,
            test_fraction: parse_var(lookup, "TRAINING_TEST_FRACTION", defaults.test_fraction)?,
            seed: parse_var(lookup, "TRAINING_SEED", defaults.seed)?,
            top_features: parse_var(lookup, "TRAINING_TOP_FEATURES", defaults.top_features)?,
        };

        ensure!(config.n_trees > 0, "TRAINING_N_TREES must be at least 1");
        ensure!(
            config.test_fraction > 0.0 && config.test_fraction < 1.0,
            "TRAINING_TEST_FRACTION must be within (0, 1), got {}",
            config.test_fraction
        );
        Ok(config)
    }

    pub fn training_params(&self) -> TrainingParams {
        TrainingParams {
            forest: ForestParams {
                n_trees: self.n_trees,
                max_depth: self.max_depth,
                min_samples_split: self.min_samples_split,
                features_per_split: None,
                seed: self.seed,
            },
            test_fraction: self.test_fraction,
            split_seed: self.seed,
            top_features: self.top_features,
        }
    }
}
