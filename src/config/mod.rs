//! Configuration module for SmartShelf.
//!
//! Structured configuration loaded from environment variables, organized by
//! concern: data locations, Training and Pricing.

mod pricing_config;
mod training_config;

pub use pricing_config::PricingEnvConfig;
pub use training_config::TrainingEnvConfig;

use anyhow::{Context, Result, anyhow};
use std::env;
use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub training: TrainingEnvConfig,
    pub pricing: PricingEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&|key: &str| env::var(key).ok())
    }

    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let data_path = lookup("DEMAND_DATA_PATH")
            .unwrap_or_else(|| "data/sales_data.csv".to_string())
            .into();
        let model_path = lookup("DEMAND_MODEL_PATH")
            .unwrap_or_else(|| "models/demand_model.json".to_string())
            .into();

        let training =
            TrainingEnvConfig::from_lookup(lookup).context("Failed to load training config")?;
        let pricing =
            PricingEnvConfig::from_lookup(lookup).context("Failed to load pricing config")?;

        Ok(Self {
            data_path,
            model_path,
            training,
            pricing,
        })
    }
}

/// Parses `key` when set, otherwise returns `default`. A value that is set
/// but unparseable is an error rather than a silent fallback.
pub(crate) fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow!("Failed to parse {}='{}': {}", key, raw, e)),
        None => Ok(default),
    }
}
