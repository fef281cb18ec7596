//! Pricing policy configuration parsing from environment variables.

use super::parse_var;
use crate::domain::pricing::{DiscountRule, PricingPolicy};
use anyhow::{Result, ensure};

/// Pricing environment configuration
#[derive(Debug, Clone, PartialEq)]
pub struct PricingEnvConfig {
    pub discount_rule: DiscountRule,
    pub discount_uplift_pct: f64,
    pub max_discount_pct: f64,
    pub margin_rate: f64,
}

impl Default for PricingEnvConfig {
    fn default() -> Self {
        let policy = PricingPolicy::default();
        Self {
            discount_rule: policy.discount_rule,
            discount_uplift_pct: policy.discount_uplift_pct,
            max_discount_pct: policy.max_discount_pct,
            margin_rate: policy.margin_rate,
        }
    }
}

impl PricingEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            discount_rule: parse_var(lookup, "PRICING_DISCOUNT_RULE", defaults.discount_rule)?,
            discount_uplift_pct: parse_var(
                lookup,
                "PRICING_DISCOUNT_UPLIFT_PCT",
                defaults.discount_uplift_pct,
            )?,
            max_discount_pct: parse_var(
                lookup,
                "PRICING_MAX_DISCOUNT_PCT",
                defaults.max_discount_pct,
            )?,
            margin_rate: parse_var(lookup, "PRICING_MARGIN_RATE", defaults.margin_rate)?,
        };

        ensure!(
            (0.0..=100.0).contains(&config.max_discount_pct),
            "PRICING_MAX_DISCOUNT_PCT must be within [0, 100]"
        );
        ensure!(
            config.discount_uplift_pct >= 0.0,
            "PRICING_DISCOUNT_UPLIFT_PCT must not be negative"
        );
        Ok(config)
    }

    pub fn policy(&self) -> PricingPolicy {
        PricingPolicy {
            discount_rule: self.discount_rule,
            discount_uplift_pct: self.discount_uplift_pct,
            max_discount_pct: self.max_discount_pct,
            margin_rate: self.margin_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pricing_config_defaults_match_policy() {
        let config = PricingEnvConfig::from_lookup(&|_: &str| None).unwrap();
        assert_eq!(config.policy(), PricingPolicy::default());
    }

    #[test]
    fn test_pricing_config_rule_override() {
        let lookup =
            |key: &str| (key == "PRICING_DISCOUNT_RULE").then(|| "demand_tiered".to_string());
        let config = PricingEnvConfig::from_lookup(&lookup).unwrap();
        assert_eq!(config.discount_rule, DiscountRule::DemandTiered);
    }

    #[test]
    fn test_pricing_config_rejects_bad_cap() {
        let lookup = |key: &str| (key == "PRICING_MAX_DISCOUNT_PCT").then(|| "150".to_string());
        assert!(PricingEnvConfig::from_lookup(&lookup).is_err());
    }
}
