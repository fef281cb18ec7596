use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator inputs that feed the pricing rules alongside the forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingInputs {
    pub inventory: f64,
    pub manual_discount_pct: f64,
    pub base_price: f64,
}

/// How the recommended discount is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DiscountRule {
    /// Operator discount plus a fixed uplift, capped.
    #[default]
    ManualUplift,
    /// Step function of predicted demand: <50 → 25%, <100 → 15%, else 5%.
    DemandTiered,
}

impl FromStr for DiscountRule {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "manual_uplift" => Ok(DiscountRule::ManualUplift),
            "demand_tiered" => Ok(DiscountRule::DemandTiered),
            _ => bail!(
                "Invalid discount rule: {}. Must be 'manual_uplift' or 'demand_tiered'",
                s
            ),
        }
    }
}

/// Inventory movement risk, bucketed on sell-through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskTier {
    HighRisk,
    ModerateRisk,
    Healthy,
}

impl RiskTier {
    /// `< 20` high, `[20, 50)` moderate, `>= 50` healthy.
    pub fn from_sell_through(sell_through_pct: f64) -> Self {
        if sell_through_pct < 20.0 {
            RiskTier::HighRisk
        } else if sell_through_pct < 50.0 {
            RiskTier::ModerateRisk
        } else {
            RiskTier::Healthy
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::HighRisk => "high risk",
            RiskTier::ModerateRisk => "moderate risk",
            RiskTier::Healthy => "healthy",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Pricing strategy hint paired with each risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategicInsight {
    HeavyDiscount,
    BalancedDiscount,
    MaintainPricing,
}

impl StrategicInsight {
    pub fn for_tier(tier: RiskTier) -> Self {
        match tier {
            RiskTier::HighRisk => StrategicInsight::HeavyDiscount,
            RiskTier::ModerateRisk => StrategicInsight::BalancedDiscount,
            RiskTier::Healthy => StrategicInsight::MaintainPricing,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            StrategicInsight::HeavyDiscount => {
                "Heavy discount strategy recommended to improve stock rotation."
            }
            StrategicInsight::BalancedDiscount => {
                "Balanced discounting can improve revenue while maintaining margins."
            }
            StrategicInsight::MaintainPricing => {
                "Maintain pricing strategy to maximize profitability."
            }
        }
    }
}

/// Everything the presentation layer needs to render one quote.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingDecision {
    /// Raw model output, not clamped.
    pub predicted_demand: f64,
    pub recommended_discount_pct: f64,
    pub final_price: f64,
    pub revenue: f64,
    pub profit: f64,
    pub sell_through_pct: f64,
    pub risk_tier: RiskTier,
    pub insight: StrategicInsight,
}

/// Rule engine turning a demand forecast into a pricing decision.
/// Holds no model; every method is a pure function of its arguments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub discount_rule: DiscountRule,
    pub discount_uplift_pct: f64,
    pub max_discount_pct: f64,
    pub margin_rate: f64,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self {
            discount_rule: DiscountRule::ManualUplift,
            discount_uplift_pct: 15.0,
            max_discount_pct: 50.0,
            margin_rate: 0.2,
        }
    }
}

impl PricingPolicy {
    pub fn recommended_discount(&self, predicted_demand: f64, manual_discount_pct: f64) -> f64 {
        match self.discount_rule {
            DiscountRule::ManualUplift => {
                (manual_discount_pct + self.discount_uplift_pct).min(self.max_discount_pct)
            }
            DiscountRule::DemandTiered => demand_tiered_discount(predicted_demand),
        }
    }

    pub fn final_price(&self, base_price: f64, discount_pct: f64) -> f64 {
        base_price * (1.0 - discount_pct / 100.0)
    }

    pub fn profit(&self, revenue: f64) -> f64 {
        revenue * self.margin_rate
    }

    pub fn decide(&self, predicted_demand: f64, inputs: &PricingInputs) -> PricingDecision {
        let recommended_discount_pct =
            self.recommended_discount(predicted_demand, inputs.manual_discount_pct);
        let final_price = self.final_price(inputs.base_price, recommended_discount_pct);
        let revenue = predicted_demand * final_price;
        let profit = self.profit(revenue);
        let sell_through_pct = sell_through(predicted_demand, inputs.inventory);
        let risk_tier = RiskTier::from_sell_through(sell_through_pct);

        PricingDecision {
            predicted_demand,
            recommended_discount_pct,
            final_price,
            revenue,
            profit,
            sell_through_pct,
            risk_tier,
            insight: StrategicInsight::for_tier(risk_tier),
        }
    }
}

/// Predicted units as a percentage of inventory; 0 when there is no inventory.
pub fn sell_through(predicted_demand: f64, inventory: f64) -> f64 {
    if inventory > 0.0 {
        predicted_demand / inventory * 100.0
    } else {
        0.0
    }
}

fn demand_tiered_discount(predicted_demand: f64) -> f64 {
    if predicted_demand < 50.0 {
        25.0
    } else if predicted_demand < 100.0 {
        15.0
    } else {
        5.0
    }
}
