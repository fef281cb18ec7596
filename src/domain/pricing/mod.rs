pub mod policy;

pub use policy::{
    DiscountRule, PricingDecision, PricingInputs, PricingPolicy, RiskTier, StrategicInsight,
    sell_through,
};
