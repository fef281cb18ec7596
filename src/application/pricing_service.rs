use crate::application::ml::model_context::ModelContext;
use crate::application::ml::predictor::DemandPredictor;
use crate::domain::errors::DemandError;
use crate::domain::pricing::{PricingDecision, PricingPolicy};
use crate::domain::sales::PredictionRequest;
use std::sync::Arc;
use tracing::info;

/// Inference boundary used by presentation layers: one request in, one
/// structured pricing decision out.
pub struct PricingService {
    predictor: DemandPredictor,
    policy: PricingPolicy,
}

impl PricingService {
    pub fn new(predictor: DemandPredictor, policy: PricingPolicy) -> Self {
        Self { predictor, policy }
    }

    /// Convenience constructor pinned to the context's current schema.
    pub fn pinned(context: Arc<ModelContext>, policy: PricingPolicy) -> Self {
        Self::new(DemandPredictor::pinned(context), policy)
    }

    pub fn policy(&self) -> &PricingPolicy {
        &self.policy
    }

    pub fn quote(&self, request: &PredictionRequest) -> Result<PricingDecision, DemandError> {
        request.validate()?;
        let predicted_demand = self.predictor.predict(request)?;
        let decision = self.policy.decide(predicted_demand, &request.pricing_inputs());

        info!(
            "Quote: demand={:.2} discount={}% sell_through={:.2}% ({})",
            decision.predicted_demand,
            decision.recommended_discount_pct,
            decision.sell_through_pct,
            decision.risk_tier
        );
        Ok(decision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::predictor::DemandModel;
    use crate::domain::errors::ErrorKind;
    use crate::domain::ml::feature_schema::{EncodingVocabulary, FeatureSchema};
    use crate::domain::pricing::RiskTier;

    struct Stub(f64);

    impl DemandModel for Stub {
        fn predict_row(&self, _row: &[f64]) -> Result<f64, DemandError> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    fn service(demand: f64) -> PricingService {
        let schema = FeatureSchema::new(
            vec!["Inventory_Level".to_string(), "Price".to_string()],
            EncodingVocabulary::default(),
        )
        .unwrap();
        let context = Arc::new(ModelContext::from_parts(Arc::new(Stub(demand)), schema));
        PricingService::pinned(context, PricingPolicy::default())
    }

    fn request(inventory: f64) -> PredictionRequest {
        PredictionRequest {
            inventory_level: inventory,
            discount_percent: 20.0,
            price: 100.0,
            promotion: true,
            category: "Electronics".to_string(),
            region: "North".to_string(),
            weather: "Sunny".to_string(),
            season: "Summer".to_string(),
            date: None,
        }
    }

    #[test]
    fn test_quote_uses_policy() {
        let decision = service(80.0).quote(&request(100.0)).unwrap();
        assert_eq!(decision.predicted_demand, 80.0);
        assert_eq!(decision.recommended_discount_pct, 35.0);
        assert_eq!(decision.risk_tier, RiskTier::Healthy);
    }

    #[test]
    fn test_quote_rejects_invalid_request() {
        let mut bad = request(100.0);
        bad.price = -1.0;
        let err = service(80.0).quote(&bad).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
