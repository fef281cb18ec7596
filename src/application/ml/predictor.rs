use super::model_context::ModelContext;
use crate::domain::errors::DemandError;
use crate::domain::ml::feature_registry::{named_features, reindex};
use crate::domain::ml::feature_schema::validate_feature_names;
use crate::domain::sales::PredictionRequest;
use std::sync::Arc;
use tracing::{debug, warn};

/// Interface for demand regression models
pub trait DemandModel: Send + Sync {
    /// Predict units sold for one row already aligned to the trained schema.
    /// The result is not clamped and may be negative.
    fn predict_row(&self, row: &[f64]) -> Result<f64, DemandError>;

    /// Get model name/type
    fn name(&self) -> &str;
}

/// Encodes a request and reorders it to `feature_names`.
pub fn align_request(
    request: &PredictionRequest,
    feature_names: &[String],
) -> Result<Vec<f64>, DemandError> {
    validate_feature_names(feature_names)?;
    Ok(reindex(&named_features(request), feature_names))
}

/// Forecasts demand for single requests against the model held by a
/// [`ModelContext`].
pub struct DemandPredictor {
    context: Arc<ModelContext>,
    pinned_version: Option<String>,
}

impl DemandPredictor {
    pub fn new(context: Arc<ModelContext>) -> Self {
        Self {
            context,
            pinned_version: None,
        }
    }

    /// Binds the predictor to the schema version currently loaded. After a
    /// reload that changes the feature schema, every prediction fails with
    /// `SchemaMismatch` instead of feeding misaligned columns.
    pub fn pinned(context: Arc<ModelContext>) -> Self {
        let version = context.schema_version();
        Self {
            context,
            pinned_version: Some(version),
        }
    }

    pub fn pinned_version(&self) -> Option<&str> {
        self.pinned_version.as_deref()
    }

    pub fn predict(&self, request: &PredictionRequest) -> Result<f64, DemandError> {
        let loaded = self.context.current();

        if let Some(expected) = &self.pinned_version
            && *expected != loaded.schema.version
        {
            return Err(DemandError::SchemaMismatch {
                expected: expected.clone(),
                actual: loaded.schema.version.clone(),
            });
        }

        for (field, level) in loaded
            .schema
            .vocabulary
            .unknown_levels(observation_levels(request))
        {
            warn!("Unseen {} '{}', encoding as reference level", field, level);
        }

        Self::predict_with(request, loaded.model.as_ref(), &loaded.schema.features)
    }

    /// Stateless form: align `request` to `feature_names` and run `model`.
    pub fn predict_with(
        request: &PredictionRequest,
        model: &dyn DemandModel,
        feature_names: &[String],
    ) -> Result<f64, DemandError> {
        let row = align_request(request, feature_names)?;
        let demand = model.predict_row(&row)?;
        debug!("{} predicted demand {:.3}", model.name(), demand);
        Ok(demand)
    }
}

fn observation_levels(request: &PredictionRequest) -> [&str; 4] {
    [
        request.category.as_str(),
        request.region.as_str(),
        request.weather.as_str(),
        request.season.as_str(),
    ]
}
