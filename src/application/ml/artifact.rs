use super::forest::DemandForest;
use super::model_context::LoadedModel;
use super::predictor::DemandModel;
use crate::domain::errors::DemandError;
use crate::domain::ml::feature_schema::FeatureSchema;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Trained ensemble bundled with the exact schema it was fitted on.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub schema: FeatureSchema,
    pub forest: DemandForest,
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifact {
    pub fn new(schema: FeatureSchema, forest: DemandForest) -> Result<Self, DemandError> {
        if schema.len() != forest.n_features() {
            return Err(DemandError::InvalidSchema {
                reason: format!(
                    "schema lists {} features, forest was fitted on {}",
                    schema.len(),
                    forest.n_features()
                ),
            });
        }
        Ok(Self {
            schema,
            forest,
            trained_at: Utc::now(),
        })
    }

    pub fn feature_names(&self) -> &[String] {
        &self.schema.features
    }

    /// Checks the invariants a deserialized artifact must still satisfy.
    pub fn validate(&self) -> Result<(), DemandError> {
        self.schema.validate()?;
        if self.schema.len() != self.forest.n_features() {
            return Err(DemandError::InvalidSchema {
                reason: "feature list does not match the stored model width".to_string(),
            });
        }
        Ok(())
    }

    pub fn into_loaded(self) -> LoadedModel {
        let model: Arc<dyn DemandModel> = Arc::new(self.forest);
        LoadedModel {
            model,
            schema: self.schema,
        }
    }
}
