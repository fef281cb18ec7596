//! Explicit holder for the model used at inference time.
//!
//! A context is built once at startup and shared by handle. Swapping in a new
//! model happens only through `reload` or `replace`; readers keep the
//! snapshot they took until they ask again.

use super::artifact::ModelArtifact;
use super::predictor::DemandModel;
use crate::domain::errors::DemandError;
use crate::domain::ml::feature_schema::FeatureSchema;
use crate::infrastructure::persistence::ArtifactStore;
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

pub struct LoadedModel {
    pub model: Arc<dyn DemandModel>,
    pub schema: FeatureSchema,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReloadOutcome {
    pub previous_version: String,
    pub current_version: String,
}

impl ReloadOutcome {
    pub fn schema_changed(&self) -> bool {
        self.previous_version != self.current_version
    }
}

pub struct ModelContext {
    store: Option<ArtifactStore>,
    loaded: RwLock<Arc<LoadedModel>>,
}

impl ModelContext {
    /// Loads the artifact from `store` and remembers it for `reload`.
    pub fn open(store: ArtifactStore) -> Result<Self, DemandError> {
        let artifact = store.load()?;
        info!(
            "Model context ready (schema {}, {} features)",
            artifact.schema.version,
            artifact.schema.len()
        );
        Ok(Self {
            store: Some(store),
            loaded: RwLock::new(Arc::new(artifact.into_loaded())),
        })
    }

    /// Wraps any model, e.g. a fixed-output stub, with an explicit schema.
    pub fn from_parts(model: Arc<dyn DemandModel>, schema: FeatureSchema) -> Self {
        Self {
            store: None,
            loaded: RwLock::new(Arc::new(LoadedModel { model, schema })),
        }
    }

    pub fn current(&self) -> Arc<LoadedModel> {
        let guard = self.loaded.read().unwrap_or_else(|e| e.into_inner());
        Arc::clone(&guard)
    }

    pub fn schema_version(&self) -> String {
        self.current().schema.version.clone()
    }

    /// Re-reads the artifact from the store this context was opened with.
    pub fn reload(&self) -> Result<ReloadOutcome, DemandError> {
        let store = self.store.as_ref().ok_or_else(|| DemandError::Model {
            reason: "context was not opened from an artifact store".to_string(),
        })?;
        let artifact = store.load()?;
        Ok(self.swap(artifact.into_loaded()))
    }

    /// Installs a freshly trained artifact without touching disk.
    pub fn replace(&self, artifact: ModelArtifact) -> ReloadOutcome {
        self.swap(artifact.into_loaded())
    }

    fn swap(&self, next: LoadedModel) -> ReloadOutcome {
        let current_version = next.schema.version.clone();
        let mut guard = self.loaded.write().unwrap_or_else(|e| e.into_inner());
        let previous_version = guard.schema.version.clone();
        *guard = Arc::new(next);
        drop(guard);

        let outcome = ReloadOutcome {
            previous_version,
            current_version,
        };
        if outcome.schema_changed() {
            warn!(
                "Feature schema changed {} -> {}; pinned predictors will reject requests",
                outcome.previous_version, outcome.current_version
            );
        } else {
            info!("Model reloaded (schema {})", outcome.current_version);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ml::predictor::DemandPredictor;
    use crate::domain::errors::ErrorKind;
    use crate::domain::ml::feature_schema::EncodingVocabulary;
    use crate::domain::sales::PredictionRequest;

    struct Constant(f64);

    impl DemandModel for Constant {
        fn predict_row(&self, _row: &[f64]) -> Result<f64, DemandError> {
            Ok(self.0)
        }

        fn name(&self) -> &str {
            "constant"
        }
    }

    fn schema(list: &[&str]) -> FeatureSchema {
        FeatureSchema::new(
            list.iter().map(|s| s.to_string()).collect(),
            EncodingVocabulary::default(),
        )
        .unwrap()
    }

    fn request() -> PredictionRequest {
        PredictionRequest {
            inventory_level: 10.0,
            discount_percent: 5.0,
            price: 9.99,
            promotion: false,
            category: "Groceries".to_string(),
            region: "West".to_string(),
            weather: "Cloudy".to_string(),
            season: "Monsoon".to_string(),
            date: None,
        }
    }

    #[test]
    fn test_pinned_predictor_rejects_changed_schema() {
        let context = Arc::new(ModelContext::from_parts(
            Arc::new(Constant(12.0)),
            schema(&["Price", "Promotion"]),
        ));
        let pinned = DemandPredictor::pinned(Arc::clone(&context));
        let floating = DemandPredictor::new(Arc::clone(&context));
        assert_eq!(pinned.predict(&request()).unwrap(), 12.0);

        let outcome = context.swap(LoadedModel {
            model: Arc::new(Constant(30.0)),
            schema: schema(&["Price", "Promotion", "Region_West"]),
        });
        assert!(outcome.schema_changed());

        let err = pinned.predict(&request()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Schema);
        assert_eq!(floating.predict(&request()).unwrap(), 30.0);
    }

    #[test]
    fn test_same_schema_swap_keeps_pins_valid() {
        let context = Arc::new(ModelContext::from_parts(
            Arc::new(Constant(1.0)),
            schema(&["Price"]),
        ));
        let pinned = DemandPredictor::pinned(Arc::clone(&context));

        let outcome = context.swap(LoadedModel {
            model: Arc::new(Constant(2.0)),
            schema: schema(&["Price"]),
        });
        assert!(!outcome.schema_changed());
        assert_eq!(pinned.predict(&request()).unwrap(), 2.0);
    }

    #[test]
    fn test_replace_installs_trained_artifact() {
        use crate::application::ml::forest::{DemandForest, ForestParams};

        let x: Vec<Vec<f64>> = (0..30).map(|i| vec![i as f64, (i % 2) as f64]).collect();
        let y: Vec<f64> = x.iter().map(|r| 3.0 * r[0] + 5.0 * r[1]).collect();
        let params = ForestParams {
            n_trees: 3,
            max_depth: 4,
            ..ForestParams::default()
        };
        let forest = DemandForest::fit(&x, &y, &params).unwrap();
        let artifact = ModelArtifact::new(schema(&["Price", "Region_West"]), forest).unwrap();
        let expected_row = vec![9.99, 1.0];
        let expected = artifact.forest.predict_row(&expected_row).unwrap();
        let new_version = artifact.schema.version.clone();

        let context = Arc::new(ModelContext::from_parts(
            Arc::new(Constant(1.0)),
            schema(&["Price", "Promotion"]),
        ));
        let pinned = DemandPredictor::pinned(Arc::clone(&context));
        let floating = DemandPredictor::new(Arc::clone(&context));

        let outcome = context.replace(artifact);
        assert!(outcome.schema_changed());
        assert_eq!(outcome.current_version, new_version);
        assert_eq!(context.schema_version(), new_version);

        assert_eq!(pinned.predict(&request()).unwrap_err().kind(), ErrorKind::Schema);
        assert_eq!(floating.predict(&request()).unwrap(), expected);
    }

    #[test]
    fn test_reload_without_store_fails() {
        let context = ModelContext::from_parts(Arc::new(Constant(1.0)), schema(&["Price"]));
        assert_eq!(context.reload().unwrap_err().kind(), ErrorKind::Model);
    }
}
