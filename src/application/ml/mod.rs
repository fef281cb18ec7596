pub mod artifact;
pub mod forest;
pub mod model_context;
pub mod predictor;
pub mod preprocessor;
pub mod trainer;

pub use artifact::ModelArtifact;
pub use forest::{DemandForest, ForestParams};
pub use model_context::{LoadedModel, ModelContext, ReloadOutcome};
pub use predictor::{DemandModel, DemandPredictor, align_request};
pub use preprocessor::{DataPreprocessor, FeatureMatrix, PreprocessedData};
pub use trainer::{EvaluationReport, FeatureImportance, ModelTrainer, TrainingParams};
