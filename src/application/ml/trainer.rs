use super::artifact::ModelArtifact;
use super::forest::{DemandForest, ForestParams};
use super::preprocessor::PreprocessedData;
use crate::domain::errors::DemandError;
use crate::infrastructure::persistence::ArtifactStore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingParams {
    pub forest: ForestParams,
    pub test_fraction: f64,
    pub split_seed: u64,
    pub top_features: usize,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            forest: ForestParams::default(),
            test_fraction: 0.2,
            split_seed: 42,
            top_features: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    /// Increase in held-out MSE when the feature's column is shuffled.
    /// Not an impurity share: the scores do not sum to 1, and a feature that
    /// carries no signal can score slightly below zero.
    pub importance: f64,
}

/// Held-out diagnostics. Informational only; nothing is gated on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    pub n_train: usize,
    pub n_test: usize,
    pub mae: f64,
    pub rmse: f64,
    pub r2: f64,
    pub top_features: Vec<FeatureImportance>,
}

pub struct ModelTrainer {
    params: TrainingParams,
}

impl ModelTrainer {
    pub fn new(params: TrainingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &TrainingParams {
        &self.params
    }

    pub fn train(
        &self,
        data: &PreprocessedData,
    ) -> Result<(ModelArtifact, EvaluationReport), DemandError> {
        let x = &data.features.rows;
        let y = &data.target;
        if x.len() != y.len() {
            return Err(DemandError::InvalidValue {
                field: "target".to_string(),
                reason: format!("{} rows but {} targets", x.len(), y.len()),
            });
        }
        let schema = data.schema()?;

        let (train_idx, test_idx) =
            train_test_split(x.len(), self.params.test_fraction, self.params.split_seed)?;
        let (x_train, y_train) = select(x, y, &train_idx);
        let (x_test, y_test) = select(x, y, &test_idx);
        info!(
            "Split {} rows into {} train / {} test",
            x.len(),
            x_train.len(),
            x_test.len()
        );

        let forest = DemandForest::fit(&x_train, &y_train, &self.params.forest)?;

        let predictions = forest.predict_rows(&x_test)?;
        let (mae, rmse, r2) = regression_metrics(&y_test, &predictions);
        info!("Held-out MAE={:.4} RMSE={:.4} R2={:.4}", mae, rmse, r2);

        let importances = permutation_importance(
            &forest,
            &x_test,
            &y_test,
            &schema.features,
            self.params.split_seed,
        )?;
        let top_features = rank_top(importances, self.params.top_features);

        let report = EvaluationReport {
            n_train: x_train.len(),
            n_test: x_test.len(),
            mae,
            rmse,
            r2,
            top_features,
        };
        let artifact = ModelArtifact::new(schema, forest)?;
        Ok((artifact, report))
    }

    /// Trains and writes the artifact, replacing whatever `store` held.
    pub fn train_and_persist(
        &self,
        data: &PreprocessedData,
        store: &ArtifactStore,
    ) -> Result<(ModelArtifact, EvaluationReport), DemandError> {
        let (artifact, report) = self.train(data)?;
        store.save(&artifact)?;
        Ok((artifact, report))
    }
}

/// Seeded shuffle of `0..n`; the first `ceil(n * test_fraction)` indices
/// form the test split. Both splits are guaranteed non-empty.
pub fn train_test_split(
    n: usize,
    test_fraction: f64,
    seed: u64,
) -> Result<(Vec<usize>, Vec<usize>), DemandError> {
    if n < 2 {
        return Err(DemandError::InsufficientData {
            needed: 2,
            actual: n,
        });
    }
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(DemandError::InvalidValue {
            field: "test_fraction".to_string(),
            reason: format!("{} is outside (0, 1)", test_fraction),
        });
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let n_test = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n - 1);
    let train = indices.split_off(n_test);
    Ok((train, indices))
}

fn select(x: &[Vec<f64>], y: &[f64], indices: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>) {
    indices.iter().map(|&i| (x[i].clone(), y[i])).unzip()
}

/// Returns `(MAE, RMSE, R²)`.
pub fn regression_metrics(actual: &[f64], predicted: &[f64]) -> (f64, f64, f64) {
    let n = actual.len();
    if n == 0 {
        return (0.0, 0.0, 0.0);
    }
    let n_f = n as f64;

    let abs_err: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum();
    let sq_err: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();

    let mean = actual.iter().sum::<f64>() / n_f;
    let ss_tot: f64 = actual.iter().map(|a| (a - mean).powi(2)).sum();
    let r2 = if ss_tot > 0.0 {
        1.0 - sq_err / ss_tot
    } else if sq_err == 0.0 {
        1.0
    } else {
        0.0
    };

    (abs_err / n_f, (sq_err / n_f).sqrt(), r2)
}

fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }
    let sq_err: f64 = actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum();
    sq_err / actual.len() as f64
}

/// Per-feature increase in held-out MSE after shuffling that column.
/// Features are scored in parallel, each with its own seeded shuffle.
fn permutation_importance(
    forest: &DemandForest,
    x: &[Vec<f64>],
    y: &[f64],
    feature_names: &[String],
    seed: u64,
) -> Result<Vec<FeatureImportance>, DemandError> {
    let baseline = mse(y, &forest.predict_rows(x)?);

    feature_names
        .par_iter()
        .enumerate()
        .map(|(column, name)| -> Result<FeatureImportance, DemandError> {
            let mut values: Vec<f64> = x.iter().map(|row| row[column]).collect();
            let mut rng = StdRng::seed_from_u64(seed.wrapping_add(column as u64));
            values.shuffle(&mut rng);

            let permuted: Vec<Vec<f64>> = x
                .iter()
                .zip(&values)
                .map(|(row, value)| {
                    let mut row = row.clone();
                    row[column] = *value;
                    row
                })
                .collect();

            let score = mse(y, &forest.predict_rows(&permuted)?) - baseline;
            Ok(FeatureImportance {
                feature: name.clone(),
                importance: score,
            })
        })
        .collect()
}

/// Highest importance first; ties keep schema order.
fn rank_top(mut importances: Vec<FeatureImportance>, limit: usize) -> Vec<FeatureImportance> {
    importances.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    importances.truncate(limit);
    importances
}
