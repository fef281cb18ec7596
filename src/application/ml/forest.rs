//! Bagged regression-tree ensemble.
//!
//! Each member is a single-tree smartcore forest with its own seed, so every
//! tree draws an independent bootstrap sample and its own per-split feature
//! subsets. Members share nothing while fitting, which lets rayon build them
//! in parallel; the ensemble output is the plain mean of member outputs.

use super::predictor::DemandModel;
use crate::domain::errors::DemandError;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use smartcore::ensemble::random_forest_regressor::{
    RandomForestRegressor, RandomForestRegressorParameters,
};
use smartcore::linalg::basic::matrix::DenseMatrix;
use std::fmt;
use tracing::{debug, info};

type Tree = RandomForestRegressor<f64, f64, DenseMatrix<f64>, Vec<f64>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_trees: usize,
    pub max_depth: u16,
    pub min_samples_split: usize,
    /// Features considered at each split. `None` uses a third of the columns.
    pub features_per_split: Option<usize>,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 20,
            max_depth: 10,
            min_samples_split: 2,
            features_per_split: None,
            seed: 42,
        }
    }
}

impl ForestParams {
    fn features_per_split_for(&self, n_features: usize) -> usize {
        self.features_per_split
            .unwrap_or(n_features / 3)
            .clamp(1, n_features)
    }
}

#[derive(Serialize, Deserialize)]
pub struct DemandForest {
    trees: Vec<Tree>,
    n_features: usize,
}

impl fmt::Debug for DemandForest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DemandForest")
            .field("n_trees", &self.trees.len())
            .field("n_features", &self.n_features)
            .finish()
    }
}

impl DemandForest {
    pub fn fit(x: &[Vec<f64>], y: &[f64], params: &ForestParams) -> Result<Self, DemandError> {
        if x.is_empty() {
            return Err(DemandError::InsufficientData {
                needed: 1,
                actual: 0,
            });
        }
        if x.len() != y.len() {
            return Err(DemandError::InvalidValue {
                field: "target".to_string(),
                reason: format!("{} rows but {} targets", x.len(), y.len()),
            });
        }
        if params.n_trees == 0 {
            return Err(DemandError::InvalidValue {
                field: "n_trees".to_string(),
                reason: "ensemble needs at least one tree".to_string(),
            });
        }

        let n_features = x[0].len();
        if n_features == 0 || x.iter().any(|row| row.len() != n_features) {
            return Err(DemandError::InvalidSchema {
                reason: "training rows must share a non-zero width".to_string(),
            });
        }

        let matrix = DenseMatrix::from_2d_vec(&x.to_vec()).map_err(DemandError::model)?;
        let targets = y.to_vec();
        let mtry = params.features_per_split_for(n_features);

        info!(
            "Fitting {} trees (depth {}, {} of {} features per split) on {} rows",
            params.n_trees,
            params.max_depth,
            mtry,
            n_features,
            x.len()
        );

        let trees = (0..params.n_trees)
            .into_par_iter()
            .map(|index| -> Result<Tree, DemandError> {
                let tree_params = RandomForestRegressorParameters::default()
                    .with_n_trees(1)
                    .with_max_depth(params.max_depth)
                    .with_min_samples_split(params.min_samples_split)
                    .with_m(mtry)
                    .with_seed(params.seed.wrapping_add(index as u64));
                let tree = Tree::fit(&matrix, &targets, tree_params).map_err(DemandError::model)?;
                debug!("Tree {} fitted", index);
                Ok(tree)
            })
            .collect::<Result<Vec<_>, DemandError>>()?;

        Ok(Self { trees, n_features })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Mean of member predictions for each row.
    pub fn predict_rows(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, DemandError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        if let Some(row) = rows.iter().find(|row| row.len() != self.n_features) {
            return Err(DemandError::InvalidSchema {
                reason: format!(
                    "row has {} features, model expects {}",
                    row.len(),
                    self.n_features
                ),
            });
        }
        if self.trees.is_empty() {
            return Err(DemandError::model("ensemble has no trees"));
        }

        let matrix = DenseMatrix::from_2d_vec(&rows.to_vec()).map_err(DemandError::model)?;
        let mut sums = vec![0.0; rows.len()];
        for tree in &self.trees {
            let predictions = tree.predict(&matrix).map_err(DemandError::model)?;
            for (sum, p) in sums.iter_mut().zip(predictions) {
                *sum += p;
            }
        }

        let n = self.trees.len() as f64;
        Ok(sums.into_iter().map(|sum| sum / n).collect())
    }
}

impl DemandModel for DemandForest {
    fn predict_row(&self, row: &[f64]) -> Result<f64, DemandError> {
        self.predict_rows(&[row.to_vec()])?
            .first()
            .copied()
            .ok_or_else(|| DemandError::model("no prediction returned"))
    }

    fn name(&self) -> &str {
        "SmartCore Bagged Regression Trees"
    }
}
