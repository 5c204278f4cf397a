/// Base-price estimator.
///
/// The pricing engine only depends on the `BasePriceEstimator` trait; the
/// concrete model here is an MLP regressor (input -> 32 -> 16 -> 1, ReLU)
/// trained with AdamW on mean squared error. Feature importance is computed
/// by permutation: shuffle one column, measure the MSE increase.
use crate::errors::AppError;
use candle_core::{DType, Device, Tensor};
use candle_nn::{linear, AdamW, Linear, Module, Optimizer, ParamsAdamW, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;
use std::path::Path;

/// Contract the pricing engine consumes. Any regression technique works as
/// long as it predicts a currency amount and can rank its inputs.
pub trait BasePriceEstimator: Send + Sync {
    /// Predicts a base price (currency units) for one encoded feature vector.
    fn predict(&self, features: &[f64]) -> Result<f64, AppError>;

    /// Feature importance scores, descending.
    fn feature_importance(&self) -> &[(String, f64)];
}

/// Training hyperparameters.
#[derive(Debug, Clone, Copy)]
pub struct TrainParams {
    pub epochs: usize,
    pub learning_rate: f64,
}

impl Default for TrainParams {
    fn default() -> Self {
        Self {
            epochs: 300,
            learning_rate: 1e-2,
        }
    }
}

/// Regression quality metrics.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Metrics {
    /// Mean absolute error, currency units.
    pub mae: f64,
    /// Mean absolute percentage error.
    pub mape: f64,
    /// Coefficient of determination.
    pub r2: f64,
}

// Targets are regressed in thousands of currency units.
const TARGET_SCALE: f64 = 1_000.0;

const HIDDEN1_DIM: usize = 32;
const HIDDEN2_DIM: usize = 16;

/// MLP price regression model.
pub struct PriceModel {
    device: Device,
    varmap: VarMap,
    input_dim: usize,

    fc1: Linear,
    fc2: Linear,
    fc3: Linear,

    /// (feature name, permutation importance), descending. Populated by
    /// `compute_feature_importance` or restored from the artifact.
    importance: Vec<(String, f64)>,
}

impl PriceModel {
    /// Creates an untrained model for `input_dim` encoded features.
    pub fn new(input_dim: usize) -> Result<Self, AppError> {
        let device = Device::Cpu;
        let varmap = VarMap::new();
        let vs = VarBuilder::from_varmap(&varmap, DType::F32, &device);

        let fc1 = linear(input_dim, HIDDEN1_DIM, vs.pp("fc1"))?;
        let fc2 = linear(HIDDEN1_DIM, HIDDEN2_DIM, vs.pp("fc2"))?;
        let fc3 = linear(HIDDEN2_DIM, 1, vs.pp("fc3"))?;

        Ok(Self {
            device,
            varmap,
            input_dim,
            fc1,
            fc2,
            fc3,
            importance: Vec::new(),
        })
    }

    /// Number of encoded features the model expects.
    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    fn forward(&self, x: &Tensor) -> Result<Tensor, AppError> {
        let x = self.fc1.forward(x)?;
        let x = x.relu()?;
        let x = self.fc2.forward(&x)?;
        let x = x.relu()?;
        let x = self.fc3.forward(&x)?;
        Ok(x)
    }

    /// Builds an `(n, input_dim)` input tensor from encoded rows.
    fn input_tensor(&self, rows: &[Vec<f64>]) -> Result<Tensor, AppError> {
        let mut flat = Vec::with_capacity(rows.len() * self.input_dim);
        for row in rows {
            if row.len() != self.input_dim {
                return Err(AppError::InternalError(format!(
                    "feature vector length {} does not match model input {}",
                    row.len(),
                    self.input_dim
                )));
            }
            flat.extend(row.iter().map(|v| *v as f32));
        }
        let tensor = Tensor::new(flat.as_slice(), &self.device)?
            .reshape((rows.len(), self.input_dim))?;
        Ok(tensor)
    }

    /// Predicts prices for a batch of encoded rows.
    pub fn predict_batch(&self, rows: &[Vec<f64>]) -> Result<Vec<f64>, AppError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let input = self.input_tensor(rows)?;
        let output = self.forward(&input)?;
        let flat = output.squeeze(1)?.to_vec1::<f32>()?;
        Ok(flat.iter().map(|p| *p as f64 * TARGET_SCALE).collect())
    }

    /// Trains the model with full-batch gradient descent. Returns the final
    /// MSE loss (in scaled units).
    pub fn fit(
        &mut self,
        rows: &[Vec<f64>],
        targets: &[f64],
        params: TrainParams,
    ) -> Result<f64, AppError> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(AppError::Validation(format!(
                "training set mismatch: {} rows, {} targets",
                rows.len(),
                targets.len()
            )));
        }

        let input = self.input_tensor(rows)?;
        let scaled: Vec<f32> = targets.iter().map(|y| (*y / TARGET_SCALE) as f32).collect();
        let target = Tensor::new(scaled.as_slice(), &self.device)?.reshape((targets.len(), 1))?;

        let opt_params = ParamsAdamW {
            lr: params.learning_rate,
            ..Default::default()
        };
        let mut optimizer = AdamW::new(self.varmap.all_vars(), opt_params)?;

        let mut loss_val = 0.0;
        for epoch in 0..params.epochs {
            let predictions = self.forward(&input)?;
            let diff = predictions.sub(&target)?;
            let loss = diff.sqr()?.mean_all()?;
            loss_val = loss.to_scalar::<f32>()? as f64;
            optimizer.backward_step(&loss)?;

            if epoch % 50 == 0 {
                tracing::debug!("epoch {}: mse loss {:.4}", epoch, loss_val);
            }
        }

        Ok(loss_val)
    }

    /// Evaluates MAE, MAPE and R² on a labeled set.
    pub fn evaluate(&self, rows: &[Vec<f64>], targets: &[f64]) -> Result<Metrics, AppError> {
        if rows.is_empty() || rows.len() != targets.len() {
            return Err(AppError::Validation(format!(
                "evaluation set mismatch: {} rows, {} targets",
                rows.len(),
                targets.len()
            )));
        }

        let preds = self.predict_batch(rows)?;
        let n = targets.len() as f64;

        let mae = targets
            .iter()
            .zip(&preds)
            .map(|(y, p)| (y - p).abs())
            .sum::<f64>()
            / n;
        let mape = targets
            .iter()
            .zip(&preds)
            .filter(|(y, _)| **y != 0.0)
            .map(|(y, p)| ((y - p) / y).abs())
            .sum::<f64>()
            / n
            * 100.0;

        let mean_y = targets.iter().sum::<f64>() / n;
        let ss_res: f64 = targets.iter().zip(&preds).map(|(y, p)| (y - p) * (y - p)).sum();
        let ss_tot: f64 = targets.iter().map(|y| (y - mean_y) * (y - mean_y)).sum();
        let r2 = if ss_tot == 0.0 { 0.0 } else { 1.0 - ss_res / ss_tot };

        Ok(Metrics { mae, mape, r2 })
    }

    fn mse(&self, rows: &[Vec<f64>], targets: &[f64]) -> Result<f64, AppError> {
        let preds = self.predict_batch(rows)?;
        let n = targets.len() as f64;
        Ok(targets
            .iter()
            .zip(&preds)
            .map(|(y, p)| (y - p) * (y - p))
            .sum::<f64>()
            / n)
    }

    /// Permutation feature importance on a labeled set: for each column,
    /// shuffle its values across rows and record the MSE increase. Stores the
    /// scores sorted descending.
    pub fn compute_feature_importance(
        &mut self,
        rows: &[Vec<f64>],
        targets: &[f64],
        feature_names: &[String],
        seed: u64,
    ) -> Result<(), AppError> {
        if feature_names.len() != self.input_dim {
            return Err(AppError::InternalError(format!(
                "{} feature names for model input {}",
                feature_names.len(),
                self.input_dim
            )));
        }

        let baseline = self.mse(rows, targets)?;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut scores = Vec::with_capacity(feature_names.len());
        for col in 0..feature_names.len() {
            let mut column: Vec<f64> = rows.iter().map(|r| r[col]).collect();
            column.shuffle(&mut rng);

            let permuted: Vec<Vec<f64>> = rows
                .iter()
                .zip(&column)
                .map(|(row, v)| {
                    let mut row = row.clone();
                    row[col] = *v;
                    row
                })
                .collect();

            let mse = self.mse(&permuted, targets)?;
            scores.push((feature_names[col].clone(), (mse - baseline).max(0.0)));
        }

        scores.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        self.importance = scores;
        Ok(())
    }

    /// Restores importance scores from a persisted artifact.
    pub fn set_importance(&mut self, importance: Vec<(String, f64)>) {
        self.importance = importance;
    }

    /// Saves model weights as safetensors.
    pub fn save_weights(&self, path: &Path) -> Result<(), AppError> {
        self.varmap.save(path)?;
        Ok(())
    }

    /// Loads model weights saved by `save_weights`. The model must have been
    /// created with the same `input_dim`.
    pub fn load_weights(&mut self, path: &Path) -> Result<(), AppError> {
        self.varmap.load(path)?;
        Ok(())
    }
}

impl BasePriceEstimator for PriceModel {
    fn predict(&self, features: &[f64]) -> Result<f64, AppError> {
        let row = features.to_vec();
        let preds = self.predict_batch(std::slice::from_ref(&row))?;
        Ok(preds[0])
    }

    fn feature_importance(&self) -> &[(String, f64)] {
        &self.importance
    }
}
