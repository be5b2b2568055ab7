//! Univariate linear regression trained from scratch with batch
//! gradient descent.

use crate::train::TrainError;
use serde::Serialize;

/// `y_hat = weight * x + bias`, minimizing MSE over a fixed number of
/// epochs. No early stopping, no regularization, no gradient clipping:
/// a learning rate too large for the feature scale diverges, and the
/// divergence is left visible in the loss history for the caller.
#[derive(Debug, Clone, Serialize)]
pub struct ScratchRegressor {
    learning_rate: f64,
    epochs: usize,
    weight: f64,
    bias: f64,
    history: Vec<f64>,
}

impl ScratchRegressor {
    pub fn new(learning_rate: f64, epochs: usize) -> Self {
        Self {
            learning_rate,
            epochs,
            weight: 0.0,
            bias: 0.0,
            history: Vec::new(),
        }
    }

    /// Batch gradient descent over the full training set.
    ///
    /// Resets weight, bias, and history first, so refitting a trained
    /// instance retrains from scratch with the same configuration. The
    /// history gets exactly one MSE entry per epoch.
    pub fn fit(&mut self, x: &[f64], y: &[f64]) -> Result<(), TrainError> {
        if x.len() != y.len() {
            return Err(TrainError::LengthMismatch {
                features: x.len(),
                targets: y.len(),
            });
        }
        if x.is_empty() {
            return Err(TrainError::EmptySet);
        }

        self.weight = 0.0;
        self.bias = 0.0;
        self.history = Vec::with_capacity(self.epochs);

        let n = x.len() as f64;

        for _ in 0..self.epochs {
            let mut sum_sq = 0.0;
            let mut dw = 0.0;
            let mut db = 0.0;

            for (&xi, &yi) in x.iter().zip(y.iter()) {
                let error = self.weight * xi + self.bias - yi;
                sum_sq += error * error;
                dw += error * xi;
                db += error;
            }

            self.history.push(sum_sq / n);

            self.weight -= self.learning_rate * (2.0 / n) * dw;
            self.bias -= self.learning_rate * (2.0 / n) * db;
        }

        Ok(())
    }

    /// Predictions for a batch of feature values. Pure; before `fit` the
    /// zero-initialized parameters predict the flat zero line.
    pub fn predict(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.predict_one(xi)).collect()
    }

    pub fn predict_one(&self, x: f64) -> f64 {
        self.weight * x + self.bias
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Per-epoch MSE, one entry per epoch of the last `fit`.
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    /// True when training blew up: non-finite parameters or terminal loss.
    pub fn is_diverged(&self) -> bool {
        !self.weight.is_finite()
            || !self.bias.is_finite()
            || self.history.last().is_some_and(|l| !l.is_finite())
    }
}
