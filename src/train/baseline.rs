//! Closed-form ordinary-least-squares baseline for comparison against
//! the gradient-descent model.

use crate::train::TrainError;
use serde::Serialize;

/// Univariate OLS fit: slope = cov(x, y) / var(x), intercept = ymean -
/// slope * xmean. A zero-variance feature degenerates to the mean
/// predictor (slope 0).
#[derive(Debug, Clone, Default, Serialize)]
pub struct OlsBaseline {
    slope: f64,
    intercept: f64,
}

impl OlsBaseline {
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self, TrainError> {
        if x.len() != y.len() {
            return Err(TrainError::LengthMismatch {
                features: x.len(),
                targets: y.len(),
            });
        }
        if x.is_empty() {
            return Err(TrainError::EmptySet);
        }

        let n = x.len() as f64;
        let x_mean = x.iter().sum::<f64>() / n;
        let y_mean = y.iter().sum::<f64>() / n;

        let mut cov = 0.0;
        let mut var = 0.0;
        for (&xi, &yi) in x.iter().zip(y.iter()) {
            cov += (xi - x_mean) * (yi - y_mean);
            var += (xi - x_mean) * (xi - x_mean);
        }

        let slope = if var == 0.0 { 0.0 } else { cov / var };
        let intercept = y_mean - slope * x_mean;

        Ok(Self { slope, intercept })
    }

    pub fn predict(&self, x: &[f64]) -> Vec<f64> {
        x.iter().map(|&xi| self.slope * xi + self.intercept).collect()
    }

    pub fn slope(&self) -> f64 {
        self.slope
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_fit_on_line() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = x.iter().map(|v| -1.5 * v + 4.0).collect();
        let model = OlsBaseline::fit(&x, &y).unwrap();
        assert!((model.slope() + 1.5).abs() < 1e-9);
        assert!((model.intercept() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_constant_feature_predicts_mean() {
        let x = vec![2.0; 10];
        let y: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let model = OlsBaseline::fit(&x, &y).unwrap();
        assert_eq!(model.slope(), 0.0);
        assert!((model.intercept() - 4.5).abs() < 1e-9);
        assert!(model.predict(&[2.0]).iter().all(|&p| (p - 4.5).abs() < 1e-9));
    }

    #[test]
    fn test_empty_input_fails() {
        assert!(matches!(
            OlsBaseline::fit(&[], &[]),
            Err(TrainError::EmptySet)
        ));
    }
}
