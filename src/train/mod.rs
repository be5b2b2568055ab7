//! Model training -- the from-scratch gradient-descent regressor, a
//! closed-form baseline, and the seeded train/test split.

pub mod baseline;
pub mod scratch;

pub use self::baseline::OlsBaseline;
pub use self::scratch::ScratchRegressor;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrainError {
    #[error("training set is empty")]
    EmptySet,
    #[error("feature/target length mismatch: {features} features vs {targets} targets")]
    LengthMismatch { features: usize, targets: usize },
    #[error("test fraction {0} leaves no training rows")]
    DegenerateSplit(f64),
}

/// A shuffled train/test partition of one (feature, target) pair.
#[derive(Debug, Clone)]
pub struct SplitData {
    pub x_train: Vec<f64>,
    pub y_train: Vec<f64>,
    pub x_test: Vec<f64>,
    pub y_test: Vec<f64>,
}

/// Shuffle with a seeded RNG and carve off `ceil(n * test_fraction)` rows
/// as the test set. Deterministic for a fixed seed.
pub fn train_test_split(
    x: &[f64],
    y: &[f64],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitData, TrainError> {
    if x.len() != y.len() {
        return Err(TrainError::LengthMismatch {
            features: x.len(),
            targets: y.len(),
        });
    }
    if x.is_empty() {
        return Err(TrainError::EmptySet);
    }

    let n = x.len();
    let test_len = ((n as f64) * test_fraction).ceil() as usize;
    if test_len >= n {
        return Err(TrainError::DegenerateSplit(test_fraction));
    }

    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let (test_idx, train_idx) = indices.split_at(test_len);

    Ok(SplitData {
        x_train: train_idx.iter().map(|&i| x[i]).collect(),
        y_train: train_idx.iter().map(|&i| y[i]).collect(),
        x_test: test_idx.iter().map(|&i| x[i]).collect(),
        y_test: test_idx.iter().map(|&i| y[i]).collect(),
    })
}
