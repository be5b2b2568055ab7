//! Synthetic fleet replication -- manufacture N machines from a
//! single-machine dataset.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

use crate::data::{Observation, SensorTable};

/// Replicate the table into `machine_count` machines named `robot_1` ..
/// `robot_N`, adding gentle Gaussian noise to every feature value so the
/// copies are not identical. Timestamp order within each machine is
/// untouched. Deterministic for a fixed seed; a non-positive `noise_std`
/// produces exact copies.
pub fn replicate_fleet(
    table: &SensorTable,
    machine_count: usize,
    noise_std: f64,
    seed: u64,
) -> SensorTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let noise = if noise_std > 0.0 {
        Normal::new(0.0, noise_std).ok()
    } else {
        None
    };

    let mut rows = Vec::with_capacity(table.rows.len() * machine_count);
    for r in 1..=machine_count {
        let machine_id = format!("robot_{r}");
        for row in &table.rows {
            let values = row
                .values
                .iter()
                .map(|&v| match &noise {
                    Some(n) => v + n.sample(&mut rng),
                    None => v,
                })
                .collect();
            rows.push(Observation {
                machine_id: machine_id.clone(),
                timestamp: row.timestamp,
                values,
            });
        }
    }

    SensorTable {
        feature_columns: table.feature_columns.clone(),
        rows,
    }
}
