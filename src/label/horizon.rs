//! Time-to-next-event horizon computation and fallback imputation.

use chrono::{DateTime, Utc};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Days until the next event strictly after each observation.
///
/// Both inputs must be sorted ascending. A single forward pointer walks
/// the event list; rows at or after the last event get `None`. An empty
/// event list yields all `None`.
pub fn time_to_next_event(
    observation_times: &[DateTime<Utc>],
    events: &[DateTime<Utc>],
) -> Vec<Option<f64>> {
    let mut labels = Vec::with_capacity(observation_times.len());
    let mut j = 0;

    for &t in observation_times {
        // Events at or before this row do not count; only strictly
        // future events remain ahead of the pointer.
        while j < events.len() && events[j] <= t {
            j += 1;
        }
        if j < events.len() {
            let delta = events[j] - t;
            labels.push(Some(delta.num_milliseconds() as f64 / MILLIS_PER_DAY));
        } else {
            labels.push(None);
        }
    }

    labels
}

/// Resolve undefined labels across the whole dataset.
///
/// If every label is undefined (no machine ever produced an event), every
/// row gets `sentinel_days`. Otherwise undefined labels get the median of
/// the defined ones -- a dataset-wide statistic, not per machine.
pub fn impute_labels(labels: &[Option<f64>], sentinel_days: f64) -> Vec<f64> {
    let defined: Vec<f64> = labels.iter().filter_map(|l| *l).collect();

    if defined.is_empty() {
        return vec![sentinel_days; labels.len()];
    }

    let fill = median(defined);
    labels.iter().map(|l| l.unwrap_or(fill)).collect()
}

/// Median with the usual midpoint average for even-length input.
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
