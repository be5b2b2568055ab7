//! Event debouncing -- collapse bursts of raw anomaly flags into
//! well-spaced event timestamps.

use chrono::{DateTime, Duration, Utc};

/// Filter chronologically ordered candidate timestamps down to events
/// separated by at least `min_gap`.
///
/// Greedy single pass: the first candidate is always kept, and each later
/// candidate is kept only if it is `min_gap` or more after the last *kept*
/// event. Discarded candidates never reset the gap timer.
pub fn debounce_events(candidates: &[DateTime<Utc>], min_gap: Duration) -> Vec<DateTime<Utc>> {
    let mut retained: Vec<DateTime<Utc>> = Vec::new();

    for &t in candidates {
        match retained.last() {
            None => retained.push(t),
            Some(&last) => {
                if t - last >= min_gap {
                    retained.push(t);
                }
            }
        }
    }

    retained
}
