//! Latency statistics.
//!
//! Percentiles use the exclusive quantile method (the default of Python's
//! `statistics.quantiles`), which interpolates between order statistics and
//! may extrapolate slightly past the extremes on small samples.

use serde::Serialize;

/// Latency distribution in milliseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct LatencySummary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub median: f64,
    pub p95: f64,
    pub p99: f64,
}

impl LatencySummary {
    /// Summarize a sample. An empty sample yields all zeros.
    pub fn from_samples(samples: &[f64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        let mut sorted = samples.to_vec();
        sorted.sort_by(f64::total_cmp);

        Self {
            mean: sorted.iter().sum::<f64>() / sorted.len() as f64,
            min: sorted[0],
            max: sorted[sorted.len() - 1],
            median: median(&sorted),
            p95: percentile(&sorted, 95),
            p99: percentile(&sorted, 99),
        }
    }
}

/// Median of an ascending sample.
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// `p`th percentile (1..=99) of an ascending sample.
pub fn percentile(sorted: &[f64], p: usize) -> f64 {
    quantile(sorted, 100, p)
}

/// `i`th of the `n - 1` cut points dividing an ascending sample into `n`
/// equal groups, exclusive method.
pub fn quantile(sorted: &[f64], n: usize, i: usize) -> f64 {
    debug_assert!(n >= 2 && (1..n).contains(&i));
    let len = sorted.len();
    match len {
        0 => return 0.0,
        1 => return sorted[0],
        _ => {}
    }

    let m = len + 1;
    let j = (i * m / n).clamp(1, len - 1);
    // Signed: delta exceeds n when extrapolating past the last sample.
    let delta = (i * m) as i64 - (j * n) as i64;
    let n = n as i64;
    (sorted[j - 1] * (n - delta) as f64 + sorted[j] * delta as f64) / n as f64
}
