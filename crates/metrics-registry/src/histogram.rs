// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Histogram over a bounded uniform reservoir of samples.

use parking_lot::Mutex;

/// Default reservoir capacity.
pub const DEFAULT_RESERVOIR_SIZE: usize = 1028;

/// Uniform reservoir (Vitter's algorithm R).
///
/// Every recorded value has the same probability of being retained once
/// more than `capacity` values have been seen.
#[derive(Debug)]
struct Reservoir {
    values: Vec<i64>,
    capacity: usize,
    /// Total number of updates, including the ones not retained.
    count: i64,
}

impl Reservoir {
    fn new(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
            capacity,
            count: 0,
        }
    }

    fn update(&mut self, value: i64) {
        self.count += 1;
        if self.values.len() < self.capacity {
            self.values.push(value);
            return;
        }
        let slot = fastrand::u64(0..self.count as u64) as usize;
        if slot < self.capacity {
            self.values[slot] = value;
        }
    }

    fn clear(&mut self) {
        self.values.clear();
        self.count = 0;
    }
}

/// Distribution of `i64` observations.
///
/// Thread-safe: updates and snapshots take a short `parking_lot::Mutex`.
#[derive(Debug)]
pub struct Histogram {
    reservoir: Mutex<Reservoir>,
}

impl Histogram {
    /// Create a histogram with the default reservoir size.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_RESERVOIR_SIZE)
    }

    /// Create a histogram retaining at most `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            reservoir: Mutex::new(Reservoir::new(capacity.max(1))),
        }
    }

    pub fn update(&self, value: i64) {
        self.reservoir.lock().update(value);
    }

    pub fn clear(&self) {
        self.reservoir.lock().clear();
    }

    pub fn count(&self) -> i64 {
        self.reservoir.lock().count
    }

    /// Copy the retained samples into an immutable snapshot.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let reservoir = self.reservoir.lock();
        HistogramSnapshot::new(reservoir.count, reservoir.values.clone())
    }
}

impl Default for Histogram {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time statistics of a [`Histogram`].
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramSnapshot {
    count: i64,
    /// Retained samples, sorted ascending.
    sorted: Vec<i64>,
}

impl HistogramSnapshot {
    /// Build a snapshot from a total update count and the retained samples.
    pub fn new(count: i64, mut values: Vec<i64>) -> Self {
        values.sort_unstable();
        Self {
            count,
            sorted: values,
        }
    }

    /// Total number of updates recorded.
    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn min(&self) -> i64 {
        self.sorted.first().copied().unwrap_or(0)
    }

    pub fn max(&self) -> i64 {
        self.sorted.last().copied().unwrap_or(0)
    }

    /// Sum of the retained samples, saturating at the `i64` bounds.
    pub fn sum(&self) -> i64 {
        let wide = self.wide_sum();
        i64::try_from(wide).unwrap_or(if wide < 0 { i64::MIN } else { i64::MAX })
    }

    pub fn mean(&self) -> f64 {
        if self.sorted.is_empty() {
            return 0.0;
        }
        self.wide_sum() as f64 / self.sorted.len() as f64
    }

    /// Cannot overflow: at most `usize::MAX` samples of `i64`.
    fn wide_sum(&self) -> i128 {
        self.sorted.iter().map(|&v| i128::from(v)).sum()
    }

    /// Population variance of the retained samples.
    pub fn variance(&self) -> f64 {
        if self.sorted.is_empty() {
            return 0.0;
        }
        let mean = self.mean();
        let squares: f64 = self
            .sorted
            .iter()
            .map(|&v| {
                let d = v as f64 - mean;
                d * d
            })
            .sum();
        squares / self.sorted.len() as f64
    }

    pub fn stddev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn percentile(&self, quantile: f64) -> f64 {
        self.percentiles(&[quantile])[0]
    }

    /// Values at the given quantiles (each in `0.0..=1.0`), in the same
    /// order as requested.
    ///
    /// Uses the `(n + 1)` rank with linear interpolation between the two
    /// neighbouring samples; ranks outside the sample clamp to min / max.
    pub fn percentiles(&self, quantiles: &[f64]) -> Vec<f64> {
        let n = self.sorted.len();
        if n == 0 {
            return vec![0.0; quantiles.len()];
        }
        quantiles
            .iter()
            .map(|&q| {
                let pos = q * (n as f64 + 1.0);
                if pos < 1.0 {
                    self.sorted[0] as f64
                } else if pos >= n as f64 {
                    self.sorted[n - 1] as f64
                } else {
                    let lower = self.sorted[pos as usize - 1] as f64;
                    let upper = self.sorted[pos as usize] as f64;
                    lower + (pos - pos.floor()) * (upper - lower)
                }
            })
            .collect()
    }

    /// Retained samples in ascending order.
    pub fn values(&self) -> &[i64] {
        &self.sorted
    }
}
