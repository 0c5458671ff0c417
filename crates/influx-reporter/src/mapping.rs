// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Registry snapshot mapping to InfluxDB points.
//!
//! Every metric kind maps to a fixed field key suffix:
//!
//! | Kind       | Points                         | Field key          |
//! |------------|--------------------------------|--------------------|
//! | Counter    | 1                              | `<name>.count`     |
//! | Gauge      | 1                              | `<name>.gauge`     |
//! | GaugeFloat | 1                              | `<name>.gauge`     |
//! | Histogram  | 1 per statistic, `bucket` tag  | `<name>.histogram` |
//! | Meter      | 1 per rate, `bucket` tag       | `<name>.meter`     |
//! | Timer      | 1 per statistic, `bucket` tag  | `<name>.timer`     |
//!
//! Multi-point kinds are expanded in the order of the bucket lists below.

use crate::influx::{FieldValue, Point};
use metrics_registry::{HistogramSnapshot, MeterSnapshot, MetricSnapshot, TimerSnapshot};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tag added to every point derived from a multi-statistic metric.
pub const BUCKET_TAG: &str = "bucket";

/// Quantiles requested from histogram and timer snapshots, in label order.
pub const PERCENTILES: [f64; 4] = [0.5, 0.75, 0.95, 0.99];

const PERCENTILE_LABELS: [&str; 4] = ["p50", "p75", "p95", "p99"];

/// Bucket name and value of one derived statistic.
type Bucket = (&'static str, f64);

/// Label a percentile result by position: the i-th value becomes the i-th
/// label, whatever the numeric order of the values.
pub fn label_percentiles(values: &[f64]) -> [Bucket; 4] {
    let at = |i: usize| values.get(i).copied().unwrap_or(0.0);
    [
        (PERCENTILE_LABELS[0], at(0)),
        (PERCENTILE_LABELS[1], at(1)),
        (PERCENTILE_LABELS[2], at(2)),
        (PERCENTILE_LABELS[3], at(3)),
    ]
}

/// count, max, mean, min, stddev, variance, p50, p75, p95, p99.
pub fn histogram_buckets(h: &HistogramSnapshot) -> Vec<Bucket> {
    let mut buckets = vec![
        ("count", h.count() as f64),
        ("max", h.max() as f64),
        ("mean", h.mean()),
        ("min", h.min() as f64),
        ("stddev", h.stddev()),
        ("variance", h.variance()),
    ];
    buckets.extend(label_percentiles(&h.percentiles(&PERCENTILES)));
    buckets
}

/// count, m1, m5, mean.
pub fn meter_buckets(m: &MeterSnapshot) -> Vec<Bucket> {
    vec![
        ("count", m.count() as f64),
        ("m1", m.rate1()),
        ("m5", m.rate5()),
        ("mean", m.rate_mean()),
    ]
}

/// Histogram statistics followed by m1, m5, meanrate.
pub fn timer_buckets(t: &TimerSnapshot) -> Vec<Bucket> {
    let mut buckets = histogram_buckets(&t.histogram);
    buckets.extend([
        ("m1", t.rate1()),
        ("m5", t.rate5()),
        ("meanrate", t.rate_mean()),
    ]);
    buckets
}

/// Copy `base` and add the bucket tag. `base` itself is never modified.
pub fn bucket_tags(bucket: &str, base: &BTreeMap<String, String>) -> BTreeMap<String, String> {
    let mut tags = base.clone();
    tags.insert(BUCKET_TAG.to_string(), bucket.to_string());
    tags
}

/// Maps named metric snapshots to points.
///
/// Stateless: the same snapshot, tags, measurement and timestamp always
/// produce the same points.
#[derive(Debug, Clone)]
pub struct PointTranslator {
    measurement: String,
    /// Base tags, shared read-only; points receive their own copies.
    tags: Arc<BTreeMap<String, String>>,
}

impl PointTranslator {
    /// Create a new translator for the given measurement and base tags.
    pub fn new(measurement: impl Into<String>, tags: BTreeMap<String, String>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: Arc::new(tags),
        }
    }

    pub fn measurement(&self) -> &str {
        &self.measurement
    }

    pub fn base_tags(&self) -> &BTreeMap<String, String> {
        &self.tags
    }

    /// Map one metric to its points, appending them to `out`.
    ///
    /// Health checks produce no points.
    pub fn translate_into(
        &self,
        name: &str,
        snapshot: &MetricSnapshot,
        timestamp_ns: u64,
        out: &mut Vec<Point>,
    ) {
        match snapshot {
            MetricSnapshot::Counter(count) => out.push(self.single(
                format!("{}.count", name),
                FieldValue::Integer(*count),
                timestamp_ns,
            )),
            MetricSnapshot::Gauge(value) => out.push(self.single(
                format!("{}.gauge", name),
                FieldValue::Integer(*value),
                timestamp_ns,
            )),
            MetricSnapshot::GaugeFloat(value) => out.push(self.single(
                format!("{}.gauge", name),
                FieldValue::Float(*value),
                timestamp_ns,
            )),
            MetricSnapshot::Histogram(h) => self.bucketed(
                &format!("{}.histogram", name),
                histogram_buckets(h),
                timestamp_ns,
                out,
            ),
            MetricSnapshot::Meter(m) => self.bucketed(
                &format!("{}.meter", name),
                meter_buckets(m),
                timestamp_ns,
                out,
            ),
            MetricSnapshot::Timer(t) => self.bucketed(
                &format!("{}.timer", name),
                timer_buckets(t),
                timestamp_ns,
                out,
            ),
            MetricSnapshot::Healthcheck(_) => {}
        }
    }

    /// Map one metric to a fresh vector of points.
    pub fn translate(&self, name: &str, snapshot: &MetricSnapshot, timestamp_ns: u64) -> Vec<Point> {
        let mut out = Vec::new();
        self.translate_into(name, snapshot, timestamp_ns, &mut out);
        out
    }

    fn single(&self, field_key: String, value: FieldValue, timestamp_ns: u64) -> Point {
        let mut fields = BTreeMap::new();
        fields.insert(field_key, value);
        Point::new(
            self.measurement.clone(),
            (*self.tags).clone(),
            fields,
            timestamp_ns,
        )
    }

    fn bucketed(
        &self,
        field_key: &str,
        buckets: Vec<Bucket>,
        timestamp_ns: u64,
        out: &mut Vec<Point>,
    ) {
        out.extend(buckets.into_iter().map(|(bucket, value)| {
            let mut fields = BTreeMap::new();
            fields.insert(field_key.to_string(), FieldValue::Float(value));
            Point::new(
                self.measurement.clone(),
                bucket_tags(bucket, &self.tags),
                fields,
                timestamp_ns,
            )
        }));
    }
}
