// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Named metric registry and the visit capability reporters rely on.

use crate::histogram::{Histogram, HistogramSnapshot};
use crate::meter::{Meter, MeterSnapshot};
use crate::metrics::{Counter, Gauge, GaugeFloat, Healthcheck};
use crate::timer::{Timer, TimerSnapshot};
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Registry errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("metric '{name}' already registered as {existing}")]
    DuplicateMetric { name: String, existing: MetricKind },
}

/// Kind of a registered metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricKind {
    Counter,
    Gauge,
    GaugeFloat,
    Histogram,
    Meter,
    Timer,
    Healthcheck,
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::GaugeFloat => "float gauge",
            MetricKind::Histogram => "histogram",
            MetricKind::Meter => "meter",
            MetricKind::Timer => "timer",
            MetricKind::Healthcheck => "healthcheck",
        };
        f.write_str(name)
    }
}

/// A registered instrument.
#[derive(Debug, Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    GaugeFloat(Arc<GaugeFloat>),
    Histogram(Arc<Histogram>),
    Meter(Arc<Meter>),
    Timer(Arc<Timer>),
    Healthcheck(Arc<Healthcheck>),
}

impl Metric {
    pub fn kind(&self) -> MetricKind {
        match self {
            Metric::Counter(_) => MetricKind::Counter,
            Metric::Gauge(_) => MetricKind::Gauge,
            Metric::GaugeFloat(_) => MetricKind::GaugeFloat,
            Metric::Histogram(_) => MetricKind::Histogram,
            Metric::Meter(_) => MetricKind::Meter,
            Metric::Timer(_) => MetricKind::Timer,
            Metric::Healthcheck(_) => MetricKind::Healthcheck,
        }
    }

    /// Read a consistent point-in-time value of this instrument.
    pub fn snapshot(&self) -> MetricSnapshot {
        match self {
            Metric::Counter(c) => MetricSnapshot::Counter(c.count()),
            Metric::Gauge(g) => MetricSnapshot::Gauge(g.value()),
            Metric::GaugeFloat(g) => MetricSnapshot::GaugeFloat(g.value()),
            Metric::Histogram(h) => MetricSnapshot::Histogram(h.snapshot()),
            Metric::Meter(m) => MetricSnapshot::Meter(m.snapshot()),
            Metric::Timer(t) => MetricSnapshot::Timer(t.snapshot()),
            Metric::Healthcheck(h) => MetricSnapshot::Healthcheck(h.error()),
        }
    }
}

/// Read-only value of one metric, tagged by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricSnapshot {
    Counter(i64),
    Gauge(i64),
    GaugeFloat(f64),
    Histogram(HistogramSnapshot),
    Meter(MeterSnapshot),
    Timer(TimerSnapshot),
    /// Last recorded failure message, `None` when healthy.
    Healthcheck(Option<String>),
}

/// Snapshot-and-visit capability.
///
/// Implementations must be callable while producers keep recording; each
/// visited snapshot is a consistent view of its instrument.
pub trait Registry: Send + Sync {
    /// Call `visit` once per registered metric.
    fn each(&self, visit: &mut dyn FnMut(&str, MetricSnapshot));
}

/// Thread-safe map from metric name to instrument.
///
/// Metrics are visited in name order.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    metrics: RwLock<BTreeMap<String, Metric>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `metric` under `name`. Fails if the name is taken.
    pub fn register(&self, name: impl Into<String>, metric: Metric) -> Result<(), RegistryError> {
        let name = name.into();
        let mut metrics = self.metrics.write();
        if let Some(existing) = metrics.get(&name) {
            return Err(RegistryError::DuplicateMetric {
                name,
                existing: existing.kind(),
            });
        }
        metrics.insert(name, metric);
        Ok(())
    }

    /// Remove the metric registered under `name`, returning it.
    pub fn unregister(&self, name: &str) -> Option<Metric> {
        self.metrics.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Metric> {
        self.metrics.read().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.metrics.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.read().is_empty()
    }

    pub fn get_or_register_counter(&self, name: &str) -> Result<Arc<Counter>, RegistryError> {
        self.get_or_register(
            name,
            || Metric::Counter(Arc::default()),
            |m| match m {
                Metric::Counter(c) => Some(c.clone()),
                _ => None,
            },
        )
    }

    pub fn get_or_register_gauge(&self, name: &str) -> Result<Arc<Gauge>, RegistryError> {
        self.get_or_register(
            name,
            || Metric::Gauge(Arc::default()),
            |m| match m {
                Metric::Gauge(g) => Some(g.clone()),
                _ => None,
            },
        )
    }

    pub fn get_or_register_gauge_float(
        &self,
        name: &str,
    ) -> Result<Arc<GaugeFloat>, RegistryError> {
        self.get_or_register(
            name,
            || Metric::GaugeFloat(Arc::default()),
            |m| match m {
                Metric::GaugeFloat(g) => Some(g.clone()),
                _ => None,
            },
        )
    }

    pub fn get_or_register_histogram(&self, name: &str) -> Result<Arc<Histogram>, RegistryError> {
        self.get_or_register(
            name,
            || Metric::Histogram(Arc::default()),
            |m| match m {
                Metric::Histogram(h) => Some(h.clone()),
                _ => None,
            },
        )
    }

    pub fn get_or_register_meter(&self, name: &str) -> Result<Arc<Meter>, RegistryError> {
        self.get_or_register(
            name,
            || Metric::Meter(Arc::default()),
            |m| match m {
                Metric::Meter(meter) => Some(meter.clone()),
                _ => None,
            },
        )
    }

    pub fn get_or_register_timer(&self, name: &str) -> Result<Arc<Timer>, RegistryError> {
        self.get_or_register(
            name,
            || Metric::Timer(Arc::default()),
            |m| match m {
                Metric::Timer(t) => Some(t.clone()),
                _ => None,
            },
        )
    }

    /// Run every registered health check.
    pub fn run_healthchecks(&self) {
        for metric in self.metrics.read().values() {
            if let Metric::Healthcheck(hc) = metric {
                hc.check();
            }
        }
    }

    fn get_or_register<T>(
        &self,
        name: &str,
        make: impl FnOnce() -> Metric,
        pick: impl Fn(&Metric) -> Option<Arc<T>>,
    ) -> Result<Arc<T>, RegistryError> {
        if let Some(metric) = self.metrics.read().get(name) {
            return pick(metric).ok_or_else(|| RegistryError::DuplicateMetric {
                name: name.to_string(),
                existing: metric.kind(),
            });
        }

        // Another thread may have registered between the read and write lock.
        let mut metrics = self.metrics.write();
        let metric = metrics.entry(name.to_string()).or_insert_with(make);
        pick(metric).ok_or_else(|| RegistryError::DuplicateMetric {
            name: name.to_string(),
            existing: metric.kind(),
        })
    }
}

impl Registry for MetricsRegistry {
    fn each(&self, visit: &mut dyn FnMut(&str, MetricSnapshot)) {
        // Snapshot outside the lock so producers can keep registering.
        let entries: Vec<(String, Metric)> = self
            .metrics
            .read()
            .iter()
            .map(|(name, metric)| (name.clone(), metric.clone()))
            .collect();

        for (name, metric) in entries {
            visit(&name, metric.snapshot());
        }
    }
}

impl<R: Registry + ?Sized> Registry for Arc<R> {
    fn each(&self, visit: &mut dyn FnMut(&str, MetricSnapshot)) {
        (**self).each(visit)
    }
}
