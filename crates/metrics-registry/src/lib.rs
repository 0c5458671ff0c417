// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! In-process metrics registry.
//!
//! Producers record into named instruments from any thread; a reporter
//! periodically visits the registry and reads a point-in-time snapshot of
//! every instrument.
//!
//! # Instruments
//! - [`Counter`]: signed running count
//! - [`Gauge`] / [`GaugeFloat`]: last written integer / float value
//! - [`Histogram`]: statistics over a bounded uniform sample of values
//! - [`Meter`]: event count plus 1-minute, 5-minute and mean rates
//! - [`Timer`]: histogram of durations combined with a meter
//! - [`Healthcheck`]: user-supplied status probe
//!
//! # Usage
//! ```rust
//! use metrics_registry::{MetricsRegistry, Registry};
//!
//! let registry = MetricsRegistry::new();
//! let requests = registry.get_or_register_counter("requests").unwrap();
//! requests.inc(1);
//!
//! registry.each(&mut |name, snapshot| {
//!     println!("{name}: {snapshot:?}");
//! });
//! ```

pub mod histogram;
pub mod meter;
pub mod metrics;
pub mod registry;
pub mod timer;

pub use histogram::{Histogram, HistogramSnapshot, DEFAULT_RESERVOIR_SIZE};
pub use meter::{Meter, MeterSnapshot};
pub use metrics::{Counter, Gauge, GaugeFloat, Healthcheck};
pub use registry::{Metric, MetricKind, MetricSnapshot, MetricsRegistry, Registry, RegistryError};
pub use timer::{Timer, TimerSnapshot};
