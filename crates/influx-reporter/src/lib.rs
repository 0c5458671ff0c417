// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB Reporter
//!
//! Periodically writes the contents of a metrics registry to InfluxDB.
//!
//! This crate provides:
//! - YAML-based reporter configuration
//! - Mapping of counters, gauges, histograms, meters and timers to points
//! - InfluxDB Line Protocol generation
//! - Size-bounded batching of each report
//! - A run loop that reports on one timer and health-checks on another,
//!   rebuilding the connection when a ping fails
//!
//! # Overview
//!
//! ```text
//! Registry --> PointTranslator --> batches --> Client (InfluxDB HTTP API)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use influx_reporter::{influx_db, ReporterConfig};
//! use metrics_registry::MetricsRegistry;
//! use std::sync::Arc;
//!
//! # async fn start() {
//! let registry = Arc::new(MetricsRegistry::new());
//! registry.get_or_register_counter("requests").unwrap().inc(1);
//!
//! let config = ReporterConfig::new("http://localhost:8086", "metrics", "app");
//! influx_db(registry, &config).await;
//! # }
//! ```

pub mod buffer;
pub mod client;
pub mod config;
pub mod influx;
pub mod mapping;
pub mod reporter;

pub use client::{
    BatchPoints, Client, ClientError, ClientSettings, Connector, HttpConnector, InfluxClient,
    PingResponse,
};
pub use config::{ConfigError, ReporterConfig};
pub use influx::{FieldValue, LineProtocolWriter, Point};
pub use mapping::PointTranslator;
pub use reporter::{influx_db, influx_db_with_tags, Reporter, ReporterError, SendReport};
