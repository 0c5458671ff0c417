// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reporter orchestrator and run loop.
//!
//! Connects the registry, point mapping, batching and the transport into a
//! single task that never exits:
//!
//! ```text
//! every interval:      Registry --> PointTranslator --> batches --> Client::write
//! every ping interval: Client::ping, on failure Connector::connect
//! ```

use crate::buffer::{batch_count, batches};
use crate::client::{
    BatchPoints, Client, ClientError, ClientSettings, Connector, HttpConnector, PingResponse,
};
use crate::config::{ConfigError, ReporterConfig};
use crate::influx::Point;
use crate::mapping::PointTranslator;
use metrics_registry::Registry;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Reporter errors.
#[derive(Debug, Error)]
pub enum ReporterError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("connection error: {0}")]
    Connection(#[source] ClientError),

    /// `index` is zero-based.
    #[error("write of batch {} of {} failed: {}", .index + 1, .total, .source)]
    Send {
        index: usize,
        total: usize,
        #[source]
        source: ClientError,
    },

    #[error("ping failed: {0}")]
    Ping(#[source] ClientError),
}

/// Outcome of a successful send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SendReport {
    pub points: usize,
    pub batches: usize,
}

/// Truncate `timestamp_ns` to a multiple of `interval` since the Unix epoch.
///
/// Boundaries are counted from 1970-01-01T00:00:00Z, so for intervals that
/// do not divide a day evenly they differ from boundaries counted from any
/// other origin (e.g. year 1).
pub fn align_timestamp(timestamp_ns: u64, interval: Duration) -> u64 {
    let step = u64::try_from(interval.as_nanos()).unwrap_or(u64::MAX).max(1);
    timestamp_ns - timestamp_ns % step
}

fn unix_nanos(now: SystemTime) -> u64 {
    now.duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Periodically writes registry snapshots to the store.
pub struct Reporter<C: Connector> {
    registry: Arc<dyn Registry>,
    connector: C,
    settings: ClientSettings,
    client: C::Client,
    translator: PointTranslator,
    database: String,
    interval: Duration,
    ping_interval: Duration,
    align: bool,
    max_batch_size: i64,
}

impl Reporter<HttpConnector> {
    /// Reporter writing over the InfluxDB HTTP API.
    pub fn http(
        registry: Arc<dyn Registry>,
        config: &ReporterConfig,
    ) -> Result<Self, ReporterError> {
        Self::new(registry, config, HttpConnector)
    }
}

impl<C: Connector> Reporter<C> {
    /// Validate `config` and build the initial client. No network I/O.
    pub fn new(
        registry: Arc<dyn Registry>,
        config: &ReporterConfig,
        connector: C,
    ) -> Result<Self, ReporterError> {
        config.validate()?;
        let settings = ClientSettings::from_config(config)?;
        let client = connector
            .connect(&settings)
            .map_err(ReporterError::Connection)?;

        Ok(Self {
            registry,
            connector,
            settings,
            client,
            translator: PointTranslator::new(config.measurement.clone(), config.tags.clone()),
            database: config.database.clone(),
            interval: config.interval(),
            ping_interval: config.ping_interval(),
            align: config.align,
            max_batch_size: config.max_batch_size,
        })
    }

    /// Current connection handle.
    pub fn client(&self) -> &C::Client {
        &self.client
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn ping_interval(&self) -> Duration {
        self.ping_interval
    }

    /// Timestamp, in nanoseconds, stamped on points sent at `now`.
    pub fn point_time(&self, now: SystemTime) -> u64 {
        let ns = unix_nanos(now);
        if self.align {
            align_timestamp(ns, self.interval)
        } else {
            ns
        }
    }

    /// Snapshot the registry into points stamped with `timestamp_ns`.
    pub fn collect(&self, timestamp_ns: u64) -> Vec<Point> {
        let mut points = Vec::new();
        self.registry.each(&mut |name, snapshot| {
            self.translator
                .translate_into(name, &snapshot, timestamp_ns, &mut points)
        });
        points
    }

    /// Send the current registry contents.
    pub async fn send(&self) -> Result<SendReport, ReporterError> {
        self.send_at(SystemTime::now()).await
    }

    /// Send the registry contents as of `now`.
    ///
    /// Batches are written in order and the first failure aborts the rest.
    /// Batches already written stay written.
    pub async fn send_at(&self, now: SystemTime) -> Result<SendReport, ReporterError> {
        let points = self.collect(self.point_time(now));
        if points.is_empty() {
            return Ok(SendReport::default());
        }

        let total = batch_count(points.len(), self.max_batch_size);
        for (index, batch) in batches(&points, self.max_batch_size).enumerate() {
            self.client
                .write(BatchPoints {
                    database: &self.database,
                    points: batch,
                })
                .await
                .map_err(|source| ReporterError::Send {
                    index,
                    total,
                    source,
                })?;
        }

        Ok(SendReport {
            points: points.len(),
            batches: total,
        })
    }

    pub async fn ping(&self) -> Result<PingResponse, ReporterError> {
        self.client.ping().await.map_err(ReporterError::Ping)
    }

    /// Replace the client with a freshly built one.
    ///
    /// On failure the current client is kept.
    pub fn reconnect(&mut self) -> Result<(), ReporterError> {
        self.client = self
            .connector
            .connect(&self.settings)
            .map_err(ReporterError::Connection)?;
        Ok(())
    }

    /// Ping the store and reconnect if the ping fails.
    ///
    /// A failed ping is logged here; only a failed reconnection is returned.
    pub async fn health_check(&mut self) -> Result<(), ReporterError> {
        match self.ping().await {
            Ok(pong) => {
                tracing::trace!(rtt = ?pong.rtt, version = %pong.version, "ping ok");
                Ok(())
            }
            Err(e) => {
                tracing::warn!("{}, reconnecting to {}", e, self.settings.url);
                self.reconnect()?;
                tracing::info!("reconnected to {}", self.settings.url);
                Ok(())
            }
        }
    }

    /// Run forever: send every `interval`, health-check every `ping_interval`.
    ///
    /// Neither timer fires at start. Ticks missed during a slow write are
    /// skipped. Errors are logged and never stop the loop.
    pub async fn run(mut self) {
        let start = Instant::now();
        let mut report_tick = interval_at(start + self.interval, self.interval);
        report_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut ping_tick = interval_at(start + self.ping_interval, self.ping_interval);
        ping_tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(
            "Reporting to {} (database '{}') every {:?}",
            self.settings.url,
            self.database,
            self.interval
        );

        loop {
            tokio::select! {
                _ = report_tick.tick() => match self.send().await {
                    Ok(report) => tracing::debug!(
                        points = report.points,
                        batches = report.batches,
                        "metrics sent"
                    ),
                    Err(e) => tracing::error!("Unable to send metrics: {}", e),
                },
                _ = ping_tick.tick() => {
                    if let Err(e) = self.health_check().await {
                        tracing::error!("Unable to reconnect: {}", e);
                    }
                }
            }
        }
    }
}

/// Start a reporter with the configured tags and run it forever.
///
/// Construction errors are logged and the function returns without
/// starting the loop.
pub async fn influx_db(registry: Arc<dyn Registry>, config: &ReporterConfig) {
    match Reporter::http(registry, config) {
        Ok(reporter) => reporter.run().await,
        Err(e) => tracing::error!("Unable to start InfluxDB reporter: {}", e),
    }
}

/// Same as [`influx_db`], adding `tags` to every point. Keys already in the
/// configuration are overridden.
pub async fn influx_db_with_tags(
    registry: Arc<dyn Registry>,
    config: &ReporterConfig,
    tags: BTreeMap<String, String>,
) {
    let mut config = config.clone();
    config.tags.extend(tags);
    influx_db(registry, &config).await
}
