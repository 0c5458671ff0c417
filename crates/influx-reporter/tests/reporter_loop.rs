// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Run loop timing against a fake transport with a paused clock.

use influx_reporter::{
    BatchPoints, Client, ClientError, ClientSettings, Connector, PingResponse, Reporter,
    ReporterConfig,
};
use metrics_registry::MetricsRegistry;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct Transport {
    connects: usize,
    pings: usize,
    fail_ping: bool,
    fail_writes: bool,
    /// Handle id used by each attempted write.
    writes: Vec<usize>,
}

#[derive(Clone, Default)]
struct FakeConnector(Arc<Mutex<Transport>>);

struct FakeClient {
    id: usize,
    transport: Arc<Mutex<Transport>>,
}

impl Connector for FakeConnector {
    type Client = FakeClient;

    fn connect(&self, _settings: &ClientSettings) -> Result<FakeClient, ClientError> {
        let mut t = self.0.lock().expect("lock");
        let id = t.connects;
        t.connects += 1;
        Ok(FakeClient {
            id,
            transport: self.0.clone(),
        })
    }
}

impl Client for FakeClient {
    async fn ping(&self) -> Result<PingResponse, ClientError> {
        let mut t = self.transport.lock().expect("lock");
        t.pings += 1;
        if t.fail_ping {
            return Err(ClientError::Status {
                status: 503,
                message: "unavailable".into(),
            });
        }
        Ok(PingResponse {
            rtt: Duration::ZERO,
            version: String::new(),
        })
    }

    async fn write(&self, _batch: BatchPoints<'_>) -> Result<(), ClientError> {
        let mut t = self.transport.lock().expect("lock");
        t.writes.push(self.id);
        if t.fail_writes {
            return Err(ClientError::Status {
                status: 500,
                message: "write failed".into(),
            });
        }
        Ok(())
    }
}

fn setup() -> (Reporter<FakeConnector>, FakeConnector, Arc<MetricsRegistry>) {
    let registry = Arc::new(MetricsRegistry::new());
    registry
        .get_or_register_counter("requests")
        .expect("counter")
        .inc(1);

    let config = ReporterConfig::new("http://localhost:8086", "metrics", "app")
        .with_interval(Duration::from_secs(10))
        .with_ping_interval(Duration::from_secs(5));
    let connector = FakeConnector::default();
    let reporter =
        Reporter::new(registry.clone(), &config, connector.clone()).expect("build reporter");
    (reporter, connector, registry)
}

async fn advance_to(secs: f64, start: tokio::time::Instant) {
    tokio::time::sleep_until(start + Duration::from_secs_f64(secs)).await;
}

#[tokio::test(start_paused = true)]
async fn test_timers_do_not_fire_at_start() {
    let (reporter, connector, _registry) = setup();
    let start = tokio::time::Instant::now();
    let task = tokio::spawn(reporter.run());

    advance_to(4.5, start).await;
    {
        let t = connector.0.lock().expect("lock");
        assert_eq!(t.pings, 0);
        assert!(t.writes.is_empty());
    }

    advance_to(9.5, start).await;
    {
        let t = connector.0.lock().expect("lock");
        assert_eq!(t.pings, 1);
        assert!(t.writes.is_empty());
    }

    advance_to(25.5, start).await;
    {
        let t = connector.0.lock().expect("lock");
        assert_eq!(t.pings, 5);
        assert_eq!(t.writes.len(), 2);
    }

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_failed_ping_switches_sends_to_new_handle() {
    let (reporter, connector, _registry) = setup();
    let start = tokio::time::Instant::now();
    let task = tokio::spawn(reporter.run());

    advance_to(12.0, start).await;
    assert_eq!(connector.0.lock().expect("lock").writes, vec![0]);

    connector.0.lock().expect("lock").fail_ping = true;
    // Ping at 15s fails and the reporter reconnects.
    advance_to(16.0, start).await;
    {
        let mut t = connector.0.lock().expect("lock");
        assert_eq!(t.connects, 2);
        t.fail_ping = false;
    }

    advance_to(21.0, start).await;
    assert_eq!(connector.0.lock().expect("lock").writes, vec![0, 1]);

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_write_failures_do_not_stop_the_loop() {
    let (reporter, connector, _registry) = setup();
    connector.0.lock().expect("lock").fail_writes = true;
    let start = tokio::time::Instant::now();
    let task = tokio::spawn(reporter.run());

    advance_to(35.0, start).await;
    assert_eq!(connector.0.lock().expect("lock").writes.len(), 3);
    assert!(!task.is_finished());

    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_empty_registry_never_writes() {
    let registry = Arc::new(MetricsRegistry::new());
    let config = ReporterConfig::new("http://localhost:8086", "metrics", "app");
    let connector = FakeConnector::default();
    let reporter = Reporter::new(registry, &config, connector.clone()).expect("build reporter");
    let start = tokio::time::Instant::now();
    let task = tokio::spawn(reporter.run());

    advance_to(31.0, start).await;
    let t = connector.0.lock().expect("lock");
    assert!(t.writes.is_empty());
    assert_eq!(t.pings, 6);
    drop(t);

    task.abort();
}
