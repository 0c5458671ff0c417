// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! InfluxDB Reporter Agent
//!
//! Samples a few process metrics and reports them to InfluxDB until Ctrl+C.
//!
//! # Usage
//!
//! ```bash
//! # Write an example configuration
//! influx-reporter-agent gen-config --output reporter.yaml
//!
//! # Check a configuration file
//! influx-reporter-agent validate --config reporter.yaml
//!
//! # Run
//! influx-reporter-agent --config reporter.yaml --log-level debug
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use influx_reporter::{Reporter, ReporterConfig};
use metrics_registry::MetricsRegistry;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Process metrics sampling period.
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// InfluxDB metrics reporter agent
#[derive(Parser, Debug)]
#[command(name = "influx-reporter-agent")]
#[command(about = "Report process metrics to InfluxDB")]
#[command(version)]
struct Args {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example configuration file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "reporter.yaml")]
        output: PathBuf,
    },

    /// Validate a configuration file
    Validate {
        /// Configuration file path
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::GenConfig { output } => cmd_gen_config(&output),
            Commands::Validate { config } => cmd_validate(&config),
        };
    }

    let path = args
        .config
        .context("Missing --config (use `gen-config` to create one)")?;
    let config = load_config(&path)?;

    let registry = Arc::new(MetricsRegistry::new());
    let sampler = ProcessSampler::register(&registry).context("Failed to register metrics")?;
    let reporter = Reporter::http(registry, &config).context("Failed to create reporter")?;

    tokio::spawn(sampler.run());

    tokio::select! {
        _ = reporter.run() => {}
        signal = tokio::signal::ctrl_c() => {
            signal.context("Failed to listen for Ctrl+C")?;
            tracing::info!("Shutting down");
        }
    }
    Ok(())
}

fn load_config(path: &Path) -> Result<ReporterConfig> {
    let config = ReporterConfig::from_file(path)
        .with_context(|| format!("Failed to load {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", path.display()))?;
    Ok(config)
}

fn example_config() -> ReporterConfig {
    let mut tags = BTreeMap::new();
    tags.insert("host".to_string(), "localhost".to_string());
    tags.insert("service".to_string(), "influx-reporter-agent".to_string());

    ReporterConfig::new("http://localhost:8086", "metrics", "agent")
        .with_credentials("writer", "changeme")
        .with_tags(tags)
        .with_interval(Duration::from_secs(10))
        .with_max_batch_size(5000)
}

fn cmd_gen_config(output: &Path) -> Result<()> {
    let yaml = example_config().to_yaml()?;
    let content = format!(
        "# InfluxDB Reporter Configuration\n# Generated by influx-reporter-agent gen-config\n\n{}",
        yaml
    );

    std::fs::write(output, content)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    let config = load_config(path)?;
    println!("Configuration valid!");
    println!();
    println!("Target:      {} (database '{}')", config.url, config.database);
    println!("Measurement: {}", config.measurement);
    println!("Interval:    {:?}", config.interval());
    println!("Ping:        {:?}", config.ping_interval());
    if !config.tags.is_empty() {
        println!("Tags:");
        for (key, value) in &config.tags {
            println!("  {} = {}", key, value);
        }
    }
    Ok(())
}

/// Feeds the agent's own metrics into the registry.
struct ProcessSampler {
    start: Instant,
    uptime: Arc<metrics_registry::Gauge>,
    heartbeat: Arc<metrics_registry::Meter>,
    samples: Arc<metrics_registry::Counter>,
    sample_time: Arc<metrics_registry::Timer>,
}

impl ProcessSampler {
    fn register(registry: &MetricsRegistry) -> Result<Self> {
        Ok(Self {
            start: Instant::now(),
            uptime: registry.get_or_register_gauge("agent.uptime_secs")?,
            heartbeat: registry.get_or_register_meter("agent.heartbeat")?,
            samples: registry.get_or_register_counter("agent.samples")?,
            sample_time: registry.get_or_register_timer("agent.sample")?,
        })
    }

    fn sample(&self) {
        self.sample_time.time(|| {
            let uptime = i64::try_from(self.start.elapsed().as_secs()).unwrap_or(i64::MAX);
            self.uptime.update(uptime);
            self.heartbeat.mark(1);
            self.samples.inc(1);
        });
    }

    async fn run(self) {
        let mut interval = tokio::time::interval(SAMPLE_INTERVAL);
        loop {
            interval.tick().await;
            self.sample();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics_registry::{MetricSnapshot, Registry};

    #[test]
    fn test_gen_config_output_validates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("reporter.yaml");

        cmd_gen_config(&path).expect("gen-config");
        let config = load_config(&path).expect("load generated config");
        assert_eq!(config, example_config());
    }

    #[test]
    fn test_load_config_rejects_invalid_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("bad.yaml");
        std::fs::write(
            &path,
            "url: \"http://localhost:8086\"\ndatabase: \"\"\nmeasurement: \"m\"\n",
        )
        .expect("write");

        let err = load_config(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("database must not be empty"));
    }

    #[test]
    fn test_sampler_updates_registry() {
        let registry = MetricsRegistry::new();
        let sampler = ProcessSampler::register(&registry).expect("register");
        sampler.sample();
        sampler.sample();

        let mut counts = BTreeMap::new();
        registry.each(&mut |name, snap| {
            let count = match snap {
                MetricSnapshot::Counter(c) => c,
                MetricSnapshot::Meter(m) => m.count(),
                MetricSnapshot::Timer(t) => t.count(),
                _ => return,
            };
            counts.insert(name.to_string(), count);
        });
        assert_eq!(counts.get("agent.samples"), Some(&2));
        assert_eq!(counts.get("agent.heartbeat"), Some(&2));
        assert_eq!(counts.get("agent.sample"), Some(&2));
    }
}
