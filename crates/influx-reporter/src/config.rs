// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! YAML configuration for the reporter.

use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Default report interval (10 s).
pub const DEFAULT_INTERVAL_MS: u64 = 10_000;
/// Default health-check interval (5 s).
pub const DEFAULT_PING_INTERVAL_MS: u64 = 5_000;

/// Configuration parsing errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Reporter configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReporterConfig {
    /// InfluxDB base URL (e.g., "http://localhost:8086").
    pub url: String,
    /// Target database.
    pub database: String,
    /// Measurement every point is written under.
    pub measurement: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Tags attached to every point.
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
    /// Report period in milliseconds.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Health-check period in milliseconds.
    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,
    /// Truncate point timestamps to a multiple of the report interval.
    #[serde(default)]
    pub align: bool,
    /// Skip TLS certificate verification.
    #[serde(default)]
    pub unsafe_ssl: bool,
    /// Maximum points per write. Zero or negative writes everything at once.
    #[serde(default)]
    pub max_batch_size: i64,
    /// HTTP request timeout in milliseconds. None = no timeout.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

fn default_interval_ms() -> u64 {
    DEFAULT_INTERVAL_MS
}

fn default_ping_interval_ms() -> u64 {
    DEFAULT_PING_INTERVAL_MS
}

impl ReporterConfig {
    /// Configuration with defaults for everything but the target.
    pub fn new(
        url: impl Into<String>,
        database: impl Into<String>,
        measurement: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            database: database.into(),
            measurement: measurement.into(),
            username: None,
            password: None,
            tags: BTreeMap::new(),
            interval_ms: DEFAULT_INTERVAL_MS,
            ping_interval_ms: DEFAULT_PING_INTERVAL_MS,
            align: false,
            unsafe_ssl: false,
            max_batch_size: 0,
            timeout_ms: None,
        }
    }

    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_tags(mut self, tags: BTreeMap<String, String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval_ms = duration_ms(interval);
        self
    }

    pub fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval_ms = duration_ms(interval);
        self
    }

    pub fn with_align(mut self, align: bool) -> Self {
        self.align = align;
        self
    }

    pub fn with_max_batch_size(mut self, max_batch_size: i64) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: ReporterConfig = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Parse configuration from a YAML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn ping_interval(&self) -> Duration {
        Duration::from_millis(self.ping_interval_ms)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// Parse the target URL. Only `http` and `https` are accepted.
    pub fn parse_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.url)
            .map_err(|e| ConfigError::Invalid(format!("url '{}': {}", self.url, e)))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(ConfigError::Invalid(format!(
                "url '{}': unsupported scheme '{}'",
                self.url, other
            ))),
        }
    }

    /// Check everything a reporter needs before it can start.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.parse_url()?;
        if self.database.is_empty() {
            return Err(ConfigError::Invalid("database must not be empty".into()));
        }
        if self.measurement.is_empty() {
            return Err(ConfigError::Invalid("measurement must not be empty".into()));
        }
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid("interval_ms must be > 0".into()));
        }
        if self.ping_interval_ms == 0 {
            return Err(ConfigError::Invalid("ping_interval_ms must be > 0".into()));
        }
        Ok(())
    }
}

fn duration_ms(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL_YAML: &str = r#"
url: "http://localhost:8086"
database: "metrics"
measurement: "app"
"#;

    const FULL_YAML: &str = r#"
url: "https://influx.example.com:8086"
database: "telemetry"
measurement: "service"
username: "writer"
password: "test-password-placeholder"
tags:
  host: "a"
  region: "eu-west"
interval_ms: 1000
ping_interval_ms: 2500
align: true
unsafe_ssl: true
max_batch_size: 500
timeout_ms: 3000
"#;

    #[test]
    fn test_config_parse_minimal() {
        let config = ReporterConfig::from_yaml(MINIMAL_YAML).expect("parse minimal yaml");

        assert_eq!(config.url, "http://localhost:8086");
        assert_eq!(config.database, "metrics");
        assert_eq!(config.measurement, "app");
        assert!(config.username.is_none());
        assert!(config.password.is_none());
        assert!(config.tags.is_empty());
        assert_eq!(config.interval(), Duration::from_secs(10));
        assert_eq!(config.ping_interval(), Duration::from_secs(5));
        assert!(!config.align);
        assert!(!config.unsafe_ssl);
        assert_eq!(config.max_batch_size, 0);
        assert!(config.timeout().is_none());
        assert_eq!(
            config,
            ReporterConfig::new("http://localhost:8086", "metrics", "app")
        );
    }

    #[test]
    fn test_config_parse_all_fields() {
        let config = ReporterConfig::from_yaml(FULL_YAML).expect("parse full yaml");

        assert_eq!(config.url, "https://influx.example.com:8086");
        assert_eq!(config.database, "telemetry");
        assert_eq!(config.measurement, "service");
        assert_eq!(config.username.as_deref(), Some("writer"));
        assert_eq!(config.password.as_deref(), Some("test-password-placeholder"));
        assert_eq!(config.tags.len(), 2);
        assert_eq!(config.tags.get("host").map(String::as_str), Some("a"));
        assert_eq!(config.interval(), Duration::from_secs(1));
        assert_eq!(config.ping_interval(), Duration::from_millis(2500));
        assert!(config.align);
        assert!(config.unsafe_ssl);
        assert_eq!(config.max_batch_size, 500);
        assert_eq!(config.timeout(), Some(Duration::from_secs(3)));
        config.validate().expect("valid");
    }

    #[test]
    fn test_config_negative_batch_size_accepted() {
        let yaml = format!("{}max_batch_size: -1\n", MINIMAL_YAML);
        let config = ReporterConfig::from_yaml(&yaml).expect("parse");
        assert_eq!(config.max_batch_size, -1);
        config.validate().expect("valid");
    }

    #[test]
    fn test_config_missing_required_field() {
        let err = ReporterConfig::from_yaml("url: \"http://localhost:8086\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = ReporterConfig::new("not a url", "db", "m");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let config = ReporterConfig::new("udp://localhost:8089", "db", "m");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported scheme 'udp'"));
    }

    #[test]
    fn test_validate_rejects_zero_intervals() {
        let base = ReporterConfig::new("http://localhost:8086", "db", "m");
        assert!(base.clone().with_interval(Duration::ZERO).validate().is_err());
        assert!(base
            .clone()
            .with_ping_interval(Duration::ZERO)
            .validate()
            .is_err());
        base.validate().expect("defaults are valid");
    }

    #[test]
    fn test_validate_rejects_empty_names() {
        assert!(ReporterConfig::new("http://localhost:8086", "", "m")
            .validate()
            .is_err());
        assert!(ReporterConfig::new("http://localhost:8086", "db", "")
            .validate()
            .is_err());
    }

    #[test]
    fn test_config_yaml_roundtrip_keeps_optional_fields_out() {
        let config = ReporterConfig::new("http://localhost:8086", "db", "m");
        let yaml = config.to_yaml().expect("serialize");
        assert!(!yaml.contains("username"));
        assert!(!yaml.contains("timeout_ms"));
        assert_eq!(ReporterConfig::from_yaml(&yaml).expect("parse"), config);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("tempfile");
        file.write_all(FULL_YAML.as_bytes()).expect("write");

        let config = ReporterConfig::from_file(file.path()).expect("load");
        assert_eq!(config.database, "telemetry");

        let missing = ReporterConfig::from_file(Path::new("/nonexistent/reporter.yaml"));
        assert!(matches!(missing, Err(ConfigError::Io(_))));
    }
}
