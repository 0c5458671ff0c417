// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport to the time-series store.
//!
//! The reporter only talks to the [`Connector`] and [`Client`] traits so it
//! can run against fakes. [`HttpConnector`] builds the real
//! [`InfluxClient`], which speaks the InfluxDB 1.x HTTP API:
//!
//! - `GET {url}/ping` health check
//! - `POST {url}/write?db={database}&precision=n` with a Line Protocol body

use crate::config::{ConfigError, ReporterConfig};
use crate::influx::{LineProtocolWriter, Point};
use reqwest::{RequestBuilder, Response, Url};
use serde::Deserialize;
use std::future::Future;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Header carrying the server version in ping responses.
pub const VERSION_HEADER: &str = "X-Influxdb-Version";

/// Transport errors.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

/// Everything needed to build a client for one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Skip TLS certificate verification.
    pub unsafe_ssl: bool,
    pub timeout: Option<Duration>,
}

impl ClientSettings {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            username: None,
            password: None,
            unsafe_ssl: false,
            timeout: None,
        }
    }

    /// Resolve the connection part of a reporter configuration.
    pub fn from_config(config: &ReporterConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            url: config.parse_url()?,
            username: config.username.clone(),
            password: config.password.clone(),
            unsafe_ssl: config.unsafe_ssl,
            timeout: config.timeout(),
        })
    }
}

/// Result of a successful ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PingResponse {
    /// Round-trip time of the request.
    pub rtt: Duration,
    /// Server version, empty if the server did not report one.
    pub version: String,
}

/// One write request: a database and the points to store in it.
#[derive(Debug, Clone, Copy)]
pub struct BatchPoints<'a> {
    pub database: &'a str,
    pub points: &'a [Point],
}

/// A live connection handle to the store.
pub trait Client: Send + Sync {
    /// Verify the store is reachable.
    fn ping(&self) -> impl Future<Output = Result<PingResponse, ClientError>> + Send;

    /// Write one batch of points.
    fn write(&self, batch: BatchPoints<'_>)
        -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Builds clients. Called once at reporter construction and again on every
/// reconnection; must not perform network I/O.
pub trait Connector: Send + Sync + 'static {
    type Client: Client + 'static;

    fn connect(&self, settings: &ClientSettings) -> Result<Self::Client, ClientError>;
}

/// Connector for [`InfluxClient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpConnector;

impl Connector for HttpConnector {
    type Client = InfluxClient;

    fn connect(&self, settings: &ClientSettings) -> Result<InfluxClient, ClientError> {
        InfluxClient::new(settings)
    }
}

/// InfluxDB 1.x HTTP client.
#[derive(Debug, Clone)]
pub struct InfluxClient {
    http: reqwest::Client,
    ping_url: Url,
    write_url: Url,
    username: Option<String>,
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

impl InfluxClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(settings.unsafe_ssl);
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            http: builder.build()?,
            ping_url: endpoint(&settings.url, "ping")?,
            write_url: endpoint(&settings.url, "write")?,
            username: settings.username.clone(),
            password: settings.password.clone(),
        })
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.username {
            Some(user) => request.basic_auth(user, self.password.as_deref()),
            None => request,
        }
    }
}

impl Client for InfluxClient {
    async fn ping(&self) -> Result<PingResponse, ClientError> {
        let start = Instant::now();
        let response = self
            .authorize(self.http.get(self.ping_url.clone()))
            .send()
            .await?;
        let rtt = start.elapsed();

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let version = response
            .headers()
            .get(VERSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(PingResponse { rtt, version })
    }

    async fn write(&self, batch: BatchPoints<'_>) -> Result<(), ClientError> {
        let mut writer = LineProtocolWriter::new();
        let written = writer.write_points(batch.points);
        if written < batch.points.len() {
            tracing::debug!(
                skipped = batch.points.len() - written,
                "points without writable fields left out"
            );
        }
        if writer.is_empty() {
            return Ok(());
        }

        let mut url = self.write_url.clone();
        url.query_pairs_mut()
            .append_pair("db", batch.database)
            .append_pair("precision", "n");

        let response = self
            .authorize(self.http.post(url))
            .header(reqwest::header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(writer.finish())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }
        Ok(())
    }
}

/// Append `segment` to the base path, keeping any path prefix.
fn endpoint(base: &Url, segment: &str) -> Result<Url, ClientError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(base.to_string()))?
        .pop_if_empty()
        .push(segment);
    Ok(url)
}

/// Turn a non-2xx response into an error, preferring the JSON `error` member.
async fn status_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = match serde_json::from_str::<ErrorBody>(&body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.trim().to_string(),
    };
    ClientError::Status { status, message }
}
