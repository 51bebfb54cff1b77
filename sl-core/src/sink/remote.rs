//! Line-protocol push to a remote time-series store
//!
//! Each tick re-reads the remote configuration, walks the whole tree, and
//! issues one POST without retry. Anything other than a 2xx ends up in the
//! local fallback file.

use std::error::Error as StdError;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use tracing::{debug, warn};
use url::Url;

use super::fallback::FallbackFile;
use super::line_protocol::build_payload;
use super::EmitOutcome;
use crate::config::RemoteSinkConfig;
use crate::constants::remote;
use crate::error::{Result, SensorLogError};
use crate::system;
use crate::topology::SensorTopology;

pub struct RemoteLineSink {
    config_path: PathBuf,
    fallback: FallbackFile,
    client: reqwest::Client,
    computer_name: String,
}

impl RemoteLineSink {
    pub fn new(config_path: impl Into<PathBuf>, fallback_path: impl Into<PathBuf>) -> Result<Self> {
        Self::with_timeout(config_path, fallback_path, remote::REQUEST_TIMEOUT)
    }

    pub fn with_timeout(
        config_path: impl Into<PathBuf>,
        fallback_path: impl Into<PathBuf>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sensorlog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SensorLogError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config_path: config_path.into(),
            fallback: FallbackFile::new(fallback_path),
            client,
            computer_name: system::computer_name(),
        })
    }

    /// Override the host name used in tags and the `source` parameter
    pub fn with_computer_name(mut self, raw: &str) -> Self {
        self.computer_name = system::sanitize_computer_name(raw);
        self
    }

    pub fn computer_name(&self) -> &str {
        &self.computer_name
    }

    pub fn fallback(&self) -> &FallbackFile {
        &self.fallback
    }

    /// Serialize the live tree and push it. Failures land in the fallback file.
    pub async fn send(&self, topology: &SensorTopology) -> EmitOutcome {
        let config = RemoteSinkConfig::load_or_init(&self.config_path);

        let sensors = topology.enumerate();
        let mainboard = topology.tree().mainboard();
        let payload = build_payload(
            &self.computer_name,
            mainboard.as_ref().map(|hw| hw.name()),
            &sensors,
        );

        let url = match config.endpoint_url(&self.computer_name) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Remote endpoint unusable, payload kept locally");
                self.fallback.record(Some(&e.to_string()), &payload);
                return EmitOutcome::TransportFailed;
            }
        };

        match self.post(url, &payload).await {
            Ok(()) => {
                debug!(host = %config.url, points = payload.lines().count(), "Payload delivered");
                EmitOutcome::Delivered
            }
            Err(e) if e.is_rejection() => {
                warn!(host = %config.url, error = %e, "Remote store rejected payload, kept locally");
                self.fallback.record(None, &payload);
                EmitOutcome::Rejected
            }
            Err(e) => {
                warn!(host = %config.url, error = %e, "Remote transport failed, kept locally");
                self.fallback.record(Some(&e.to_string()), &payload);
                EmitOutcome::TransportFailed
            }
        }
    }

    /// One POST of `payload`; non-2xx answers become [`SensorLogError::HttpStatus`]
    pub async fn post(&self, url: Url, payload: &str) -> Result<()> {
        let response = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(payload.to_string())
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(SensorLogError::HttpStatus {
            status: status.as_u16(),
            body: body.trim().to_string(),
        })
    }
}

fn classify(e: reqwest::Error) -> SensorLogError {
    let detail = error_chain(&e);
    if e.is_timeout() {
        SensorLogError::Timeout(detail)
    } else {
        SensorLogError::transport(detail)
    }
}

/// `outer: inner: root` for an error and its sources
fn error_chain(e: &dyn StdError) -> String {
    let mut text = e.to_string();
    let mut source = e.source();
    while let Some(inner) = source {
        let inner_text = inner.to_string();
        if !text.contains(&inner_text) {
            text.push_str(": ");
            text.push_str(&inner_text);
        }
        source = inner.source();
    }
    text
}
