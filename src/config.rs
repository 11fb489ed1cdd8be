//! Configuration types for signal-dash

use crate::fetch::{HttpFetcherConfig, DEFAULT_BASE_URL};
use crate::poller::PollerSettings;
use crate::signal::InstrumentKey;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Signal service configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the signal service
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (milliseconds)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}
fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Settings for the HTTP fetcher
    pub fn fetcher_config(&self) -> HttpFetcherConfig {
        HttpFetcherConfig {
            base_url: self.base_url.clone(),
            timeout: self.timeout(),
        }
    }
}

/// Polling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PollerConfig {
    /// Time between fetches (milliseconds)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// How long the "fresh data" pulse stays raised (milliseconds)
    #[serde(default = "default_pulse_ms")]
    pub pulse_ms: u64,

    /// Instrument watched on startup
    #[serde(default = "default_instrument")]
    pub instrument: InstrumentKey,

    /// Instruments offered by the selector
    #[serde(default = "default_instruments")]
    pub instruments: Vec<InstrumentKey>,
}

fn default_interval_ms() -> u64 {
    10_000
}
fn default_pulse_ms() -> u64 {
    600
}
fn default_instrument() -> InstrumentKey {
    InstrumentKey::default()
}
fn default_instruments() -> Vec<InstrumentKey> {
    ["NIFTY", "BANKNIFTY", "SENSEX"]
        .into_iter()
        .filter_map(|k| InstrumentKey::new(k).ok())
        .collect()
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            pulse_ms: default_pulse_ms(),
            instrument: default_instrument(),
            instruments: default_instruments(),
        }
    }
}

impl PollerConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format
    #[default]
    Pretty,
    /// JSON format for log aggregation
    Json,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Serve Prometheus metrics on this port when set
    #[serde(default)]
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Poller timing derived from the poller and API sections
    pub fn poller_settings(&self) -> PollerSettings {
        PollerSettings {
            pulse_duration: Duration::from_millis(self.poller.pulse_ms),
            fetch_timeout: self.api.timeout(),
        }
    }

    /// Problems that do not prevent running but defeat the polling guarantees
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.poller.interval_ms == 0 {
            warnings.push("poller.interval_ms is 0; polling cannot start".to_string());
        }
        if self.api.timeout_ms >= self.poller.interval_ms {
            warnings.push(format!(
                "api.timeout_ms ({}) is not below poller.interval_ms ({}); fetches may overlap",
                self.api.timeout_ms, self.poller.interval_ms
            ));
        }
        if self.poller.pulse_ms >= self.poller.interval_ms {
            warnings.push(format!(
                "poller.pulse_ms ({}) outlasts the poll interval; the pulse never settles",
                self.poller.pulse_ms
            ));
        }

        warnings
    }
}
