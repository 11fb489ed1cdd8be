//! HTTP client for the signal service
//!
//! Talks to the service's read-only JSON endpoints:
//! - `GET /api/signal?symbol=KEY` returns one signal or `null`
//! - `GET /api/signals?symbols=A,B` returns a batch of signals
//! - `GET /api/symbols` lists the instruments the service knows
//! - `GET /health` reports liveness

use super::{FetchError, FetchResult, SignalFetcher};
use crate::signal::{InstrumentKey, Signal};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// Default location of the signal service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Configuration for the HTTP fetcher
#[derive(Debug, Clone)]
pub struct HttpFetcherConfig {
    /// Base URL of the signal service, without trailing slash
    pub base_url: String,
    /// Per-request timeout, should stay below the poll interval
    pub timeout: Duration,
}

impl Default for HttpFetcherConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(5),
        }
    }
}

/// Health report returned by `/health`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceHealth {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SymbolsResponse {
    symbols: Vec<InstrumentKey>,
}

#[derive(Debug, Deserialize)]
struct BatchResponse {
    signals: Vec<Signal>,
}

/// reqwest-backed [`SignalFetcher`]
pub struct HttpFetcher {
    config: HttpFetcherConfig,
    client: Client,
}

impl HttpFetcher {
    /// Create a fetcher with default configuration
    pub fn new() -> anyhow::Result<Self> {
        Self::with_config(HttpFetcherConfig::default())
    }

    /// Create a fetcher with custom configuration
    pub fn with_config(mut config: HttpFetcherConfig) -> anyhow::Result<Self> {
        config.base_url = config.base_url.trim_end_matches('/').to_string();

        let client = Client::builder()
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self { config, client })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetch signals for several instruments in one request
    ///
    /// Instruments without a signal are simply absent from the result.
    pub async fn fetch_batch(&self, instruments: &[InstrumentKey]) -> Result<Vec<Signal>, FetchError> {
        let url = format!("{}/api/signals", self.config.base_url);
        let symbols = instruments
            .iter()
            .map(InstrumentKey::as_str)
            .collect::<Vec<_>>()
            .join(",");

        tracing::debug!(url = %url, symbols = %symbols, "Fetching signal batch");

        let response = self
            .client
            .get(&url)
            .query(&[("symbols", symbols.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let batch: BatchResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Malformed(e.to_string()))?;

        for signal in &batch.signals {
            signal.validate().map_err(FetchError::Malformed)?;
            if !instruments.contains(&signal.instrument) {
                return Err(FetchError::Malformed(format!(
                    "got signal for {} which was not requested",
                    signal.instrument
                )));
            }
        }

        Ok(batch.signals)
    }

    /// List the instruments the service can produce signals for
    pub async fn list_instruments(&self) -> anyhow::Result<Vec<InstrumentKey>> {
        let url = format!("{}/api/symbols", self.config.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Signal service error: {} - {}", status, body);
        }

        let symbols: SymbolsResponse = response.json().await?;
        Ok(symbols.symbols)
    }

    /// Query the service health endpoint
    pub async fn health(&self) -> anyhow::Result<ServiceHealth> {
        let url = format!("{}/health", self.config.base_url);

        let response = self.client.get(&url).send().await?;

        if !response.status().is_success() {
            anyhow::bail!("Signal service unhealthy: {}", response.status());
        }

        Ok(response.json().await?)
    }

    fn transport_error(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(self.config.timeout)
        } else {
            FetchError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl SignalFetcher for HttpFetcher {
    async fn fetch(&self, instrument: &InstrumentKey) -> FetchResult {
        let url = format!("{}/api/signal", self.config.base_url);

        tracing::debug!(url = %url, instrument = %instrument, "Fetching signal");

        let response = self
            .client
            .get(&url)
            .query(&[("symbol", instrument.as_str())])
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| self.transport_error(e))?;
        let signal = parse_signal_body(&body)?;

        if let Some(ref signal) = signal {
            if signal.instrument != *instrument {
                return Err(FetchError::Malformed(format!(
                    "got signal for {} while polling {}",
                    signal.instrument, instrument
                )));
            }
        }

        Ok(signal)
    }
}

/// Parse a `/api/signal` body
///
/// Both `null` and an empty body mean the service has no signal right now.
fn parse_signal_body(body: &str) -> FetchResult {
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }

    let signal: Option<Signal> =
        serde_json::from_str(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    if let Some(ref s) = signal {
        s.validate().map_err(FetchError::Malformed)?;
    }

    Ok(signal)
}
