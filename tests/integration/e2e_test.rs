//! End-to-end tests: configuration through a running poller

use async_trait::async_trait;
use signal_dash::config::Config;
use signal_dash::fetch::{FetchResult, SignalFetcher};
use signal_dash::poller::{PollPhase, Poller};
use signal_dash::signal::InstrumentKey;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const EXAMPLE_CONFIG: &str = include_str!("../../config.toml.example");

struct CountingFetcher {
    calls: AtomicUsize,
}

#[async_trait]
impl SignalFetcher for CountingFetcher {
    async fn fetch(&self, _instrument: &InstrumentKey) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(None)
    }
}

#[test]
fn test_config_example_parses() {
    let config: Config = toml::from_str(EXAMPLE_CONFIG).unwrap();
    assert_eq!(config.poller.interval_ms, 10_000);
    assert_eq!(config.poller.instrument.as_str(), "NIFTY");
    assert!(config.warnings().is_empty());
}

#[test]
fn test_config_example_loads_from_disk() {
    let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("config.toml.example");
    let config = tokio_test::assert_ok!(Config::load(&path));

    assert_eq!(config.api.timeout_ms, 5_000);
    assert_eq!(config.poller.instruments.len(), 3);
    assert_eq!(config.poller_settings().pulse_duration, Duration::from_millis(600));
}

#[tokio::test(start_paused = true)]
async fn test_poller_runs_on_configured_interval() {
    let config: Config = toml::from_str(EXAMPLE_CONFIG).unwrap();
    let fetcher = Arc::new(CountingFetcher {
        calls: AtomicUsize::new(0),
    });
    let poller = Poller::new(fetcher.clone(), config.poller_settings());

    poller
        .start(config.poller.instrument.clone(), config.poller.interval())
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(25_000)).await;

    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 3);
    assert_eq!(poller.phase().await, PollPhase::Connected);

    let view = poller.view().await.unwrap();
    assert_eq!(view.connected_label, "Live");
    assert!(view.display_signal.is_none());
    assert!(view.last_update.is_some());

    poller.stop().await;
    assert_eq!(poller.phase().await, PollPhase::Terminated);
}
