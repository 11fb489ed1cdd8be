//! Integration tests for the poller state machine
//!
//! All tests run on paused tokio time, so sleeps advance a virtual clock.

use async_trait::async_trait;
use signal_dash::fetch::{FetchError, FetchResult, SignalFetcher};
use signal_dash::poller::{PollPhase, Poller, PollerSettings};
use signal_dash::signal::{Greeks, InstrumentKey, Side, Signal, SignalDetail};
use signal_dash::view::ViewModel;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

const INTERVAL: Duration = Duration::from_secs(10);

/// Plays back a queue of (delay, result) steps per instrument
struct ScriptedFetcher {
    steps: Mutex<HashMap<String, VecDeque<(Duration, FetchResult)>>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    fn new() -> Self {
        Self {
            steps: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    fn push(&self, instrument: &str, delay: Duration, result: FetchResult) -> &Self {
        self.steps
            .lock()
            .unwrap()
            .entry(instrument.to_string())
            .or_default()
            .push_back((delay, result));
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SignalFetcher for ScriptedFetcher {
    async fn fetch(&self, instrument: &InstrumentKey) -> FetchResult {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let step = self
            .steps
            .lock()
            .unwrap()
            .get_mut(instrument.as_str())
            .and_then(VecDeque::pop_front);

        match step {
            Some((delay, result)) => {
                sleep(delay).await;
                result
            }
            None => Ok(None),
        }
    }
}

fn key(s: &str) -> InstrumentKey {
    InstrumentKey::new(s).unwrap()
}

fn signal(instrument: &str, confidence: f64, strike: f64) -> Signal {
    Signal {
        instrument: key(instrument),
        side: Side::Buy,
        confidence,
        timestamp: "09:15:00".to_string(),
        greeks: Greeks {
            delta: 0.5,
            gamma: 0.06,
            theta: -0.4,
            vega: 0.35,
        },
        levels: None,
        detail: SignalDetail {
            strike: Some(strike),
            ..Default::default()
        },
    }
}

fn settings(fetch_timeout: Duration) -> PollerSettings {
    PollerSettings {
        pulse_duration: Duration::from_millis(600),
        fetch_timeout,
    }
}

/// Sleep until `ms` milliseconds after `origin`
async fn at(origin: tokio::time::Instant, ms: u64) {
    tokio::time::sleep_until(origin + Duration::from_millis(ms)).await;
}

async fn view<F: SignalFetcher + 'static>(poller: &Poller<F>) -> ViewModel {
    poller.view().await.expect("poller is watching")
}

#[tokio::test(start_paused = true)]
async fn test_absent_a_a_error_b_sequence() {
    let a = signal("NIFTY", 0.8, 20000.0);
    let b = signal("NIFTY", 0.9, 20100.0);
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher
        .push("NIFTY", Duration::ZERO, Ok(None))
        .push("NIFTY", Duration::ZERO, Ok(Some(a.clone())))
        .push("NIFTY", Duration::ZERO, Ok(Some(a.clone())))
        .push("NIFTY", Duration::ZERO, Err(FetchError::Status(502)))
        .push("NIFTY", Duration::ZERO, Ok(Some(b.clone())));

    let poller = Poller::new(fetcher.clone(), settings(Duration::from_secs(5)));
    let origin = tokio::time::Instant::now();
    poller.start(key("NIFTY"), INTERVAL).await.unwrap();

    // t=0: no signal
    at(origin, 1).await;
    let v = view(&poller).await;
    assert!(v.connected);
    assert!(v.display_signal.is_none());
    assert!(!v.pulse_active);
    assert!(!v.is_loading_first_time);

    // t=10s: A arrives and pulses
    at(origin, 10_001).await;
    let v = view(&poller).await;
    assert_eq!(v.display_signal, Some(a.clone()));
    assert!(v.pulse_active);

    // pulse expires without another tick
    at(origin, 10_700).await;
    assert!(!view(&poller).await.pulse_active);

    // t=20s: identical A pulses again
    at(origin, 20_001).await;
    let v = view(&poller).await;
    assert_eq!(v.display_signal, Some(a.clone()));
    assert!(v.pulse_active);
    let state = poller.snapshot().await.unwrap();
    assert_eq!(state.previous, Some(a.clone()));

    // t=30s: error keeps A on screen, disconnected
    at(origin, 30_001).await;
    let v = view(&poller).await;
    assert!(!v.connected);
    assert_eq!(v.connected_label, "Offline");
    assert_eq!(v.display_signal, Some(a.clone()));
    assert!(!v.pulse_active);

    // t=40s: B arrives with A as previous
    at(origin, 40_001).await;
    let v = view(&poller).await;
    assert!(v.connected);
    assert_eq!(v.display_signal, Some(b.clone()));
    assert!(v.pulse_active);
    assert_eq!(v.strike_delta, Some(100.0));
    let state = poller.snapshot().await.unwrap();
    assert_eq!(state.previous, Some(a));

    assert_eq!(fetcher.calls(), 5);
    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_slow_first_fetch_is_discarded() {
    let slow = signal("NIFTY", 0.7, 20000.0);
    let fast = signal("NIFTY", 0.95, 20200.0);
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher
        .push("NIFTY", Duration::from_millis(15_000), Ok(Some(slow)))
        .push("NIFTY", Duration::from_millis(2_000), Ok(Some(fast.clone())));

    // Timeout above the slow fetch so it resolves instead of timing out
    let poller = Poller::new(fetcher.clone(), settings(Duration::from_secs(20)));
    let origin = tokio::time::Instant::now();
    poller.start(key("NIFTY"), INTERVAL).await.unwrap();

    at(origin, 9_999).await;
    assert_eq!(poller.phase().await, PollPhase::Loading);
    assert!(view(&poller).await.is_loading_first_time);

    // second fetch issued at 10s resolves at 12s
    at(origin, 12_001).await;
    let state = poller.snapshot().await.unwrap();
    assert_eq!(state.current, Some(fast.clone()));
    assert!(state.previous.is_none());

    // first fetch resolves at 15s and is dropped
    at(origin, 15_001).await;
    let state = poller.snapshot().await.unwrap();
    assert_eq!(state.current, Some(fast));
    assert!(state.previous.is_none());
    assert!(!state.changed_pulse_active);

    assert_eq!(fetcher.calls(), 2);
    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_switch_discards_in_flight_result() {
    let old = signal("NIFTY", 0.8, 20000.0);
    let new = signal("BANKNIFTY", 0.85, 45000.0);
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher
        .push("NIFTY", Duration::from_millis(5_000), Ok(Some(old)))
        .push("BANKNIFTY", Duration::ZERO, Ok(Some(new.clone())));

    let poller = Poller::new(fetcher.clone(), settings(Duration::from_secs(8)));
    let origin = tokio::time::Instant::now();
    poller.start(key("NIFTY"), INTERVAL).await.unwrap();

    at(origin, 1_000).await;
    poller.switch_instrument(key("BANKNIFTY")).await.unwrap();

    at(origin, 1_001).await;
    let after_switch = poller.snapshot().await.unwrap();
    assert_eq!(after_switch.instrument, key("BANKNIFTY"));
    assert_eq!(after_switch.current, Some(new.clone()));

    // NIFTY fetch resolves at 5s; nothing observable changes
    at(origin, 5_001).await;
    let mut later = poller.snapshot().await.unwrap();
    // pulse from the BANKNIFTY arrival has expired in between
    later.changed_pulse_active = after_switch.changed_pulse_active;
    assert_eq!(later, after_switch);
    assert_eq!(poller.instrument().await, Some(key("BANKNIFTY")));

    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_switch_discards_failed_in_flight_result() {
    let new = signal("BANKNIFTY", 0.85, 45000.0);
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher
        .push(
            "NIFTY",
            Duration::from_millis(5_000),
            Err(FetchError::Transport("connection reset".to_string())),
        )
        .push("BANKNIFTY", Duration::ZERO, Ok(Some(new.clone())));

    let poller = Poller::new(fetcher.clone(), settings(Duration::from_secs(8)));
    let origin = tokio::time::Instant::now();
    poller.start(key("NIFTY"), INTERVAL).await.unwrap();

    at(origin, 1_000).await;
    poller.switch_instrument(key("BANKNIFTY")).await.unwrap();

    // NIFTY failure lands at 5s
    at(origin, 5_001).await;
    let state = poller.snapshot().await.unwrap();
    assert!(state.connected);
    assert_eq!(state.current, Some(new));
    assert_eq!(poller.phase().await, PollPhase::Connected);
    assert_eq!(view(&poller).await.connected_label, "Live");

    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_switch_discards_timed_out_in_flight_fetch() {
    let new = signal("SENSEX", 0.77, 70000.0);
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher
        .push("NIFTY", Duration::from_millis(9_000), Ok(None))
        .push("SENSEX", Duration::ZERO, Ok(Some(new.clone())));

    let poller = Poller::new(fetcher.clone(), settings(Duration::from_secs(3)));
    let origin = tokio::time::Instant::now();
    poller.start(key("NIFTY"), INTERVAL).await.unwrap();

    at(origin, 500).await;
    poller.switch_instrument(key("SENSEX")).await.unwrap();

    // NIFTY fetch hits its 3s timeout
    at(origin, 3_001).await;
    let state = poller.snapshot().await.unwrap();
    assert!(state.connected);
    assert!(!state.loading);
    assert_eq!(state.current, Some(new));
    assert_eq!(poller.phase().await, PollPhase::Connected);

    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_switch_restarts_timer_on_new_instrument() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    let poller = Poller::new(fetcher.clone(), settings(Duration::from_secs(5)));
    let origin = tokio::time::Instant::now();

    poller.start(key("NIFTY"), INTERVAL).await.unwrap();
    at(origin, 4_000).await;
    poller.switch_instrument(key("SENSEX")).await.unwrap();
    assert_eq!(poller.phase().await, PollPhase::Loading);

    // old schedule would have ticked at 10s; the new one ticks at 14s
    at(origin, 10_500).await;
    assert_eq!(fetcher.calls(), 2);

    at(origin, 14_500).await;
    assert_eq!(fetcher.calls(), 3);
    assert_eq!(poller.phase().await, PollPhase::Connected);

    poller.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_prevents_further_reconciliation() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher.push(
        "NIFTY",
        Duration::from_millis(3_000),
        Ok(Some(signal("NIFTY", 0.8, 20000.0))),
    );

    let poller = Poller::new(fetcher.clone(), settings(Duration::from_secs(5)));
    let origin = tokio::time::Instant::now();
    poller.start(key("NIFTY"), INTERVAL).await.unwrap();

    at(origin, 1_000).await;
    poller.stop().await;
    let stopped = poller.snapshot().await.unwrap();

    at(origin, 60_000).await;
    assert_eq!(poller.phase().await, PollPhase::Terminated);
    assert_eq!(poller.snapshot().await.unwrap(), stopped);
    assert!(stopped.current.is_none());
    assert_eq!(fetcher.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_pulse_is_extended_by_new_arrival() {
    let fetcher = Arc::new(ScriptedFetcher::new());
    fetcher
        .push("NIFTY", Duration::ZERO, Ok(Some(signal("NIFTY", 0.8, 20000.0))))
        .push("NIFTY", Duration::ZERO, Ok(Some(signal("NIFTY", 0.8, 20000.0))));

    // pulse longer than the interval so the second arrival lands mid-pulse
    let settings = PollerSettings {
        pulse_duration: Duration::from_millis(1_500),
        fetch_timeout: Duration::from_millis(500),
    };
    let poller = Poller::new(fetcher, settings);
    let origin = tokio::time::Instant::now();
    poller.start(key("NIFTY"), Duration::from_secs(1)).await.unwrap();

    // first pulse would expire at 1.5s, the second arrival at 1s extends it to 2.5s
    at(origin, 1_600).await;
    assert!(view(&poller).await.pulse_active);

    at(origin, 2_600).await;
    // third tick at 2s returned no signal, which lowers the pulse immediately
    let v = view(&poller).await;
    assert!(!v.pulse_active);
    assert!(v.display_signal.is_none());

    poller.stop().await;
}
