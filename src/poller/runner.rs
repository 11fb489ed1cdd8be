//! Recurring signal poller
//!
//! Drives a [`SignalFetcher`] on a fixed wall-clock interval for one instrument
//! at a time and folds every completed fetch into a [`PollState`].
//!
//! Every issued fetch gets a sequence number. When a fetch resolves it is
//! reconciled only if it is still the most recently issued one for the active
//! watch; anything else (a slow straggler, a result for an instrument that was
//! switched away from, anything after `stop`) is dropped.

use super::reconcile::reconcile;
use super::{PollPhase, PollState};
use crate::fetch::{FetchError, FetchResult, SignalFetcher};
use crate::signal::InstrumentKey;
use crate::telemetry;
use crate::view::{project, ViewModel};
use chrono::Utc;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Default lifetime of the "fresh data" pulse
pub const DEFAULT_PULSE: Duration = Duration::from_millis(600);

/// Default bound on a single fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Poller command errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PollerError {
    /// `stop` was called; the poller accepts no further commands
    #[error("poller has been stopped")]
    Terminated,

    /// `switch_instrument` before any `start`
    #[error("poller is not watching any instrument")]
    NotStarted,

    /// Poll interval must be positive
    #[error("poll interval must be greater than zero")]
    ZeroInterval,
}

/// Timing knobs of the poller
#[derive(Debug, Clone)]
pub struct PollerSettings {
    /// How long the pulse stays raised after a signal arrives
    pub pulse_duration: Duration,
    /// Fetches still outstanding after this long reconcile as a timeout
    pub fetch_timeout: Duration,
}

impl Default for PollerSettings {
    fn default() -> Self {
        Self {
            pulse_duration: DEFAULT_PULSE,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }
}

struct Shared {
    /// `None` until the first `start`
    state: Option<PollState>,
    interval: Duration,
    /// Bumped on every start/switch; timers from older epochs stop issuing
    epoch: u64,
    last_seq: u64,
    /// Sequence number of the only fetch whose result may still be applied
    latest_issued: Option<u64>,
    pulse_seq: u64,
    terminated: bool,
}

struct Inner<F> {
    fetcher: Arc<F>,
    settings: PollerSettings,
    shared: RwLock<Shared>,
    driver: Mutex<Option<JoinHandle<()>>>,
    revision: watch::Sender<u64>,
}

/// Polls one instrument at a time and owns its [`PollState`]
pub struct Poller<F> {
    inner: Arc<Inner<F>>,
}

impl<F: SignalFetcher + 'static> Poller<F> {
    /// Create an idle poller
    pub fn new(fetcher: Arc<F>, settings: PollerSettings) -> Self {
        let (revision, _) = watch::channel(0);

        Self {
            inner: Arc::new(Inner {
                fetcher,
                settings,
                shared: RwLock::new(Shared {
                    state: None,
                    interval: Duration::ZERO,
                    epoch: 0,
                    last_seq: 0,
                    latest_issued: None,
                    pulse_seq: 0,
                    terminated: false,
                }),
                driver: Mutex::new(None),
                revision,
            }),
        }
    }

    /// Create with default pulse and timeout
    pub fn with_defaults(fetcher: Arc<F>) -> Self {
        Self::new(fetcher, PollerSettings::default())
    }

    /// Start watching `instrument`
    ///
    /// Resets the state, issues one fetch immediately, then one every `interval`.
    /// Calling it while already watching restarts the watch.
    pub async fn start(&self, instrument: InstrumentKey, interval: Duration) -> Result<(), PollerError> {
        if interval.is_zero() {
            return Err(PollerError::ZeroInterval);
        }

        let mut guard = self.inner.shared.write().await;
        if guard.terminated {
            return Err(PollerError::Terminated);
        }

        tracing::info!(
            instrument = %instrument,
            interval_ms = interval.as_millis() as u64,
            "Starting signal poller"
        );

        self.inner.begin_watch(&mut guard, instrument, interval);
        drop(guard);
        self.inner.notify();

        Ok(())
    }

    /// Move the watch to another instrument, keeping the interval
    ///
    /// Anything still in flight for the old instrument is discarded when it
    /// resolves.
    pub async fn switch_instrument(&self, instrument: InstrumentKey) -> Result<(), PollerError> {
        let mut guard = self.inner.shared.write().await;
        if guard.terminated {
            return Err(PollerError::Terminated);
        }

        let old = match guard.state.as_ref() {
            Some(state) => state.instrument.clone(),
            None => return Err(PollerError::NotStarted),
        };
        let interval = guard.interval;

        tracing::info!(from = %old, to = %instrument, "Switching instrument");

        self.inner.begin_watch(&mut guard, instrument, interval);
        drop(guard);
        self.inner.notify();

        Ok(())
    }

    /// Stop polling for good
    ///
    /// No reconciliation happens after this returns. Calling it again is a no-op.
    pub async fn stop(&self) {
        let mut guard = self.inner.shared.write().await;
        if guard.terminated {
            return;
        }

        guard.terminated = true;
        guard.latest_issued = None;
        self.inner.abort_driver();

        if let Some(state) = guard.state.as_mut() {
            state.loading = false;
            state.clear_pulse();
            tracing::info!(instrument = %state.instrument, "Signal poller stopped");
        }

        drop(guard);
        self.inner.notify();
    }

    /// Current lifecycle phase
    pub async fn phase(&self) -> PollPhase {
        let shared = self.inner.shared.read().await;
        if shared.terminated {
            return PollPhase::Terminated;
        }
        shared
            .state
            .as_ref()
            .map(PollPhase::of)
            .unwrap_or(PollPhase::Idle)
    }

    /// Instrument being watched
    pub async fn instrument(&self) -> Option<InstrumentKey> {
        let shared = self.inner.shared.read().await;
        shared.state.as_ref().map(|s| s.instrument.clone())
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> Option<PollState> {
        self.inner.shared.read().await.state.clone()
    }

    /// Render-ready projection of the current state
    pub async fn view(&self) -> Option<ViewModel> {
        self.inner.shared.read().await.state.as_ref().map(project)
    }

    /// Revision counter that changes after every state write
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }
}

impl<F> Drop for Poller<F> {
    fn drop(&mut self) {
        self.inner.abort_driver();
    }
}

impl<F> Inner<F> {
    fn abort_driver(&self) {
        if let Ok(mut driver) = self.driver.lock() {
            if let Some(handle) = driver.take() {
                handle.abort();
            }
        }
    }

    fn notify(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}

impl<F: SignalFetcher + 'static> Inner<F> {
    /// Reset to a fresh watch, fire the first fetch and arm the timer
    fn begin_watch(self: &Arc<Self>, shared: &mut Shared, instrument: InstrumentKey, interval: Duration) {
        self.abort_driver();

        shared.epoch += 1;
        shared.latest_issued = None;
        shared.interval = interval;
        shared.state = Some(PollState::new(instrument));

        self.issue(shared);

        let driver = tokio::spawn(Arc::clone(self).run_timer(interval, shared.epoch));
        if let Ok(mut slot) = self.driver.lock() {
            *slot = Some(driver);
        }
    }

    /// Issue one fetch for the active instrument
    fn issue(self: &Arc<Self>, shared: &mut Shared) {
        shared.last_seq += 1;
        let seq = shared.last_seq;

        let Some(state) = shared.state.as_mut() else {
            return;
        };
        state.begin_fetch();
        let instrument = state.instrument.clone();
        shared.latest_issued = Some(seq);

        tracing::debug!(instrument = %instrument, seq, "Issuing signal fetch");

        tokio::spawn(Arc::clone(self).fetch_and_reconcile(seq, instrument));
    }

    async fn run_timer(self: Arc<Self>, interval: Duration, epoch: u64) {
        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;

            let mut guard = self.shared.write().await;
            if guard.terminated || guard.epoch != epoch {
                break;
            }
            self.issue(&mut guard);
            drop(guard);
            self.notify();
        }
    }

    async fn fetch_and_reconcile(self: Arc<Self>, seq: u64, instrument: InstrumentKey) {
        let started = Instant::now();
        let timeout = self.settings.fetch_timeout;

        let result = match tokio::time::timeout(timeout, self.fetcher.fetch(&instrument)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(timeout)),
        };

        telemetry::record_fetch(&result, started.elapsed());
        self.complete(seq, &instrument, result).await;
    }

    /// Reconcile a resolved fetch if it is still the latest issued one
    async fn complete(self: &Arc<Self>, seq: u64, instrument: &InstrumentKey, result: FetchResult) {
        let mut guard = self.shared.write().await;
        let shared = &mut *guard;

        if shared.terminated || shared.latest_issued != Some(seq) {
            tracing::debug!(instrument = %instrument, seq, "Dropping stale fetch result");
            telemetry::record_stale_drop();
            return;
        }

        let Some(state) = shared.state.as_mut() else {
            return;
        };

        if let Err(ref e) = result {
            tracing::warn!(instrument = %instrument, seq, error = %e, "Signal fetch failed");
        }

        let outcome = reconcile(state, result, Utc::now());
        telemetry::set_connected(state.connected);

        tracing::debug!(
            instrument = %instrument,
            seq,
            outcome = outcome.as_str(),
            "Reconciled fetch result"
        );

        if outcome.pulse_started() {
            shared.pulse_seq += 1;
            let pulse_seq = shared.pulse_seq;
            tokio::spawn(Arc::clone(self).expire_pulse(pulse_seq));
        }

        drop(guard);
        self.notify();
    }

    /// Lower the pulse unless a newer one was raised meanwhile
    async fn expire_pulse(self: Arc<Self>, pulse_seq: u64) {
        tokio::time::sleep(self.settings.pulse_duration).await;

        let mut guard = self.shared.write().await;
        if guard.terminated || guard.pulse_seq != pulse_seq {
            return;
        }
        if let Some(state) = guard.state.as_mut() {
            state.clear_pulse();
        }
        drop(guard);
        self.notify();
    }
}
