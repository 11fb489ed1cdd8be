//! Polling and reconciliation
//!
//! Keeps the latest signal for the watched instrument fresh:
//! - `runner` owns the timer, issues fetches and guards against stale results
//! - `reconcile` folds a completed fetch into the state
//! - `state` holds what the dashboard currently knows

mod reconcile;
mod runner;
mod state;

pub use reconcile::{reconcile, ReconcileOutcome};
pub use runner::{Poller, PollerError, PollerSettings, DEFAULT_FETCH_TIMEOUT, DEFAULT_PULSE};
pub use state::{PollPhase, PollState};
