//! Folding fetch results into poll state

use super::PollState;
use crate::fetch::FetchResult;
use chrono::{DateTime, Utc};

/// What a reconciliation did to the state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Fetch failed; the last known signal stays on screen
    Disconnected,
    /// Service reported no signal
    Cleared,
    /// A signal arrived and the pulse was raised
    Refreshed,
}

impl ReconcileOutcome {
    /// Whether the caller must arm the pulse expiry timer
    pub fn pulse_started(self) -> bool {
        matches!(self, ReconcileOutcome::Refreshed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReconcileOutcome::Disconnected => "disconnected",
            ReconcileOutcome::Cleared => "cleared",
            ReconcileOutcome::Refreshed => "refreshed",
        }
    }
}

/// Apply a completed fetch to the state
///
/// The pulse fires on every non-empty arrival, identical signals included.
/// Errors only touch `connected` and `loading`.
pub fn reconcile(state: &mut PollState, result: FetchResult, now: DateTime<Utc>) -> ReconcileOutcome {
    state.loading = false;

    match result {
        Err(_) => {
            state.connected = false;
            ReconcileOutcome::Disconnected
        }
        Ok(None) => {
            state.connected = true;
            state.previous = state.current.take();
            state.changed_pulse_active = false;
            state.last_update = Some(now);
            ReconcileOutcome::Cleared
        }
        Ok(Some(signal)) => {
            state.connected = true;
            state.previous = state.current.replace(signal);
            state.changed_pulse_active = true;
            state.received_signal = true;
            state.last_update = Some(now);
            ReconcileOutcome::Refreshed
        }
    }
}
