//! Poll state and lifecycle phases

use crate::signal::{InstrumentKey, Signal};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// State held for the instrument currently being watched
///
/// Only the poller writes to it: the reconciler on a completed fetch, and the
/// poller itself when it issues a fetch, resets on a switch, or stops.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PollState {
    pub instrument: InstrumentKey,
    pub current: Option<Signal>,
    pub previous: Option<Signal>,
    pub connected: bool,
    pub loading: bool,
    pub last_update: Option<DateTime<Utc>>,
    pub changed_pulse_active: bool,
    /// Whether any signal has arrived since watching began
    pub received_signal: bool,
}

impl PollState {
    /// Initial empty-but-loading state for a fresh watch
    pub fn new(instrument: InstrumentKey) -> Self {
        Self {
            instrument,
            current: None,
            previous: None,
            connected: false,
            loading: true,
            last_update: None,
            changed_pulse_active: false,
            received_signal: false,
        }
    }

    pub(crate) fn begin_fetch(&mut self) {
        self.loading = true;
    }

    pub(crate) fn clear_pulse(&mut self) {
        self.changed_pulse_active = false;
    }
}

/// Lifecycle phase of the poller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PollPhase {
    /// Not polling anything
    Idle,
    /// A fetch is outstanding
    Loading,
    /// Last fetch succeeded
    Connected,
    /// Last fetch failed
    Disconnected,
    /// Stopped for good
    Terminated,
}

impl PollPhase {
    /// Phase of an active watch, derived from its state
    pub fn of(state: &PollState) -> Self {
        if state.loading {
            PollPhase::Loading
        } else if state.connected {
            PollPhase::Connected
        } else {
            PollPhase::Disconnected
        }
    }
}

impl fmt::Display for PollPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollPhase::Idle => write!(f, "idle"),
            PollPhase::Loading => write!(f, "loading"),
            PollPhase::Connected => write!(f, "connected"),
            PollPhase::Disconnected => write!(f, "disconnected"),
            PollPhase::Terminated => write!(f, "terminated"),
        }
    }
}
