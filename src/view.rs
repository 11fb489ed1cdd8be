//! Read-only projection of poll state for renderers

use crate::poller::PollState;
use crate::signal::{InstrumentKey, Signal};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Label shown while the last fetch succeeded
pub const LIVE_LABEL: &str = "Live";
/// Label shown while the last fetch failed
pub const OFFLINE_LABEL: &str = "Offline";

/// Everything a renderer needs to draw the dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewModel {
    pub instrument: InstrumentKey,
    pub connected: bool,
    pub connected_label: &'static str,
    /// Spinner state: loading and nothing has ever been shown
    pub is_loading_first_time: bool,
    pub display_signal: Option<Signal>,
    /// Strike movement since the previous signal, if it moved
    pub strike_delta: Option<f64>,
    pub pulse_active: bool,
    pub last_update: Option<DateTime<Utc>>,
}

/// Project poll state into a view model
pub fn project(state: &PollState) -> ViewModel {
    ViewModel {
        instrument: state.instrument.clone(),
        connected: state.connected,
        connected_label: if state.connected {
            LIVE_LABEL
        } else {
            OFFLINE_LABEL
        },
        is_loading_first_time: state.loading && !state.received_signal,
        display_signal: state.current.clone(),
        strike_delta: strike_delta(state.current.as_ref(), state.previous.as_ref()),
        pulse_active: state.changed_pulse_active,
        last_update: state.last_update,
    }
}

fn strike_delta(current: Option<&Signal>, previous: Option<&Signal>) -> Option<f64> {
    let (current, previous) = (current?, previous?);
    if current.instrument != previous.instrument {
        return None;
    }

    let diff = current.strike()? - previous.strike()?;
    (diff != 0.0).then_some(diff)
}
