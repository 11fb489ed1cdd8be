//! Fetch and connectivity metrics

use crate::fetch::FetchResult;
use std::time::Duration;

const FETCH_TOTAL: &str = "signaldash_fetch_total";
const FETCH_LATENCY_MS: &str = "signaldash_fetch_latency_ms";
const STALE_DROPPED_TOTAL: &str = "signaldash_stale_results_dropped_total";
const CONNECTED: &str = "signaldash_connected";

/// Record the outcome and latency of one fetch
pub fn record_fetch(result: &FetchResult, latency: Duration) {
    let outcome = match result {
        Ok(Some(_)) => "signal",
        Ok(None) => "empty",
        Err(e) => e.kind(),
    };

    metrics::counter!(FETCH_TOTAL, "outcome" => outcome).increment(1);
    metrics::histogram!(FETCH_LATENCY_MS).record(latency.as_secs_f64() * 1000.0);
}

/// Count a fetch result discarded because a newer fetch superseded it
pub fn record_stale_drop() {
    metrics::counter!(STALE_DROPPED_TOTAL).increment(1);
}

/// Publish the connectivity flag
pub fn set_connected(connected: bool) {
    metrics::gauge!(CONNECTED).set(if connected { 1.0 } else { 0.0 });
}
