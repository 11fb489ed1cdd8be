//! Signal fetching
//!
//! One network round-trip per call. An empty answer from the service is a
//! successful `Ok(None)`; only transport-level problems are errors.

mod error;
mod http;

pub use error::FetchError;
pub use http::{HttpFetcher, HttpFetcherConfig, ServiceHealth, DEFAULT_BASE_URL};

use crate::signal::{InstrumentKey, Signal};
use async_trait::async_trait;

/// Result of a single fetch: the latest signal, no signal, or a failure
pub type FetchResult = Result<Option<Signal>, FetchError>;

/// Trait for signal sources polled by the [`Poller`](crate::poller::Poller)
#[async_trait]
pub trait SignalFetcher: Send + Sync {
    /// Fetch the current signal for an instrument
    async fn fetch(&self, instrument: &InstrumentKey) -> FetchResult;
}
