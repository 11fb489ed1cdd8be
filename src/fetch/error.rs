use std::time::Duration;
use thiserror::Error;

/// Why a fetch failed
///
/// Every variant is transient: the poller reports disconnected and tries again
/// on its next tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Network unreachable, connection reset, or similar
    #[error("transport error: {0}")]
    Transport(String),

    /// Service answered with a non-2xx status
    #[error("unexpected status {0}")]
    Status(u16),

    /// Body did not match the signal shape
    #[error("malformed response: {0}")]
    Malformed(String),

    /// No answer within the bound
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl FetchError {
    /// Short label used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status(_) => "status",
            FetchError::Malformed(_) => "malformed",
            FetchError::Timeout(_) => "timeout",
        }
    }
}
