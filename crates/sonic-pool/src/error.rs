//! Pool error types.

use std::time::Duration;

use thiserror::Error;

/// Failures originating in the pool itself.
///
/// These are converted into the channel's error type before reaching the
/// caller, see [`ChannelError`](crate::ChannelError).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PoolError {
    /// No channel became available within the acquire timeout.
    #[error("timed out after {0:?} waiting for an available channel")]
    Timeout(Duration),

    /// The pool has been closed.
    #[error("pool is closed")]
    Closed,
}

impl PoolError {
    /// Check if this is an acquisition timeout.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
