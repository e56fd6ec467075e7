//! Pool configuration.

use std::time::Duration;

/// Default acquire timeout.
pub const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for a channel pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Maximum number of channels alive at once (default: 1).
    ///
    /// Zero is treated as 1.
    pub max_channels: u32,

    /// How long an operation waits for an idle channel (default: 30s).
    ///
    /// A zero duration is treated as the default.
    pub acquire_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_channels: 1,
            acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
        }
    }
}

impl PoolConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of channels.
    #[must_use]
    pub fn max_channels(mut self, count: u32) -> Self {
        self.max_channels = count;
        self
    }

    /// Set the acquire timeout.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Replace out-of-range values with their defaults.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            max_channels: self.max_channels.max(1),
            acquire_timeout: if self.acquire_timeout.is_zero() {
                DEFAULT_ACQUIRE_TIMEOUT
            } else {
                self.acquire_timeout
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PoolConfig::new();
        assert_eq!(config.max_channels, 1);
        assert_eq!(config.acquire_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_normalized() {
        let config = PoolConfig::new()
            .max_channels(0)
            .acquire_timeout(Duration::ZERO)
            .normalized();
        assert_eq!(config, PoolConfig::default());

        let config = PoolConfig::new()
            .max_channels(8)
            .acquire_timeout(Duration::from_millis(250))
            .normalized();
        assert_eq!(config.max_channels, 8);
        assert_eq!(config.acquire_timeout, Duration::from_millis(250));
    }
}
