//! Client configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use sonic_pool::PoolConfig;

/// Callback receiving every line sent or received by a channel.
pub type LineObserver = Arc<dyn Fn(&str) + Send + Sync>;

/// Configuration for connecting to a Sonic server.
#[derive(Clone)]
pub struct Config {
    /// Server address as `host:port` (default: `localhost:1491`).
    pub addr: String,

    /// Channel password (default: `SecretPassword`).
    pub password: String,

    /// Maximum number of pooled channels (default: 1).
    pub pool_size: u32,

    /// How long an operation waits for a free channel (default: 30s).
    pub pool_timeout: Duration,

    /// TCP connect timeout (default: 10s).
    pub connect_timeout: Duration,

    /// Longest accepted response line in bytes, unlimited if `None`.
    pub max_line_length: Option<usize>,

    /// Diagnostic callback for every line sent or received.
    pub observer: Option<LineObserver>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            addr: "localhost:1491".to_string(),
            password: "SecretPassword".to_string(),
            pool_size: 1,
            pool_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_line_length: None,
            observer: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the server address.
    #[must_use]
    pub fn addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    /// Set the channel password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    /// Set the maximum number of pooled channels.
    #[must_use]
    pub fn pool_size(mut self, size: u32) -> Self {
        self.pool_size = size;
        self
    }

    /// Set the pool acquire timeout.
    #[must_use]
    pub fn pool_timeout(mut self, timeout: Duration) -> Self {
        self.pool_timeout = timeout;
        self
    }

    /// Set the connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Limit the length of response lines.
    #[must_use]
    pub fn max_line_length(mut self, max: usize) -> Self {
        self.max_line_length = Some(max);
        self
    }

    /// Install a line observer.
    #[must_use]
    pub fn observer(mut self, observer: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Derive the pool configuration.
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new()
            .max_channels(self.pool_size)
            .acquire_timeout(self.pool_timeout)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("addr", &self.addr)
            .field("password", &"<redacted>")
            .field("pool_size", &self.pool_size)
            .field("pool_timeout", &self.pool_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_line_length", &self.max_line_length)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
