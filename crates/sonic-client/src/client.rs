//! Pooled client.

use std::fmt;

use async_trait::async_trait;
use futures_util::future::BoxFuture;
use sonic_pool::{ChannelFactory, Pool, PoolMetrics, PoolStatus};
use sonic_protocol::{ChannelMode, PING_COMMAND};

use crate::channel::Channel;
use crate::config::Config;
use crate::dial::{Dialer, TcpDialer};
use crate::error::Result;

/// Channel factory that dials and starts a channel in a fixed mode.
#[derive(Debug, Clone)]
pub struct ChannelConnector<D: Dialer = TcpDialer> {
    dialer: D,
    mode: ChannelMode,
    config: Config,
}

impl<D: Dialer> ChannelConnector<D> {
    /// Create a connector.
    pub fn new(dialer: D, mode: ChannelMode, config: Config) -> Self {
        Self {
            dialer,
            mode,
            config,
        }
    }
}

#[async_trait]
impl<D: Dialer> ChannelFactory for ChannelConnector<D> {
    type Channel = Channel<D::Stream>;

    async fn create(&self) -> Result<Channel<D::Stream>> {
        Channel::connect(&self.dialer, self.mode, &self.config).await
    }
}

/// A pooled client for one channel mode.
///
/// Connections are opened lazily on the first operation and reused until
/// the server ends them or the client is closed. Cloning a client shares
/// its pool.
///
/// # Example
///
/// ```rust,ignore
/// use sonic_client::{Client, Config};
///
/// let client = Client::search(Config::new().addr("localhost:1491").pool_size(4));
/// client.ping().await?;
///
/// let reply = client
///     .query(|channel| {
///         Box::pin(async move {
///             channel.write("QUERY messages user:1 \"hello\"").await?;
///             channel.read().await
///         })
///     })
///     .await?;
/// ```
pub struct Client<D: Dialer = TcpDialer> {
    pool: Pool<ChannelConnector<D>>,
}

impl Client<TcpDialer> {
    /// Create a client dialing TCP.
    #[must_use]
    pub fn new(mode: ChannelMode, config: Config) -> Self {
        let dialer = TcpDialer::new(config.connect_timeout);
        Self::with_dialer(mode, config, dialer)
    }

    /// Create a search mode client.
    #[must_use]
    pub fn search(config: Config) -> Self {
        Self::new(ChannelMode::Search, config)
    }

    /// Create an ingest mode client.
    #[must_use]
    pub fn ingest(config: Config) -> Self {
        Self::new(ChannelMode::Ingest, config)
    }

    /// Create a control mode client.
    #[must_use]
    pub fn control(config: Config) -> Self {
        Self::new(ChannelMode::Control, config)
    }
}

impl<D: Dialer> Client<D> {
    /// Create a client opening its connections through `dialer`.
    pub fn with_dialer(mode: ChannelMode, config: Config, dialer: D) -> Self {
        let pool_config = config.pool_config();
        Self {
            pool: Pool::new(ChannelConnector::new(dialer, mode, config), pool_config),
        }
    }

    /// Run `op` on a pooled channel.
    ///
    /// See [`Pool::query`] for how the channel is handled afterwards.
    pub async fn exec<Op>(&self, op: Op) -> Result<()>
    where
        Op: for<'c> FnOnce(&'c mut Channel<D::Stream>) -> BoxFuture<'c, Result<()>> + Send,
    {
        self.pool.exec(op).await
    }

    /// Run `op` on a pooled channel and return its result.
    pub async fn query<T, Op>(&self, op: Op) -> Result<T>
    where
        Op: for<'c> FnOnce(&'c mut Channel<D::Stream>) -> BoxFuture<'c, Result<T>> + Send,
        T: Send,
    {
        self.pool.query(op).await
    }

    /// Check that the server answers.
    pub async fn ping(&self) -> Result<()> {
        self.exec(|channel| {
            Box::pin(async move {
                channel.write(PING_COMMAND).await?;
                channel.read().await?;
                Ok(())
            })
        })
        .await
    }

    /// Close the client and every idle connection.
    pub async fn close(&self) -> Result<()> {
        self.pool.close().await
    }

    /// Get the channel mode.
    #[must_use]
    pub fn mode(&self) -> ChannelMode {
        self.pool.factory().mode
    }

    /// Get the client configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.pool.factory().config
    }

    /// Get the pool status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        self.pool.status()
    }

    /// Get pool metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        self.pool.metrics()
    }

    /// Get the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<ChannelConnector<D>> {
        &self.pool
    }
}

impl<D: Dialer> Clone for Client<D> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
        }
    }
}

impl<D: Dialer> fmt::Debug for Client<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("mode", &self.mode())
            .field("addr", &self.config().addr)
            .field("status", &self.status())
            .finish()
    }
}
