//! Channel pool implementation.
//!
//! Capacity is tracked by a semaphore holding one permit per channel that may
//! still be handed out: idle channels plus room to create new ones. A caller
//! first takes a permit (waiting up to the acquire timeout), then reuses an
//! idle channel if there is one and only otherwise asks the factory for a new
//! one. Returning or evicting a channel gives the permit back.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::lifecycle::{ChannelError, ChannelFactory, ErrorOf, PooledChannel};

/// A bounded pool of protocol channels.
///
/// Cloning a pool is cheap and yields a handle to the same channels.
///
/// # Example
///
/// ```rust,ignore
/// let pool = Pool::new(factory, PoolConfig::new().max_channels(2));
///
/// pool.exec(|channel| {
///     Box::pin(async move {
///         channel.write("PING").await?;
///         channel.read().await?;
///         Ok(())
///     })
/// })
/// .await?;
/// ```
pub struct Pool<F: ChannelFactory> {
    inner: Arc<PoolInner<F>>,
}

struct PoolInner<F: ChannelFactory> {
    /// Produces new channels on demand.
    factory: F,

    /// Normalized pool configuration.
    config: PoolConfig,

    /// Idle channels and creation bookkeeping.
    state: Mutex<PoolState<F::Channel>>,

    /// One permit per channel that can still be checked out.
    available: Semaphore,

    /// When the pool was created.
    created_at: Instant,

    /// Pool metrics.
    metrics: Mutex<PoolMetricsInner>,
}

struct PoolState<C> {
    idle: VecDeque<C>,
    /// Channels alive, idle or checked out.
    created: u32,
    closed: bool,
}

/// Internal metrics tracking.
#[derive(Debug, Default)]
struct PoolMetricsInner {
    connections_created: u64,
    connections_closed: u64,
    checkouts_successful: u64,
    checkouts_failed: u64,
    evictions: u64,
}

impl<F: ChannelFactory> Pool<F> {
    /// Create a pool around `factory`.
    ///
    /// Out-of-range configuration values are normalized, see
    /// [`PoolConfig::normalized`]. No channel is created until the first
    /// operation runs.
    pub fn new(factory: F, config: PoolConfig) -> Self {
        let config = config.normalized();

        tracing::info!(
            max = config.max_channels,
            acquire_timeout = ?config.acquire_timeout,
            "channel pool created"
        );

        let inner = Arc::new(PoolInner {
            factory,
            available: Semaphore::new(config.max_channels as usize),
            state: Mutex::new(PoolState {
                idle: VecDeque::with_capacity(config.max_channels as usize),
                created: 0,
                closed: false,
            }),
            config,
            created_at: Instant::now(),
            metrics: Mutex::new(PoolMetricsInner::default()),
        });

        Self { inner }
    }

    /// Run `op` against a pooled channel and return its result.
    ///
    /// The channel goes back to the pool afterwards unless `op` failed with
    /// an end-of-stream error, in which case it is closed and evicted. Any
    /// other error, `ERR` replies included, is returned as is and the channel
    /// stays in the pool.
    ///
    /// Fails with [`PoolError::Timeout`] if no channel becomes available in
    /// time, and returns factory errors unchanged.
    pub async fn query<T, Op>(&self, op: Op) -> Result<T, ErrorOf<F>>
    where
        Op: for<'c> FnOnce(&'c mut F::Channel) -> BoxFuture<'c, Result<T, ErrorOf<F>>> + Send,
        T: Send,
    {
        let (mut channel, slot) = self.checkout().await?;

        let result = op(&mut channel).await;

        let fatal = matches!(&result, Err(err) if err.is_end_of_stream());
        if fatal {
            self.retire(channel, slot, true).await;
        } else {
            self.restore(channel, slot).await;
        }

        result
    }

    /// Run `op` against a pooled channel.
    ///
    /// Same contract as [`query`](Self::query) without a result value.
    pub async fn exec<Op>(&self, op: Op) -> Result<(), ErrorOf<F>>
    where
        Op: for<'c> FnOnce(&'c mut F::Channel) -> BoxFuture<'c, Result<(), ErrorOf<F>>> + Send,
    {
        self.query(op).await
    }

    /// Close the pool and every idle channel.
    ///
    /// Waiting callers fail with [`PoolError::Closed`], as do later
    /// operations. Channels still checked out are closed when their operation
    /// ends. Every idle channel is closed even if some fail; the first error
    /// is returned and the rest are logged.
    pub async fn close(&self) -> Result<(), ErrorOf<F>> {
        let drained: Vec<F::Channel> = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            self.inner.available.close();

            let drained: Vec<_> = state.idle.drain(..).collect();
            state.created = state.created.saturating_sub(drained.len() as u32);
            drained
        };

        let count = drained.len();
        let mut first_error = None;
        for channel in drained {
            self.inner.metrics.lock().connections_closed += 1;
            if let Err(err) = channel.close().await {
                if first_error.is_none() {
                    first_error = Some(err);
                } else {
                    tracing::warn!(error = %err, "failed to close channel");
                }
            }
        }

        tracing::info!(closed = count, "channel pool closed");

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Check if the pool is closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.state.lock().closed
    }

    /// Get the current pool status.
    #[must_use]
    pub fn status(&self) -> PoolStatus {
        let state = self.inner.state.lock();
        let available = state.idle.len() as u32;
        PoolStatus {
            available,
            in_use: state.created.saturating_sub(available),
            total: state.created,
            max: self.inner.config.max_channels,
        }
    }

    /// Get pool metrics.
    #[must_use]
    pub fn metrics(&self) -> PoolMetrics {
        let inner = self.inner.metrics.lock();
        PoolMetrics {
            connections_created: inner.connections_created,
            connections_closed: inner.connections_closed,
            checkouts_successful: inner.checkouts_successful,
            checkouts_failed: inner.checkouts_failed,
            evictions: inner.evictions,
            uptime: self.inner.created_at.elapsed(),
        }
    }

    /// Get the pool configuration.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }

    /// Get the channel factory.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.inner.factory
    }

    async fn checkout(&self) -> Result<(F::Channel, Slot<'_, F>), ErrorOf<F>> {
        tracing::trace!("acquiring channel from pool");

        let result = self.try_checkout().await;
        let mut metrics = self.inner.metrics.lock();
        match result {
            Ok(_) => metrics.checkouts_successful += 1,
            Err(_) => metrics.checkouts_failed += 1,
        }
        result
    }

    async fn try_checkout(&self) -> Result<(F::Channel, Slot<'_, F>), ErrorOf<F>> {
        let timeout = self.inner.config.acquire_timeout;
        match tokio::time::timeout(timeout, self.inner.available.acquire()).await {
            Ok(Ok(permit)) => permit.forget(),
            Ok(Err(_)) => return Err(PoolError::Closed.into()),
            Err(_) => {
                tracing::debug!(timeout = ?timeout, "timed out waiting for a channel");
                return Err(PoolError::Timeout(timeout).into());
            }
        }

        // From here on the permit is owned by the slot.
        let mut slot = Slot {
            pool: &self.inner,
            holds_channel: false,
        };

        let idle = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Err(PoolError::Closed.into());
            }
            state.idle.pop_front()
        };
        if let Some(channel) = idle {
            slot.holds_channel = true;
            return Ok((channel, slot));
        }

        let channel = self.inner.factory.create().await?;

        let created = {
            let mut state = self.inner.state.lock();
            if state.closed {
                None
            } else {
                state.created += 1;
                Some(state.created)
            }
        };
        let Some(total) = created else {
            if let Err(err) = channel.close().await {
                tracing::warn!(error = %err, "failed to close channel created after pool close");
            }
            return Err(PoolError::Closed.into());
        };

        self.inner.metrics.lock().connections_created += 1;
        tracing::debug!(
            total = total,
            max = self.inner.config.max_channels,
            "channel created"
        );

        slot.holds_channel = true;
        Ok((channel, slot))
    }

    async fn restore(&self, channel: F::Channel, mut slot: Slot<'_, F>) {
        let rejected = {
            let mut state = self.inner.state.lock();
            if state.closed {
                Some(channel)
            } else {
                state.idle.push_back(channel);
                slot.holds_channel = false;
                None
            }
        };

        if let Some(channel) = rejected {
            self.retire(channel, slot, false).await;
        }
    }

    async fn retire(&self, channel: F::Channel, slot: Slot<'_, F>, evicted: bool) {
        if let Err(err) = channel.close().await {
            if evicted {
                tracing::debug!(error = %err, "error while closing evicted channel");
            } else {
                tracing::warn!(error = %err, "failed to close channel returned after pool close");
            }
        }

        if evicted {
            self.inner.metrics.lock().evictions += 1;
            tracing::debug!("evicted channel after end of stream");
        }

        drop(slot);
    }
}

impl<F: ChannelFactory> Clone for Pool<F> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<F: ChannelFactory> std::fmt::Debug for Pool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pool")
            .field("config", &self.inner.config)
            .field("status", &self.status())
            .finish()
    }
}

/// One unit of capacity held by a caller.
///
/// Dropping the slot hands its permit back. If it still holds a channel at
/// that point, the channel is gone (closed, evicted or dropped by a cancelled
/// operation) and the created count goes down with it.
struct Slot<'a, F: ChannelFactory> {
    pool: &'a PoolInner<F>,
    holds_channel: bool,
}

impl<F: ChannelFactory> Drop for Slot<'_, F> {
    fn drop(&mut self) {
        if self.holds_channel {
            let mut state = self.pool.state.lock();
            state.created = state.created.saturating_sub(1);
            self.pool.metrics.lock().connections_closed += 1;
        }
        self.pool.available.add_permits(1);
    }
}

/// Builder for creating a channel pool.
///
/// # Example
///
/// ```rust,ignore
/// let pool = PoolBuilder::new()
///     .max_channels(4)
///     .acquire_timeout(Duration::from_secs(5))
///     .build(factory);
/// ```
#[derive(Debug, Clone, Default)]
pub struct PoolBuilder {
    pool_config: PoolConfig,
}

impl PoolBuilder {
    /// Create a new pool builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the pool configuration.
    #[must_use]
    pub fn pool_config(mut self, config: PoolConfig) -> Self {
        self.pool_config = config;
        self
    }

    /// Set the maximum number of channels.
    #[must_use]
    pub fn max_channels(mut self, count: u32) -> Self {
        self.pool_config.max_channels = count;
        self
    }

    /// Set the acquire timeout.
    #[must_use]
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.pool_config.acquire_timeout = timeout;
        self
    }

    /// Build the pool.
    pub fn build<F: ChannelFactory>(self, factory: F) -> Pool<F> {
        Pool::new(factory, self.pool_config)
    }
}

/// Status information about the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStatus {
    /// Number of idle channels available.
    pub available: u32,
    /// Number of channels currently in use.
    pub in_use: u32,
    /// Total number of channels alive.
    pub total: u32,
    /// Maximum allowed channels.
    pub max: u32,
}

impl PoolStatus {
    /// Calculate the utilization percentage.
    #[must_use]
    pub fn utilization(&self) -> f64 {
        if self.max == 0 {
            return 0.0;
        }
        (self.in_use as f64 / self.max as f64) * 100.0
    }

    /// Check if the pool is at capacity.
    #[must_use]
    pub fn is_at_capacity(&self) -> bool {
        self.total >= self.max
    }
}

/// Metrics collected from the pool.
#[derive(Debug, Clone)]
pub struct PoolMetrics {
    /// Total channels created since pool start.
    pub connections_created: u64,
    /// Total channels closed since pool start.
    pub connections_closed: u64,
    /// Successful channel checkouts.
    pub checkouts_successful: u64,
    /// Failed channel checkouts (timeouts, factory errors, pool closed).
    pub checkouts_failed: u64,
    /// Channels evicted after an end-of-stream error.
    pub evictions: u64,
    /// Time since pool creation.
    pub uptime: Duration,
}

impl PoolMetrics {
    /// Calculate checkout success rate (0.0 to 1.0).
    #[must_use]
    pub fn checkout_success_rate(&self) -> f64 {
        let total = self.checkouts_successful + self.checkouts_failed;
        if total == 0 {
            return 1.0;
        }
        self.checkouts_successful as f64 / total as f64
    }
}
