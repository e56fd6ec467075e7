//! # sonic-pool
//!
//! Bounded pool of protocol channels with lazy creation, timeout-bounded
//! acquisition and eviction of dead channels.
//!
//! The pool is generic over a [`ChannelFactory`]. It never opens connections
//! itself; it asks the factory for a new channel only when no channel is idle
//! and fewer than `max_channels` exist. Callers beyond capacity wait, up to
//! the acquire timeout, for another caller to hand a channel back.
//!
//! A channel is evicted only when an operation fails with an end-of-stream
//! error (see [`ChannelError::is_end_of_stream`]). Every other error,
//! including `ERR` replies from the server, leaves the channel in the pool.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sonic_pool::{PoolBuilder, PooledChannel};
//!
//! let pool = PoolBuilder::new()
//!     .max_channels(4)
//!     .acquire_timeout(Duration::from_secs(5))
//!     .build(factory);
//!
//! let reply = pool
//!     .query(|channel| {
//!         Box::pin(async move {
//!             channel.write("PING").await?;
//!             channel.read().await
//!         })
//!     })
//!     .await?;
//!
//! pool.close().await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod pool;

// Configuration
pub use config::PoolConfig;

// Error types
pub use error::PoolError;

// Pool types
pub use pool::{Pool, PoolBuilder, PoolMetrics, PoolStatus};

// Channel capabilities
pub use lifecycle::{ChannelError, ChannelFactory, ErrorOf, PooledChannel};
