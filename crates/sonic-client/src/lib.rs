//! # sonic-client
//!
//! Async pooled client for the Sonic search backend.
//!
//! A [`Client`] owns a bounded pool of [`Channel`]s, each one a TCP
//! connection that has completed the `START` handshake in a given
//! [`ChannelMode`]. Operations borrow a channel for their duration, write
//! command lines and read the replies.
//!
//! ## Error policy
//!
//! `ERR` replies surface as [`Error::Protocol`] and leave the connection in
//! the pool. Only the end of the stream (see [`Error::is_end_of_stream`])
//! evicts a connection; the next operation opens a fresh one.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sonic_client::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> sonic_client::Result<()> {
//!     let client = Client::ingest(
//!         Config::new()
//!             .addr("localhost:1491")
//!             .password("SecretPassword")
//!             .pool_size(2),
//!     );
//!
//!     client
//!         .exec(|channel| {
//!             Box::pin(async move {
//!                 let text = "some long text";
//!                 for chunk in channel.split(text) {
//!                     let line = format!("PUSH messages user:1 obj:1 \"{}\"", channel.escape(chunk));
//!                     channel.write(&line).await?;
//!                     channel.read().await?;
//!                 }
//!                 Ok(())
//!             })
//!         })
//!         .await?;
//!
//!     client.close().await
//! }
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod channel;
pub mod client;
pub mod config;
pub mod dial;
pub mod error;

pub use channel::Channel;
pub use client::{ChannelConnector, Client};
pub use config::{Config, LineObserver};
pub use dial::{Dialer, TcpDialer};
pub use error::{Error, Result};

pub use sonic_codec::CodecError;
pub use sonic_pool::{PoolError, PoolMetrics, PoolStatus};
pub use sonic_protocol::{ChannelMode, ProtocolError};
