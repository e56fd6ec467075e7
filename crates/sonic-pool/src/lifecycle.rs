//! Channel capabilities the pool relies on.
//!
//! The pool never names a concrete transport. It only needs to create a
//! channel, hand it to operations, tell fatal errors apart from ordinary
//! ones, and close the channel when it is evicted or the pool shuts down.

use async_trait::async_trait;
use sonic_protocol::TextChunks;

use crate::error::PoolError;

/// Error type of a pooled channel.
///
/// Pool failures are folded into it through `From<PoolError>`, so pool
/// operations return a single error type.
pub trait ChannelError: std::error::Error + From<PoolError> + Send + Sync + 'static {
    /// Whether the error means the transport stream has ended.
    ///
    /// Returning `true` makes the pool evict the channel that produced it.
    fn is_end_of_stream(&self) -> bool;
}

/// A line-oriented channel that can be pooled.
#[async_trait]
pub trait PooledChannel: Send + 'static {
    /// Error returned by channel operations.
    type Error: ChannelError;

    /// Send one line.
    async fn write(&mut self, line: &str) -> Result<(), Self::Error>;

    /// Receive one line.
    async fn read(&mut self) -> Result<String, Self::Error>;

    /// Cut text into chunks that fit one command.
    fn split<'a>(&self, text: &'a str) -> TextChunks<'a>;

    /// Close the channel, releasing its transport.
    async fn close(self) -> Result<(), Self::Error>
    where
        Self: Sized;
}

/// Produces ready channels on demand.
#[async_trait]
pub trait ChannelFactory: Send + Sync + 'static {
    /// Channel type produced.
    type Channel: PooledChannel;

    /// Open and initialize a new channel.
    async fn create(&self) -> Result<Self::Channel, <Self::Channel as PooledChannel>::Error>;
}

/// Error type of the channels produced by factory `F`.
pub type ErrorOf<F> = <<F as ChannelFactory>::Channel as PooledChannel>::Error;
