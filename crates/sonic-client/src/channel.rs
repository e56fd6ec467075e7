//! A single Sonic channel.
//!
//! A channel owns one connection that has completed the `START` handshake.
//! It reads and writes protocol lines, translates `ERR` replies into
//! [`ProtocolError::Server`](sonic_protocol::ProtocolError::Server) and knows
//! how much text fits in one command.

use std::borrow::Cow;
use std::fmt;

use async_trait::async_trait;
use sonic_codec::{LineCodec, LineStream};
use sonic_pool::PooledChannel;
use sonic_protocol::{
    ChannelMode, QUIT_COMMAND, TextChunks, parse_buffer_size, parse_line, rune_budget,
    start_command,
};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::config::{Config, LineObserver};
use crate::dial::Dialer;
use crate::error::{Error, Result, transport};

/// A started protocol channel over stream `S`.
pub struct Channel<S> {
    stream: LineStream<S>,
    mode: ChannelMode,
    buffer_size: usize,
    max_runes: usize,
    observer: Option<LineObserver>,
}

impl<S> Channel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Dial `config.addr` and start a channel in `mode`.
    ///
    /// Dial errors are returned as produced by the dialer. If the handshake
    /// fails the connection is shut down before the error is returned.
    pub async fn connect<D>(dialer: &D, mode: ChannelMode, config: &Config) -> Result<Self>
    where
        D: Dialer<Stream = S>,
    {
        let transport = dialer.dial(&config.addr).await?;

        let codec = match config.max_line_length {
            Some(max) => LineCodec::with_max_length(max),
            None => LineCodec::new(),
        };

        Self::handshake(
            LineStream::with_codec(transport, codec),
            mode,
            &config.password,
            config.observer.clone(),
        )
        .await
    }

    /// Run the `START` handshake over an already open stream.
    pub async fn handshake(
        stream: LineStream<S>,
        mode: ChannelMode,
        password: &str,
        observer: Option<LineObserver>,
    ) -> Result<Self> {
        let mut channel = Self {
            stream,
            mode,
            buffer_size: 0,
            max_runes: 0,
            observer,
        };

        match channel.start(password).await {
            Ok(()) => {
                tracing::debug!(
                    mode = %mode,
                    buffer_size = channel.buffer_size,
                    max_runes = channel.max_runes,
                    "channel started"
                );
                Ok(channel)
            }
            Err(err) => {
                if let Err(shutdown_err) = channel.stream.shutdown().await {
                    tracing::debug!(error = %shutdown_err, "shutdown after failed handshake");
                }
                Err(err)
            }
        }
    }

    async fn start(&mut self, password: &str) -> Result<()> {
        self.write(&start_command(self.mode, password)).await?;

        // CONNECTED <banner>
        self.read().await?;

        let started = self.read().await?;
        self.buffer_size = parse_buffer_size(&started)?;
        self.max_runes = rune_budget(self.buffer_size);
        Ok(())
    }

    /// Send one line.
    pub async fn write(&mut self, line: &str) -> Result<()> {
        self.observe(line);
        tracing::trace!(line = line, "sending line");
        self.stream.send_line(line).await.map_err(transport)
    }

    /// Read one line.
    ///
    /// An `ERR <reason>` line is returned as a protocol error carrying the
    /// reason; any other line is returned trimmed.
    pub async fn read(&mut self) -> Result<String> {
        let line = self.stream.next_line().await.map_err(transport)?;
        tracing::trace!(line = %line, "received line");

        let reply = parse_line(&line)?;
        self.observe(reply);
        Ok(reply.to_owned())
    }

    /// Cut `text` into chunks that fit one command on this channel.
    pub fn split<'a>(&self, text: &'a str) -> TextChunks<'a> {
        sonic_protocol::split(text, self.max_runes)
    }

    /// Escape `text` for use inside a quoted command argument.
    pub fn escape<'a>(&self, text: &'a str) -> Cow<'a, str> {
        sonic_protocol::escape(text)
    }

    /// Send `QUIT`, wait for the acknowledgement and close the connection.
    ///
    /// The connection is closed even if the quit exchange fails; that error
    /// is returned afterwards.
    pub async fn close(mut self) -> Result<()> {
        let result = self.quit().await;

        if let Err(err) = self.stream.shutdown().await {
            tracing::debug!(error = %err, "shutdown while closing channel");
        }

        result
    }

    async fn quit(&mut self) -> Result<()> {
        self.write(QUIT_COMMAND).await?;
        self.read().await?;
        Ok(())
    }

    /// Get the channel mode.
    #[must_use]
    pub fn mode(&self) -> ChannelMode {
        self.mode
    }

    /// Get the buffer size announced by the server, in bytes.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Get the largest text chunk, in characters, returned by [`split`](Self::split).
    #[must_use]
    pub fn max_runes(&self) -> usize {
        self.max_runes
    }

    fn observe(&self, line: &str) {
        if let Some(observer) = &self.observer {
            observer(line);
        }
    }
}

#[async_trait]
impl<S> PooledChannel for Channel<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    type Error = Error;

    async fn write(&mut self, line: &str) -> Result<()> {
        Channel::write(self, line).await
    }

    async fn read(&mut self) -> Result<String> {
        Channel::read(self).await
    }

    fn split<'a>(&self, text: &'a str) -> TextChunks<'a> {
        Channel::split(self, text)
    }

    async fn close(self) -> Result<()> {
        Channel::close(self).await
    }
}

impl<S> fmt::Debug for Channel<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Channel")
            .field("mode", &self.mode)
            .field("buffer_size", &self.buffer_size)
            .field("max_runes", &self.max_runes)
            .finish_non_exhaustive()
    }
}
