//! Framed line stream for async I/O.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use futures_util::{Sink, SinkExt, StreamExt};
use pin_project_lite::pin_project;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::Framed;

use crate::error::CodecError;
use crate::line_codec::LineCodec;

pin_project! {
    /// A framed line stream over an async I/O transport.
    ///
    /// This wraps a tokio-util `Framed` codec and provides a higher-level
    /// interface for sending and receiving protocol lines.
    pub struct LineStream<T> {
        #[pin]
        inner: Framed<T, LineCodec>,
    }
}

impl<T> LineStream<T>
where
    T: AsyncRead + AsyncWrite,
{
    /// Create a new line stream over the given transport.
    pub fn new(transport: T) -> Self {
        Self {
            inner: Framed::new(transport, LineCodec::new()),
        }
    }

    /// Create a new line stream with a custom codec.
    pub fn with_codec(transport: T, codec: LineCodec) -> Self {
        Self {
            inner: Framed::new(transport, codec),
        }
    }

    /// Get a mutable reference to the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        self.inner.get_mut()
    }

    /// Get a reference to the codec.
    pub fn codec(&self) -> &LineCodec {
        self.inner.codec()
    }
}

impl<T> LineStream<T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Write one line and flush it.
    pub async fn send_line(&mut self, line: &str) -> Result<(), CodecError> {
        self.send(line).await
    }

    /// Read the next line.
    ///
    /// A stream that has ended yields [`CodecError::ConnectionClosed`]. A
    /// line that could not be decoded is skipped and reported as an error;
    /// the stream can still be read afterwards.
    pub async fn next_line(&mut self) -> Result<String, CodecError> {
        match self.next().await {
            Some(line) => line,
            None => Err(CodecError::ConnectionClosed),
        }
    }

    /// Shut down the write half of the transport.
    pub async fn shutdown(&mut self) -> Result<(), CodecError> {
        self.inner.get_mut().shutdown().await?;
        Ok(())
    }
}

impl<T> Stream for LineStream<T>
where
    T: AsyncRead + Unpin,
{
    type Item = Result<String, CodecError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project()
            .inner
            .poll_next(cx)
            .map(|item| item.map(|line| line.and_then(|line| line)))
    }
}

impl<'a, T> Sink<&'a str> for LineStream<T>
where
    T: AsyncWrite + Unpin,
{
    type Error = CodecError;

    fn poll_ready(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_ready(cx)
    }

    fn start_send(self: Pin<&mut Self>, item: &'a str) -> Result<(), Self::Error> {
        self.project().inner.start_send(item)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_flush(cx)
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.project().inner.poll_close(cx)
    }
}

impl<T> std::fmt::Debug for LineStream<T>
where
    T: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LineStream")
            .field("transport", self.inner.get_ref())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_send_and_receive_lines() {
        let transport = Builder::new()
            .write(b"PING\r\n")
            .read(b"PO")
            .read(b"NG\r\nENDED quit\r\n")
            .build();
        let mut stream = LineStream::new(transport);

        stream.send_line("PING").await.unwrap();
        assert_eq!(stream.next_line().await.unwrap(), "PONG");
        assert_eq!(stream.next_line().await.unwrap(), "ENDED quit");

        let err = stream.next_line().await.unwrap_err();
        assert!(err.is_end_of_stream());
    }

    #[tokio::test]
    async fn test_read_error_is_surfaced() {
        let transport = Builder::new()
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            ))
            .build();
        let mut stream = LineStream::new(transport);

        let err = stream.next_line().await.unwrap_err();
        assert!(matches!(err, CodecError::Io(ref e) if e.kind() == std::io::ErrorKind::ConnectionReset));
        assert!(!err.is_end_of_stream());
    }

    #[tokio::test]
    async fn test_custom_codec() {
        let transport = Builder::new().read(b"0123456789\r\n").build();
        let mut stream = LineStream::with_codec(transport, LineCodec::with_max_length(4));
        assert_eq!(stream.codec().max_length(), Some(4));

        let err = stream.next_line().await.unwrap_err();
        assert!(matches!(err, CodecError::LineTooLong { max: 4, .. }));
    }

    #[tokio::test]
    async fn test_bad_line_does_not_end_stream() {
        let transport = Builder::new()
            .read(b"\xff\r\n0123456789\r\n")
            .read(b"PONG\r\n")
            .build();
        let mut stream = LineStream::with_codec(transport, LineCodec::with_max_length(4));

        let err = stream.next_line().await.unwrap_err();
        assert!(matches!(err, CodecError::InvalidUtf8));
        let err = stream.next_line().await.unwrap_err();
        assert!(matches!(err, CodecError::LineTooLong { length: 10, max: 4 }));

        assert_eq!(stream.next_line().await.unwrap(), "PONG");
        assert!(stream.next_line().await.unwrap_err().is_end_of_stream());
    }

    #[tokio::test]
    async fn test_stream_and_sink_impls() {
        let transport = Builder::new()
            .write(b"PING\r\n")
            .read(b"PONG\r\n")
            .build();
        let mut stream = LineStream::new(transport);

        SinkExt::send(&mut stream, "PING").await.unwrap();
        assert_eq!(StreamExt::next(&mut stream).await.unwrap().unwrap(), "PONG");
        assert!(StreamExt::next(&mut stream).await.is_none());
    }
}
