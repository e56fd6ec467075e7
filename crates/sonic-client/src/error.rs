//! Client error types.

use sonic_codec::CodecError;
use sonic_pool::{ChannelError, PoolError};
use sonic_protocol::ProtocolError;
use thiserror::Error;

/// Result type for client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by channels and the client.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure: dialing, writing or reading the socket.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Line framing failure, including the end of the stream.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// `ERR` reply or malformed response from the server.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// No channel could be obtained from the pool.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

impl Error {
    /// Check if the transport stream has ended.
    ///
    /// Channels failing with such an error are evicted from the pool.
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        match self {
            Self::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            Self::Codec(err) => err.is_end_of_stream(),
            Self::Protocol(_) | Self::Pool(_) => false,
        }
    }

    /// Check if no channel became available in time.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Pool(err) if err.is_timeout())
    }

    /// Check if the pool has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Pool(PoolError::Closed))
    }

    /// Check if the server sent a response of unexpected shape.
    #[must_use]
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::Protocol(err) if err.is_invalid_response())
    }

    /// Returns the reason of an `ERR` reply, if this is one.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Protocol(err) => err.server_message(),
            _ => None,
        }
    }
}

impl ChannelError for Error {
    fn is_end_of_stream(&self) -> bool {
        Error::is_end_of_stream(self)
    }
}

/// Surface I/O failures from the codec as plain transport errors.
pub(crate) fn transport(err: CodecError) -> Error {
    match err {
        CodecError::Io(err) => Error::Io(err),
        other => Error::Codec(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::time::Duration;

    #[test]
    fn test_end_of_stream_classification() {
        assert!(Error::Codec(CodecError::ConnectionClosed).is_end_of_stream());
        assert!(Error::Io(io::Error::from(io::ErrorKind::UnexpectedEof)).is_end_of_stream());

        assert!(!Error::Io(io::Error::from(io::ErrorKind::BrokenPipe)).is_end_of_stream());
        assert!(!Error::Codec(CodecError::InvalidUtf8).is_end_of_stream());
        assert!(!Error::Protocol(ProtocolError::Server("no".into())).is_end_of_stream());
        assert!(!Error::Pool(PoolError::Closed).is_end_of_stream());
    }

    #[test]
    fn test_server_message_display() {
        let err = Error::from(ProtocolError::Server("bad password".into()));
        assert_eq!(err.to_string(), "bad password");
        assert_eq!(err.server_message(), Some("bad password"));
        assert!(!err.is_invalid_response());
    }

    #[test]
    fn test_pool_conditions() {
        let err = Error::from(PoolError::Timeout(Duration::from_secs(1)));
        assert!(err.is_timeout());
        assert!(!err.is_closed());
        assert!(Error::from(PoolError::Closed).is_closed());
    }

    #[test]
    fn test_transport_unwraps_io() {
        let err = transport(CodecError::Io(io::Error::from(io::ErrorKind::ConnectionReset)));
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::ConnectionReset));

        let err = transport(CodecError::ConnectionClosed);
        assert!(matches!(err, Error::Codec(CodecError::ConnectionClosed)));
    }
}
