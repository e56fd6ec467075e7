//! Codec error types.

use thiserror::Error;

/// Errors that can occur while reading or writing lines.
#[derive(Debug, Error)]
pub enum CodecError {
    /// IO error during read/write operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The peer closed the stream.
    ///
    /// Also raised when the stream ends in the middle of a line.
    #[error("connection closed")]
    ConnectionClosed,

    /// A line exceeded the configured maximum length.
    #[error("line too long: {length} bytes (max {max})")]
    LineTooLong {
        /// Bytes read so far without a terminator.
        length: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// A line was not valid UTF-8.
    #[error("line is not valid UTF-8")]
    InvalidUtf8,
}

impl CodecError {
    /// Check if this error means the stream has ended.
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        match self {
            Self::ConnectionClosed => true,
            Self::Io(err) => err.kind() == std::io::ErrorKind::UnexpectedEof,
            Self::LineTooLong { .. } | Self::InvalidUtf8 => false,
        }
    }
}
