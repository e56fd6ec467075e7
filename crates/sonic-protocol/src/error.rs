//! Protocol-level error types.

use thiserror::Error;

/// Errors raised while interpreting Sonic protocol lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The server answered with an `ERR <reason>` line.
    ///
    /// The display form is the trimmed reason text alone.
    #[error("{0}")]
    Server(String),

    /// A response line did not have the expected structure.
    #[error("invalid response: {0:?}")]
    InvalidResponse(String),
}

impl ProtocolError {
    /// Returns the server-supplied reason if this is an `ERR` reply.
    #[must_use]
    pub fn server_message(&self) -> Option<&str> {
        match self {
            Self::Server(reason) => Some(reason),
            Self::InvalidResponse(_) => None,
        }
    }

    /// Check if this is the malformed-response condition.
    #[must_use]
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse(_))
    }
}
