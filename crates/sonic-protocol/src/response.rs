//! Response line framing.

use crate::error::ProtocolError;

/// Prefix marking a protocol-level failure.
pub const ERR_PREFIX: &str = "ERR ";

/// Interpret one response line with its terminator already removed.
///
/// A line starting with `ERR ` becomes [`ProtocolError::Server`] carrying the
/// trimmed reason. Any other line is returned trimmed.
pub fn parse_line(line: &str) -> Result<&str, ProtocolError> {
    match line.strip_prefix(ERR_PREFIX) {
        Some(reason) => Err(ProtocolError::Server(reason.trim().to_string())),
        None => Ok(line.trim()),
    }
}
