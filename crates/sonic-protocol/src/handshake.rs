//! Channel handshake lines.
//!
//! A channel is started by sending `START <mode> <password>`. The server
//! replies with a `CONNECTED` banner followed by a `STARTED` line whose
//! trailing `buffer(N)` field gives the maximum command size in bytes.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ProtocolError;
use crate::mode::ChannelMode;

/// Command closing a channel. The server acknowledges with `ENDED quit`.
pub const QUIT_COMMAND: &str = "QUIT";

/// Liveness command. The server answers with `PONG`.
pub const PING_COMMAND: &str = "PING";

static BUFFER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.+buffer\(([0-9]+)\)$").unwrap());

/// Format the `START` command for the given mode and password.
#[must_use]
pub fn start_command(mode: ChannelMode, password: &str) -> String {
    format!("START {mode} {password}")
}

/// Extract the negotiated buffer size from a `STARTED` line.
///
/// Only the trailing `buffer(N)` field is inspected; the rest of the line is
/// free-form. A missing field or a value that does not fit in `usize` is
/// reported as [`ProtocolError::InvalidResponse`].
pub fn parse_buffer_size(line: &str) -> Result<usize, ProtocolError> {
    let line = line.trim();
    let invalid = || ProtocolError::InvalidResponse(line.to_string());

    let captures = BUFFER_RE.captures(line).ok_or_else(invalid)?;
    let digits = captures.get(1).ok_or_else(invalid)?;
    digits.as_str().parse().map_err(|_| invalid())
}

/// Number of characters allowed in one text argument for a buffer size.
///
/// Half of the buffer is reserved for the text itself, and each character is
/// assumed to take up to four bytes once encoded.
#[must_use]
pub const fn rune_budget(buffer_size: usize) -> usize {
    buffer_size / 2 / 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_start_command() {
        assert_eq!(
            start_command(ChannelMode::Search, "SecretPassword"),
            "START search SecretPassword"
        );
        assert_eq!(
            start_command(ChannelMode::Control, "pw"),
            "START control pw"
        );
    }

    #[test]
    fn test_parse_buffer_size() {
        let size = parse_buffer_size("STARTED search protocol(1) buffer(20000)").unwrap();
        assert_eq!(size, 20000);

        // Outer wording is not checked.
        assert_eq!(parse_buffer_size("anything buffer(8)\r\n").unwrap(), 8);
    }

    #[test]
    fn test_parse_buffer_size_invalid() {
        for line in [
            "STARTED invalid",
            "STARTED search protocol(1) buffer(invalid)",
            "STARTED search protocol(1) buffer()",
            "buffer(20000)",
            "STARTED search buffer(20000) protocol(1)",
            "STARTED search buffer(99999999999999999999999999)",
        ] {
            let err = parse_buffer_size(line).unwrap_err();
            assert!(err.is_invalid_response(), "{line}: {err:?}");
        }
    }

    #[test]
    fn test_rune_budget() {
        assert_eq!(rune_budget(20000), 2500);
        assert_eq!(rune_budget(7), 0);
        assert_eq!(rune_budget(0), 0);
    }
}
