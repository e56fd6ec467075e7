//! Channel modes.

use std::fmt;

/// The mode a channel is started in.
///
/// Sonic exposes a separate command set per mode; the mode is fixed for the
/// lifetime of a channel and sent once in the `START` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelMode {
    /// Query and suggest commands.
    Search,
    /// Push, pop, count and flush commands.
    Ingest,
    /// Trigger and info commands.
    Control,
}

impl ChannelMode {
    /// The tag sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Search => "search",
            Self::Ingest => "ingest",
            Self::Control => "control",
        }
    }
}

impl fmt::Display for ChannelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_tags() {
        assert_eq!(ChannelMode::Search.as_str(), "search");
        assert_eq!(ChannelMode::Ingest.to_string(), "ingest");
        assert_eq!(ChannelMode::Control.as_str(), "control");
    }
}
