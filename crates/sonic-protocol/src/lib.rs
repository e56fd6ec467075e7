//! # sonic-protocol
//!
//! Pure implementation of the Sonic channel line protocol.
//!
//! This crate contains the parts of the protocol that do not touch I/O:
//! channel modes, the handshake lines and their parsing, the `ERR` framing
//! rule, and the text helpers used to embed free text inside commands.
//!
//! ## Wire format
//!
//! Every message is a single line terminated by `\r\n`. A channel is opened
//! with the following exchange:
//!
//! ```text
//! C: START search SecretPassword
//! S: CONNECTED <sonic-server v1.4.9>
//! S: STARTED search protocol(1) buffer(20000)
//! ```
//!
//! The `buffer(N)` value bounds the size of a single command line. Free text
//! is escaped with [`escape`] and cut with [`split`] so that every chunk stays
//! within the [`rune_budget`] derived from it.

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod handshake;
pub mod mode;
pub mod response;
pub mod text;

pub use error::ProtocolError;
pub use handshake::{PING_COMMAND, QUIT_COMMAND, parse_buffer_size, rune_budget, start_command};
pub use mode::ChannelMode;
pub use response::{ERR_PREFIX, parse_line};
pub use text::{TextChunks, escape, split};
