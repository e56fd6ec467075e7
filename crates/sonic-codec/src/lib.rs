//! # sonic-codec
//!
//! Async framing layer for Sonic channel lines.
//!
//! This crate turns a raw byte stream into a stream of protocol lines and a
//! sink accepting outgoing lines, handling lines split across TCP segments
//! and several lines arriving in one read.
//!
//! ## Features
//!
//! - `\r\n` terminated output, `\r\n` or bare `\n` accepted on input
//! - Optional maximum line length
//! - End-of-stream reported as [`CodecError::ConnectionClosed`]
//! - Integration with tokio-util's codec framework

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod framed;
pub mod line_codec;

pub use error::CodecError;
pub use framed::LineStream;
pub use line_codec::{LineCodec, TERMINATOR};
