//! # sonic-testing
//!
//! Test infrastructure for Sonic channel clients.
//!
//! [`MockServer`] listens on a local TCP port and answers each received line
//! according to an ordered list of regex rules. Lines nobody matches get an
//! `ERR no match: <line>` reply, and `QUIT` is always acknowledged with
//! `ENDED quit` before the connection is closed.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sonic_testing::MockServer;
//!
//! let server = MockServer::builder()
//!     .accept_start(20000)
//!     .on("^PING$", ["PONG"])
//!     .start()
//!     .await?;
//!
//! let client = Client::search(Config::new().addr(server.addr()));
//! client.ping().await?;
//! assert_eq!(server.connections(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod server;

pub use server::{MockServer, MockServerBuilder, MockServerError};
