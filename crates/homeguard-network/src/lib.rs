//! Remote command channel for Homeguard.
//!
//! A line-oriented TCP server that lets a companion app read back
//! acknowledgements for `(device, param, value)` writes. See
//! [`protocol`] for the wire format.

pub mod error;
pub mod protocol;
pub mod server;

pub use error::{RemoteError, Result};
pub use protocol::{RemoteRequest, RemoteResponse};
pub use server::{MAX_LINE_LENGTH, RemoteServer, RemoteServerConfig, handle_line};
