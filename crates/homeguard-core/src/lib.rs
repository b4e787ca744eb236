//! Core vocabulary for the Homeguard controller.
//!
//! Everything that more than one crate needs to agree on lives here: the
//! closed set of controllable devices, the source tag carried by commands,
//! validated value types, the reported parameter keys, and the exact status
//! strings that downstream consumers match on.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::*;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
