//! Controller error type.
//!
//! None of these are fatal to the controller: a failing loop is reported
//! through [`HubHandle`](crate::hub::HubHandle) and the remaining loops keep
//! running.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ControllerError {
    /// Peripheral failure that ended a loop (e.g. keypad disconnected).
    #[error("Hardware error: {0}")]
    Hardware(#[from] homeguard_hardware::HardwareError),

    /// Settings store failure.
    #[error("Storage error: {0}")]
    Storage(#[from] homeguard_storage::StorageError),

    /// Rejected remote command.
    #[error("Invalid command: {0}")]
    Command(#[from] homeguard_core::Error),
}

pub type Result<T> = std::result::Result<T, ControllerError>;
