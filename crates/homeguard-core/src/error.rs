use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Validation errors
    #[error("Invalid password format: length must be 1-{max} bytes, got {len}")]
    InvalidPasswordFormat { len: usize, max: usize },

    #[error("Invalid fan speed: {0} (expected 0-5)")]
    InvalidFanSpeed(i64),

    #[error("Invalid value for {param}: expected {expected}")]
    InvalidValue {
        param: String,
        expected: &'static str,
    },

    // Naming errors
    #[error("Unknown device: {0}")]
    UnknownDevice(String),

    #[error("Unknown parameter: {device}/{param}")]
    UnknownParam { device: String, param: String },
}

pub type Result<T> = std::result::Result<T, Error>;
