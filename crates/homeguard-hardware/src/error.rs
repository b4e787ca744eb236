//! Peripheral errors.

pub type Result<T> = std::result::Result<T, HardwareError>;

#[derive(Debug, thiserror::Error)]
pub enum HardwareError {
    /// No echo arrived within the sampling window. Monitors read this as
    /// "nobody there", not as a fault.
    #[error("Sensor timeout: no echo within {window_ms}ms")]
    SensorTimeout { window_ms: u64 },

    /// The input source is gone; the reading loop should stop.
    #[error("Device disconnected: {device}")]
    Disconnected { device: String },

    #[error("Invalid data: {message}")]
    InvalidData { message: String },

    /// A sample could not be taken (bus error, bad checksum).
    #[error("Sensor read failed: {message}")]
    ReadFailed { message: String },
}

impl HardwareError {
    pub fn sensor_timeout(window_ms: u64) -> Self {
        Self::SensorTimeout { window_ms }
    }

    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    pub fn invalid_data(message: impl Into<String>) -> Self {
        Self::InvalidData {
            message: message.into(),
        }
    }

    pub fn read_failed(message: impl Into<String>) -> Self {
        Self::ReadFailed {
            message: message.into(),
        }
    }

    /// Whether this error only means "nothing detected".
    pub fn is_no_detection(&self) -> bool {
        matches!(self, Self::SensorTimeout { .. })
    }
}
