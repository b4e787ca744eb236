//! Peripheral abstraction layer for the Homeguard controller.
//!
//! This crate provides trait-based abstractions for the controller's
//! peripherals: the 4x4 matrix keypad, the ultrasonic door proximity sensor,
//! the climate sensor, and the buzzer/LED indicator. Controller loops are
//! written against these traits so mock implementations (for development
//! and testing) and real drivers are interchangeable.
//!
//! # Design Philosophy
//!
//! - **Async-first**: every blocking peripheral operation is a future.
//! - **Spawnable**: trait futures are `Send`, so generic loops can run on
//!   the Tokio runtime.
//! - **Error-aware**: operations return [`Result<T>`][error::Result];
//!   a missing echo is the distinct [`HardwareError::SensorTimeout`].
//!
//! # Keypad
//!
//! [`MatrixKeypad`] scans any [`KeyMatrix`] and yields debounced keys:
//!
//! ```no_run
//! use homeguard_hardware::{KeypadDevice, MatrixKeypad};
//! use homeguard_hardware::mock::MockKeyMatrix;
//!
//! # async fn example() -> homeguard_hardware::Result<()> {
//! let (matrix, handle) = MockKeyMatrix::new();
//! let mut keypad = MatrixKeypad::new(matrix);
//!
//! handle.press('A', 3);
//! let key = keypad.read_key().await?;
//! println!("pressed {key}");
//! # Ok(())
//! # }
//! ```
//!
//! # Mock Implementations
//!
//! The [`mock`] module provides scripted sensors, a channel-driven keypad,
//! a scripted key matrix, and recording/simulated indicators.

pub mod error;
pub mod matrix;
pub mod mock;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::{HardwareError, Result};
pub use matrix::{KEYMAP, KeyHit, MatrixKeypad, ScanConfig};
pub use traits::{
    ClimateSensor, Indicator, KeyMatrix, KeypadDevice, KeypadInput, ProximitySensor,
    echo_distance_cm,
};
pub use types::{ClimateReading, Cue, LedColor};
