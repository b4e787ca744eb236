//! Mock device implementations for testing and development.
//!
//! This module provides simulated peripherals that can be controlled
//! programmatically without physical hardware. The daemon uses them to run
//! on a workstation; tests use them to script sensor readings and to
//! observe indicator output.

pub mod climate;
pub mod indicator;
pub mod keypad;
pub mod matrix;
pub mod proximity;

// Re-export commonly used types
pub use climate::{MockClimate, MockClimateHandle};
pub use indicator::{RecordingIndicator, SimulatedIndicator};
pub use keypad::{MockKeypad, MockKeypadHandle};
pub use matrix::{MockKeyMatrix, MockKeyMatrixHandle};
pub use proximity::{MockProximity, MockProximityHandle};

use std::sync::{Mutex, MutexGuard};

/// Lock a mock's shared state, recovering from poisoning.
///
/// Mock state is plain data, so a panic in another holder never leaves it
/// half-updated in a way that matters to a test.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
