//! Peripheral trait definitions.
//!
//! These traits are the contract between the controller loops and the
//! physical peripherals: the 4x4 keypad, the ultrasonic proximity sensor,
//! the climate sensor and the buzzer/LED indicator. Controller loops are
//! spawned onto the Tokio runtime, so every async method returns a future
//! that is `Send`. Implementors can still write `async fn`.

use std::future::Future;
use std::time::Duration;

use crate::error::{HardwareError, Result};
use crate::types::{ClimateReading, Cue, LedColor};

/// A key on the 4x4 keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeypadInput {
    /// Numeric digit (0-9).
    Digit(u8),

    /// Star key (*), clears the password buffer.
    Star,

    /// Hash key (#), submits the password buffer.
    Hash,

    /// `A`: cycle fan speed.
    A,

    /// `B`: toggle light.
    B,

    /// `C`: toggle TV.
    C,

    /// `D`: toggle plug.
    D,
}

impl KeypadInput {
    /// Create a digit input.
    ///
    /// # Errors
    ///
    /// Returns an error if the digit is greater than 9.
    ///
    /// # Examples
    ///
    /// ```
    /// use homeguard_hardware::traits::KeypadInput;
    ///
    /// let input = KeypadInput::digit(5).unwrap();
    /// assert_eq!(input.as_digit(), Some(5));
    ///
    /// assert!(KeypadInput::digit(10).is_err());
    /// ```
    pub fn digit(d: u8) -> Result<Self> {
        if d > 9 {
            return Err(HardwareError::invalid_data(format!(
                "Digit must be 0-9, got {}",
                d
            )));
        }
        Ok(Self::Digit(d))
    }

    /// Map a keypad legend character to an input.
    ///
    /// # Errors
    ///
    /// Returns an error for characters that are not on the keypad.
    pub fn from_char(c: char) -> Result<Self> {
        match c {
            '0'..='9' => Ok(Self::Digit(c as u8 - b'0')),
            '*' => Ok(Self::Star),
            '#' => Ok(Self::Hash),
            'A' | 'a' => Ok(Self::A),
            'B' | 'b' => Ok(Self::B),
            'C' | 'c' => Ok(Self::C),
            'D' | 'd' => Ok(Self::D),
            other => Err(HardwareError::invalid_data(format!(
                "Unknown key '{}'",
                other
            ))),
        }
    }

    /// The legend printed on the key.
    pub fn as_char(&self) -> char {
        match self {
            Self::Digit(d) => char::from(b'0' + d),
            Self::Star => '*',
            Self::Hash => '#',
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
        }
    }

    /// Get the digit value if this is a digit input.
    pub fn as_digit(&self) -> Option<u8> {
        match self {
            Self::Digit(d) => Some(*d),
            _ => None,
        }
    }
}

impl std::fmt::Display for KeypadInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_char())
    }
}

/// Keypad device abstraction.
///
/// Yields one debounced key per call.
///
/// # Examples
///
/// ```no_run
/// use homeguard_hardware::traits::{KeypadDevice, KeypadInput};
/// use homeguard_hardware::error::Result;
///
/// async fn read_code<K: KeypadDevice>(keypad: &mut K) -> Result<String> {
///     let mut code = String::new();
///
///     loop {
///         match keypad.read_key().await? {
///             KeypadInput::Digit(d) => code.push(char::from(b'0' + d)),
///             KeypadInput::Hash => break,
///             KeypadInput::Star => code.clear(),
///             _ => {}
///         }
///     }
///
///     Ok(code)
/// }
/// ```
pub trait KeypadDevice: Send {
    /// Wait for the next key press.
    ///
    /// # Errors
    ///
    /// Returns an error if the device is disconnected.
    fn read_key(&mut self) -> impl Future<Output = Result<KeypadInput>> + Send;
}

/// Row/column access to a keypad matrix.
///
/// Rows are driven outputs; columns are pulled-up inputs that read active
/// while a key on the currently driven row is held. This is the only
/// GPIO-level surface the controller needs.
pub trait KeyMatrix: Send {
    /// Drive (`true`) or release (`false`) a row strobe.
    fn set_row(&mut self, row: usize, active: bool);

    /// Whether a column currently reads active.
    fn column_active(&mut self, col: usize) -> bool;
}

/// Ultrasonic proximity sensor.
pub trait ProximitySensor: Send {
    /// Measure the distance to the nearest object in centimeters.
    ///
    /// # Errors
    ///
    /// Returns [`HardwareError::SensorTimeout`] when no echo arrives within
    /// the sampling window. Callers treat that as "nothing detected".
    fn measure_cm(&mut self) -> impl Future<Output = Result<f32>> + Send;
}

/// Temperature/humidity sensor.
pub trait ClimateSensor: Send {
    /// Take one sample.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor does not answer or the frame is corrupt.
    fn read(&mut self) -> impl Future<Output = Result<ClimateReading>> + Send;
}

/// Buzzer and status LED.
///
/// Shared between every loop, so methods take `&self`. `play` resolves once
/// the cue pattern has finished.
pub trait Indicator: Send + Sync + 'static {
    /// Play a cue to completion.
    fn play(&self, cue: Cue) -> impl Future<Output = ()> + Send;

    /// Set the status LED.
    fn set_led(&self, color: LedColor);
}

/// Convert an ultrasonic echo pulse width into a distance.
///
/// Sound travels 0.0343 cm/µs and the pulse covers the round trip.
///
/// # Examples
///
/// ```
/// use homeguard_hardware::traits::echo_distance_cm;
/// use std::time::Duration;
///
/// let cm = echo_distance_cm(Duration::from_micros(583));
/// assert!((cm - 10.0).abs() < 0.1);
/// ```
pub fn echo_distance_cm(pulse: Duration) -> f32 {
    (pulse.as_micros() as f32 * 0.0343) / 2.0
}
