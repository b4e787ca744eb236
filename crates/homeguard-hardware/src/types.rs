//! Common types shared across peripheral implementations.
//!
//! Indicator cues, LED colors and climate readings.

use homeguard_core::Device;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Status LED colors.
///
/// The controller has a bicolor red/green LED; `Off` turns both off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedColor {
    /// LED off.
    Off,

    /// Red LED (armed).
    Red,

    /// Green LED (door open).
    Green,
}

/// Audible/visual feedback cue.
///
/// Cues never change functional state. Each one has a distinct pattern so a
/// user can tell what happened without looking at a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cue {
    /// Short click played on every key press.
    KeyClick,

    /// Double beep after arming.
    ArmConfirm,

    /// Long beep after disarming.
    DisarmConfirm,

    /// Three low beeps (wrong password, high temperature).
    Error,

    /// Two-tone doorbell when the door opens.
    Doorbell,

    /// One beep per speed step; a single low tone for off.
    FanSpeed(u8),

    /// The device-specific tune played when an appliance turns on.
    DeviceOn(Device),

    /// Three green LED blinks marking a device power-on.
    OnSequence,
}

impl Cue {
    /// Nominal duration of the cue pattern.
    pub fn duration(&self) -> Duration {
        let ms = match self {
            Cue::KeyClick => 50,
            Cue::ArmConfirm => 300,
            Cue::DisarmConfirm => 500,
            Cue::Error => 750,
            Cue::Doorbell => 1_000,
            Cue::FanSpeed(0) => 200,
            Cue::FanSpeed(speed) => u64::from(*speed) * 160,
            Cue::DeviceOn(Device::Fan) => 300,
            Cue::DeviceOn(Device::Light) => 100,
            Cue::DeviceOn(Device::Tv) => 300,
            Cue::DeviceOn(Device::Plug) => 160,
            Cue::DeviceOn(Device::Security) => 0,
            Cue::OnSequence => 900,
        };
        Duration::from_millis(ms)
    }

    /// Whether this cue drives the status LED while it plays.
    pub fn uses_led(&self) -> bool {
        matches!(self, Cue::OnSequence)
    }
}

/// A temperature/humidity sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClimateReading {
    /// Temperature in degrees Celsius.
    pub temperature: f32,

    /// Relative humidity in percent.
    pub humidity: f32,

    /// When the sample was taken.
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl ClimateReading {
    /// Create a reading stamped with the current time.
    pub fn new(temperature: f32, humidity: f32) -> Self {
        Self {
            temperature,
            humidity,
            timestamp: chrono::Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_speed_cue_scales_with_speed() {
        assert_eq!(Cue::FanSpeed(0).duration(), Duration::from_millis(200));
        assert_eq!(Cue::FanSpeed(1).duration(), Duration::from_millis(160));
        assert_eq!(Cue::FanSpeed(5).duration(), Duration::from_millis(800));
    }

    #[test]
    fn test_device_cues_are_distinct() {
        let cues: Vec<Cue> = Device::APPLIANCES.into_iter().map(Cue::DeviceOn).collect();
        for (i, a) in cues.iter().enumerate() {
            for b in &cues[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_only_on_sequence_uses_led() {
        assert!(Cue::OnSequence.uses_led());
        assert!(!Cue::Doorbell.uses_led());
        assert!(!Cue::DeviceOn(Device::Light).uses_led());
    }

    #[test]
    fn test_led_color_serialization() {
        let color = LedColor::Green;
        let json = serde_json::to_string(&color).unwrap();
        let deserialized: LedColor = serde_json::from_str(&json).unwrap();
        assert_eq!(color, deserialized);
    }

    #[test]
    fn test_climate_reading_new() {
        let reading = ClimateReading::new(21.5, 40.0);
        assert_eq!(reading.temperature, 21.5);
        assert_eq!(reading.humidity, 40.0);
    }
}
