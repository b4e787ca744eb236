//! Mock proximity sensor.
//!
//! Holds a "current" distance that the handle can change at any time.
//! `None` simulates a missing echo, which surfaces as
//! [`HardwareError::SensorTimeout`](crate::HardwareError::SensorTimeout).

use std::sync::{Arc, Mutex};

use homeguard_core::constants::ECHO_TIMEOUT_MS;

use super::lock;
use crate::{HardwareError, Result, traits::ProximitySensor};

/// Proximity sensor returning whatever its handle last set.
#[derive(Debug)]
pub struct MockProximity {
    distance: Arc<Mutex<Option<f32>>>,
}

impl MockProximity {
    /// Create a sensor that initially sees nothing (no echo).
    pub fn new() -> (Self, MockProximityHandle) {
        let distance = Arc::new(Mutex::new(None));
        (
            Self {
                distance: Arc::clone(&distance),
            },
            MockProximityHandle { distance },
        )
    }
}

impl ProximitySensor for MockProximity {
    async fn measure_cm(&mut self) -> Result<f32> {
        let reading = *lock(&self.distance);
        reading.ok_or_else(|| HardwareError::sensor_timeout(ECHO_TIMEOUT_MS))
    }
}

/// Handle for changing what the mock sensor sees.
#[derive(Debug, Clone)]
pub struct MockProximityHandle {
    distance: Arc<Mutex<Option<f32>>>,
}

impl MockProximityHandle {
    /// Report this distance on every subsequent measurement.
    pub fn set_distance(&self, cm: f32) {
        *lock(&self.distance) = Some(cm);
    }

    /// Stop answering; measurements time out.
    pub fn clear(&self) {
        *lock(&self.distance) = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_echo_times_out() {
        let (mut sensor, _handle) = MockProximity::new();
        let err = sensor.measure_cm().await.unwrap_err();
        assert!(err.is_no_detection());
    }

    #[tokio::test]
    async fn test_distance_follows_handle() {
        let (mut sensor, handle) = MockProximity::new();

        handle.set_distance(12.5);
        assert_eq!(sensor.measure_cm().await.unwrap(), 12.5);

        handle.set_distance(80.0);
        assert_eq!(sensor.measure_cm().await.unwrap(), 80.0);

        handle.clear();
        assert!(sensor.measure_cm().await.is_err());
    }
}
