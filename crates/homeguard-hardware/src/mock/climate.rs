//! Mock climate sensor.

use std::sync::{Arc, Mutex};

use super::lock;
use crate::{HardwareError, Result, traits::ClimateSensor, types::ClimateReading};

#[derive(Debug, Clone, Copy)]
enum Sample {
    Value { temperature: f32, humidity: f32 },
    Fail,
}

/// Climate sensor returning whatever its handle last set.
#[derive(Debug)]
pub struct MockClimate {
    sample: Arc<Mutex<Sample>>,
}

impl MockClimate {
    /// Create a sensor reading 22.0 °C / 45 %.
    pub fn new() -> (Self, MockClimateHandle) {
        let sample = Arc::new(Mutex::new(Sample::Value {
            temperature: 22.0,
            humidity: 45.0,
        }));
        (
            Self {
                sample: Arc::clone(&sample),
            },
            MockClimateHandle { sample },
        )
    }
}

impl ClimateSensor for MockClimate {
    async fn read(&mut self) -> Result<ClimateReading> {
        let sample = *lock(&self.sample);
        match sample {
            Sample::Value {
                temperature,
                humidity,
            } => Ok(ClimateReading::new(temperature, humidity)),
            Sample::Fail => Err(HardwareError::read_failed("no response from sensor")),
        }
    }
}

/// Handle for changing the mock climate.
#[derive(Debug, Clone)]
pub struct MockClimateHandle {
    sample: Arc<Mutex<Sample>>,
}

impl MockClimateHandle {
    /// Report this temperature and humidity from now on.
    pub fn set(&self, temperature: f32, humidity: f32) {
        *lock(&self.sample) = Sample::Value {
            temperature,
            humidity,
        };
    }

    /// Make subsequent reads fail.
    pub fn fail(&self) {
        *lock(&self.sample) = Sample::Fail;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_climate_follows_handle() {
        let (mut sensor, handle) = MockClimate::new();
        assert_eq!(sensor.read().await.unwrap().temperature, 22.0);

        handle.set(51.0, 30.0);
        let reading = sensor.read().await.unwrap();
        assert_eq!(reading.temperature, 51.0);
        assert_eq!(reading.humidity, 30.0);

        handle.fail();
        assert!(sensor.read().await.is_err());
    }
}
