//! Indicator implementations without a buzzer.

use std::sync::{Arc, Mutex};

use tracing::{debug, info};

use super::lock;
use crate::traits::Indicator;
use crate::types::{Cue, LedColor};

/// Indicator that records every cue and LED write.
///
/// Clones share the same record, so a test can keep one clone and hand
/// another to the controller.
#[derive(Debug, Clone, Default)]
pub struct RecordingIndicator {
    cues: Arc<Mutex<Vec<Cue>>>,
    leds: Arc<Mutex<Vec<LedColor>>>,
}

impl RecordingIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cues played so far, in order.
    pub fn cues(&self) -> Vec<Cue> {
        lock(&self.cues).clone()
    }

    /// LED colors written so far, in order.
    pub fn leds(&self) -> Vec<LedColor> {
        lock(&self.leds).clone()
    }

    /// Last LED color written.
    pub fn last_led(&self) -> Option<LedColor> {
        lock(&self.leds).last().copied()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        lock(&self.cues).clear();
        lock(&self.leds).clear();
    }
}

impl Indicator for RecordingIndicator {
    async fn play(&self, cue: Cue) {
        lock(&self.cues).push(cue);
    }

    fn set_led(&self, color: LedColor) {
        lock(&self.leds).push(color);
    }
}

/// Indicator that logs cues and takes as long as the real pattern would.
#[derive(Debug, Clone, Default)]
pub struct SimulatedIndicator {
    led: Arc<Mutex<Option<LedColor>>>,
}

impl SimulatedIndicator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Indicator for SimulatedIndicator {
    async fn play(&self, cue: Cue) {
        debug!(?cue, "Playing cue");
        tokio::time::sleep(cue.duration()).await;
    }

    fn set_led(&self, color: LedColor) {
        let mut led = lock(&self.led);
        if *led != Some(color) {
            info!(?color, "Status LED");
            *led = Some(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeguard_core::Device;

    #[tokio::test]
    async fn test_recording_indicator_shares_record() {
        let indicator = RecordingIndicator::new();
        let observer = indicator.clone();

        indicator.play(Cue::DeviceOn(Device::Tv)).await;
        indicator.play(Cue::OnSequence).await;
        indicator.set_led(LedColor::Red);

        assert_eq!(
            observer.cues(),
            vec![Cue::DeviceOn(Device::Tv), Cue::OnSequence]
        );
        assert_eq!(observer.last_led(), Some(LedColor::Red));

        observer.clear();
        assert!(indicator.cues().is_empty());
        assert!(indicator.leds().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_simulated_indicator_takes_cue_duration() {
        let indicator = SimulatedIndicator::new();
        let started = tokio::time::Instant::now();
        indicator.play(Cue::Doorbell).await;
        assert!(started.elapsed() >= Cue::Doorbell.duration());
    }
}
