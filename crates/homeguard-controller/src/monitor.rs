//! Periodic monitors: door proximity and climate.

use std::time::Duration;

use homeguard_core::ParamKey;
use homeguard_core::constants::{
    CLIMATE_PERIOD_MS, DOOR_AUTO_CLOSE_SECS, DOOR_THRESHOLD_CM, ECHO_TIMEOUT_MS,
    HIGH_TEMP_ALERT_C, HIGH_TEMP_RESET_C, PROXIMITY_PERIOD_MS,
};
use homeguard_hardware::{ClimateReading, ClimateSensor, Cue, Indicator, ProximitySensor};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::effects::Effects;
use crate::hub::Hub;
use crate::notify::Delivery;
use crate::security::{door_tick, led_for};

/// Proximity monitor settings.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Sampling period.
    pub period: Duration,
    /// A reading strictly between 0 and this distance counts as presence.
    pub threshold_cm: f32,
    /// Idle time after which an open door closes and the system re-arms.
    pub auto_close: Duration,
    /// Longest wait for one echo. A sensor that does not answer in time
    /// reads as nobody there.
    pub echo_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(PROXIMITY_PERIOD_MS),
            threshold_cm: DOOR_THRESHOLD_CM,
            auto_close: Duration::from_secs(DOOR_AUTO_CLOSE_SECS),
            echo_timeout: Duration::from_millis(ECHO_TIMEOUT_MS),
        }
    }
}

/// Door proximity monitor.
pub struct ProximitySecurityMonitor<P, I> {
    sensor: P,
    hub: Hub<I>,
    config: MonitorConfig,
}

impl<P: ProximitySensor, I: Indicator> ProximitySecurityMonitor<P, I> {
    pub fn new(sensor: P, hub: Hub<I>, config: MonitorConfig) -> Self {
        Self {
            sensor,
            hub,
            config,
        }
    }

    /// Sample the sensor. A missing or late echo or a failed read means
    /// nobody is there.
    pub async fn person_nearby(&mut self) -> bool {
        let window = self.config.echo_timeout;
        let Ok(measured) = tokio::time::timeout(window, self.sensor.measure_cm()).await else {
            debug!(window_ms = window.as_millis() as u64, "No echo in time");
            return false;
        };
        match measured {
            Ok(cm) => cm > 0.0 && cm < self.config.threshold_cm,
            Err(e) if e.is_no_detection() => false,
            Err(e) => {
                warn!(error = %e, "Proximity read failed");
                false
            }
        }
    }

    /// One monitor tick at `now`.
    pub async fn tick(&mut self, now: Instant) {
        let nearby = self.person_nearby().await;
        let auto_close = self.config.auto_close;
        let (fx, led) = self
            .hub
            .state()
            .with_lock(|state| {
                let fx = door_tick(state, nearby, now, auto_close);
                let led = led_for(state.security.armed, state.security.door_open);
                (fx, led)
            })
            .await;

        self.hub.show_led(led);
        self.hub.emit(fx).await;
    }

    /// Tick every period, forever.
    pub async fn run(mut self) {
        info!(period_ms = self.config.period.as_millis() as u64, "Proximity monitor started");
        let mut ticker = tokio::time::interval(self.config.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.tick(Instant::now()).await;
        }
    }
}

/// High temperature latch.
///
/// Fires once when the temperature rises above the alert threshold and
/// re-arms only after it falls below the lower reset threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureWatch {
    alert_above: f32,
    reset_below: f32,
    latched: bool,
}

impl Default for TemperatureWatch {
    fn default() -> Self {
        Self::new(HIGH_TEMP_ALERT_C, HIGH_TEMP_RESET_C)
    }
}

impl TemperatureWatch {
    pub fn new(alert_above: f32, reset_below: f32) -> Self {
        Self {
            alert_above,
            reset_below,
            latched: false,
        }
    }

    /// Feed a sample; `true` when an alert should fire.
    pub fn observe(&mut self, temperature: f32) -> bool {
        if temperature > self.alert_above {
            if !self.latched {
                self.latched = true;
                return true;
            }
        } else if temperature < self.reset_below {
            self.latched = false;
        }
        false
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }
}

/// Periodic temperature/humidity reporting with the high temperature alert.
pub struct ClimateMonitor<C, I> {
    sensor: C,
    hub: Hub<I>,
    watch: TemperatureWatch,
    period: Duration,
}

impl<C: ClimateSensor, I: Indicator> ClimateMonitor<C, I> {
    pub fn new(sensor: C, hub: Hub<I>) -> Self {
        Self {
            sensor,
            hub,
            watch: TemperatureWatch::default(),
            period: Duration::from_millis(CLIMATE_PERIOD_MS),
        }
    }

    pub fn with_period(mut self, period: Duration) -> Self {
        self.period = period;
        self
    }

    /// Take and report one sample. Read failures are logged and skipped.
    pub async fn sample(&mut self) -> Option<ClimateReading> {
        let reading = match self.sensor.read().await {
            Ok(reading) => reading,
            Err(e) => {
                warn!(error = %e, "Climate read failed");
                return None;
            }
        };
        debug!(
            temperature = reading.temperature,
            humidity = reading.humidity,
            "Climate sample"
        );

        let fire = self.watch.observe(reading.temperature);
        let fx = self
            .hub
            .state()
            .with_lock(|state| {
                let mut fx = Effects::new();
                fx.set(&mut state.board, ParamKey::Temperature, reading.temperature);
                fx.set(&mut state.board, ParamKey::Humidity, reading.humidity);
                if fire {
                    fx.cue(Cue::Error);
                    fx.alert(
                        &mut state.board,
                        format!("High Temp Alert: {:.1} C", reading.temperature),
                        Delivery::Deferred,
                    );
                }
                fx
            })
            .await;
        self.hub.emit(fx).await;
        Some(reading)
    }

    /// Sample every period, forever.
    pub async fn run(mut self) {
        info!(period_ms = self.period.as_millis() as u64, "Climate monitor started");
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            self.sample().await;
        }
    }
}
