//! The controller hub.
//!
//! [`Hub`] owns the shared state and every outbound surface (indicator,
//! alert notifier, parameter sink, settings store). It is cheap to clone;
//! each loop gets its own clone.
//!
//! # Lifecycle
//!
//! 1. [`Hub::open`] loads the stored master password and builds the hub
//! 2. [`Hub::start`] spawns the monitor, climate, keypad and relay loops
//! 3. [`HubHandle::shutdown`] stops them and reports how each one ended
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use homeguard_controller::{Hub, HubConfig, LogSink, Peripherals};
//! use homeguard_hardware::mock::{MockClimate, MockKeypad, MockProximity, SimulatedIndicator};
//! use homeguard_storage::MemorySettingsStore;
//!
//! # async fn example() {
//! let (hub, relay) = Hub::open(
//!     SimulatedIndicator::new(),
//!     Arc::new(LogSink),
//!     Arc::new(LogSink),
//!     MemorySettingsStore::new().into(),
//! )
//! .await;
//!
//! let (keypad, _keys) = MockKeypad::new();
//! let (proximity, _distance) = MockProximity::new();
//! let (climate, _climate) = MockClimate::new();
//! let peripherals = Peripherals { keypad, proximity, climate };
//!
//! let handle = hub.start(relay, peripherals, &HubConfig::default()).await;
//! let report = handle.shutdown().await;
//! assert_eq!(report.panics, 0);
//! # }
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use homeguard_core::constants::{CLIMATE_PERIOD_MS, MASTER_PASSWORD_KEY, PASSWORD_INVALID};
use homeguard_core::{MasterPassword, ParamKey, ParamValue, SourceTag};
use homeguard_hardware::{ClimateSensor, Cue, Indicator, KeypadDevice, LedColor, ProximitySensor};
use homeguard_storage::{AnySettingsStore, SettingsStore};
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::dispatcher::{self, Command};
use crate::effects::Effects;
use crate::error::Result;
use crate::keypad::KeypadInputProcessor;
use crate::monitor::{ClimateMonitor, MonitorConfig, ProximitySecurityMonitor};
use crate::notify::{NotificationRelay, Notifier};
use crate::remote::RemoteCommand;
use crate::security::led_for;
use crate::sink::{AlertSink, ParamSink};
use crate::state::SharedState;

/// Loop timing.
#[derive(Debug, Clone, PartialEq)]
pub struct HubConfig {
    pub monitor: MonitorConfig,
    pub climate_period: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            climate_period: Duration::from_millis(CLIMATE_PERIOD_MS),
        }
    }
}

/// Peripherals driven by the hub's loops.
#[derive(Debug)]
pub struct Peripherals<K, P, C> {
    pub keypad: K,
    pub proximity: P,
    pub climate: C,
}

/// Load the master password from the store.
///
/// Returns `fallback` when nothing is stored, the stored value is
/// malformed, or the store fails.
pub async fn load_master_password<S: SettingsStore>(
    store: &S,
    fallback: MasterPassword,
) -> MasterPassword {
    match store.load(MASTER_PASSWORD_KEY).await {
        Ok(Some(stored)) => MasterPassword::new(&stored).unwrap_or_else(|e| {
            warn!(error = %e, "Stored master password is malformed, using default");
            fallback
        }),
        Ok(None) => {
            info!("No stored master password, using default");
            fallback
        }
        Err(e) => {
            warn!(error = %e, "Failed to load master password, using default");
            fallback
        }
    }
}

/// Shared controller context.
pub struct Hub<I> {
    state: Arc<SharedState>,
    indicator: Arc<I>,
    notifier: Notifier,
    params: Arc<dyn ParamSink>,
    store: AnySettingsStore,
    animations: Arc<AtomicUsize>,
}

impl<I> Clone for Hub<I> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            indicator: Arc::clone(&self.indicator),
            notifier: self.notifier.clone(),
            params: Arc::clone(&self.params),
            store: self.store.clone(),
            animations: Arc::clone(&self.animations),
        }
    }
}

impl<I: Indicator> Hub<I> {
    /// Build a hub around an already loaded master password.
    pub fn new(
        indicator: I,
        alerts: Arc<dyn AlertSink>,
        params: Arc<dyn ParamSink>,
        store: AnySettingsStore,
        master_password: MasterPassword,
    ) -> (Self, NotificationRelay) {
        let (notifier, relay) = Notifier::new(alerts);
        let hub = Self {
            state: Arc::new(SharedState::new(master_password)),
            indicator: Arc::new(indicator),
            notifier,
            params,
            store,
            animations: Arc::new(AtomicUsize::new(0)),
        };
        (hub, relay)
    }

    /// Build a hub, loading the master password from `store`.
    pub async fn open(
        indicator: I,
        alerts: Arc<dyn AlertSink>,
        params: Arc<dyn ParamSink>,
        store: AnySettingsStore,
    ) -> (Self, NotificationRelay) {
        let password = load_master_password(&store, MasterPassword::default()).await;
        Self::new(indicator, alerts, params, store, password)
    }

    pub fn state(&self) -> &Arc<SharedState> {
        &self.state
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Whether an LED animation currently owns the status LED.
    pub fn is_animating(&self) -> bool {
        self.animations.load(Ordering::Acquire) > 0
    }

    /// Set the status LED unless an animation is running.
    pub fn show_led(&self, color: LedColor) {
        if !self.is_animating() {
            self.indicator.set_led(color);
        }
    }

    /// Play one cue. LED animations take the status LED for their duration
    /// and hand it back showing the current security state.
    pub async fn play(&self, cue: Cue) {
        if !cue.uses_led() {
            self.indicator.play(cue).await;
            return;
        }

        let animation = AnimationGuard::start(&self.animations);
        self.indicator.play(cue).await;
        drop(animation);

        // Overlapping animations hand the LED back when the last one ends.
        if self.is_animating() {
            return;
        }
        let led = self
            .state
            .with_lock(|state| led_for(state.security.armed, state.security.door_open))
            .await;
        self.show_led(led);
    }

    /// Perform the effects of a transition. Must be called with the state
    /// lock released.
    pub async fn emit(&self, fx: Effects) {
        let Effects {
            updates,
            cues,
            alerts,
            persist_password,
        } = fx;

        if let Some(password) = persist_password {
            match self.store.save(MASTER_PASSWORD_KEY, password.as_str()).await {
                Ok(()) => debug!("Master password saved"),
                Err(e) => warn!(error = %e, "Failed to save master password"),
            }
        }
        for update in &updates {
            self.params.publish(update);
        }
        for alert in alerts {
            self.notifier.report(&alert.message, alert.delivery).await;
        }
        for cue in cues {
            self.play(cue).await;
        }
    }

    /// Run a command and perform its effects. Returns the effects' parameter
    /// updates.
    pub async fn execute(&self, command: Command, source: SourceTag) -> Vec<homeguard_core::ParamUpdate> {
        let fx = self
            .state
            .with_lock(|state| dispatcher::apply(state, command, source))
            .await;
        let updates = fx.updates.clone();
        self.emit(fx).await;
        updates
    }

    /// Handle a remote write and return the acknowledged value.
    ///
    /// Power and speed writes echo the written value. Password writes
    /// acknowledge `Updated` or `Invalid`. Unrecognized writes are echoed
    /// without effect.
    ///
    /// # Errors
    ///
    /// Returns the decode error for malformed command values; state is not
    /// touched in that case.
    pub async fn handle_remote(
        &self,
        device: &str,
        param: &str,
        value: ParamValue,
    ) -> homeguard_core::Result<ParamValue> {
        let command = RemoteCommand::parse(device, param, &value)?;
        let Some(command) = command.into_command() else {
            debug!(device, param, "Remote write passed through");
            return Ok(value);
        };

        info!(device, param, command = command.kind(), "Remote command");
        let is_password = matches!(command, Command::SetMasterPassword(_));
        let updates = self.execute(command, SourceTag::App).await;
        if !is_password {
            return Ok(value);
        }
        let ack = updates
            .into_iter()
            .rev()
            .find(|update| update.key == ParamKey::SetPassword)
            .map(|update| update.value)
            .unwrap_or_else(|| ParamValue::from(PASSWORD_INVALID));
        Ok(ack)
    }

    /// Publish every parameter's current value.
    pub async fn report_all(&self) {
        let (updates, led) = self
            .state
            .with_lock(|state| {
                (
                    state.board.updates(),
                    led_for(state.security.armed, state.security.door_open),
                )
            })
            .await;
        for update in &updates {
            self.params.publish(update);
        }
        self.show_led(led);
    }

    /// Spawn the controller loops.
    pub async fn start<K, P, C>(
        &self,
        relay: NotificationRelay,
        peripherals: Peripherals<K, P, C>,
        config: &HubConfig,
    ) -> HubHandle
    where
        K: KeypadDevice + 'static,
        P: ProximitySensor + 'static,
        C: ClimateSensor + 'static,
    {
        self.report_all().await;

        let mut tasks = JoinSet::new();

        let monitor =
            ProximitySecurityMonitor::new(peripherals.proximity, self.clone(), config.monitor.clone());
        tasks.spawn(async move {
            monitor.run().await;
            Ok(())
        });

        let climate =
            ClimateMonitor::new(peripherals.climate, self.clone()).with_period(config.climate_period);
        tasks.spawn(async move {
            climate.run().await;
            Ok(())
        });

        tasks.spawn(KeypadInputProcessor::new(peripherals.keypad, self.clone()).run());

        tasks.spawn(async move {
            relay.run().await;
            Ok(())
        });

        info!(tasks = tasks.len(), "Hub started");
        HubHandle { tasks }
    }
}

/// Counts one running LED animation for as long as it is alive, so a
/// cancelled `play` still releases the LED.
struct AnimationGuard {
    animations: Arc<AtomicUsize>,
}

impl AnimationGuard {
    fn start(animations: &Arc<AtomicUsize>) -> Self {
        animations.fetch_add(1, Ordering::AcqRel);
        Self {
            animations: Arc::clone(animations),
        }
    }
}

impl Drop for AnimationGuard {
    fn drop(&mut self) {
        self.animations.fetch_sub(1, Ordering::AcqRel);
    }
}

/// How a hub task ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskTermination {
    Success,
    Error,
    /// Aborted, the normal end during shutdown.
    Cancelled,
    Panic,
}

/// Counts of abnormal task ends seen during shutdown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub errors: usize,
    pub panics: usize,
}

/// Handle to the running hub loops.
#[derive(Debug)]
pub struct HubHandle {
    tasks: JoinSet<Result<()>>,
}

impl HubHandle {
    /// Number of loops still running.
    pub fn running(&self) -> usize {
        self.tasks.len()
    }

    /// Wait for the next loop to end.
    pub async fn join_next(&mut self) -> Option<TaskTermination> {
        let result = self.tasks.join_next().await?;
        Some(Self::classify_task_result(result))
    }

    /// Abort every loop and wait for them to finish.
    pub async fn shutdown(mut self) -> ShutdownReport {
        self.tasks.abort_all();

        let mut report = ShutdownReport::default();
        while let Some(result) = self.tasks.join_next().await {
            match Self::classify_task_result(result) {
                TaskTermination::Success | TaskTermination::Cancelled => {}
                TaskTermination::Error => report.errors += 1,
                TaskTermination::Panic => report.panics += 1,
            }
        }

        info!(errors = report.errors, panics = report.panics, "Hub stopped");
        report
    }

    fn classify_task_result(
        result: std::result::Result<Result<()>, tokio::task::JoinError>,
    ) -> TaskTermination {
        match result {
            Ok(Ok(())) => TaskTermination::Success,
            Ok(Err(e)) => {
                error!(error = %e, "Hub task failed");
                TaskTermination::Error
            }
            Err(e) if e.is_cancelled() => TaskTermination::Cancelled,
            Err(e) => {
                error!(error = %e, "Hub task panicked");
                TaskTermination::Panic
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::RecordingSink;
    use homeguard_core::constants::DEFAULT_PASSWORD;
    use homeguard_hardware::mock::{RecordingIndicator, SimulatedIndicator};
    use homeguard_storage::MemorySettingsStore;

    async fn hub() -> (Hub<RecordingIndicator>, NotificationRelay, RecordingIndicator, RecordingSink) {
        let indicator = RecordingIndicator::new();
        let sink = RecordingSink::new();
        let (hub, relay) = Hub::open(
            indicator.clone(),
            Arc::new(sink.clone()),
            Arc::new(sink.clone()),
            MemorySettingsStore::new().into(),
        )
        .await;
        (hub, relay, indicator, sink)
    }

    #[tokio::test]
    async fn test_load_master_password_fallbacks() {
        let store = MemorySettingsStore::new();
        let fallback = MasterPassword::default;
        assert!(load_master_password(&store, fallback()).await.matches(DEFAULT_PASSWORD));

        let custom = MasterPassword::new("1357").unwrap();
        assert!(load_master_password(&store, custom).await.matches("1357"));

        store.save(MASTER_PASSWORD_KEY, "").await.unwrap();
        assert!(load_master_password(&store, fallback()).await.matches(DEFAULT_PASSWORD));

        store.save(MASTER_PASSWORD_KEY, "7777").await.unwrap();
        assert!(load_master_password(&store, fallback()).await.matches("7777"));
    }

    #[tokio::test]
    async fn test_on_sequence_restores_led() {
        let (hub, _relay, indicator, _sink) = hub().await;

        hub.play(Cue::OnSequence).await;

        assert!(!hub.is_animating());
        assert_eq!(indicator.cues(), vec![Cue::OnSequence]);
        assert_eq!(indicator.last_led(), Some(LedColor::Red));
    }

    #[tokio::test]
    async fn test_show_led_suppressed_while_animating() {
        let (hub, _relay, indicator, _sink) = hub().await;

        let animation = AnimationGuard::start(&hub.animations);
        hub.show_led(LedColor::Green);
        assert!(indicator.leds().is_empty());

        drop(animation);
        hub.show_led(LedColor::Green);
        assert_eq!(indicator.leds(), vec![LedColor::Green]);
    }

    async fn simulated_hub() -> Hub<SimulatedIndicator> {
        let (hub, _relay) = Hub::open(
            SimulatedIndicator::new(),
            Arc::new(RecordingSink::new()),
            Arc::new(RecordingSink::new()),
            MemorySettingsStore::new().into(),
        )
        .await;
        hub
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_on_sequences_keep_led() {
        let hub = simulated_hub().await;
        let sequence = Cue::OnSequence.duration();

        let first = tokio::spawn({
            let hub = hub.clone();
            async move { hub.play(Cue::OnSequence).await }
        });
        tokio::time::sleep(Duration::from_millis(400)).await;
        let second = tokio::spawn({
            let hub = hub.clone();
            async move { hub.play(Cue::OnSequence).await }
        });

        first.await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(hub.is_animating(), "second sequence still owns the LED");

        tokio::time::sleep(sequence).await;
        second.await.unwrap();
        assert!(!hub.is_animating());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_animation_releases_led() {
        let hub = simulated_hub().await;

        let playing = tokio::spawn({
            let hub = hub.clone();
            async move { hub.play(Cue::OnSequence).await }
        });
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(hub.is_animating());

        playing.abort();
        assert!(playing.await.unwrap_err().is_cancelled());
        assert!(!hub.is_animating());
    }

    #[tokio::test]
    async fn test_remote_password_ack_and_persist() {
        let (hub, _relay, _indicator, sink) = hub().await;

        let ack = hub
            .handle_remote("Security", "Set Password", ParamValue::from("1357"))
            .await
            .unwrap();
        assert_eq!(ack, ParamValue::from("Updated"));
        assert_eq!(
            hub.store.load(MASTER_PASSWORD_KEY).await.unwrap(),
            Some("1357".to_string())
        );
        assert_eq!(sink.alerts(), vec!["Security Password Changed via App"]);

        let ack = hub
            .handle_remote("Security", "Set Password", ParamValue::from(""))
            .await
            .unwrap();
        assert_eq!(ack, ParamValue::from("Invalid"));
        assert_eq!(
            hub.store.load(MASTER_PASSWORD_KEY).await.unwrap(),
            Some("1357".to_string())
        );
    }

    #[tokio::test]
    async fn test_remote_pass_through_echoes() {
        let (hub, _relay, indicator, sink) = hub().await;

        let ack = hub
            .handle_remote("Home", "Temperature", ParamValue::Float(99.0))
            .await
            .unwrap();
        assert_eq!(ack, ParamValue::Float(99.0));
        assert!(sink.params().is_empty());
        assert!(indicator.cues().is_empty());
    }

    #[tokio::test]
    async fn test_remote_rejects_bad_speed_without_change() {
        let (hub, _relay, _indicator, _sink) = hub().await;

        let err = hub
            .handle_remote("Fan", "Speed", ParamValue::Int(9))
            .await
            .unwrap_err();
        assert_eq!(err, homeguard_core::Error::InvalidFanSpeed(9));
        assert_eq!(hub.state().snapshot().await.fan_speed, 0);
    }

    #[tokio::test]
    async fn test_report_all_publishes_board() {
        let (hub, _relay, indicator, sink) = hub().await;
        hub.report_all().await;

        assert_eq!(sink.params().len(), ParamKey::ALL.len());
        assert_eq!(indicator.last_led(), Some(LedColor::Red));
    }
}
