//! Homeguard controller logic.
//!
//! Four loops share one [`SharedState`]:
//!
//! - the [`KeypadInputProcessor`] turns keys into password entry and
//!   appliance toggles,
//! - the [`ProximitySecurityMonitor`] opens the door for a disarmed visitor
//!   and closes (and re-arms) it after ten idle seconds,
//! - the [`ClimateMonitor`] reports temperature and raises the high
//!   temperature alert,
//! - the [`NotificationRelay`] drains deferred alerts.
//!
//! Remote writes enter through [`Hub::handle_remote`].
//!
//! Every transition is a synchronous function over [`HomeState`] that
//! returns [`Effects`]. The hub performs those effects once the lock is
//! released, so a sound or a slow sink never holds up another loop.

pub mod dispatcher;
pub mod effects;
pub mod error;
pub mod hub;
pub mod keypad;
pub mod monitor;
pub mod notify;
pub mod remote;
pub mod security;
pub mod sink;
pub mod state;

pub use dispatcher::Command;
pub use effects::{Alert, Effects};
pub use error::{ControllerError, Result};
pub use hub::{
    Hub, HubConfig, HubHandle, Peripherals, ShutdownReport, TaskTermination, load_master_password,
};
pub use keypad::KeypadInputProcessor;
pub use monitor::{ClimateMonitor, MonitorConfig, ProximitySecurityMonitor, TemperatureWatch};
pub use notify::{Delivery, NotificationRelay, Notifier, PendingNotification};
pub use remote::RemoteCommand;
pub use security::{PasswordOutcome, led_for};
pub use sink::{AlertSink, LogSink, ParamSink, RecordingSink};
pub use state::{DigitOutcome, HomeSnapshot, HomeState, SharedState};
