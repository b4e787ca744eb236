//! Shared home state.
//!
//! Every loop (keypad, proximity, climate, remote) mutates the same
//! [`HomeState`] through one [`SharedState`] lock. Transitions run inside
//! [`SharedState::with_lock`] and return [`Effects`](crate::effects::Effects);
//! sounds and notifications are produced only after the lock is released.

use std::collections::BTreeMap;

use homeguard_core::constants::{
    DOOR_CLOSED, MODE_LOCKED, PASSWORD_BUFFER_LEN, STATUS_DOOR_LOCKED, SUMMARY_OFF, SYSTEM_OK,
};
use homeguard_core::{Device, FanSpeed, MasterPassword, ParamKey, ParamUpdate, ParamValue};
use serde::Serialize;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Result of pushing a digit into the password buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigitOutcome {
    Accepted,
    /// Buffer already held four digits.
    Dropped,
}

/// Security half of the home state.
#[derive(Debug)]
pub struct SecurityState {
    pub armed: bool,
    pub door_open: bool,
    /// Last time presence was seen while the door was open.
    pub last_proximity: Instant,
    password_buffer: String,
    master_password: MasterPassword,
}

impl SecurityState {
    /// Boot state: armed, door closed, empty buffer.
    pub fn new(master_password: MasterPassword) -> Self {
        Self {
            armed: true,
            door_open: false,
            last_proximity: Instant::now(),
            password_buffer: String::with_capacity(PASSWORD_BUFFER_LEN),
            master_password,
        }
    }

    /// Append a digit unless the buffer is full.
    pub fn push_digit(&mut self, digit: u8) -> DigitOutcome {
        if self.password_buffer.len() >= PASSWORD_BUFFER_LEN || digit > 9 {
            return DigitOutcome::Dropped;
        }
        self.password_buffer.push(char::from(b'0' + digit));
        DigitOutcome::Accepted
    }

    pub fn clear_buffer(&mut self) {
        self.password_buffer.clear();
    }

    /// Take the entered code, leaving the buffer empty.
    pub fn take_buffer(&mut self) -> String {
        std::mem::take(&mut self.password_buffer)
    }

    pub fn buffer_len(&self) -> usize {
        self.password_buffer.len()
    }

    pub fn master_password(&self) -> &MasterPassword {
        &self.master_password
    }

    pub fn set_master_password(&mut self, password: MasterPassword) {
        self.master_password = password;
    }
}

/// Fan state. Power is derived from the speed, so a powered-off fan always
/// reports speed 0 and a non-zero speed always means powered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanState {
    speed: FanSpeed,
}

impl FanState {
    pub fn power(&self) -> bool {
        !self.speed.is_off()
    }

    pub fn speed(&self) -> FanSpeed {
        self.speed
    }

    pub fn set_speed(&mut self, speed: FanSpeed) {
        self.speed = speed;
    }
}

/// Appliance power flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeviceState {
    pub fan: FanState,
    pub light: bool,
    pub tv: bool,
    pub plug: bool,
}

impl DeviceState {
    /// Power flag of any device. `Security` is never "powered".
    pub fn power(&self, device: Device) -> bool {
        match device {
            Device::Fan => self.fan.power(),
            Device::Light => self.light,
            Device::Tv => self.tv,
            Device::Plug => self.plug,
            Device::Security => false,
        }
    }

    /// Set the power flag of a switched appliance. Fan power goes through
    /// the fan speed instead and is ignored here.
    pub fn set_switch(&mut self, device: Device, on: bool) {
        match device {
            Device::Light => self.light = on,
            Device::Tv => self.tv = on,
            Device::Plug => self.plug = on,
            Device::Fan | Device::Security => {}
        }
    }
}

/// Last reported value of every parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusBoard {
    values: BTreeMap<ParamKey, ParamValue>,
}

impl StatusBoard {
    /// Record a value and return the update to publish.
    pub fn set(&mut self, key: ParamKey, value: impl Into<ParamValue>) -> ParamUpdate {
        let update = ParamUpdate::new(key, value);
        self.values.insert(key, update.value.clone());
        update
    }

    pub fn get(&self, key: ParamKey) -> Option<&ParamValue> {
        self.values.get(&key)
    }

    /// All parameters in key order, for an initial full report.
    pub fn updates(&self) -> Vec<ParamUpdate> {
        self.values
            .iter()
            .map(|(key, value)| ParamUpdate::new(*key, value.clone()))
            .collect()
    }
}

impl Default for StatusBoard {
    fn default() -> Self {
        let mut values = BTreeMap::new();
        values.insert(ParamKey::Temperature, ParamValue::Float(0.0));
        values.insert(ParamKey::Humidity, ParamValue::Float(0.0));
        values.insert(ParamKey::SystemAlert, SYSTEM_OK.into());
        for device in Device::APPLIANCES {
            values.insert(ParamKey::summary(device), SUMMARY_OFF.into());
        }
        values.insert(ParamKey::HomeDoor, DOOR_CLOSED.into());
        values.insert(ParamKey::HomeSecurity, MODE_LOCKED.into());
        values.insert(ParamKey::DoorOpen, false.into());
        values.insert(ParamKey::SecurityStatus, STATUS_DOOR_LOCKED.into());
        values.insert(ParamKey::SetPassword, "".into());
        values.insert(ParamKey::FanSpeed, FanSpeed::OFF.into());
        values.insert(ParamKey::FanStatus, FanSpeed::OFF.status_text().into());
        for device in Device::APPLIANCES {
            if let Some(power) = ParamKey::power(device) {
                values.insert(power, false.into());
            }
        }
        for device in [Device::Light, Device::Tv, Device::Plug] {
            values.insert(
                ParamKey::status(device),
                format!("{} Off", device.name()).into(),
            );
        }

        Self { values }
    }
}

/// Everything guarded by the shared lock.
#[derive(Debug)]
pub struct HomeState {
    pub security: SecurityState,
    pub devices: DeviceState,
    pub board: StatusBoard,
}

impl HomeState {
    pub fn new(master_password: MasterPassword) -> Self {
        Self {
            security: SecurityState::new(master_password),
            devices: DeviceState::default(),
            board: StatusBoard::default(),
        }
    }

    pub fn snapshot(&self) -> HomeSnapshot {
        HomeSnapshot {
            armed: self.security.armed,
            door_open: self.security.door_open,
            entered_digits: self.security.buffer_len(),
            fan_power: self.devices.fan.power(),
            fan_speed: self.devices.fan.speed().get(),
            light: self.devices.light,
            tv: self.devices.tv,
            plug: self.devices.plug,
        }
    }
}

/// Point-in-time copy of the functional state, without the password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HomeSnapshot {
    pub armed: bool,
    pub door_open: bool,
    pub entered_digits: usize,
    pub fan_power: bool,
    pub fan_speed: u8,
    pub light: bool,
    pub tv: bool,
    pub plug: bool,
}

/// The single lock over [`HomeState`].
#[derive(Debug)]
pub struct SharedState {
    inner: Mutex<HomeState>,
}

impl SharedState {
    pub fn new(master_password: MasterPassword) -> Self {
        Self {
            inner: Mutex::new(HomeState::new(master_password)),
        }
    }

    /// Run `f` with exclusive access to the state.
    ///
    /// `f` is synchronous, so the lock can never be held across an await
    /// point: a transition cannot wait on a sound or a notification.
    pub async fn with_lock<R>(&self, f: impl FnOnce(&mut HomeState) -> R) -> R {
        let mut state = self.inner.lock().await;
        f(&mut state)
    }

    pub async fn snapshot(&self) -> HomeSnapshot {
        self.with_lock(|state| state.snapshot()).await
    }

    /// Current value of one parameter.
    pub async fn param(&self, key: ParamKey) -> Option<ParamValue> {
        self.with_lock(|state| state.board.get(key).cloned()).await
    }
}
