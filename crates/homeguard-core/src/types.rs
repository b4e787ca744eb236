use crate::{
    Result,
    constants::{DEFAULT_PASSWORD, MAX_FAN_SPEED, MAX_PASSWORD_LEN},
    error::Error,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Controllable device.
///
/// Commands are addressed to one of these variants; device names only
/// exist at the remote boundary where [`Device::from_str`](std::str::FromStr)
/// turns them into a variant once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Device {
    Fan,
    Light,
    #[serde(rename = "TV")]
    Tv,
    Plug,
    Security,
}

impl Device {
    /// Appliances that carry a power flag.
    pub const APPLIANCES: [Device; 4] = [Device::Fan, Device::Light, Device::Tv, Device::Plug];

    /// Name used in status text, alerts and on the remote channel.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Device::Fan => "Fan",
            Device::Light => "Light",
            Device::Tv => "TV",
            Device::Plug => "Plug",
            Device::Security => "Security",
        }
    }

    /// Whether this device has a power flag.
    #[must_use]
    pub fn is_appliance(&self) -> bool {
        !matches!(self, Device::Security)
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for Device {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Fan" => Ok(Device::Fan),
            "Light" => Ok(Device::Light),
            "TV" => Ok(Device::Tv),
            "Plug" => Ok(Device::Plug),
            "Security" => Ok(Device::Security),
            other => Err(Error::UnknownDevice(other.to_string())),
        }
    }
}

/// Where a command came from. Only affects alert wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceTag {
    Keypad,
    App,
}

impl SourceTag {
    /// Suffix appended to alert messages, e.g. `"via Keypad"`.
    #[must_use]
    pub fn suffix(&self) -> &'static str {
        match self {
            SourceTag::Keypad => "via Keypad",
            SourceTag::App => "via App",
        }
    }
}

impl fmt::Display for SourceTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SourceTag::Keypad => f.write_str("Keypad"),
            SourceTag::App => f.write_str("App"),
        }
    }
}

/// Fan speed step (0-5). Zero means the fan is off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct FanSpeed(u8);

impl FanSpeed {
    pub const OFF: FanSpeed = FanSpeed(0);
    pub const LOW: FanSpeed = FanSpeed(1);

    /// Create a fan speed with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidFanSpeed` if `speed` is outside 0-5.
    pub fn new(speed: i64) -> Result<Self> {
        if !(0..=i64::from(MAX_FAN_SPEED)).contains(&speed) {
            return Err(Error::InvalidFanSpeed(speed));
        }
        Ok(FanSpeed(speed as u8))
    }

    /// Get the raw step.
    #[must_use]
    pub fn get(&self) -> u8 {
        self.0
    }

    #[must_use]
    pub fn is_off(&self) -> bool {
        self.0 == 0
    }

    /// Next step in the keypad cycle `0→1→…→5→0`.
    #[must_use]
    pub fn next(&self) -> FanSpeed {
        if self.0 >= MAX_FAN_SPEED {
            FanSpeed::OFF
        } else {
            FanSpeed(self.0 + 1)
        }
    }

    /// Derived status text: `"Fan Off"` or `"Fan Speed {n}"`.
    #[must_use]
    pub fn status_text(&self) -> String {
        if self.is_off() {
            "Fan Off".to_string()
        } else {
            format!("Fan Speed {}", self.0)
        }
    }
}

impl fmt::Display for FanSpeed {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared master password (1-15 characters).
///
/// # Security
/// Comparison against keypad input is constant-time and the value is
/// redacted from `Debug` output.
#[derive(Clone, Eq)]
pub struct MasterPassword(String);

impl MasterPassword {
    /// Create a master password with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidPasswordFormat` if the password is empty or
    /// longer than 15 bytes of UTF-8.
    pub fn new(password: &str) -> Result<Self> {
        let len = password.len();
        if len == 0 || len > MAX_PASSWORD_LEN {
            return Err(Error::InvalidPasswordFormat {
                len,
                max: MAX_PASSWORD_LEN,
            });
        }
        Ok(MasterPassword(password.to_string()))
    }

    /// Exact, constant-time match against an entered code.
    #[must_use]
    pub fn matches(&self, entered: &str) -> bool {
        self.0.as_bytes().ct_eq(entered.as_bytes()).into()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for MasterPassword {
    /// The factory password, `2580`.
    fn default() -> Self {
        MasterPassword(DEFAULT_PASSWORD.to_string())
    }
}

impl PartialEq for MasterPassword {
    fn eq(&self, other: &Self) -> bool {
        self.matches(&other.0)
    }
}

impl fmt::Debug for MasterPassword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("MasterPassword(****)")
    }
}

impl std::str::FromStr for MasterPassword {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        MasterPassword::new(s)
    }
}

/// Reported parameter.
///
/// Each key belongs to a remote-visible device (`Home`, `Security`, `Fan`,
/// `Light`, `TV`, `Plug`) and carries a parameter name within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParamKey {
    // Home summary
    Temperature,
    Humidity,
    SystemAlert,
    HomeFan,
    HomeLight,
    HomeTv,
    HomePlug,
    HomeDoor,
    HomeSecurity,

    // Security
    DoorOpen,
    SecurityStatus,
    SetPassword,

    // Appliances
    FanPower,
    FanSpeed,
    FanStatus,
    LightPower,
    LightStatus,
    TvPower,
    TvStatus,
    PlugPower,
    PlugStatus,
}

impl ParamKey {
    pub const ALL: [ParamKey; 21] = [
        ParamKey::Temperature,
        ParamKey::Humidity,
        ParamKey::SystemAlert,
        ParamKey::HomeFan,
        ParamKey::HomeLight,
        ParamKey::HomeTv,
        ParamKey::HomePlug,
        ParamKey::HomeDoor,
        ParamKey::HomeSecurity,
        ParamKey::DoorOpen,
        ParamKey::SecurityStatus,
        ParamKey::SetPassword,
        ParamKey::FanPower,
        ParamKey::FanSpeed,
        ParamKey::FanStatus,
        ParamKey::LightPower,
        ParamKey::LightStatus,
        ParamKey::TvPower,
        ParamKey::TvStatus,
        ParamKey::PlugPower,
        ParamKey::PlugStatus,
    ];

    /// Remote-visible device name the parameter is attached to.
    #[must_use]
    pub fn device_name(&self) -> &'static str {
        use ParamKey::*;
        match self {
            Temperature | Humidity | SystemAlert | HomeFan | HomeLight | HomeTv | HomePlug
            | HomeDoor | HomeSecurity => "Home",
            DoorOpen | SecurityStatus | SetPassword => "Security",
            FanPower | FanSpeed | FanStatus => "Fan",
            LightPower | LightStatus => "Light",
            TvPower | TvStatus => "TV",
            PlugPower | PlugStatus => "Plug",
        }
    }

    /// Parameter name within its device.
    #[must_use]
    pub fn param_name(&self) -> &'static str {
        use ParamKey::*;
        match self {
            Temperature => "Temperature",
            Humidity => "Humidity",
            SystemAlert => "System Alert",
            HomeFan => "Fan Status",
            HomeLight => "Light Status",
            HomeTv => "TV Status",
            HomePlug => "Plug Status",
            HomeDoor => "Door Status",
            HomeSecurity => "Security Mode",
            DoorOpen => "Door",
            SecurityStatus => "Status",
            SetPassword => "Set Password",
            FanPower | LightPower | TvPower | PlugPower => "Power",
            FanSpeed => "Speed",
            FanStatus | LightStatus | TvStatus | PlugStatus => "Status",
        }
    }

    /// Find a parameter by its remote names.
    #[must_use]
    pub fn lookup(device: &str, param: &str) -> Option<ParamKey> {
        ParamKey::ALL
            .into_iter()
            .find(|key| key.device_name() == device && key.param_name() == param)
    }

    /// Power parameter of an appliance.
    #[must_use]
    pub fn power(device: Device) -> Option<ParamKey> {
        match device {
            Device::Fan => Some(ParamKey::FanPower),
            Device::Light => Some(ParamKey::LightPower),
            Device::Tv => Some(ParamKey::TvPower),
            Device::Plug => Some(ParamKey::PlugPower),
            Device::Security => None,
        }
    }

    /// Device-specific status parameter.
    #[must_use]
    pub fn status(device: Device) -> ParamKey {
        match device {
            Device::Fan => ParamKey::FanStatus,
            Device::Light => ParamKey::LightStatus,
            Device::Tv => ParamKey::TvStatus,
            Device::Plug => ParamKey::PlugStatus,
            Device::Security => ParamKey::SecurityStatus,
        }
    }

    /// Home summary parameter mirroring a device's status.
    #[must_use]
    pub fn summary(device: Device) -> ParamKey {
        match device {
            Device::Fan => ParamKey::HomeFan,
            Device::Light => ParamKey::HomeLight,
            Device::Tv => ParamKey::HomeTv,
            Device::Plug => ParamKey::HomePlug,
            Device::Security => ParamKey::HomeSecurity,
        }
    }
}

impl fmt::Display for ParamKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}/{}", self.device_name(), self.param_name())
    }
}

/// Parameter value as carried on the remote channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            ParamValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(i) => write!(f, "{i}"),
            ParamValue::Float(v) => write!(f, "{v:.1}"),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<FanSpeed> for ParamValue {
    fn from(value: FanSpeed) -> Self {
        ParamValue::Int(i64::from(value.get()))
    }
}

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        ParamValue::Float(f64::from(value))
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

/// A single parameter write-back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamUpdate {
    pub key: ParamKey,
    pub value: ParamValue,
}

impl ParamUpdate {
    pub fn new(key: ParamKey, value: impl Into<ParamValue>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}
