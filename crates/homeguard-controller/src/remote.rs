//! Remote command decoding.
//!
//! The remote channel addresses parameters by `(device, param)` name pairs.
//! Three parameter names are commands: `Power`, `Speed` (fan only) and
//! `Set Password`. Everything else is acknowledged without effect.

use homeguard_core::{Device, Error, FanSpeed, ParamKey, ParamValue, Result};

use crate::dispatcher::Command;

/// Accepted on any device name.
pub const PARAM_SET_PASSWORD: &str = "Set Password";

/// A decoded remote write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    Power { device: Device, on: bool },
    Speed(FanSpeed),
    SetPassword(String),
    /// Recognized nowhere; echoed back unchanged.
    PassThrough,
}

impl RemoteCommand {
    /// Decode a `(device, param, value)` write.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidValue` when a command parameter carries the
    /// wrong value type, and `Error::InvalidFanSpeed` for a speed outside
    /// 0-5.
    pub fn parse(device: &str, param: &str, value: &ParamValue) -> Result<Self> {
        if param == PARAM_SET_PASSWORD {
            let password = value.as_str().ok_or_else(|| invalid(param, "string"))?;
            return Ok(RemoteCommand::SetPassword(password.to_string()));
        }

        let Some(key) = ParamKey::lookup(device, param) else {
            return Ok(RemoteCommand::PassThrough);
        };
        if key == ParamKey::FanSpeed {
            let speed = value
                .as_int()
                .ok_or_else(|| invalid(param, "integer 0-5"))?;
            return Ok(RemoteCommand::Speed(FanSpeed::new(speed)?));
        }
        match Device::APPLIANCES
            .into_iter()
            .find(|appliance| ParamKey::power(*appliance) == Some(key))
        {
            Some(device) => {
                let on = value.as_bool().ok_or_else(|| invalid(param, "bool"))?;
                Ok(RemoteCommand::Power { device, on })
            }
            None => Ok(RemoteCommand::PassThrough),
        }
    }

    /// The dispatcher command to run, `None` for a pass-through.
    pub fn into_command(self) -> Option<Command> {
        match self {
            RemoteCommand::Power { device, on } => Some(Command::SetPower { device, on }),
            RemoteCommand::Speed(speed) => Some(Command::SetFanSpeed(speed)),
            RemoteCommand::SetPassword(password) => Some(Command::SetMasterPassword(password)),
            RemoteCommand::PassThrough => None,
        }
    }
}

fn invalid(param: &str, expected: &'static str) -> Error {
    Error::InvalidValue {
        param: param.to_string(),
        expected,
    }
}
