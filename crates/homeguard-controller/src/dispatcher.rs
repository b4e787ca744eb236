//! Appliance commands.
//!
//! Keypad and remote commands funnel into the same transitions here, so the
//! fan, light, TV and plug behave identically whatever the source. Each
//! function mutates [`HomeState`] and returns the [`Effects`] to perform;
//! none of them block or touch a peripheral.
//!
//! Commands are not gated by the security mode: appliances stay usable
//! while the system is armed.

use homeguard_core::constants::{PASSWORD_INVALID, PASSWORD_UPDATED, SUMMARY_OFF, SUMMARY_ON};
use homeguard_core::{Device, FanSpeed, MasterPassword, ParamKey, SourceTag};
use homeguard_hardware::Cue;
use tracing::{debug, info, warn};

use crate::effects::Effects;
use crate::notify::Delivery;
use crate::state::HomeState;

/// A device command, from either the keypad or the remote channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetFanSpeed(FanSpeed),
    SetPower { device: Device, on: bool },
    SetMasterPassword(String),
    /// Step the fan speed `0→1→…→5→0`.
    CycleFan,
    /// Flip an appliance's power.
    Toggle(Device),
}

impl Command {
    /// Short name for logging. Never includes a password.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::SetFanSpeed(_) => "set_fan_speed",
            Command::SetPower { .. } => "set_power",
            Command::SetMasterPassword(_) => "set_master_password",
            Command::CycleFan => "cycle_fan",
            Command::Toggle(_) => "toggle",
        }
    }
}

/// Apply a command to the state.
pub fn apply(state: &mut HomeState, command: Command, source: SourceTag) -> Effects {
    debug!(command = command.kind(), %source, "Applying command");
    match command {
        Command::SetFanSpeed(speed) => set_fan_speed(state, speed, source),
        Command::SetPower { device, on } => set_power(state, device, on, source),
        Command::SetMasterPassword(candidate) => set_master_password(state, &candidate, source),
        Command::CycleFan => cycle_fan(state, source),
        Command::Toggle(device) => toggle(state, device, source),
    }
}

/// Set the fan speed. Speed 0 turns the fan off.
pub fn set_fan_speed(state: &mut HomeState, speed: FanSpeed, source: SourceTag) -> Effects {
    state.devices.fan.set_speed(speed);

    let mut fx = Effects::new();
    report_fan(state, &mut fx);
    fx.cue(Cue::FanSpeed(speed.get()));

    let message = if speed.is_off() {
        format!("Fan Turned OFF {}", source.suffix())
    } else {
        format!("Fan Speed Changed {}", source.suffix())
    };
    fx.alert(&mut state.board, message, Delivery::Immediate);
    fx
}

/// Switch the fan on or off.
///
/// Turning on a stopped fan selects speed 1; turning it on again keeps the
/// current speed. Off always forces speed 0.
pub fn set_fan_power(state: &mut HomeState, on: bool, source: SourceTag) -> Effects {
    let was_on = state.devices.fan.power();
    let speed = match (on, state.devices.fan.speed()) {
        (false, _) => FanSpeed::OFF,
        (true, current) if current.is_off() => FanSpeed::LOW,
        (true, current) => current,
    };
    state.devices.fan.set_speed(speed);

    let mut fx = Effects::new();
    report_fan(state, &mut fx);
    if on && !was_on {
        fx.cue(Cue::DeviceOn(Device::Fan));
        fx.cue(Cue::OnSequence);
    } else {
        fx.cue(Cue::FanSpeed(speed.get()));
    }

    let message = format!(
        "Fan Turned {} {}",
        if on { "ON" } else { "OFF" },
        source.suffix()
    );
    fx.alert(&mut state.board, message, Delivery::Immediate);
    fx
}

fn report_fan(state: &mut HomeState, fx: &mut Effects) {
    let fan = state.devices.fan;
    let text = fan.speed().status_text();
    fx.set(&mut state.board, ParamKey::FanPower, fan.power());
    fx.set(&mut state.board, ParamKey::FanSpeed, fan.speed());
    fx.set(&mut state.board, ParamKey::FanStatus, text.clone());
    fx.set(&mut state.board, ParamKey::HomeFan, text);
}

/// Set any appliance's power. The fan routes to [`set_fan_power`].
///
/// The on-sequence plays only on an off→on edge; repeating a command
/// re-reports status without replaying it.
pub fn set_power(state: &mut HomeState, device: Device, on: bool, source: SourceTag) -> Effects {
    let Some(power_key) = ParamKey::power(device) else {
        warn!(%device, "Ignoring power command for a device without power");
        return Effects::new();
    };
    if device == Device::Fan {
        return set_fan_power(state, on, source);
    }

    let was_on = state.devices.power(device);
    state.devices.set_switch(device, on);

    let mut fx = Effects::new();
    let name = device.name();
    fx.set(&mut state.board, power_key, on);
    fx.set(
        &mut state.board,
        ParamKey::status(device),
        format!("{} {}", name, if on { "On" } else { "Off" }),
    );
    fx.set(
        &mut state.board,
        ParamKey::summary(device),
        if on { SUMMARY_ON } else { SUMMARY_OFF },
    );
    if on && !was_on {
        fx.cue(Cue::DeviceOn(device));
        fx.cue(Cue::OnSequence);
    }
    let message = format!(
        "{} Turned {} {}",
        name,
        if on { "ON" } else { "OFF" },
        source.suffix()
    );
    fx.alert(&mut state.board, message, Delivery::Immediate);
    fx
}

pub fn set_light_power(state: &mut HomeState, on: bool, source: SourceTag) -> Effects {
    set_power(state, Device::Light, on, source)
}

pub fn set_tv_power(state: &mut HomeState, on: bool, source: SourceTag) -> Effects {
    set_power(state, Device::Tv, on, source)
}

pub fn set_plug_power(state: &mut HomeState, on: bool, source: SourceTag) -> Effects {
    set_power(state, Device::Plug, on, source)
}

/// Advance the fan one speed step.
pub fn cycle_fan(state: &mut HomeState, source: SourceTag) -> Effects {
    let next = state.devices.fan.speed().next();
    set_fan_speed(state, next, source)
}

/// Flip an appliance's power.
pub fn toggle(state: &mut HomeState, device: Device, source: SourceTag) -> Effects {
    let on = !state.devices.power(device);
    set_power(state, device, on, source)
}

/// Replace the master password.
///
/// A valid candidate (1-15 characters) is adopted, queued for persistence
/// and acknowledged as `Updated`. Anything else leaves the password alone
/// and is acknowledged as `Invalid`.
pub fn set_master_password(state: &mut HomeState, candidate: &str, source: SourceTag) -> Effects {
    let mut fx = Effects::new();
    match MasterPassword::new(candidate) {
        Ok(password) => {
            state.security.set_master_password(password.clone());
            fx.persist_password = Some(password);
            fx.set(&mut state.board, ParamKey::SetPassword, PASSWORD_UPDATED);
            fx.alert(
                &mut state.board,
                format!("Security Password Changed {}", source.suffix()),
                Delivery::Immediate,
            );
            info!(%source, "Master password changed");
        }
        Err(e) => {
            warn!(%source, error = %e, "Rejected master password");
            fx.set(&mut state.board, ParamKey::SetPassword, PASSWORD_INVALID);
        }
    }
    fx
}
