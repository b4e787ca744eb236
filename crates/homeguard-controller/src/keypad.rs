//! Keypad input processing.
//!
//! Key mapping:
//!
//! | Key       | Action                              |
//! |-----------|-------------------------------------|
//! | `0`-`9`   | append to the password buffer       |
//! | `*`       | clear the buffer                    |
//! | `#`       | submit: arm/disarm or wrong password |
//! | `A`       | cycle fan speed                     |
//! | `B`       | toggle light                        |
//! | `C`       | toggle TV                           |
//! | `D`       | toggle plug                         |

use homeguard_core::{Device, SourceTag};
use homeguard_hardware::{Cue, Indicator, KeypadDevice, KeypadInput};
use tracing::{debug, info};

use crate::dispatcher;
use crate::effects::Effects;
use crate::error::Result;
use crate::hub::Hub;
use crate::security;
use crate::state::HomeState;

/// Apply one key to the state.
pub fn apply_key(state: &mut HomeState, key: KeypadInput) -> Effects {
    match key {
        KeypadInput::Digit(d) => security::enter_digit(state, d),
        KeypadInput::Star => security::clear_entry(state),
        KeypadInput::Hash => security::submit_entry(state).1,
        KeypadInput::A => dispatcher::cycle_fan(state, SourceTag::Keypad),
        KeypadInput::B => dispatcher::toggle(state, Device::Light, SourceTag::Keypad),
        KeypadInput::C => dispatcher::toggle(state, Device::Tv, SourceTag::Keypad),
        KeypadInput::D => dispatcher::toggle(state, Device::Plug, SourceTag::Keypad),
    }
}

/// Reads keys and applies them under the shared lock.
pub struct KeypadInputProcessor<K, I> {
    keypad: K,
    hub: Hub<I>,
}

impl<K: KeypadDevice, I: Indicator> KeypadInputProcessor<K, I> {
    pub fn new(keypad: K, hub: Hub<I>) -> Self {
        Self { keypad, hub }
    }

    /// Handle one key: click, transition, then effects.
    pub async fn handle_key(&self, key: KeypadInput) {
        process_key(&self.hub, key).await;
    }

    /// Process keys until the keypad fails.
    ///
    /// The keypad is only borrowed while reading, so the loop is `Send` for
    /// any `Send` keypad.
    ///
    /// # Errors
    ///
    /// Returns the keypad error that ended the loop.
    pub async fn run(self) -> Result<()> {
        let Self { mut keypad, hub } = self;
        info!("Keypad processor started");
        loop {
            let key = keypad.read_key().await?;
            match key {
                KeypadInput::Digit(_) => debug!("Digit pressed"),
                other => debug!(key = %other, "Key pressed"),
            }
            process_key(&hub, key).await;
        }
    }
}

async fn process_key<I: Indicator>(hub: &Hub<I>, key: KeypadInput) {
    hub.play(Cue::KeyClick).await;
    let fx = hub.state().with_lock(|state| apply_key(state, key)).await;
    hub.emit(fx).await;
}
