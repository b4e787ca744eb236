//! Channel-fed keypad.
//!
//! Keys sent through a [`MockKeypadHandle`] come out of
//! [`KeypadDevice::read_key`] in order. Once every handle is dropped the
//! keypad reports [`HardwareError::Disconnected`], which ends the keypad
//! loop the same way a lost device would.
//!
//! ```
//! use homeguard_hardware::KeypadDevice;
//! use homeguard_hardware::mock::MockKeypad;
//!
//! # #[tokio::main]
//! # async fn main() -> homeguard_hardware::Result<()> {
//! let (mut keypad, keys) = MockKeypad::new();
//! keys.send_keys("25#").await?;
//!
//! assert_eq!(keypad.read_key().await?.as_char(), '2');
//! # Ok(())
//! # }
//! ```

use tokio::sync::mpsc;

use crate::{HardwareError, KeypadDevice, KeypadInput, Result};

/// Keys a handle can queue before `send_input` waits.
const KEY_BUFFER: usize = 32;

const DEVICE: &str = "mock keypad";

#[derive(Debug)]
pub struct MockKeypad {
    keys: mpsc::Receiver<KeypadInput>,
}

impl MockKeypad {
    pub fn new() -> (Self, MockKeypadHandle) {
        let (tx, keys) = mpsc::channel(KEY_BUFFER);
        (Self { keys }, MockKeypadHandle { tx })
    }
}

impl KeypadDevice for MockKeypad {
    async fn read_key(&mut self) -> Result<KeypadInput> {
        self.keys
            .recv()
            .await
            .ok_or_else(|| HardwareError::disconnected(DEVICE))
    }
}

#[derive(Debug, Clone)]
pub struct MockKeypadHandle {
    tx: mpsc::Sender<KeypadInput>,
}

impl MockKeypadHandle {
    /// Queue one key.
    ///
    /// # Errors
    ///
    /// [`HardwareError::Disconnected`] once the keypad is dropped.
    pub async fn send_input(&self, key: KeypadInput) -> Result<()> {
        self.tx
            .send(key)
            .await
            .map_err(|_| HardwareError::disconnected(DEVICE))
    }

    /// Queue keys by legend, e.g. `"2580#"`. Nothing is sent if any legend
    /// is not on the keypad.
    ///
    /// # Errors
    ///
    /// [`HardwareError::InvalidData`] for an unknown legend,
    /// [`HardwareError::Disconnected`] once the keypad is dropped.
    pub async fn send_keys(&self, legends: &str) -> Result<()> {
        let keys = legends
            .chars()
            .map(KeypadInput::from_char)
            .collect::<Result<Vec<_>>>()?;
        for key in keys {
            self.send_input(key).await?;
        }
        Ok(())
    }
}
