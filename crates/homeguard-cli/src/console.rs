//! Stdin console driving the simulated peripherals.
//!
//! Each line is either a run of keypad legends (`2580#`, `A`, `*`), pressed
//! in order on the simulated key matrix, or one of:
//!
//! - `near <cm>`: the proximity sensor sees an object at this distance
//! - `away`: the proximity sensor sees nothing
//! - `temp <celsius> [humidity]`: set the climate reading
//! - `climate-fail`: make climate reads fail
//! - `status`: log a snapshot of the shared state

use std::sync::Arc;

use homeguard_controller::SharedState;
use homeguard_hardware::KeypadInput;
use homeguard_hardware::mock::{MockClimateHandle, MockKeyMatrixHandle, MockProximityHandle};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// Active column samples each console key press is held for.
const HOLD_SAMPLES: usize = 3;

const DEFAULT_HUMIDITY: f32 = 45.0;

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Keys(Vec<char>),
    Near(f32),
    Away,
    Climate { temperature: f32, humidity: f32 },
    ClimateFail,
    Status,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("not a keypad key: {0:?}")]
    UnknownKey(char),

    #[error("{command}: expected a number, got {got:?}")]
    BadNumber { command: &'static str, got: String },

    #[error("{0}: missing argument")]
    MissingArgument(&'static str),
}

impl ConsoleCommand {
    /// Parse one console line. Blank lines yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ParseError> {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            return Ok(None);
        };

        let command = match first {
            "near" => Self::Near(number("near", words.next())?),
            "away" => Self::Away,
            "temp" => {
                let temperature = number("temp", words.next())?;
                let humidity = match words.next() {
                    Some(word) => number("temp", Some(word))?,
                    None => DEFAULT_HUMIDITY,
                };
                Self::Climate {
                    temperature,
                    humidity,
                }
            }
            "climate-fail" => Self::ClimateFail,
            "status" => Self::Status,
            _ => {
                let keys: Vec<char> = line.chars().filter(|c| !c.is_whitespace()).collect();
                if let Some(&bad) = keys.iter().find(|c| KeypadInput::from_char(**c).is_err()) {
                    return Err(ParseError::UnknownKey(bad));
                }
                Self::Keys(keys)
            }
        };
        Ok(Some(command))
    }
}

fn number(command: &'static str, word: Option<&str>) -> Result<f32, ParseError> {
    let word = word.ok_or(ParseError::MissingArgument(command))?;
    word.parse().map_err(|_| ParseError::BadNumber {
        command,
        got: word.to_string(),
    })
}

/// Handles onto the simulated peripherals.
pub struct Console {
    pub keys: MockKeyMatrixHandle,
    pub proximity: MockProximityHandle,
    pub climate: MockClimateHandle,
    pub state: Arc<SharedState>,
}

impl Console {
    pub async fn execute(&self, command: ConsoleCommand) {
        match command {
            ConsoleCommand::Keys(keys) => {
                for key in keys {
                    self.keys.press(key, HOLD_SAMPLES);
                }
            }
            ConsoleCommand::Near(cm) => self.proximity.set_distance(cm),
            ConsoleCommand::Away => self.proximity.clear(),
            ConsoleCommand::Climate {
                temperature,
                humidity,
            } => self.climate.set(temperature, humidity),
            ConsoleCommand::ClimateFail => self.climate.fail(),
            ConsoleCommand::Status => {
                let snapshot = self.state.snapshot().await;
                info!(?snapshot, "Controller status");
            }
        }
    }

    /// Read commands from stdin until it closes.
    pub async fn run(self) -> std::io::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match ConsoleCommand::parse(&line) {
                Ok(Some(command)) => self.execute(command).await,
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Ignoring console input"),
            }
        }
        info!("Console input closed");
        Ok(())
    }
}
