//! Side effects of a state transition.
//!
//! Transitions are synchronous and run under the shared lock. Anything that
//! takes time or leaves the process (sounds, notifications, parameter
//! reports, persistence) is collected into [`Effects`] and performed by the
//! hub after the lock has been released.

use homeguard_core::{MasterPassword, ParamKey, ParamUpdate, ParamValue};
use homeguard_hardware::Cue;

use crate::notify::Delivery;
use crate::state::StatusBoard;

/// A notification produced by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub delivery: Delivery,
}

/// Everything a transition wants done once the lock is released.
#[derive(Debug, Default)]
pub struct Effects {
    /// Parameter changes, already applied to the status board.
    pub updates: Vec<ParamUpdate>,
    /// Cues to play, in order.
    pub cues: Vec<Cue>,
    pub alerts: Vec<Alert>,
    /// New master password to store durably.
    pub persist_password: Option<MasterPassword>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a parameter change on the board and queue its report.
    pub fn set(&mut self, board: &mut StatusBoard, key: ParamKey, value: impl Into<ParamValue>) {
        self.updates.push(board.set(key, value));
    }

    pub fn cue(&mut self, cue: Cue) {
        self.cues.push(cue);
    }

    /// Raise an alert, sent directly or through the notification queue.
    /// The alert text also becomes the `System Alert` parameter.
    pub fn alert(
        &mut self,
        board: &mut StatusBoard,
        message: impl Into<String>,
        delivery: Delivery,
    ) {
        let message = message.into();
        self.set(board, ParamKey::SystemAlert, message.clone());
        self.alerts.push(Alert { message, delivery });
    }

    /// Alert texts in order.
    pub fn alert_messages(&self) -> Vec<&str> {
        self.alerts.iter().map(|a| a.message.as_str()).collect()
    }

    /// Last value queued for `key`, if this transition touched it.
    pub fn update_for(&self, key: ParamKey) -> Option<&ParamValue> {
        self.updates
            .iter()
            .rev()
            .find(|update| update.key == key)
            .map(|update| &update.value)
    }

    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
            && self.cues.is_empty()
            && self.alerts.is_empty()
            && self.persist_password.is_none()
    }
}
