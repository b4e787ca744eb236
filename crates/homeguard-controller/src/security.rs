//! Security transitions: password entry, arming and the door.
//!
//! All functions run under the shared lock and return [`Effects`].

use std::time::Duration;

use homeguard_core::constants::{
    ALERT_AUTO_ARMED, ALERT_DOOR_CLOSED, ALERT_DOOR_OPENED, ALERT_INVALID_PASSWORD, DOOR_CLOSED,
    DOOR_OPEN, MODE_DOOR_OPEN, MODE_LOCKED, MODE_UNLOCKED, STATUS_CLEARED, STATUS_DOOR_LOCKED,
    STATUS_DOOR_OPENED, STATUS_DOOR_UNLOCKED, STATUS_ENTERING_PASSWORD, STATUS_WRONG_PASSWORD,
};
use homeguard_core::{ParamKey, SourceTag};
use homeguard_hardware::{Cue, LedColor};
use tokio::time::Instant;
use tracing::{info, warn};

use crate::effects::Effects;
use crate::notify::Delivery;
use crate::state::{DigitOutcome, HomeState};

/// Result of submitting the entered code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordOutcome {
    Armed,
    Disarmed,
    Mismatch,
}

/// Append a digit to the password buffer. A fifth digit is dropped.
pub fn enter_digit(state: &mut HomeState, digit: u8) -> Effects {
    let mut fx = Effects::new();
    match state.security.push_digit(digit) {
        DigitOutcome::Accepted => {
            fx.set(
                &mut state.board,
                ParamKey::SecurityStatus,
                STATUS_ENTERING_PASSWORD,
            );
        }
        DigitOutcome::Dropped => warn!("Password buffer full, digit dropped"),
    }
    fx
}

/// Discard the entered digits.
pub fn clear_entry(state: &mut HomeState) -> Effects {
    state.security.clear_buffer();
    let mut fx = Effects::new();
    fx.set(&mut state.board, ParamKey::SecurityStatus, STATUS_CLEARED);
    fx
}

/// Compare the entered code with the master password and toggle the
/// armed flag on a match. The buffer is cleared either way.
pub fn submit_entry(state: &mut HomeState) -> (PasswordOutcome, Effects) {
    let entered = state.security.take_buffer();
    let mut fx = Effects::new();

    if !state.security.master_password().matches(&entered) {
        warn!(digits = entered.len(), "Wrong password entered");
        fx.set(
            &mut state.board,
            ParamKey::SecurityStatus,
            STATUS_WRONG_PASSWORD,
        );
        fx.cue(Cue::Error);
        fx.alert(&mut state.board, ALERT_INVALID_PASSWORD, Delivery::Immediate);
        return (PasswordOutcome::Mismatch, fx);
    }

    state.security.armed = !state.security.armed;
    let suffix = SourceTag::Keypad.suffix();
    let outcome = if state.security.armed {
        fx.set(&mut state.board, ParamKey::SecurityStatus, STATUS_DOOR_LOCKED);
        fx.set(&mut state.board, ParamKey::HomeSecurity, MODE_LOCKED);
        fx.cue(Cue::ArmConfirm);
        fx.alert(&mut state.board, format!("Door Locked {suffix}"), Delivery::Immediate);
        PasswordOutcome::Armed
    } else {
        fx.set(
            &mut state.board,
            ParamKey::SecurityStatus,
            STATUS_DOOR_UNLOCKED,
        );
        fx.set(&mut state.board, ParamKey::HomeSecurity, MODE_UNLOCKED);
        fx.cue(Cue::DisarmConfirm);
        fx.alert(&mut state.board, format!("Door Unlocked {suffix}"), Delivery::Immediate);
        PasswordOutcome::Disarmed
    };
    info!(?outcome, "Security mode changed");
    (outcome, fx)
}

/// One proximity tick.
///
/// A closed door opens when the system is disarmed and someone is near.
/// An open door records presence and closes once nobody has been seen for
/// longer than `auto_close`, or as soon as the system is armed. Closing
/// after inactivity re-arms the system.
pub fn door_tick(
    state: &mut HomeState,
    person_nearby: bool,
    now: Instant,
    auto_close: Duration,
) -> Effects {
    let mut fx = Effects::new();
    let security = &mut state.security;

    if !security.door_open {
        if !security.armed && person_nearby {
            security.door_open = true;
            security.last_proximity = now;
            info!("Door opened");

            let board = &mut state.board;
            fx.set(board, ParamKey::DoorOpen, true);
            fx.set(board, ParamKey::HomeDoor, DOOR_OPEN);
            fx.set(board, ParamKey::SecurityStatus, STATUS_DOOR_OPENED);
            fx.set(board, ParamKey::HomeSecurity, MODE_DOOR_OPEN);
            fx.cue(Cue::Doorbell);
            fx.alert(board, ALERT_DOOR_OPENED, Delivery::Immediate);
        }
        return fx;
    }

    if person_nearby {
        security.last_proximity = now;
    }
    let idle = now.saturating_duration_since(security.last_proximity);
    if idle <= auto_close && !security.armed {
        return fx;
    }

    security.door_open = false;
    let board = &mut state.board;
    if security.armed {
        info!("Door closed after arming");
        fx.alert(board, ALERT_DOOR_CLOSED, Delivery::Immediate);
    } else {
        security.armed = true;
        info!(idle_secs = idle.as_secs(), "Door closed, system auto-armed");
        fx.alert(board, ALERT_AUTO_ARMED, Delivery::Immediate);
    }
    fx.set(board, ParamKey::DoorOpen, false);
    fx.set(board, ParamKey::HomeDoor, DOOR_CLOSED);
    let (status, mode) = if security.armed {
        (STATUS_DOOR_LOCKED, MODE_LOCKED)
    } else {
        (STATUS_DOOR_UNLOCKED, MODE_UNLOCKED)
    };
    fx.set(board, ParamKey::SecurityStatus, status);
    fx.set(board, ParamKey::HomeSecurity, mode);
    fx
}

/// Status LED color for a security state.
///
/// Solid red while armed, green while disarmed with the door open, off
/// while disarmed with the door closed.
pub fn led_for(armed: bool, door_open: bool) -> LedColor {
    match (armed, door_open) {
        (true, _) => LedColor::Red,
        (false, true) => LedColor::Green,
        (false, false) => LedColor::Off,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeguard_core::constants::DEFAULT_PASSWORD;
    use homeguard_core::{MasterPassword, ParamValue};
    use proptest::prelude::*;
    use rstest::rstest;

    const AUTO_CLOSE: Duration = Duration::from_secs(10);

    fn home() -> HomeState {
        HomeState::new(MasterPassword::new(DEFAULT_PASSWORD).unwrap())
    }

    fn enter(state: &mut HomeState, code: &str) -> (PasswordOutcome, Effects) {
        for c in code.chars() {
            enter_digit(state, c.to_digit(10).unwrap() as u8);
        }
        submit_entry(state)
    }

    fn disarmed() -> HomeState {
        let mut state = home();
        let (outcome, _) = enter(&mut state, DEFAULT_PASSWORD);
        assert_eq!(outcome, PasswordOutcome::Disarmed);
        state
    }

    #[test]
    fn test_correct_password_toggles() {
        let mut state = home();

        let (outcome, fx) = enter(&mut state, "2580");
        assert_eq!(outcome, PasswordOutcome::Disarmed);
        assert!(!state.security.armed);
        assert_eq!(fx.cues, vec![Cue::DisarmConfirm]);
        assert_eq!(fx.alert_messages(), vec!["Door Unlocked via Keypad"]);
        assert_eq!(
            fx.update_for(ParamKey::HomeSecurity),
            Some(&ParamValue::from(MODE_UNLOCKED))
        );

        let (outcome, fx) = enter(&mut state, "2580");
        assert_eq!(outcome, PasswordOutcome::Armed);
        assert!(state.security.armed);
        assert_eq!(fx.cues, vec![Cue::ArmConfirm]);
        assert_eq!(fx.alert_messages(), vec!["Door Locked via Keypad"]);
    }

    #[rstest]
    #[case("1234")]
    #[case("258")]
    #[case("")]
    fn test_wrong_password_keeps_mode(#[case] code: &str) {
        let mut state = home();
        let (outcome, fx) = enter(&mut state, code);

        assert_eq!(outcome, PasswordOutcome::Mismatch);
        assert!(state.security.armed);
        assert_eq!(state.security.buffer_len(), 0);
        assert_eq!(fx.cues, vec![Cue::Error]);
        assert_eq!(fx.alert_messages(), vec![ALERT_INVALID_PASSWORD]);
        assert_eq!(
            fx.update_for(ParamKey::SecurityStatus),
            Some(&ParamValue::from(STATUS_WRONG_PASSWORD))
        );
    }

    #[test]
    fn test_fifth_digit_dropped() {
        let mut state = home();
        for d in [2, 5, 8, 0] {
            assert!(!enter_digit(&mut state, d).is_empty());
        }
        assert!(enter_digit(&mut state, 9).is_empty());

        let (outcome, _) = submit_entry(&mut state);
        assert_eq!(outcome, PasswordOutcome::Disarmed);
    }

    #[test]
    fn test_clear_entry() {
        let mut state = home();
        enter_digit(&mut state, 2);
        enter_digit(&mut state, 5);
        let fx = clear_entry(&mut state);

        assert_eq!(state.security.buffer_len(), 0);
        assert_eq!(
            fx.update_for(ParamKey::SecurityStatus),
            Some(&ParamValue::from(STATUS_CLEARED))
        );
    }

    #[test]
    fn test_door_stays_closed_while_armed() {
        let mut state = home();
        let fx = door_tick(&mut state, true, Instant::now(), AUTO_CLOSE);
        assert!(!state.security.door_open);
        assert!(fx.is_empty());
    }

    #[test]
    fn test_door_opens_when_disarmed() {
        let mut state = disarmed();
        let fx = door_tick(&mut state, true, Instant::now(), AUTO_CLOSE);

        assert!(state.security.door_open);
        assert_eq!(fx.cues, vec![Cue::Doorbell]);
        assert_eq!(fx.alert_messages(), vec![ALERT_DOOR_OPENED]);
        assert_eq!(
            fx.update_for(ParamKey::HomeSecurity),
            Some(&ParamValue::from(MODE_DOOR_OPEN))
        );
        assert_eq!(fx.update_for(ParamKey::DoorOpen), Some(&ParamValue::Bool(true)));
    }

    #[test]
    fn test_door_auto_closes_and_arms() {
        let mut state = disarmed();
        let opened = Instant::now();
        door_tick(&mut state, true, opened, AUTO_CLOSE);

        let fx = door_tick(&mut state, false, opened + Duration::from_secs(10), AUTO_CLOSE);
        assert!(state.security.door_open, "exactly 10 s is not yet idle");
        assert!(fx.is_empty());

        let fx = door_tick(
            &mut state,
            false,
            opened + Duration::from_millis(10_100),
            AUTO_CLOSE,
        );
        assert!(!state.security.door_open);
        assert!(state.security.armed);
        assert_eq!(fx.alert_messages(), vec![ALERT_AUTO_ARMED]);
        assert_eq!(
            fx.update_for(ParamKey::SecurityStatus),
            Some(&ParamValue::from(STATUS_DOOR_LOCKED))
        );
    }

    #[test]
    fn test_presence_extends_open_door() {
        let mut state = disarmed();
        let opened = Instant::now();
        door_tick(&mut state, true, opened, AUTO_CLOSE);

        door_tick(&mut state, true, opened + Duration::from_secs(8), AUTO_CLOSE);
        door_tick(&mut state, false, opened + Duration::from_secs(15), AUTO_CLOSE);
        assert!(state.security.door_open);

        door_tick(&mut state, false, opened + Duration::from_secs(19), AUTO_CLOSE);
        assert!(!state.security.door_open);
    }

    #[test]
    fn test_arming_closes_open_door() {
        let mut state = disarmed();
        let opened = Instant::now();
        door_tick(&mut state, true, opened, AUTO_CLOSE);

        let (outcome, _) = enter(&mut state, DEFAULT_PASSWORD);
        assert_eq!(outcome, PasswordOutcome::Armed);

        let fx = door_tick(&mut state, true, opened + Duration::from_secs(1), AUTO_CLOSE);
        assert!(!state.security.door_open);
        assert_eq!(fx.alert_messages(), vec![ALERT_DOOR_CLOSED]);
    }

    #[rstest]
    #[case(true, false, LedColor::Red)]
    #[case(true, true, LedColor::Red)]
    #[case(false, true, LedColor::Green)]
    #[case(false, false, LedColor::Off)]
    fn test_led_for(#[case] armed: bool, #[case] door_open: bool, #[case] expected: LedColor) {
        assert_eq!(led_for(armed, door_open), expected);
    }

    #[derive(Debug, Clone)]
    enum Step {
        Digit(u8),
        Clear,
        Submit,
        Tick { nearby: bool, advance_ms: u64 },
    }

    fn step() -> impl Strategy<Value = Step> {
        prop_oneof![
            (0..10_u8).prop_map(Step::Digit),
            Just(Step::Clear),
            Just(Step::Submit),
            (any::<bool>(), 0..12_000_u64)
                .prop_map(|(nearby, advance_ms)| Step::Tick { nearby, advance_ms }),
        ]
    }

    proptest! {
        #[test]
        fn prop_door_never_open_while_armed_after_tick(steps in prop::collection::vec(step(), 0..60)) {
            let mut state = home();
            let mut now = Instant::now();
            for step in steps {
                match step {
                    Step::Digit(d) => { enter_digit(&mut state, d); }
                    Step::Clear => { clear_entry(&mut state); }
                    Step::Submit => { submit_entry(&mut state); }
                    Step::Tick { nearby, advance_ms } => {
                        now += Duration::from_millis(advance_ms);
                        door_tick(&mut state, nearby, now, AUTO_CLOSE);
                        prop_assert!(!(state.security.armed && state.security.door_open));
                    }
                }
                prop_assert!(state.security.buffer_len() <= 4);
            }
        }
    }
}
