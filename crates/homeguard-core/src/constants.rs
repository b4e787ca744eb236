//! Controller-wide constants.
//!
//! Timing targets, thresholds and the exact status vocabulary reported to
//! remote consumers. Status strings are part of the external contract:
//! dashboards and automations match on them verbatim, so they are defined
//! once here and referenced everywhere else.
//!
//! # Usage
//!
//! ```
//! use homeguard_core::constants::*;
//! use std::time::Duration;
//!
//! let period = Duration::from_millis(PROXIMITY_PERIOD_MS);
//! assert_eq!(period, Duration::from_millis(100));
//! assert_eq!(STATUS_DOOR_LOCKED, "Door Locked");
//! ```

// ============================================================================
// Timing
// ============================================================================

/// Proximity monitor tick period in milliseconds.
pub const PROXIMITY_PERIOD_MS: u64 = 100;

/// Keypad matrix scan period in milliseconds.
pub const KEYPAD_SCAN_PERIOD_MS: u64 = 50;

/// Climate sampling period in milliseconds.
pub const CLIMATE_PERIOD_MS: u64 = 2_000;

/// Maximum time to wait for an ultrasonic echo edge, in milliseconds.
pub const ECHO_TIMEOUT_MS: u64 = 25;

/// Door auto-close / auto-arm inactivity timeout, in seconds.
///
/// The door closes once no proximity has been seen for strictly longer
/// than this.
pub const DOOR_AUTO_CLOSE_SECS: u64 = 10;

/// Poll interval while waiting for a pressed key to be released.
pub const KEY_RELEASE_POLL_MS: u64 = 10;

/// Upper bound on the key-release wait. A key held longer than this is
/// reported anyway and the scan resumes.
pub const KEY_RELEASE_TIMEOUT_MS: u64 = 5_000;

// ============================================================================
// Thresholds
// ============================================================================

/// A reading strictly between zero and this distance counts as a person at the door.
pub const DOOR_THRESHOLD_CM: f32 = 15.0;

/// Temperature above which the high-temperature alert fires.
pub const HIGH_TEMP_ALERT_C: f32 = 50.0;

/// Temperature below which the high-temperature alert re-arms.
pub const HIGH_TEMP_RESET_C: f32 = 48.0;

// ============================================================================
// Security
// ============================================================================

/// Password used when no stored password exists.
pub const DEFAULT_PASSWORD: &str = "2580";

/// Number of digits the keypad password buffer can hold.
pub const PASSWORD_BUFFER_LEN: usize = 4;

/// Maximum master password length in bytes (exclusive bound is 16).
pub const MAX_PASSWORD_LEN: usize = 15;

/// Settings key under which the master password is persisted.
pub const MASTER_PASSWORD_KEY: &str = "master_pw";

// ============================================================================
// Notifications
// ============================================================================

/// Capacity of the deferred notification queue.
pub const NOTIFICATION_QUEUE_CAPACITY: usize = 5;

/// Maximum length of a queued notification message, in characters.
pub const MAX_NOTIFICATION_LEN: usize = 95;

// ============================================================================
// Fan
// ============================================================================

/// Highest fan speed step.
pub const MAX_FAN_SPEED: u8 = 5;

// ============================================================================
// Status vocabulary
// ============================================================================

pub const STATUS_DOOR_LOCKED: &str = "Door Locked";
pub const STATUS_DOOR_UNLOCKED: &str = "Door Unlocked";
pub const STATUS_DOOR_OPENED: &str = "Door Opened";
pub const STATUS_WRONG_PASSWORD: &str = "Wrong Password";
pub const STATUS_CLEARED: &str = "Cleared";
pub const STATUS_ENTERING_PASSWORD: &str = "Entering Password...";

pub const DOOR_OPEN: &str = "Open";
pub const DOOR_CLOSED: &str = "Closed";

pub const SUMMARY_ON: &str = "On";
pub const SUMMARY_OFF: &str = "Off";

pub const MODE_LOCKED: &str = "Locked";
pub const MODE_UNLOCKED: &str = "Unlocked";
pub const MODE_DOOR_OPEN: &str = "Door Open";

pub const PASSWORD_UPDATED: &str = "Updated";
pub const PASSWORD_INVALID: &str = "Invalid";

/// Initial value of the system alert parameter.
pub const SYSTEM_OK: &str = "System OK";

// ============================================================================
// Alert messages
// ============================================================================

pub const ALERT_DOOR_OPENED: &str = "Automatic Door Opened";
pub const ALERT_AUTO_ARMED: &str = "System Auto-Armed: No Activity";
pub const ALERT_DOOR_CLOSED: &str = "Door Closed";
pub const ALERT_INVALID_PASSWORD: &str = "Invalid Password Entered";
