//! Debounced 4x4 matrix keypad scanner.
//!
//! [`MatrixKeypad`] turns a raw [`KeyMatrix`] into a [`KeypadDevice`]. Each
//! scan strobes one row at a time and samples every column. When a column
//! reads active the row strobe is held until the column releases, which is
//! the debounce: one physical press yields exactly one key. The release wait
//! is a bounded poll with a sleep between samples, so a stuck key cannot
//! starve other tasks or hang the scanner.
//!
//! ```text
//!          col0 col1 col2 col3
//!   row0    1    2    3    A
//!   row1    4    5    6    B
//!   row2    7    8    9    C
//!   row3    *    0    #    D
//! ```

use std::time::Duration;

use homeguard_core::constants::{
    KEY_RELEASE_POLL_MS, KEY_RELEASE_TIMEOUT_MS, KEYPAD_SCAN_PERIOD_MS,
};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;
use crate::traits::{KeyMatrix, KeypadDevice, KeypadInput};

/// Number of matrix rows.
pub const ROWS: usize = 4;

/// Number of matrix columns.
pub const COLS: usize = 4;

/// Key legends by `[row][col]`.
pub const KEYMAP: [[char; COLS]; ROWS] = [
    ['1', '2', '3', 'A'],
    ['4', '5', '6', 'B'],
    ['7', '8', '9', 'C'],
    ['*', '0', '#', 'D'],
];

/// Scanner timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Idle time between full scans when no key is down.
    pub period: Duration,

    /// Sleep between samples while waiting for release.
    pub release_poll: Duration,

    /// Give up waiting for release after this long.
    pub release_timeout: Duration,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_millis(KEYPAD_SCAN_PERIOD_MS),
            release_poll: Duration::from_millis(KEY_RELEASE_POLL_MS),
            release_timeout: Duration::from_millis(KEY_RELEASE_TIMEOUT_MS),
        }
    }
}

/// Position of a pressed key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyHit {
    pub row: usize,
    pub col: usize,
}

impl KeyHit {
    /// Legend of the key at this position.
    pub fn legend(&self) -> char {
        KEYMAP[self.row][self.col]
    }
}

/// Keypad backed by a scanned matrix.
#[derive(Debug)]
pub struct MatrixKeypad<M> {
    matrix: M,
    config: ScanConfig,
}

impl<M: KeyMatrix> MatrixKeypad<M> {
    /// Create a scanner with default timing. All rows start released.
    pub fn new(matrix: M) -> Self {
        Self::with_config(matrix, ScanConfig::default())
    }

    /// Create a scanner with custom timing.
    pub fn with_config(mut matrix: M, config: ScanConfig) -> Self {
        for row in 0..ROWS {
            matrix.set_row(row, false);
        }
        Self { matrix, config }
    }

    /// Scan every row once.
    ///
    /// On a hit the row strobe is left driven; the caller must release it
    /// after the key has been debounced.
    pub fn scan_once(&mut self) -> Option<KeyHit> {
        for row in 0..ROWS {
            self.matrix.set_row(row, true);
            for col in 0..COLS {
                if self.matrix.column_active(col) {
                    return Some(KeyHit { row, col });
                }
            }
            self.matrix.set_row(row, false);
        }
        None
    }

    /// Hold the row strobe until the column releases or the wait times out.
    async fn wait_release(&mut self, hit: KeyHit) {
        let deadline = Instant::now() + self.config.release_timeout;
        while self.matrix.column_active(hit.col) {
            if Instant::now() >= deadline {
                warn!(
                    "Key '{}' still held after {}ms, resuming scan",
                    hit.legend(),
                    self.config.release_timeout.as_millis()
                );
                break;
            }
            tokio::time::sleep(self.config.release_poll).await;
        }
        self.matrix.set_row(hit.row, false);
    }

    /// Access the underlying matrix.
    pub fn matrix(&self) -> &M {
        &self.matrix
    }
}

impl<M: KeyMatrix> KeypadDevice for MatrixKeypad<M> {
    async fn read_key(&mut self) -> Result<KeypadInput> {
        loop {
            if let Some(hit) = self.scan_once() {
                self.wait_release(hit).await;
                debug!("Key released");
                return KeypadInput::from_char(hit.legend());
            }
            tokio::time::sleep(self.config.period).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockKeyMatrix;

    #[test]
    fn test_keymap_legends() {
        assert_eq!(KeyHit { row: 0, col: 3 }.legend(), 'A');
        assert_eq!(KeyHit { row: 3, col: 0 }.legend(), '*');
        assert_eq!(KeyHit { row: 3, col: 1 }.legend(), '0');
        assert_eq!(KeyHit { row: 3, col: 2 }.legend(), '#');
    }

    #[test]
    fn test_scan_once_idle() {
        let (matrix, _handle) = MockKeyMatrix::new();
        let mut keypad = MatrixKeypad::new(matrix);
        assert_eq!(keypad.scan_once(), None);
        assert!(keypad.matrix().active_rows().is_empty());
    }

    #[test]
    fn test_scan_once_holds_row_on_hit() {
        let (matrix, handle) = MockKeyMatrix::new();
        let mut keypad = MatrixKeypad::new(matrix);
        handle.press('5', 1);

        let hit = keypad.scan_once().unwrap();
        assert_eq!(hit, KeyHit { row: 1, col: 1 });
        assert_eq!(keypad.matrix().active_rows(), vec![1]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_key_debounces_single_press() {
        let (matrix, handle) = MockKeyMatrix::new();
        let mut keypad = MatrixKeypad::new(matrix);

        // Held for several release polls; still reported once.
        handle.press('B', 5);
        handle.press('7', 1);

        assert_eq!(keypad.read_key().await.unwrap(), KeypadInput::B);
        assert_eq!(keypad.read_key().await.unwrap(), KeypadInput::Digit(7));
        assert!(keypad.matrix().active_rows().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_key_gives_up_on_stuck_key() {
        let (matrix, handle) = MockKeyMatrix::new();
        let config = ScanConfig {
            release_timeout: Duration::from_millis(100),
            ..ScanConfig::default()
        };
        let mut keypad = MatrixKeypad::with_config(matrix, config);

        handle.press('#', usize::MAX);
        let started = Instant::now();
        assert_eq!(keypad.read_key().await.unwrap(), KeypadInput::Hash);
        assert!(started.elapsed() >= Duration::from_millis(100));
        assert!(keypad.matrix().active_rows().is_empty());
    }
}
