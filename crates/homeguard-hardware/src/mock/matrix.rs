//! Scripted key matrix.
//!
//! Presses are queued through a [`MockKeyMatrixHandle`]. The front press is
//! "down" until its column has been sampled active `hold_samples` times on
//! the correct row, then it releases and the next press goes down.

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use super::lock;
use crate::matrix::{COLS, KEYMAP, ROWS};
use crate::traits::KeyMatrix;

#[derive(Debug, Default)]
struct MatrixState {
    presses: VecDeque<Press>,
    active_rows: BTreeSet<usize>,
}

#[derive(Debug, Clone, Copy)]
struct Press {
    row: usize,
    col: usize,
    remaining: usize,
}

/// Key matrix driven by a script.
#[derive(Debug)]
pub struct MockKeyMatrix {
    state: Arc<Mutex<MatrixState>>,
}

impl MockKeyMatrix {
    /// Create a matrix with no keys down.
    pub fn new() -> (Self, MockKeyMatrixHandle) {
        let state = Arc::new(Mutex::new(MatrixState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockKeyMatrixHandle { state },
        )
    }

    /// Rows currently driven.
    pub fn active_rows(&self) -> Vec<usize> {
        lock(&self.state).active_rows.iter().copied().collect()
    }
}

impl KeyMatrix for MockKeyMatrix {
    fn set_row(&mut self, row: usize, active: bool) {
        let mut state = lock(&self.state);
        if active {
            state.active_rows.insert(row);
        } else {
            state.active_rows.remove(&row);
        }
    }

    fn column_active(&mut self, col: usize) -> bool {
        let mut state = lock(&self.state);
        let Some(press) = state.presses.front().copied() else {
            return false;
        };
        if press.col != col || !state.active_rows.contains(&press.row) {
            return false;
        }
        let remaining = press.remaining.saturating_sub(1);
        if remaining == 0 {
            state.presses.pop_front();
        } else if let Some(front) = state.presses.front_mut() {
            front.remaining = remaining;
        }
        true
    }
}

/// Handle for scripting key presses.
#[derive(Debug, Clone)]
pub struct MockKeyMatrixHandle {
    state: Arc<Mutex<MatrixState>>,
}

impl MockKeyMatrixHandle {
    /// Queue a press of the key with this legend, held for `hold_samples`
    /// active column samples. Unknown legends are ignored.
    pub fn press(&self, legend: char, hold_samples: usize) {
        let position = (0..ROWS)
            .flat_map(|row| (0..COLS).map(move |col| (row, col)))
            .find(|&(row, col)| KEYMAP[row][col] == legend.to_ascii_uppercase());
        if let Some((row, col)) = position {
            lock(&self.state).presses.push_back(Press {
                row,
                col,
                remaining: hold_samples.max(1),
            });
        }
    }

    /// Number of presses not yet fully released.
    pub fn pending(&self) -> usize {
        lock(&self.state).presses.len()
    }
}
