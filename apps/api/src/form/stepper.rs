//! Stepper Controller — a line graph of K steps, moved one edge at a time.
//!
//! Back at step 1 and Next at step K are silent no-ops. Step K is not terminal:
//! the user may go back from it and return.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Stepper {
    current: usize,
    total: usize,
}

impl Stepper {
    /// Starts at step 1. `total` is clamped to at least one step.
    pub fn new(total: usize) -> Self {
        Self {
            current: 1,
            total: total.max(1),
        }
    }

    pub fn current(&self) -> usize {
        self.current
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_first(&self) -> bool {
        self.current == 1
    }

    pub fn is_final(&self) -> bool {
        self.current == self.total
    }

    /// Returns the new current step.
    pub fn back(&mut self) -> usize {
        if !self.is_first() {
            self.current -= 1;
        }
        self.current
    }

    /// Returns the new current step.
    pub fn next(&mut self) -> usize {
        if !self.is_final() {
            self.current += 1;
        }
        self.current
    }
}
