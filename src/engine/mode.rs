// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Canvas interaction mode.
//!
//! A single mode decides how pointer input is interpreted. Leaving
//! `Dragging` is deferred by a short settle delay so that the click a
//! browser fires right after a drag is not taken as a label-cycle click.

use std::time::{Duration, Instant};

/// Current canvas mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Drawing,
    Dragging,
}

/// The mode state machine.
#[derive(Debug, Clone)]
pub struct ModeMachine {
    mode: Mode,
    settle_at: Option<Instant>,
    settle_delay: Duration,
}

impl ModeMachine {
    pub fn new(settle_delay: Duration) -> Self {
        Self {
            mode: Mode::Idle,
            settle_at: None,
            settle_delay,
        }
    }

    /// Apply any pending settle whose deadline has passed and return the mode.
    pub fn poll(&mut self, now: Instant) -> Mode {
        if let Some(deadline) = self.settle_at {
            if now >= deadline {
                self.settle_at = None;
                if self.mode == Mode::Dragging {
                    self.set(Mode::Idle);
                }
            }
        }
        self.mode
    }

    /// Mode without applying pending settles.
    pub fn current(&self) -> Mode {
        self.mode
    }

    /// `Idle -> Drawing`. Returns false when another gesture is in progress.
    pub fn begin_drawing(&mut self) -> bool {
        if self.mode != Mode::Idle {
            return false;
        }
        self.set(Mode::Drawing);
        true
    }

    /// `Drawing -> Idle`, returning whether a drawing was in progress.
    pub fn finish_drawing(&mut self) -> bool {
        if self.mode != Mode::Drawing {
            return false;
        }
        self.set(Mode::Idle);
        true
    }

    /// Enter `Dragging`. A settle still pending from an earlier drag is cancelled.
    pub fn begin_drag(&mut self) {
        self.settle_at = None;
        self.set(Mode::Dragging);
    }

    /// Schedule `Dragging -> Idle` after the settle delay.
    pub fn release_drag(&mut self, now: Instant) {
        if self.mode == Mode::Dragging {
            self.settle_at = Some(now + self.settle_delay);
        }
    }

    /// Drop any gesture in progress.
    pub fn reset(&mut self) {
        self.settle_at = None;
        self.set(Mode::Idle);
    }

    fn set(&mut self, mode: Mode) {
        if self.mode != mode {
            log::debug!("Canvas mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drawing_cycle() {
        let mut mode = ModeMachine::new(Duration::from_millis(100));
        assert_eq!(mode.current(), Mode::Idle);
        assert!(mode.begin_drawing());
        assert!(!mode.begin_drawing());
        assert!(mode.finish_drawing());
        assert_eq!(mode.current(), Mode::Idle);
        assert!(!mode.finish_drawing());
    }

    #[test]
    fn test_drag_settles_after_delay() {
        let t0 = Instant::now();
        let mut mode = ModeMachine::new(Duration::from_millis(100));
        mode.begin_drag();
        mode.release_drag(t0);

        assert_eq!(mode.poll(t0 + Duration::from_millis(50)), Mode::Dragging);
        assert_eq!(mode.poll(t0 + Duration::from_millis(100)), Mode::Idle);
    }

    #[test]
    fn test_new_drag_cancels_pending_settle() {
        let t0 = Instant::now();
        let mut mode = ModeMachine::new(Duration::from_millis(100));
        mode.begin_drag();
        mode.release_drag(t0);
        mode.begin_drag();

        assert_eq!(mode.poll(t0 + Duration::from_secs(1)), Mode::Dragging);
    }

    #[test]
    fn test_cannot_draw_while_dragging() {
        let mut mode = ModeMachine::new(Duration::from_millis(100));
        mode.begin_drag();
        assert!(!mode.begin_drawing());
        mode.reset();
        assert!(mode.begin_drawing());
    }
}
