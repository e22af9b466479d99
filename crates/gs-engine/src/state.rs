//! Engine states and cursor.

use std::time::Duration;

/// The engine's lifecycle state.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StepState {
    /// No track bound, or cursor at start and not running.
    Idle,
    /// Step timer armed, cursor advancing.
    Running,
    /// Timer disarmed, cursor retained.
    Paused,
    /// Cursor consumed the last waypoint pair; timer stopped automatically.
    /// The cursor resets on the next `load` or `restart`, not before.
    Finished,
}

/// Mutable per-run stepping state, owned exclusively by the engine.
#[derive(Clone, Debug)]
pub struct Cursor {
    /// Index of the waypoint consumed by the next step.
    pub current_index: usize,

    /// Period of the step timer.  Survives restarts and track loads.
    pub interval: Duration,

    /// Containment of the previous step; `None` until the first step of a
    /// run, so the first step always raises a status-change edge.
    pub last_containment: Option<bool>,
}

impl Cursor {
    pub fn new(interval: Duration) -> Self {
        Self {
            current_index:    0,
            interval,
            last_containment: None,
        }
    }

    /// Reset run state; the configured interval is kept.
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.last_containment = None;
    }
}
