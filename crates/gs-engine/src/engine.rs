//! The stepping engine: transitions and per-tick step semantics.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;

use gs_core::{PositionRecord, Waypoint};
use gs_geo::{GeofenceIndex, TrackSequence};

use crate::state::{Cursor, StepState};
use crate::EngineObserver;

/// Step period used when the driver does not configure one (the historical
/// playback default).
pub const DEFAULT_STEP_INTERVAL: Duration = Duration::from_millis(50);

/// What one step produced: the record to buffer plus the heading toward the
/// next waypoint, for rendering collaborators.
#[derive(Clone, Debug, PartialEq)]
pub struct StepEmission {
    pub record: PositionRecord,
    /// Azimuth toward the next waypoint, degrees in `[0, 360)`.
    pub heading: f64,
}

/// Advances a cursor through a [`TrackSequence`] on an external cadence,
/// computing heading and geofence containment for each consumed waypoint
/// and emitting one [`PositionRecord`] per step.
///
/// The engine holds no timer and performs no I/O; see the crate docs for
/// the state diagram and `gs-sim` for the driver.
pub struct StepEngine {
    geofence: Arc<GeofenceIndex>,
    track:    Option<TrackSequence>,
    state:    StepState,
    cursor:   Cursor,

    // Read-only view for rendering collaborators, refreshed each step.
    center:  Option<Waypoint>,
    heading: Option<f64>,

    degraded_reported: bool,
}

impl StepEngine {
    pub fn new(geofence: Arc<GeofenceIndex>, interval: Duration) -> Self {
        Self {
            geofence,
            track:             None,
            state:             StepState::Idle,
            cursor:            Cursor::new(interval),
            center:            None,
            heading:           None,
            degraded_reported: false,
        }
    }

    // ── Transitions ───────────────────────────────────────────────────────

    /// Bind a new track, resetting the cursor and moving to `Idle`.
    ///
    /// Valid from any state; the driver must disarm any pending timer when
    /// it sees the engine leave `Running`.
    pub fn load(&mut self, track: TrackSequence) {
        tracing::debug!(waypoints = track.len(), "track loaded");
        self.track = Some(track);
        self.cursor.reset();
        self.center = None;
        self.heading = None;
        self.degraded_reported = false;
        self.state = StepState::Idle;
    }

    /// Begin (or resume) stepping.  Returns whether the engine is now
    /// `Running`.
    ///
    /// A no-op without a bound track or with fewer than two waypoints:
    /// there is no waypoint pair to compute a heading from.
    pub fn start(&mut self) -> bool {
        let len = self.track.as_ref().map_or(0, TrackSequence::len);
        if len < 2 {
            tracing::debug!(waypoints = len, "start ignored: track too short");
            return false;
        }
        match self.state {
            StepState::Idle | StepState::Paused => {
                self.state = StepState::Running;
                true
            }
            StepState::Running => true,
            StepState::Finished => false,
        }
    }

    /// From `Running`, retain the cursor and stop.  No-op otherwise.
    pub fn pause(&mut self) {
        if self.state == StepState::Running {
            self.state = StepState::Paused;
        }
    }

    /// From any state: clear visual state, reset the cursor, move to `Idle`.
    ///
    /// Already-emitted records are unaffected; they belong to the buffer.
    pub fn restart(&mut self) {
        self.cursor.reset();
        self.center = None;
        self.heading = None;
        self.degraded_reported = false;
        self.state = StepState::Idle;
    }

    /// Update the step period.  The driver re-arms its timer immediately
    /// when the engine is `Running`; the cursor is untouched.  A zero
    /// interval is ignored.
    pub fn set_interval(&mut self, interval: Duration) {
        if interval.is_zero() {
            tracing::debug!("zero step interval ignored");
            return;
        }
        self.cursor.interval = interval;
    }

    // ── One step ──────────────────────────────────────────────────────────

    /// Execute one step at `now`.  Called by the driver on each step-timer
    /// fire; returns the emission, or `None` when not `Running` or on the
    /// terminal tick.
    pub fn tick<O: EngineObserver>(
        &mut self,
        now: OffsetDateTime,
        observer: &mut O,
    ) -> Option<StepEmission> {
        if self.state != StepState::Running {
            return None;
        }
        let track = self.track.as_ref()?;
        let len = track.len();

        // Terminal condition: no pair left.  Normally unreachable because
        // the consuming branch below finishes eagerly, but a tick raced
        // against a transition must stop cleanly without emitting.
        if self.cursor.current_index + 1 >= len {
            self.finish(observer);
            return None;
        }

        let current = track.get(self.cursor.current_index)?;
        let next = track.get(self.cursor.current_index + 1)?;
        let heading = current.heading_to(next);

        if self.geofence.is_degraded() && !self.degraded_reported {
            self.degraded_reported = true;
            observer.on_degraded_geofence();
        }
        let inside = self.geofence.contains(current);

        let record = PositionRecord::at(current, inside, now);

        if self.cursor.last_containment != Some(inside) {
            let message = if inside {
                "Position is inside the geofence".to_string()
            } else {
                format!("Position {current} is outside the geofence")
            };
            observer.on_containment_change(current, inside, &message);
            self.cursor.last_containment = Some(inside);
        }

        self.center = Some(current);
        self.heading = Some(heading);
        self.cursor.current_index += 1;

        // The pair just consumed was the last one: stop now rather than
        // burning an empty terminal tick.
        if self.cursor.current_index + 1 >= len {
            self.finish(observer);
        }

        Some(StepEmission { record, heading })
    }

    fn finish<O: EngineObserver>(&mut self, observer: &mut O) {
        self.state = StepState::Finished;
        tracing::debug!(steps = self.cursor.current_index, "run finished");
        observer.on_finished(self.cursor.current_index);
    }

    // ── Observable state ──────────────────────────────────────────────────

    pub fn state(&self) -> StepState {
        self.state
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.state == StepState::Running
    }

    pub fn interval(&self) -> Duration {
        self.cursor.interval
    }

    pub fn current_index(&self) -> usize {
        self.cursor.current_index
    }

    /// The waypoint consumed by the most recent step, read-only for
    /// rendering collaborators.
    pub fn current_center(&self) -> Option<Waypoint> {
        self.center
    }

    /// Heading of the most recent step, degrees in `[0, 360)`.
    pub fn current_heading(&self) -> Option<f64> {
        self.heading
    }

    pub fn track_len(&self) -> usize {
        self.track.as_ref().map_or(0, TrackSequence::len)
    }

    pub fn geofence(&self) -> &GeofenceIndex {
        &self.geofence
    }
}
