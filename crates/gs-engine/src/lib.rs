//! `gs-engine` — the stepping state machine of the `geosim` pipeline.
//!
//! # State machine
//!
//! ```text
//!            load            start             tick × (n-1)
//!  (any) ──────────▶ Idle ──────────▶ Running ─────────────▶ Finished
//!                     ▲                │   ▲                     │
//!                     │        pause   │   │ start               │ load /
//!                     │                ▼   │                     │ restart
//!                     └─────────────  Paused                     │
//!                        restart                                 ▼
//!                     └──────────────────────────────────────── Idle
//! ```
//!
//! The engine owns **no timer**.  A driver (see `gs-sim`) arms the step
//! interval and calls [`StepEngine::tick`] on each fire; pause, restart,
//! and retiming are therefore plain state transitions that can be tested
//! without any clock.  Each consumed waypoint pair produces exactly one
//! emission and at most one containment notification, and is never
//! re-emitted across pause/resume or retime.

pub mod engine;
pub mod observer;
pub mod state;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use engine::{StepEmission, StepEngine, DEFAULT_STEP_INTERVAL};
pub use observer::{EngineObserver, NoopEngineObserver};
pub use state::{Cursor, StepState};
