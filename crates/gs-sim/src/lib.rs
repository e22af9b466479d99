//! `gs-sim` — composition root of the `geosim` pipeline.
//!
//! # Two cooperative timers
//!
//! ```text
//!            step timer (engine interval)     flush timer (fixed period)
//!                      │                               │
//!                      ▼                               ▼
//!  commands ──▶ StepEngine::tick ──▶ RecordBuffer ──▶ batch ──▶ PositionStore
//!                      │                               (spawn_blocking,
//!                      └─▶ EngineObserver notifications  fire-and-forget)
//! ```
//!
//! Both timers live on one `tokio::select!` loop, so a step tick and a
//! flush tick never interleave mid-operation and the record buffer needs no
//! lock.  The batch hand-off is dispatched without awaiting its result:
//! at-most-once delivery, failures logged and dropped, the simulation never
//! stalls on storage.  Pause, restart, and retime disarm/re-arm the step
//! timer deterministically; one engine never has two step timers.

pub mod buffer;
pub mod command;
pub mod orchestrator;

#[cfg(test)]
mod tests;

// ── Re-exports ────────────────────────────────────────────────────────────────

pub use buffer::RecordBuffer;
pub use command::Command;
pub use orchestrator::{Orchestrator, SimHandle, DEFAULT_FLUSH_PERIOD};
