//! `gs-core` — foundational types for the `geosim` pipeline.
//!
//! This crate is a dependency of every other `gs-*` crate.  It intentionally
//! has no `gs-*` dependencies and minimal external ones (only `serde` and
//! `time`).
//!
//! # What lives here
//!
//! | Module       | Contents                                            |
//! |--------------|-----------------------------------------------------|
//! | [`waypoint`] | `Waypoint`, planar heading math                     |
//! | [`record`]   | `PositionRecord`, `PersistedPosition`, `PositionKey`|

pub mod record;
pub mod waypoint;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use record::{PersistedPosition, PositionKey, PositionRecord};
pub use waypoint::Waypoint;
