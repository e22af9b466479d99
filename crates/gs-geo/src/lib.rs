//! `gs-geo` — track and geofence geometry for the `geosim` pipeline.
//!
//! Two inputs cross this boundary:
//!
//! | Input            | Shape                                         | Policy on bad input          |
//! |------------------|-----------------------------------------------|------------------------------|
//! | Track            | FeatureCollection of Point features (or CSV)  | reject the whole input       |
//! | Reference fence  | FeatureCollection of Polygon/MultiPolygon     | caller may run **degraded**  |
//!
//! A degraded [`GeofenceIndex`] answers `false` for every containment query
//! and reports itself via [`GeofenceIndex::is_degraded`] — fail-open but
//! visible, never silent.

pub mod error;
pub mod fence;
pub mod geojson;
pub mod track;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{GeoError, GeoResult};
pub use fence::GeofenceIndex;
pub use track::TrackSequence;
