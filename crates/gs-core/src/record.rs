//! Position records as emitted by the engine and persisted by the sink.
//!
//! Field names on the wire are camelCase (`isInsidePolygon`, `exitTime`)
//! and `exit_time` travels as RFC 3339, matching the persistence sink's
//! JSON surface.

use time::OffsetDateTime;

use crate::Waypoint;

// ── PositionRecord ────────────────────────────────────────────────────────────

/// One simulated position: produced exactly once per engine step, immutable
/// after creation.  Has no identity until the sink accepts it.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionRecord {
    pub latitude: f64,
    pub longitude: f64,
    pub is_inside_polygon: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub exit_time: OffsetDateTime,
}

impl PositionRecord {
    /// Build a record for `position` at `exit_time`.
    ///
    /// The latitude is the waypoint's `y` component and the longitude its
    /// `x` component.
    pub fn at(position: Waypoint, inside: bool, exit_time: OffsetDateTime) -> Self {
        Self {
            latitude:          position.y,
            longitude:         position.x,
            is_inside_polygon: inside,
            exit_time,
        }
    }

    /// The record's deduplication key.
    #[inline]
    pub fn natural_key(&self) -> PositionKey {
        PositionKey::new(self.latitude, self.longitude)
    }
}

// ── PositionKey ───────────────────────────────────────────────────────────────

/// The (latitude, longitude) natural key, bit-exact.
///
/// Stored as raw `f64` bits so the key is `Eq + Hash`.  Two records collide
/// only when both coordinates are bitwise identical — the key detects
/// duplicate rows, it is not a spatial-tolerance proxy.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct PositionKey(u64, u64);

impl PositionKey {
    #[inline]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self(latitude.to_bits(), longitude.to_bits())
    }
}

// ── PersistedPosition ─────────────────────────────────────────────────────────

/// A [`PositionRecord`] accepted by the sink, with its assigned row id.
///
/// Serialises flat (`{id, latitude, ...}`) as the sink returns it.
#[derive(Clone, Debug, PartialEq)]
#[derive(serde::Serialize, serde::Deserialize)]
pub struct PersistedPosition {
    pub id: i64,
    #[serde(flatten)]
    pub record: PositionRecord,
}
