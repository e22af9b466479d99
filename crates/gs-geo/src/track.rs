//! Ordered waypoint sequence and its loaders.
//!
//! Loading is all-or-nothing: one malformed feature or CSV row rejects the
//! entire input.  A partially loaded track would silently change headings
//! and containment transitions, so the engine never sees one.

use std::io::Read;

use gs_core::Waypoint;

use crate::geojson::{self, FeatureCollection};
use crate::{GeoError, GeoResult};

/// An ordered, finite, immutable sequence of waypoints.
///
/// Once bound to a running engine the sequence is never mutated; loading a
/// new track replaces the binding wholesale.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackSequence {
    points: Vec<Waypoint>,
}

impl TrackSequence {
    pub fn from_points(points: Vec<Waypoint>) -> Self {
        Self { points }
    }

    /// Load a track from a GeoJSON FeatureCollection of Point features.
    ///
    /// Every feature must carry Point geometry with at least two finite
    /// numeric components (extra components are truncated).  Any violation
    /// rejects the whole input.
    pub fn from_geojson_str(input: &str) -> GeoResult<Self> {
        let collection = FeatureCollection::parse(input)?;

        let mut points = Vec::with_capacity(collection.features.len());
        for (index, feature) in collection.features.iter().enumerate() {
            let geometry = feature
                .geometry
                .as_ref()
                .ok_or_else(|| GeoError::invalid_feature(index, "missing geometry"))?;
            if geometry.kind != "Point" {
                return Err(GeoError::invalid_feature(
                    index,
                    format!("expected Point geometry, got {}", geometry.kind),
                ));
            }
            let (x, y) = geojson::position(&geometry.coordinates)
                .ok_or_else(|| GeoError::invalid_feature(index, "malformed coordinates"))?;
            points.push(Waypoint::new(x, y));
        }

        Ok(Self { points })
    }

    /// Load a track from CSV with an `x,y` header (case-insensitive).
    ///
    /// Same reject-all policy as the GeoJSON loader.
    pub fn from_csv_reader<R: Read>(reader: R) -> GeoResult<Self> {
        let mut rdr = csv::Reader::from_reader(reader);

        let headers = rdr.headers()?.clone();
        let col = |name: &str| {
            headers
                .iter()
                .position(|h| h.trim().eq_ignore_ascii_case(name))
        };
        let (x_col, y_col) = match (col("x"), col("y")) {
            (Some(x), Some(y)) => (x, y),
            _ => return Err(GeoError::invalid_feature(0, "missing x/y header")),
        };

        let mut points = Vec::new();
        for (index, row) in rdr.records().enumerate() {
            let row = row?;
            let parse = |field: Option<&str>| {
                field
                    .and_then(|f| f.trim().parse::<f64>().ok())
                    .filter(|v| v.is_finite())
            };
            match (parse(row.get(x_col)), parse(row.get(y_col))) {
                (Some(x), Some(y)) => points.push(Waypoint::new(x, y)),
                _ => {
                    return Err(GeoError::invalid_feature(index, "malformed coordinate row"));
                }
            }
        }

        Ok(Self { points })
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Waypoint> {
        self.points.get(index).copied()
    }

    pub fn points(&self) -> &[Waypoint] {
        &self.points
    }
}
