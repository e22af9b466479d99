//! Minimal GeoJSON feature-collection model.
//!
//! Only the subset this pipeline consumes is modelled: a FeatureCollection
//! whose features carry Point, Polygon, or MultiPolygon geometry.
//! Coordinates are kept as raw JSON until a loader interprets them, so one
//! model serves both the track and the fence input.

use serde_json::Value;

use crate::{GeoError, GeoResult};

#[derive(Debug, serde::Deserialize)]
pub(crate) struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct Feature {
    pub geometry: Option<Geometry>,
}

#[derive(Debug, serde::Deserialize)]
pub(crate) struct Geometry {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

impl FeatureCollection {
    /// Parse and require `"type": "FeatureCollection"`.
    pub fn parse(input: &str) -> GeoResult<Self> {
        let collection: FeatureCollection = serde_json::from_str(input)?;
        if collection.kind != "FeatureCollection" {
            return Err(GeoError::NotFeatureCollection);
        }
        Ok(collection)
    }
}

// ── Coordinate interpretation ─────────────────────────────────────────────────

/// Interpret a GeoJSON position: an array with at least two finite numbers.
///
/// Extra components (altitude etc.) are truncated.
pub(crate) fn position(value: &Value) -> Option<(f64, f64)> {
    let arr = value.as_array()?;
    if arr.len() < 2 {
        return None;
    }
    let x = arr[0].as_f64()?;
    let y = arr[1].as_f64()?;
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

/// Interpret a linear ring: an array of positions.
pub(crate) fn ring(value: &Value) -> Option<Vec<(f64, f64)>> {
    value.as_array()?.iter().map(position).collect()
}

/// Interpret Polygon coordinates: an array of rings, exterior first.
pub(crate) fn polygon_rings(value: &Value) -> Option<Vec<Vec<(f64, f64)>>> {
    let rings: Option<Vec<_>> = value.as_array()?.iter().map(ring).collect();
    rings.filter(|r| !r.is_empty())
}
