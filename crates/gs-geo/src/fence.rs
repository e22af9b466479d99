//! Reference geofence geometry and containment queries.

use geo::{Coord, Intersects, LineString, MultiPolygon, Point, Polygon};

use gs_core::Waypoint;

use crate::geojson::{self, FeatureCollection};
use crate::{GeoError, GeoResult};

/// An immutable multi-polygon answering point-containment queries.
///
/// Built once at startup and shared read-only by every step.  When the
/// reference geometry is absent or unparseable the index runs **degraded**:
/// every query answers `false` and [`is_degraded`][Self::is_degraded]
/// reports the condition so callers can surface it.
#[derive(Clone, Debug)]
pub struct GeofenceIndex {
    region: Option<MultiPolygon<f64>>,
}

impl GeofenceIndex {
    /// An index with no geometry: `contains` is constantly `false`.
    pub fn degraded() -> Self {
        Self { region: None }
    }

    pub fn from_multipolygon(region: MultiPolygon<f64>) -> Self {
        Self { region: Some(region) }
    }

    /// Build the index from a GeoJSON FeatureCollection of Polygon or
    /// MultiPolygon features, merged into a single multi-polygon.
    ///
    /// Errors here mean the caller must decide between aborting and
    /// explicitly running [`degraded`][Self::degraded].
    pub fn from_geojson_str(input: &str) -> GeoResult<Self> {
        let collection = FeatureCollection::parse(input)?;

        let mut polygons: Vec<Polygon<f64>> = Vec::new();
        for (index, feature) in collection.features.iter().enumerate() {
            let geometry = feature
                .geometry
                .as_ref()
                .ok_or_else(|| GeoError::invalid_feature(index, "missing geometry"))?;
            match geometry.kind.as_str() {
                "Polygon" => {
                    let rings = geojson::polygon_rings(&geometry.coordinates)
                        .ok_or_else(|| GeoError::invalid_feature(index, "malformed polygon"))?;
                    polygons.push(build_polygon(rings));
                }
                "MultiPolygon" => {
                    let parts = geometry
                        .coordinates
                        .as_array()
                        .ok_or_else(|| GeoError::invalid_feature(index, "malformed multipolygon"))?;
                    for part in parts {
                        let rings = geojson::polygon_rings(part).ok_or_else(|| {
                            GeoError::invalid_feature(index, "malformed multipolygon part")
                        })?;
                        polygons.push(build_polygon(rings));
                    }
                }
                other => {
                    return Err(GeoError::invalid_feature(
                        index,
                        format!("expected polygon geometry, got {other}"),
                    ));
                }
            }
        }

        if polygons.is_empty() {
            return Err(GeoError::NoPolygons);
        }
        Ok(Self::from_multipolygon(MultiPolygon::new(polygons)))
    }

    // ── Queries ───────────────────────────────────────────────────────────

    /// Whether `point` lies within the fence.  Boundary points count as
    /// inside.  Always `false` in degraded mode.
    pub fn contains(&self, point: Waypoint) -> bool {
        match &self.region {
            Some(region) => region.intersects(&Point::new(point.x, point.y)),
            None => false,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.region.is_none()
    }

    pub fn polygon_count(&self) -> usize {
        self.region.as_ref().map_or(0, |r| r.0.len())
    }
}

/// First ring is the exterior, the rest are holes.
fn build_polygon(rings: Vec<Vec<(f64, f64)>>) -> Polygon<f64> {
    let mut iter = rings.into_iter().map(|ring| {
        LineString::from(
            ring.into_iter()
                .map(|(x, y)| Coord { x, y })
                .collect::<Vec<_>>(),
        )
    });
    let exterior = iter.next().unwrap_or_else(|| LineString::new(vec![]));
    Polygon::new(exterior, iter.collect())
}
