//! Containment and distance for a single zone.

use geofence_spatial::{distance, point_in_polygon};
use geofence_spatial_models::Coordinate;
use geofence_zone_models::Zone;

/// Outcome of matching one point against one zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneMatch {
    /// Whether the point is inside the zone (boundary inclusive).
    pub within: bool,
    /// Meters from the point to the zone center.
    pub distance: f64,
}

/// Matches `point` against `zone`.
///
/// Polygon zones test containment against the ring. The reported distance
/// is always measured to the zone center, for polygon zones too, so the
/// buffer threshold keeps meaning "this far from the site" regardless of
/// the zone's shape.
#[must_use]
pub fn match_zone(zone: &Zone, point: &Coordinate) -> ZoneMatch {
    let distance = distance(point, &zone.center);

    let within = zone.polygon.as_deref().map_or_else(
        || distance <= f64::from(zone.radius_meters),
        |ring| point_in_polygon(point, ring),
    );

    ZoneMatch { within, distance }
}
