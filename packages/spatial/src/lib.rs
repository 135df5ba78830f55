#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geometry primitives for geofence matching.
//!
//! Provides haversine distance on a spherical Earth, ray-casting
//! point-in-polygon with an inclusive boundary, coordinate range
//! validation, and bounding boxes over point sets. Everything here is a
//! pure function of its inputs.
//!
//! Coordinates are handed to `geo` as `x = longitude, y = latitude`.

use geo::{BoundingRect, Coord, Intersects, LineString, MultiPoint, Point};
use geofence_spatial_models::{Bounds, Coordinate};
use thiserror::Error;

/// Mean Earth radius used for every distance computation, in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Errors from coordinate validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeoError {
    /// Latitude or longitude is outside its valid range (or not finite).
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate {
        /// Which bound was violated.
        message: String,
    },
}

/// Validates a latitude/longitude pair and returns it as a [`Coordinate`].
///
/// Values are never clamped.
///
/// # Errors
///
/// Returns [`GeoError::InvalidCoordinate`] naming the violated bound if the
/// latitude is outside `[-90, 90]`, the longitude is outside `[-180, 180]`,
/// or either value is not finite.
pub fn validate_coordinate(latitude: f64, longitude: f64) -> Result<Coordinate, GeoError> {
    if !latitude.is_finite() {
        return Err(GeoError::InvalidCoordinate {
            message: format!("latitude {latitude} is not a finite number"),
        });
    }
    if !longitude.is_finite() {
        return Err(GeoError::InvalidCoordinate {
            message: format!("longitude {longitude} is not a finite number"),
        });
    }
    if latitude < -90.0 {
        return Err(GeoError::InvalidCoordinate {
            message: format!("latitude {latitude} is below the minimum of -90"),
        });
    }
    if latitude > 90.0 {
        return Err(GeoError::InvalidCoordinate {
            message: format!("latitude {latitude} is above the maximum of 90"),
        });
    }
    if longitude < -180.0 {
        return Err(GeoError::InvalidCoordinate {
            message: format!("longitude {longitude} is below the minimum of -180"),
        });
    }
    if longitude > 180.0 {
        return Err(GeoError::InvalidCoordinate {
            message: format!("longitude {longitude} is above the maximum of 180"),
        });
    }

    Ok(Coordinate::new(latitude, longitude))
}

/// Validates an existing [`Coordinate`].
///
/// # Errors
///
/// Same conditions as [`validate_coordinate`].
pub fn check_coordinate(coordinate: &Coordinate) -> Result<(), GeoError> {
    validate_coordinate(coordinate.latitude, coordinate.longitude).map(|_| ())
}

/// Great-circle distance between two coordinates in meters (haversine).
///
/// Symmetric in its arguments and zero for identical points.
#[must_use]
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let c = 2.0 * h.sqrt().min(1.0).asin();

    EARTH_RADIUS_METERS * c
}

/// The point reached by travelling `meters` along a great circle from
/// `origin` at the given initial bearing (degrees clockwise from north).
///
/// Uses the same sphere as [`distance`], so `distance(origin,
/// destination(origin, b, d))` is `d` up to floating point error.
#[must_use]
pub fn destination(origin: &Coordinate, bearing_degrees: f64, meters: f64) -> Coordinate {
    let angular = meters / EARTH_RADIUS_METERS;
    let bearing = bearing_degrees.to_radians();
    let lat1 = origin.latitude.to_radians();
    let lon1 = origin.longitude.to_radians();

    let lat2 = (lat1.sin() * angular.cos() + lat1.cos() * angular.sin() * bearing.cos()).asin();
    let lon2 = lon1
        + (bearing.sin() * angular.sin() * lat1.cos())
            .atan2(angular.cos() - lat1.sin() * lat2.sin());

    let mut longitude = lon2.to_degrees();
    if longitude > 180.0 {
        longitude -= 360.0;
    } else if longitude < -180.0 {
        longitude += 360.0;
    }

    Coordinate::new(lat2.to_degrees(), longitude)
}

/// Whether `point` lies inside the ring described by `ring`.
///
/// Even-odd ray casting. Points on an edge or vertex count as inside.
/// The ring may be open or closed;
/// the closing edge is implied either way. Rings with fewer than three
/// vertices contain nothing.
#[must_use]
pub fn point_in_polygon(point: &Coordinate, ring: &[Coordinate]) -> bool {
    if ring.len() < 3 {
        log::debug!(
            "Polygon ring with {} vertices cannot contain a point",
            ring.len()
        );
        return false;
    }

    let p = to_coord(point);
    let vertices: Vec<Coord<f64>> = ring.iter().map(to_coord).collect();

    let mut boundary = vertices.clone();
    if boundary.first() != boundary.last() {
        boundary.push(boundary[0]);
    }
    if Point::from(p).intersects(&LineString::from(boundary)) {
        return true;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let a = vertices[i];
        let b = vertices[j];
        if (a.y > p.y) != (b.y > p.y) {
            let x_cross = (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

/// Bounding box of a point set, or `None` when the set is empty.
#[must_use]
pub fn bounding_box<'a, I>(points: I) -> Option<Bounds>
where
    I: IntoIterator<Item = &'a Coordinate>,
{
    let multi: MultiPoint<f64> = MultiPoint::new(
        points
            .into_iter()
            .map(|c| Point::from(to_coord(c)))
            .collect(),
    );

    multi
        .bounding_rect()
        .map(|rect| Bounds::new(rect.max().y, rect.min().y, rect.max().x, rect.min().x))
}

const fn to_coord(coordinate: &Coordinate) -> Coord<f64> {
    Coord {
        x: coordinate.longitude,
        y: coordinate.latitude,
    }
}
