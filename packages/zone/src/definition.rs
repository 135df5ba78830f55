//! Validation and normalization of zone payloads.
//!
//! Nothing reaches storage without passing through here. Besides range
//! checks, an open polygon ring is closed by appending its first point and
//! weekday lists are sorted and deduplicated.

use geofence_config::{BUFFER_CEILING_METERS, RADIUS_CEILING_METERS, ZoneLimits};
use geofence_spatial::{GeoError, validate_coordinate};
use geofence_spatial_models::Coordinate;
use geofence_zone_models::{NewZone, TimeRestrictions, Zone, ZoneDefinition, ZoneUpdate};

use crate::ZoneError;

/// Validates a create payload.
///
/// # Errors
///
/// * [`ZoneError::InvalidCoordinate`] if the center or any polygon point is
///   out of range.
/// * [`ZoneError::InvalidPolygon`] if the ring has fewer than three
///   vertices or more than `limits.max_polygon_points`.
/// * [`ZoneError::InvalidArgument`] for a blank or overlong name, an
///   out-of-range radius or buffer, or inconsistent time restrictions.
pub fn validate_zone_definition(
    definition: ZoneDefinition,
    limits: &ZoneLimits,
) -> Result<NewZone, ZoneError> {
    let name = validate_name(&definition.name, limits)?;
    let center = validate_coordinate(definition.center_latitude, definition.center_longitude)
        .map_err(|e| located("center", e))?;
    let radius_meters = validate_radius(definition.radius_meters, limits)?;
    let buffer_meters = validate_buffer(definition.buffer_meters, limits)?;
    let polygon = definition
        .polygon
        .map(|ring| normalize_polygon(ring, limits))
        .transpose()?;
    let time_restrictions = definition
        .time_restrictions
        .map(validate_time_restrictions)
        .transpose()?;
    let description = definition
        .description
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    Ok(NewZone {
        name,
        description,
        zone_type: definition.zone_type,
        center,
        radius_meters,
        polygon,
        project_id: definition.project_id,
        strict_enforcement: definition.strict_enforcement,
        buffer_meters,
        active: definition.active,
        time_restrictions,
    })
}

/// Applies an update payload to a stored zone.
///
/// The merged result goes through the same validation as a new zone, so
/// an update can never produce a zone that could not have been created.
/// The returned zone keeps its id and timestamps; the caller stamps
/// `updated_at`.
///
/// # Errors
///
/// Same as [`validate_zone_definition`].
pub fn apply_zone_update(
    zone: &Zone,
    update: ZoneUpdate,
    limits: &ZoneLimits,
) -> Result<Zone, ZoneError> {
    let merged = ZoneDefinition {
        name: update.name.unwrap_or_else(|| zone.name.clone()),
        description: update
            .description
            .unwrap_or_else(|| zone.description.clone()),
        zone_type: update.zone_type.unwrap_or(zone.zone_type),
        center_latitude: update.center_latitude.unwrap_or(zone.center.latitude),
        center_longitude: update.center_longitude.unwrap_or(zone.center.longitude),
        radius_meters: update
            .radius_meters
            .unwrap_or_else(|| i64::from(zone.radius_meters)),
        polygon: update.polygon.unwrap_or_else(|| zone.polygon.clone()),
        project_id: update.project_id.unwrap_or(zone.project_id),
        strict_enforcement: update.strict_enforcement.unwrap_or(zone.strict_enforcement),
        buffer_meters: update
            .buffer_meters
            .unwrap_or_else(|| i64::from(zone.buffer_meters)),
        active: update.active.unwrap_or(zone.active),
        time_restrictions: update
            .time_restrictions
            .unwrap_or_else(|| zone.time_restrictions.clone()),
    };

    let mut updated = validate_zone_definition(merged, limits)?.into_zone(zone.id, zone.created_at);
    updated.updated_at = zone.updated_at;
    Ok(updated)
}

/// Validates every point of a polygon ring and closes it if needed.
///
/// # Errors
///
/// [`ZoneError::InvalidCoordinate`] naming the first bad point, or
/// [`ZoneError::InvalidPolygon`] if the vertex count is out of bounds.
pub fn normalize_polygon(
    mut ring: Vec<Coordinate>,
    limits: &ZoneLimits,
) -> Result<Vec<Coordinate>, ZoneError> {
    if ring.len() < 3 {
        return Err(ZoneError::InvalidPolygon {
            message: format!(
                "a polygon must have at least 3 points, got {}",
                ring.len()
            ),
        });
    }

    for (index, point) in ring.iter().enumerate() {
        validate_coordinate(point.latitude, point.longitude)
            .map_err(|e| located(&format!("polygon point {index}"), e))?;
    }

    if ring.first() != ring.last() {
        let first = ring[0];
        ring.push(first);
        log::debug!("Closed open polygon ring ({} points)", ring.len());
    }

    let vertices = ring.len() - 1;
    if vertices < 3 {
        return Err(ZoneError::InvalidPolygon {
            message: format!(
                "a closed polygon needs at least 3 distinct vertices, got {vertices}"
            ),
        });
    }
    if vertices > limits.max_polygon_points {
        return Err(ZoneError::InvalidPolygon {
            message: format!(
                "a polygon may have at most {} points, got {vertices}",
                limits.max_polygon_points
            ),
        });
    }

    Ok(ring)
}

fn validate_name(name: &str, limits: &ZoneLimits) -> Result<String, ZoneError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ZoneError::InvalidArgument {
            message: "name must not be empty".to_string(),
        });
    }
    if name.chars().count() > limits.max_name_length {
        return Err(ZoneError::InvalidArgument {
            message: format!(
                "name must be at most {} characters",
                limits.max_name_length
            ),
        });
    }
    Ok(name.to_string())
}

fn validate_radius(radius_meters: i64, limits: &ZoneLimits) -> Result<u32, ZoneError> {
    let max = limits.max_radius_meters.min(RADIUS_CEILING_METERS);
    u32::try_from(radius_meters)
        .ok()
        .filter(|r| (limits.min_radius_meters.max(1)..=max).contains(r))
        .ok_or_else(|| ZoneError::InvalidArgument {
            message: format!(
                "radius_meters must be between {} and {max}, got {radius_meters}",
                limits.min_radius_meters.max(1)
            ),
        })
}

fn validate_buffer(buffer_meters: i64, limits: &ZoneLimits) -> Result<u32, ZoneError> {
    let max = limits.max_buffer_meters.min(BUFFER_CEILING_METERS);
    u32::try_from(buffer_meters)
        .ok()
        .filter(|b| *b <= max)
        .ok_or_else(|| ZoneError::InvalidArgument {
            message: format!("buffer_meters must be between 0 and {max}, got {buffer_meters}"),
        })
}

fn validate_time_restrictions(
    mut restrictions: TimeRestrictions,
) -> Result<TimeRestrictions, ZoneError> {
    if let Some(day) = restrictions.days_of_week.iter().find(|d| **d > 6) {
        return Err(ZoneError::InvalidArgument {
            message: format!("days_of_week must be between 0 (Sunday) and 6 (Saturday), got {day}"),
        });
    }
    restrictions.days_of_week.sort_unstable();
    restrictions.days_of_week.dedup();

    if restrictions.enabled {
        let (Some(start), Some(end)) = (restrictions.start_time, restrictions.end_time) else {
            return Err(ZoneError::InvalidArgument {
                message: "enabled time restrictions need both start_time and end_time"
                    .to_string(),
            });
        };
        if end <= start {
            return Err(ZoneError::InvalidArgument {
                message: format!("end_time {end} must be after start_time {start}"),
            });
        }
    }

    Ok(restrictions)
}

fn located(context: &str, error: GeoError) -> ZoneError {
    let GeoError::InvalidCoordinate { message } = error;
    ZoneError::InvalidCoordinate {
        message: format!("{context}: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveTime, Utc};
    use geofence_zone_models::ZoneType;

    use super::*;

    fn definition() -> ZoneDefinition {
        ZoneDefinition {
            name: "Riyadh Site".to_string(),
            description: None,
            zone_type: ZoneType::ProjectSite,
            center_latitude: 24.7136,
            center_longitude: 46.6753,
            radius_meters: 100,
            polygon: None,
            project_id: Some(3),
            strict_enforcement: false,
            buffer_meters: 20,
            active: true,
            time_restrictions: None,
        }
    }

    fn triangle() -> Vec<Coordinate> {
        vec![
            Coordinate::new(24.71, 46.67),
            Coordinate::new(24.72, 46.67),
            Coordinate::new(24.72, 46.68),
        ]
    }

    #[test]
    fn accepts_valid_circle() {
        let zone = validate_zone_definition(definition(), &ZoneLimits::default()).unwrap();
        assert_eq!(zone.radius_meters, 100);
        assert_eq!(zone.buffer_meters, 20);
        assert_eq!(zone.center, Coordinate::new(24.7136, 46.6753));
        assert!(zone.polygon.is_none());
    }

    #[test]
    fn open_triangle_is_closed() {
        let mut def = definition();
        def.polygon = Some(triangle());
        let zone = validate_zone_definition(def, &ZoneLimits::default()).unwrap();
        let ring = zone.polygon.unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.first(), ring.last());
    }

    #[test]
    fn closed_ring_is_left_alone() {
        let mut ring = triangle();
        ring.push(ring[0]);
        let normalized = normalize_polygon(ring.clone(), &ZoneLimits::default()).unwrap();
        assert_eq!(normalized, ring);
    }

    #[test]
    fn rejects_short_polygon() {
        let mut def = definition();
        def.polygon = Some(triangle()[..2].to_vec());
        let err = validate_zone_definition(def, &ZoneLimits::default()).unwrap_err();
        assert!(matches!(err, ZoneError::InvalidPolygon { .. }), "{err}");
    }

    #[test]
    fn rejects_closed_two_vertex_ring() {
        let ring = vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(1.0, 1.0),
            Coordinate::new(0.0, 0.0),
        ];
        let err = normalize_polygon(ring, &ZoneLimits::default()).unwrap_err();
        assert!(matches!(err, ZoneError::InvalidPolygon { .. }), "{err}");
    }

    #[test]
    fn rejects_too_many_polygon_points() {
        let limits = ZoneLimits {
            max_polygon_points: 3,
            ..ZoneLimits::default()
        };
        let mut ring = triangle();
        ring.push(Coordinate::new(24.71, 46.68));
        let err = normalize_polygon(ring, &limits).unwrap_err();
        assert!(err.to_string().contains("at most 3"), "{err}");
    }

    #[test]
    fn rejects_bad_polygon_point() {
        let mut def = definition();
        let mut ring = triangle();
        ring[1] = Coordinate::new(95.0, 46.67);
        def.polygon = Some(ring);
        let err = validate_zone_definition(def, &ZoneLimits::default()).unwrap_err();
        assert!(matches!(err, ZoneError::InvalidCoordinate { .. }), "{err}");
        assert!(err.to_string().contains("polygon point 1"), "{err}");
    }

    #[test]
    fn center_error_names_the_bound() {
        let mut def = definition();
        def.center_longitude = 181.0;
        let err = validate_zone_definition(def, &ZoneLimits::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("center"), "{message}");
        assert!(message.contains("longitude"), "{message}");
        assert!(message.contains("maximum"), "{message}");
    }

    #[test]
    fn radius_and_buffer_bounds() {
        let limits = ZoneLimits::default();
        for radius in [0, -5, 50_001] {
            let mut def = definition();
            def.radius_meters = radius;
            assert!(
                matches!(
                    validate_zone_definition(def, &limits),
                    Err(ZoneError::InvalidArgument { .. })
                ),
                "radius {radius} should be rejected"
            );
        }
        for radius in [1, 50_000] {
            let mut def = definition();
            def.radius_meters = radius;
            assert!(validate_zone_definition(def, &limits).is_ok());
        }

        let mut def = definition();
        def.buffer_meters = -1;
        assert!(validate_zone_definition(def, &limits).is_err());

        let mut def = definition();
        def.buffer_meters = 1_001;
        assert!(validate_zone_definition(def, &limits).is_err());
    }

    #[test]
    fn loose_limits_cannot_exceed_ceilings() {
        let limits = ZoneLimits {
            max_radius_meters: 200_000,
            max_buffer_meters: 10_000,
            ..ZoneLimits::default()
        };

        let mut def = definition();
        def.radius_meters = 150_000;
        let err = validate_zone_definition(def, &limits).unwrap_err();
        assert!(err.to_string().contains("50000"), "{err}");

        let mut def = definition();
        def.buffer_meters = 5_000;
        assert!(validate_zone_definition(def, &limits).is_err());
    }

    #[test]
    fn blank_name_rejected() {
        let mut def = definition();
        def.name = "   ".to_string();
        assert!(validate_zone_definition(def, &ZoneLimits::default()).is_err());
    }

    #[test]
    fn time_restrictions_checked_and_normalized() {
        let mut def = definition();
        def.time_restrictions = Some(TimeRestrictions {
            enabled: true,
            start_time: NaiveTime::from_hms_opt(17, 0, 0),
            end_time: NaiveTime::from_hms_opt(9, 0, 0),
            days_of_week: vec![1],
        });
        assert!(validate_zone_definition(def, &ZoneLimits::default()).is_err());

        let mut def = definition();
        def.time_restrictions = Some(TimeRestrictions {
            enabled: true,
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_time: None,
            days_of_week: vec![],
        });
        assert!(validate_zone_definition(def, &ZoneLimits::default()).is_err());

        let mut def = definition();
        def.time_restrictions = Some(TimeRestrictions {
            enabled: false,
            start_time: None,
            end_time: None,
            days_of_week: vec![7],
        });
        assert!(validate_zone_definition(def, &ZoneLimits::default()).is_err());

        let mut def = definition();
        def.time_restrictions = Some(TimeRestrictions {
            enabled: true,
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_time: NaiveTime::from_hms_opt(17, 0, 0),
            days_of_week: vec![5, 1, 3, 1],
        });
        let zone = validate_zone_definition(def, &ZoneLimits::default()).unwrap();
        assert_eq!(zone.time_restrictions.unwrap().days_of_week, vec![1, 3, 5]);
    }

    #[test]
    fn update_merges_and_revalidates() {
        let created = Utc::now();
        let zone = validate_zone_definition(definition(), &ZoneLimits::default())
            .unwrap()
            .into_zone(9, created);

        let update = ZoneUpdate {
            radius_meters: Some(250),
            project_id: Some(None),
            polygon: Some(Some(triangle())),
            ..ZoneUpdate::default()
        };
        let updated = apply_zone_update(&zone, update, &ZoneLimits::default()).unwrap();
        assert_eq!(updated.id, 9);
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.radius_meters, 250);
        assert_eq!(updated.project_id, None);
        assert_eq!(updated.buffer_meters, 20);
        assert_eq!(updated.polygon.map(|p| p.len()), Some(4));

        let bad = ZoneUpdate {
            radius_meters: Some(0),
            ..ZoneUpdate::default()
        };
        assert!(apply_zone_update(&zone, bad, &ZoneLimits::default()).is_err());
    }

    #[test]
    fn update_can_clear_polygon() {
        let mut def = definition();
        def.polygon = Some(triangle());
        let zone = validate_zone_definition(def, &ZoneLimits::default())
            .unwrap()
            .into_zone(1, Utc::now());

        let update = ZoneUpdate {
            polygon: Some(None),
            ..ZoneUpdate::default()
        };
        let updated = apply_zone_update(&zone, update, &ZoneLimits::default()).unwrap();
        assert!(updated.polygon.is_none());
    }
}
