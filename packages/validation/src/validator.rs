//! Validates a location against a set of zones.
//!
//! Zones are checked in the order given. Every zone contributes to the
//! closest-zone tracking, but only zones the point is outside of can
//! produce a [`Violation`]:
//!
//! | zone                 | outside by            | severity  |
//! |----------------------|-----------------------|-----------|
//! | `strict_enforcement` | any amount            | strict    |
//! | otherwise            | more than `buffer`    | warning   |
//!
//! A location inside at least one zone is always valid, even when other
//! zones report violations.

use geofence_spatial_models::Coordinate;
use geofence_validation_models::{
    ClosestZone, NearestZone, ValidationResult, Violation, ViolationSeverity,
};
use geofence_zone::match_zone;
use geofence_zone_models::Zone;

/// Validates `point` against `zones`.
///
/// An empty zone set is valid with no closest zone.
#[must_use]
pub fn validate(point: &Coordinate, zones: &[&Zone]) -> ValidationResult {
    let mut is_within_any_zone = false;
    let mut violations = Vec::new();
    let mut closest: Option<(&Zone, f64)> = None;

    for zone in zones {
        let matched = match_zone(zone, point);
        is_within_any_zone |= matched.within;

        // Strictly less, so the earliest zone keeps a tie.
        if closest.is_none_or(|(_, best)| matched.distance < best) {
            closest = Some((zone, matched.distance));
        }

        if let Some(violation) = classify(zone, matched.within, matched.distance) {
            violations.push(violation);
        }
    }

    let is_valid = is_within_any_zone || violations.is_empty();

    if !violations.is_empty() {
        log::debug!(
            "{point} violates {} of {} zones (within any: {is_within_any_zone})",
            violations.len(),
            zones.len()
        );
    }

    ValidationResult {
        is_valid,
        is_within_any_zone,
        violations,
        closest_zone: closest.map(|(zone, distance)| ClosestZone {
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            distance,
        }),
        total_zones_checked: zones.len(),
    }
}

fn classify(zone: &Zone, within: bool, distance: f64) -> Option<Violation> {
    if within {
        return None;
    }

    let radius = f64::from(zone.radius_meters);

    if zone.strict_enforcement {
        // Polygon zones can be left while still closer than the radius.
        let message = if distance > radius {
            format!(
                "Location is {:.2} meters outside strictly enforced zone '{}'",
                distance - radius,
                zone.name
            )
        } else {
            format!(
                "Location is outside the boundary of strictly enforced zone '{}'",
                zone.name
            )
        };
        return Some(Violation {
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            distance,
            severity: ViolationSeverity::Strict,
            message,
        });
    }

    if distance > zone.tolerance_meters() {
        return Some(Violation {
            zone_id: zone.id,
            zone_name: zone.name.clone(),
            distance,
            severity: ViolationSeverity::Warning,
            message: format!(
                "Location is {:.2} meters beyond the {}m radius of zone '{}'",
                distance - radius,
                zone.radius_meters,
                zone.name
            ),
        });
    }

    None
}

/// The zone whose center is closest to `point`, first wins on ties.
#[must_use]
pub fn find_nearest_zone(point: &Coordinate, zones: &[&Zone]) -> Option<NearestZone> {
    let mut nearest: Option<(&Zone, f64)> = None;

    for zone in zones {
        let distance = match_zone(zone, point).distance;
        if nearest.is_none_or(|(_, best)| distance < best) {
            nearest = Some((zone, distance));
        }
    }

    nearest.map(|(zone, distance)| NearestZone {
        zone: zone.clone(),
        distance,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use geofence_spatial::destination;
    use geofence_zone_models::ZoneType;

    use super::*;

    fn riyadh_site() -> Zone {
        Zone {
            id: 1,
            name: "Riyadh Site".to_string(),
            description: None,
            zone_type: ZoneType::ProjectSite,
            center: Coordinate::new(24.7136, 46.6753),
            radius_meters: 100,
            polygon: None,
            project_id: Some(7),
            strict_enforcement: false,
            buffer_meters: 20,
            active: true,
            time_restrictions: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn unit_square() -> Zone {
        Zone {
            id: 2,
            name: "Unit Square".to_string(),
            center: Coordinate::new(0.5, 0.5),
            radius_meters: 1,
            buffer_meters: 0,
            project_id: None,
            polygon: Some(vec![
                Coordinate::new(0.0, 0.0),
                Coordinate::new(0.0, 1.0),
                Coordinate::new(1.0, 1.0),
                Coordinate::new(1.0, 0.0),
                Coordinate::new(0.0, 0.0),
            ]),
            ..riyadh_site()
        }
    }

    #[test]
    fn empty_zone_set_is_valid() {
        let result = validate(&Coordinate::new(10.0, 10.0), &[]);
        assert!(result.is_valid);
        assert!(!result.is_within_any_zone);
        assert!(result.violations.is_empty());
        assert!(result.closest_zone.is_none());
        assert_eq!(result.total_zones_checked, 0);
    }

    #[test]
    fn within_buffer_is_not_a_violation() {
        let zone = riyadh_site();
        let point = destination(&zone.center, 45.0, 90.0);
        let result = validate(&point, &[&zone]);

        assert!(result.is_within_any_zone);
        assert!(result.is_valid);
        assert!(result.violations.is_empty());
        let closest = result.closest_zone.unwrap();
        assert_eq!(closest.zone_id, 1);
        assert!((closest.distance - 90.0).abs() < 1e-3);
    }

    #[test]
    fn outside_radius_but_inside_buffer_is_silent() {
        let zone = riyadh_site();
        let point = destination(&zone.center, 180.0, 110.0);
        let result = validate(&point, &[&zone]);

        assert!(!result.is_within_any_zone);
        assert!(result.violations.is_empty());
        assert!(result.is_valid);
    }

    #[test]
    fn beyond_buffer_is_a_warning() {
        let zone = riyadh_site();
        let point = destination(&zone.center, 270.0, 130.0);
        let result = validate(&point, &[&zone]);

        assert!(!result.is_within_any_zone);
        assert!(!result.is_valid);
        assert_eq!(result.violations.len(), 1);

        let violation = &result.violations[0];
        assert_eq!(violation.severity, ViolationSeverity::Warning);
        assert_eq!(violation.zone_id, 1);
        assert_eq!(violation.zone_name, "Riyadh Site");
        assert!((violation.distance - 130.0).abs() < 1e-3);
        assert!(violation.message.contains("30.00 meters"));
    }

    #[test]
    fn strict_zone_ignores_buffer() {
        let mut zone = riyadh_site();
        zone.strict_enforcement = true;
        let point = destination(&zone.center, 0.0, 110.0);
        let result = validate(&point, &[&zone]);

        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].severity, ViolationSeverity::Strict);
        assert!(result.violations[0].message.contains("10.00 meters"));
        assert!(!result.is_valid);
    }

    #[test]
    fn inside_one_zone_is_valid_despite_other_violations() {
        let near = riyadh_site();
        let mut far = riyadh_site();
        far.id = 3;
        far.name = "Far Site".to_string();
        far.center = destination(&near.center, 90.0, 5_000.0);

        let result = validate(&near.center, &[&far, &near]);

        assert!(result.is_within_any_zone);
        assert!(result.is_valid);
        assert_eq!(result.violations.len(), 1);
        assert_eq!(result.violations[0].zone_id, 3);
        assert_eq!(result.closest_zone.unwrap().zone_id, 1);
        assert_eq!(result.total_zones_checked, 2);
    }

    #[test]
    fn closest_zone_tie_goes_to_first() {
        let first = riyadh_site();
        let mut second = riyadh_site();
        second.id = 9;

        let point = destination(&first.center, 0.0, 500.0);
        let result = validate(&point, &[&first, &second]);
        assert_eq!(result.closest_zone.unwrap().zone_id, 1);

        let reversed = validate(&point, &[&second, &first]);
        assert_eq!(reversed.closest_zone.unwrap().zone_id, 9);
    }

    #[test]
    fn unit_square_polygon() {
        let zone = unit_square();

        let inside = validate(&Coordinate::new(0.5, 0.5), &[&zone]);
        assert!(inside.is_within_any_zone);
        assert!(inside.violations.is_empty());

        let edge = validate(&Coordinate::new(0.0, 0.5), &[&zone]);
        assert!(edge.is_within_any_zone);

        let outside = validate(&Coordinate::new(2.0, 2.0), &[&zone]);
        assert!(!outside.is_within_any_zone);
        assert_eq!(outside.violations.len(), 1);
        assert_eq!(outside.violations[0].severity, ViolationSeverity::Warning);
    }

    #[test]
    fn strict_polygon_within_radius_names_the_boundary() {
        let mut zone = unit_square();
        zone.strict_enforcement = true;
        zone.radius_meters = 1_000_000;

        let result = validate(&Coordinate::new(2.0, 2.0), &[&zone]);
        assert_eq!(result.violations.len(), 1);
        let message = &result.violations[0].message;
        assert!(message.contains("outside the boundary"), "{message}");
        assert!(!message.contains("meters outside"), "{message}");
    }

    #[test]
    fn nearest_zone_reports_full_zone() {
        let near = riyadh_site();
        let mut far = riyadh_site();
        far.id = 3;
        far.center = destination(&near.center, 90.0, 2_000.0);

        let point = destination(&near.center, 270.0, 300.0);
        let nearest = find_nearest_zone(&point, &[&far, &near]).unwrap();
        assert_eq!(nearest.zone.id, 1);
        assert!((nearest.distance - 300.0).abs() < 1e-3);

        assert!(find_nearest_zone(&point, &[]).is_none());
    }
}
