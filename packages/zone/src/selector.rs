//! Narrows a zone snapshot to the zones that apply to a check-in.
//!
//! Two independent filters: project scope ([`applicable_zones`]) and the
//! weekly time window ([`zones_in_effect`]). Both take an already-fetched
//! snapshot and never look anything up themselves.

use chrono::{Datelike as _, NaiveDateTime};
use geofence_zone_models::{TimeRestrictions, Zone};

/// Zones that apply to `project_id`.
///
/// With a project, that is the project's own zones plus every global zone.
/// Without one, only global zones apply. Inactive zones are always
/// dropped, even though snapshot sources are expected to filter them
/// already. Input order is preserved.
#[must_use]
pub fn applicable_zones(zones: &[Zone], project_id: Option<i64>) -> Vec<&Zone> {
    zones
        .iter()
        .filter(|zone| zone.active)
        .filter(|zone| zone.is_global() || zone.project_id == project_id)
        .collect()
}

/// Whether a zone's time window is open at the local time `at`.
///
/// Missing or disabled restrictions are always open. An empty day list
/// means every day. Windows whose end is before their start wrap past
/// midnight.
#[must_use]
pub fn restrictions_apply(restrictions: Option<&TimeRestrictions>, at: NaiveDateTime) -> bool {
    let Some(restrictions) = restrictions.filter(|r| r.enabled) else {
        return true;
    };

    let weekday = u8::try_from(at.weekday().num_days_from_sunday()).unwrap_or(u8::MAX);
    if !restrictions.days_of_week.is_empty() && !restrictions.days_of_week.contains(&weekday) {
        return false;
    }

    let time = at.time();
    match (restrictions.start_time, restrictions.end_time) {
        (Some(start), Some(end)) if start <= end => start <= time && time <= end,
        (Some(start), Some(end)) => time >= start || time <= end,
        (Some(start), None) => time >= start,
        (None, Some(end)) => time <= end,
        (None, None) => true,
    }
}

/// Keeps only the zones whose time window is open at `at`.
#[must_use]
pub fn zones_in_effect(zones: Vec<&Zone>, at: NaiveDateTime) -> Vec<&Zone> {
    let before = zones.len();
    let in_effect: Vec<&Zone> = zones
        .into_iter()
        .filter(|zone| restrictions_apply(zone.time_restrictions.as_ref(), at))
        .collect();

    if in_effect.len() < before {
        log::debug!(
            "{} of {before} zones are outside their time window at {at}",
            before - in_effect.len()
        );
    }

    in_effect
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, Utc};
    use geofence_spatial_models::Coordinate;
    use geofence_zone_models::ZoneType;

    use super::*;

    fn zone(id: i64, project_id: Option<i64>, active: bool) -> Zone {
        Zone {
            id,
            name: format!("zone-{id}"),
            description: None,
            zone_type: ZoneType::Office,
            center: Coordinate::new(40.7128, -74.0060),
            radius_meters: 100,
            polygon: None,
            project_id,
            strict_enforcement: false,
            buffer_meters: 0,
            active,
            time_restrictions: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids(zones: &[&Zone]) -> Vec<i64> {
        zones.iter().map(|z| z.id).collect()
    }

    fn business_hours() -> TimeRestrictions {
        TimeRestrictions {
            enabled: true,
            start_time: NaiveTime::from_hms_opt(9, 0, 0),
            end_time: NaiveTime::from_hms_opt(17, 0, 0),
            days_of_week: vec![1, 2, 3, 4, 5],
        }
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, min, 0))
            .unwrap()
    }

    #[test]
    fn project_scope_includes_globals() {
        let zones = vec![
            zone(1, None, true),
            zone(2, Some(10), true),
            zone(3, Some(20), true),
            zone(4, None, true),
        ];
        assert!(zones[0].is_global());
        assert!(!zones[1].is_global());
        assert_eq!(ids(&applicable_zones(&zones, Some(10))), vec![1, 2, 4]);
        assert_eq!(ids(&applicable_zones(&zones, Some(20))), vec![1, 3, 4]);
    }

    #[test]
    fn no_project_means_globals_only() {
        let zones = vec![zone(1, None, true), zone(2, Some(10), true)];
        assert_eq!(ids(&applicable_zones(&zones, None)), vec![1]);
    }

    #[test]
    fn inactive_zones_never_apply() {
        let zones = vec![zone(1, None, false), zone(2, Some(10), false)];
        assert!(applicable_zones(&zones, Some(10)).is_empty());
        assert!(applicable_zones(&zones, None).is_empty());
    }

    #[test]
    fn business_hours_window() {
        let window = business_hours();
        // 2026-10-14 is a Wednesday.
        assert!(restrictions_apply(Some(&window), at(2026, 10, 14, 9, 0)));
        assert!(restrictions_apply(Some(&window), at(2026, 10, 14, 17, 0)));
        assert!(!restrictions_apply(Some(&window), at(2026, 10, 14, 20, 0)));
        // 2026-10-18 is a Sunday.
        assert!(!restrictions_apply(Some(&window), at(2026, 10, 18, 12, 0)));
    }

    #[test]
    fn disabled_or_missing_restrictions_always_apply() {
        let mut window = business_hours();
        window.enabled = false;
        assert!(restrictions_apply(Some(&window), at(2026, 10, 18, 3, 0)));
        assert!(restrictions_apply(None, at(2026, 10, 18, 3, 0)));
    }

    #[test]
    fn overnight_window_wraps() {
        let window = TimeRestrictions {
            enabled: true,
            start_time: NaiveTime::from_hms_opt(22, 0, 0),
            end_time: NaiveTime::from_hms_opt(6, 0, 0),
            days_of_week: vec![],
        };
        assert!(restrictions_apply(Some(&window), at(2026, 10, 14, 23, 30)));
        assert!(restrictions_apply(Some(&window), at(2026, 10, 14, 5, 0)));
        assert!(!restrictions_apply(Some(&window), at(2026, 10, 14, 12, 0)));
    }

    #[test]
    fn zones_in_effect_filters_closed_windows() {
        let mut restricted = zone(1, None, true);
        restricted.time_restrictions = Some(business_hours());
        let open = zone(2, None, true);
        let zones = vec![restricted, open];

        let evening = zones_in_effect(applicable_zones(&zones, None), at(2026, 10, 14, 20, 0));
        assert_eq!(ids(&evening), vec![2]);

        let midday = zones_in_effect(applicable_zones(&zones, None), at(2026, 10, 14, 12, 0));
        assert_eq!(ids(&midday), vec![1, 2]);
    }
}
