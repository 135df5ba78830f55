#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Location samples and geofence validation results.
//!
//! A [`LocationSample`] is one GPS check-in. Validating it yields a
//! [`ValidationResult`]; any [`Violation`]s are appended to the sample's
//! history as a [`ViolationBatch`] and announced through a
//! [`GeofenceViolationDetected`] event.

use chrono::{DateTime, Utc};
use geofence_spatial_models::Coordinate;
use geofence_zone_models::Zone;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// How serious a zone violation is.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViolationSeverity {
    /// Outside a non-strict zone by more than its radius plus buffer.
    Warning,
    /// Outside a strictly enforced zone by any amount.
    Strict,
}

/// One zone that a location violated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// The violated zone.
    pub zone_id: i64,
    /// Zone name at the time of the violation.
    pub zone_name: String,
    /// Meters from the location to the zone center.
    pub distance: f64,
    /// Severity classification.
    pub severity: ViolationSeverity,
    /// Human-readable description.
    pub message: String,
}

/// A set of violations recorded together for one check-in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationBatch {
    /// When the batch was recorded.
    pub timestamp: DateTime<Utc>,
    /// The violations found.
    pub violations: Vec<Violation>,
    /// Where the sample was when the violations were found.
    pub coordinates: Coordinate,
}

/// One GPS observation tied to an employee and project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    /// Primary key.
    pub id: i64,
    /// Reported position.
    pub coordinates: Coordinate,
    /// Project the check-in belongs to.
    #[serde(default)]
    pub project_id: Option<i64>,
    /// Employee who checked in.
    #[serde(default)]
    pub employee_id: Option<i64>,
    /// When the observation was taken.
    pub recorded_at: DateTime<Utc>,
    /// Whether the position was inside at least one applicable zone.
    #[serde(default)]
    pub is_within_any_zone: bool,
    /// Meters to the closest applicable zone, once validated.
    #[serde(default)]
    pub distance_from_site: Option<f64>,
    /// Append-only violation history, oldest first.
    #[serde(default)]
    pub violations: Vec<ViolationBatch>,
    /// Optimistic concurrency token, bumped by the store on every save.
    #[serde(default)]
    pub version: u64,
}

impl LocationSample {
    /// Whether any violation has ever been recorded for this sample.
    #[must_use]
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }
}

/// A check-in that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLocationSample {
    /// Reported position.
    pub coordinates: Coordinate,
    /// Project the check-in belongs to.
    #[serde(default)]
    pub project_id: Option<i64>,
    /// Employee who checked in.
    #[serde(default)]
    pub employee_id: Option<i64>,
    /// When the observation was taken.
    pub recorded_at: DateTime<Utc>,
}

impl NewLocationSample {
    /// Turns the check-in into an unvalidated stored sample.
    #[must_use]
    pub fn into_sample(self, id: i64) -> LocationSample {
        LocationSample {
            id,
            coordinates: self.coordinates,
            project_id: self.project_id,
            employee_id: self.employee_id,
            recorded_at: self.recorded_at,
            is_within_any_zone: false,
            distance_from_site: None,
            violations: Vec::new(),
            version: 0,
        }
    }
}

/// The zone closest to a validated location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosestZone {
    /// Zone id.
    pub zone_id: i64,
    /// Zone name.
    pub zone_name: String,
    /// Meters to the zone center.
    pub distance: f64,
}

/// Outcome of validating one location against its applicable zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// Inside some zone, or nothing was violated.
    pub is_valid: bool,
    /// Inside at least one zone.
    pub is_within_any_zone: bool,
    /// Violations in zone input order.
    pub violations: Vec<Violation>,
    /// Closest zone by center distance; first wins on ties.
    pub closest_zone: Option<ClosestZone>,
    /// Number of zones the location was checked against.
    pub total_zones_checked: usize,
}

/// The nearest zone to a point along with its full definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearestZone {
    /// The zone.
    pub zone: Zone,
    /// Meters to the zone center.
    pub distance: f64,
}

/// Signal raised whenever violations are recorded for a sample.
///
/// Consumers (notifications, escalation) receive it asynchronously; the
/// engine never waits on them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceViolationDetected {
    /// The sample after the new batch was appended.
    pub sample: LocationSample,
    /// The violations in the new batch.
    pub violations: Vec<Violation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr as _;

    #[test]
    fn severity_strings() {
        assert_eq!(ViolationSeverity::Strict.to_string(), "strict");
        assert_eq!(
            ViolationSeverity::from_str("warning").unwrap(),
            ViolationSeverity::Warning
        );
        assert_eq!(
            serde_json::to_value(ViolationSeverity::Strict).unwrap(),
            "strict"
        );
    }

    #[test]
    fn new_sample_starts_unvalidated() {
        let sample = NewLocationSample {
            coordinates: Coordinate::new(24.7136, 46.6753),
            project_id: Some(1),
            employee_id: Some(2),
            recorded_at: Utc::now(),
        }
        .into_sample(5);

        assert_eq!(sample.id, 5);
        assert!(!sample.is_within_any_zone);
        assert!(sample.distance_from_site.is_none());
        assert!(!sample.has_violations());
        assert_eq!(sample.version, 0);
    }

    #[test]
    fn sample_history_defaults_when_absent() {
        let json = r#"{
            "id": 1,
            "coordinates": {"latitude": 1.0, "longitude": 2.0},
            "recorded_at": "2026-10-14T08:00:00Z"
        }"#;
        let sample: LocationSample = serde_json::from_str(json).unwrap();
        assert!(sample.violations.is_empty());
        assert!(sample.project_id.is_none());
    }
}
