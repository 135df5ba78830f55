#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reporting types computed over stored location samples.

use chrono::{DateTime, NaiveDate, Utc};
use geofence_spatial_models::{Bounds, Coordinate};
use geofence_validation_models::Violation;
use serde::{Deserialize, Serialize};

/// Narrows a sample set for reporting. Every field is optional.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleFilter {
    /// Only samples for this project.
    #[serde(default)]
    pub project_id: Option<i64>,
    /// Only samples for this employee.
    #[serde(default)]
    pub employee_id: Option<i64>,
    /// First included day (UTC), inclusive.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Last included day (UTC), inclusive.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl SampleFilter {
    /// Restricts the filter to one project.
    #[must_use]
    pub const fn for_project(project_id: i64) -> Self {
        Self {
            project_id: Some(project_id),
            employee_id: None,
            date_from: None,
            date_to: None,
        }
    }
}

/// Compliance summary for a sample set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComplianceStats {
    /// Samples considered.
    pub total_samples: usize,
    /// Samples inside at least one zone.
    pub compliant_samples: usize,
    /// Samples with any recorded violation.
    pub violation_samples: usize,
    /// Percentage of compliant samples, two decimals.
    pub compliance_rate: f64,
    /// Mean distance to the nearest zone over validated samples, two
    /// decimals.
    pub average_distance: f64,
    /// Largest distance to the nearest zone.
    pub max_distance: f64,
}

/// Geographic extent of a sample set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coverage {
    /// Midpoint of `bounds`.
    pub center: Option<Coordinate>,
    /// Extent of every sample coordinate.
    pub bounds: Option<Bounds>,
    /// Planar approximation of the bounded area in square meters.
    pub approx_area_sq_meters: f64,
    /// Samples considered.
    pub total_points: usize,
}

/// One recorded violation batch, flattened with its sample's identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViolationRecord {
    /// Sample the batch belongs to.
    pub sample_id: i64,
    /// Employee of the sample.
    pub employee_id: Option<i64>,
    /// Project of the sample.
    pub project_id: Option<i64>,
    /// When the batch was recorded.
    pub timestamp: DateTime<Utc>,
    /// Where the sample was.
    pub coordinates: Coordinate,
    /// The batch's violations.
    pub violations: Vec<Violation>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_dates_parse_as_calendar_days() {
        let filter: SampleFilter =
            serde_json::from_str(r#"{"project_id": 3, "date_from": "2026-10-01"}"#).unwrap();
        assert_eq!(filter.project_id, Some(3));
        assert_eq!(filter.date_from, NaiveDate::from_ymd_opt(2026, 10, 1));
        assert!(filter.date_to.is_none());
        assert!(filter.employee_id.is_none());
    }

    #[test]
    fn empty_coverage_has_no_center() {
        let coverage = Coverage::default();
        assert!(coverage.center.is_none());
        assert_eq!(coverage.total_points, 0);
    }
}
