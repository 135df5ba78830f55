//! Sample selection and violation history flattening.

use chrono::NaiveDate;
use geofence_analytics_models::{SampleFilter, ViolationRecord};
use geofence_validation_models::LocationSample;

use crate::AnalyticsError;

/// Parses a `YYYY-MM-DD` date.
///
/// # Errors
///
/// Returns [`AnalyticsError::InvalidDate`] if `s` is not a calendar date.
pub fn parse_date(s: &str) -> Result<NaiveDate, AnalyticsError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| AnalyticsError::InvalidDate {
        message: format!("'{s}': {e}. Expected format: YYYY-MM-DD"),
    })
}

/// Whether `sample` passes `filter`. Date bounds are whole UTC days.
#[must_use]
pub fn matches(filter: &SampleFilter, sample: &LocationSample) -> bool {
    if filter.project_id.is_some_and(|p| sample.project_id != Some(p)) {
        return false;
    }
    if filter.employee_id.is_some_and(|e| sample.employee_id != Some(e)) {
        return false;
    }

    let day = sample.recorded_at.date_naive();
    if filter.date_from.is_some_and(|from| day < from) {
        return false;
    }
    if filter.date_to.is_some_and(|to| day > to) {
        return false;
    }

    true
}

/// The samples passing `filter`, in input order.
#[must_use]
pub fn filter_samples<'a>(
    samples: &'a [LocationSample],
    filter: &SampleFilter,
) -> Vec<&'a LocationSample> {
    samples.iter().filter(|s| matches(filter, s)).collect()
}

/// Every recorded batch, newest first, at most `limit` of them.
#[must_use]
pub fn recent_violations<'a, I>(samples: I, limit: usize) -> Vec<ViolationRecord>
where
    I: IntoIterator<Item = &'a LocationSample>,
{
    let mut records: Vec<ViolationRecord> = samples
        .into_iter()
        .flat_map(|sample| {
            sample.violations.iter().map(move |batch| ViolationRecord {
                sample_id: sample.id,
                employee_id: sample.employee_id,
                project_id: sample.project_id,
                timestamp: batch.timestamp,
                coordinates: batch.coordinates,
                violations: batch.violations.clone(),
            })
        })
        .collect();

    // Stable, so batches with equal timestamps keep storage order.
    records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    records.truncate(limit);
    records
}
