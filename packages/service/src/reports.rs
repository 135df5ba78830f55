//! Compliance statistics, coverage, and recent violations.

use geofence_analytics::{aggregate, coverage, filter_samples, recent_violations};
use geofence_analytics_models::{ComplianceStats, Coverage, SampleFilter, ViolationRecord};
use geofence_database::{SampleStore, ZoneStore};

use crate::{GeofenceError, GeofenceService};

impl<S: ZoneStore + SampleStore> GeofenceService<S> {
    /// Compliance statistics over the samples matching `filter`.
    ///
    /// # Errors
    ///
    /// * [`GeofenceError::InvalidArgument`] if `date_to` is before
    ///   `date_from`
    /// * [`GeofenceError::Store`] if the samples cannot be read
    pub fn get_statistics(&self, filter: &SampleFilter) -> Result<ComplianceStats, GeofenceError> {
        check_filter(filter)?;
        let samples = self.store.samples()?;
        Ok(aggregate(filter_samples(&samples, filter)))
    }

    /// Geographic coverage of the samples matching `filter`.
    ///
    /// # Errors
    ///
    /// Same as [`Self::get_statistics`].
    pub fn get_coverage(&self, filter: &SampleFilter) -> Result<Coverage, GeofenceError> {
        check_filter(filter)?;
        let samples = self.store.samples()?;
        Ok(coverage(filter_samples(&samples, filter)))
    }

    /// The most recent violation batches, newest first.
    ///
    /// `limit` defaults to `violations.default_recent_limit` and is clamped
    /// to `1..=violations.max_recent_limit`.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Store`] if the samples cannot be read.
    pub fn recent_violations(
        &self,
        limit: Option<usize>,
        project_id: Option<i64>,
    ) -> Result<Vec<ViolationRecord>, GeofenceError> {
        let settings = &self.config.violations;
        let limit = limit
            .unwrap_or(settings.default_recent_limit)
            .clamp(1, settings.max_recent_limit.max(1));

        let filter = SampleFilter {
            project_id,
            ..SampleFilter::default()
        };
        let samples = self.store.samples()?;
        Ok(recent_violations(filter_samples(&samples, &filter), limit))
    }
}

fn check_filter(filter: &SampleFilter) -> Result<(), GeofenceError> {
    if let (Some(from), Some(to)) = (filter.date_from, filter.date_to)
        && to < from
    {
        return Err(GeofenceError::InvalidArgument {
            message: format!("date_to {to} is before date_from {from}"),
        });
    }
    Ok(())
}
