#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! The geofence service.
//!
//! [`GeofenceService`] ties zone storage, validation, violation recording,
//! and reporting together. Every call reads a fresh zone snapshot from the
//! store, so zone edits take effect on the next call.
//!
//! Zone administration lives in [`zones`], reporting in [`reports`].

pub mod reports;
pub mod zones;

use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Utc};
use geofence_analytics::round2;
use geofence_config::GeofenceConfig;
use geofence_database::{SampleStore, StoreError, ZoneStore};
use geofence_spatial::{GeoError, check_coordinate, validate_coordinate};
use geofence_spatial_models::Coordinate;
use geofence_validation::{
    ViolationEventSink, announce, append_batch, find_nearest_zone, validate,
};
use geofence_validation_models::{
    LocationSample, NearestZone, NewLocationSample, ValidationResult,
};
use geofence_zone::{ZoneError, applicable_zones, zones_in_effect};
use geofence_zone_models::Zone;
use thiserror::Error;

/// Errors surfaced by [`GeofenceService`].
#[derive(Debug, Error)]
pub enum GeofenceError {
    /// A location coordinate is out of range.
    #[error(transparent)]
    Geo(#[from] GeoError),

    /// A zone payload failed validation.
    #[error(transparent)]
    Zone(#[from] ZoneError),

    /// The store failed or the record does not exist.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Another zone already uses this name.
    #[error("A zone named '{name}' already exists")]
    DuplicateZoneName {
        /// The conflicting name.
        name: String,
    },

    /// A request argument is unusable.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// What is wrong.
        message: String,
    },
}

/// Zone administration, check-in validation, and reporting over one store.
pub struct GeofenceService<S> {
    store: Arc<S>,
    sink: Arc<dyn ViolationEventSink>,
    config: GeofenceConfig,
}

impl<S: ZoneStore + SampleStore> GeofenceService<S> {
    /// Creates a service. Violation events go to `sink`.
    pub fn new(store: Arc<S>, sink: Arc<dyn ViolationEventSink>, config: GeofenceConfig) -> Self {
        Self {
            store,
            sink,
            config,
        }
    }

    /// The backing store.
    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &GeofenceConfig {
        &self.config
    }

    /// Validates a location against the zones that apply to `project_id`
    /// right now (local time).
    ///
    /// Nothing is stored and no event is emitted.
    ///
    /// # Errors
    ///
    /// * [`GeofenceError::Geo`] if the coordinate is out of range
    /// * [`GeofenceError::Store`] if the zone snapshot cannot be read
    pub fn validate_location(
        &self,
        latitude: f64,
        longitude: f64,
        project_id: Option<i64>,
        employee_id: Option<i64>,
    ) -> Result<ValidationResult, GeofenceError> {
        self.validate_location_at(
            latitude,
            longitude,
            project_id,
            employee_id,
            Local::now().naive_local(),
        )
    }

    /// Like [`Self::validate_location`], with an explicit local time for
    /// zone time windows.
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate_location`].
    pub fn validate_location_at(
        &self,
        latitude: f64,
        longitude: f64,
        project_id: Option<i64>,
        employee_id: Option<i64>,
        at: NaiveDateTime,
    ) -> Result<ValidationResult, GeofenceError> {
        let point = validate_coordinate(latitude, longitude)?;
        let snapshot = self.store.active_zones()?;
        let result = check_against(&point, &snapshot, project_id, at);

        log::debug!(
            "Validated {point} for employee {employee_id:?}, project {project_id:?}: valid={} within={} zones={}",
            result.is_valid,
            result.is_within_any_zone,
            result.total_zones_checked
        );

        Ok(result)
    }

    /// Stores a new check-in without validating it.
    ///
    /// # Errors
    ///
    /// * [`GeofenceError::Geo`] if the coordinate is out of range
    /// * [`GeofenceError::Store`] if the sample cannot be stored
    pub fn record_sample(&self, sample: NewLocationSample) -> Result<LocationSample, GeofenceError> {
        check_coordinate(&sample.coordinates)?;
        Ok(self.store.insert_sample(sample)?)
    }

    /// Validates a stored sample and persists the outcome.
    ///
    /// Sets `is_within_any_zone` and `distance_from_site` (closest zone,
    /// two decimals), appends any violations as a new batch, and saves the
    /// sample. The violation event is emitted only once the save succeeded
    /// and carries the saved sample. Time windows are evaluated at the
    /// sample's recorded time in local time.
    ///
    /// # Errors
    ///
    /// * [`GeofenceError::Store`] with [`StoreError::SampleNotFound`] for an
    ///   unknown id, or [`StoreError::Conflict`] if the sample was saved by
    ///   someone else in the meantime
    /// * [`GeofenceError::Geo`] if the stored coordinate is out of range
    pub fn process_sample(&self, sample_id: i64) -> Result<ValidationResult, GeofenceError> {
        let mut sample = self.store.get_sample(sample_id)?;
        check_coordinate(&sample.coordinates)?;

        let snapshot = self.store.active_zones()?;
        let at = sample.recorded_at.with_timezone(&Local).naive_local();
        let result = check_against(&sample.coordinates, &snapshot, sample.project_id, at);

        sample.is_within_any_zone = result.is_within_any_zone;
        sample.distance_from_site = result.closest_zone.as_ref().map(|c| round2(c.distance));

        append_batch(&mut sample, &result.violations, Utc::now());

        let saved = self.store.save_sample(&sample)?;
        announce(&saved, result.violations.clone(), self.sink.as_ref());

        log::info!(
            "Processed sample {sample_id}: within={} distance={:?} violations={}",
            saved.is_within_any_zone,
            saved.distance_from_site,
            result.violations.len()
        );

        Ok(result)
    }

    /// The zone applicable to `project_id` whose center is closest to the
    /// location. Time windows are not considered.
    ///
    /// # Errors
    ///
    /// * [`GeofenceError::Geo`] if the coordinate is out of range
    /// * [`GeofenceError::Store`] if the zone snapshot cannot be read
    pub fn find_nearest_zone(
        &self,
        latitude: f64,
        longitude: f64,
        project_id: Option<i64>,
    ) -> Result<Option<NearestZone>, GeofenceError> {
        let point = validate_coordinate(latitude, longitude)?;
        let snapshot = self.store.active_zones()?;
        Ok(find_nearest_zone(
            &point,
            &applicable_zones(&snapshot, project_id),
        ))
    }
}

fn check_against(
    point: &Coordinate,
    snapshot: &[Zone],
    project_id: Option<i64>,
    at: NaiveDateTime,
) -> ValidationResult {
    let zones = zones_in_effect(applicable_zones(snapshot, project_id), at);
    validate(point, &zones)
}
