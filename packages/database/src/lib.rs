#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Zone and location sample storage.
//!
//! The engine talks to storage through the [`ZoneStore`] and
//! [`SampleStore`] traits. [`memory::InMemoryStore`] implements both and
//! can be persisted to a JSON file via [`snapshot`].
//!
//! Samples carry a `version` token. A save whose version no longer matches
//! the stored one fails with [`StoreError::Conflict`], so two writers
//! racing on the same sample's violation history cannot silently drop an
//! append.

pub mod memory;
pub mod snapshot;

use chrono::{DateTime, Utc};
use geofence_validation_models::{LocationSample, NewLocationSample};
use geofence_zone_models::{NewZone, Zone};

pub use memory::InMemoryStore;
pub use snapshot::StoreSnapshot;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No zone with the given id.
    #[error("Zone {id} not found")]
    ZoneNotFound {
        /// The requested id.
        id: i64,
    },

    /// No sample with the given id.
    #[error("Location sample {id} not found")]
    SampleNotFound {
        /// The requested id.
        id: i64,
    },

    /// The sample changed since it was read.
    #[error(
        "Location sample {id} was modified concurrently (expected version {expected}, found {found})"
    )]
    Conflict {
        /// The sample id.
        id: i64,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        found: u64,
    },

    /// Reading or writing the data file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The data file could not be (de)serialized.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Zone storage.
pub trait ZoneStore: Send + Sync {
    /// Active zones in id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be read.
    fn active_zones(&self) -> Result<Vec<Zone>, StoreError>;

    /// Every zone, active or not, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be read.
    fn all_zones(&self) -> Result<Vec<Zone>, StoreError>;

    /// Fetches one zone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ZoneNotFound`] for an unknown id.
    fn get_zone(&self, id: i64) -> Result<Zone, StoreError>;

    /// Stores a validated zone under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be written.
    fn insert_zone(&self, zone: NewZone, now: DateTime<Utc>) -> Result<Zone, StoreError>;

    /// Replaces an existing zone.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ZoneNotFound`] if the zone was never inserted.
    fn save_zone(&self, zone: &Zone) -> Result<(), StoreError>;
}

/// Location sample storage.
pub trait SampleStore: Send + Sync {
    /// Fetches one sample.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SampleNotFound`] for an unknown id.
    fn get_sample(&self, id: i64) -> Result<LocationSample, StoreError>;

    /// Stores a new check-in under a fresh id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be written.
    fn insert_sample(&self, sample: NewLocationSample) -> Result<LocationSample, StoreError>;

    /// Replaces a sample if its version still matches, returning the stored
    /// copy with the bumped version.
    ///
    /// # Errors
    ///
    /// * [`StoreError::SampleNotFound`] if the sample was never inserted
    /// * [`StoreError::Conflict`] if another writer saved it first
    fn save_sample(&self, sample: &LocationSample) -> Result<LocationSample, StoreError>;

    /// Every sample in id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be read.
    fn samples(&self) -> Result<Vec<LocationSample>, StoreError>;
}
