#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Per-zone geofence logic.
//!
//! - [`matcher`] decides containment and distance for one zone and one
//!   point.
//! - [`selector`] narrows a zone snapshot to the zones that apply to a
//!   project at a given time.
//! - [`definition`] validates and normalizes administrative zone payloads
//!   before they reach storage.

pub mod definition;
pub mod matcher;
pub mod selector;

use thiserror::Error;

pub use definition::{apply_zone_update, validate_zone_definition};
pub use matcher::{ZoneMatch, match_zone};
pub use selector::{applicable_zones, restrictions_apply, zones_in_effect};

/// Errors from zone definition validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ZoneError {
    /// A center or polygon coordinate is out of range.
    #[error("Invalid coordinate: {message}")]
    InvalidCoordinate {
        /// Which coordinate and which bound.
        message: String,
    },

    /// The polygon ring is unusable.
    #[error("Invalid polygon: {message}")]
    InvalidPolygon {
        /// What is wrong with the ring.
        message: String,
    },

    /// Any other field is out of bounds.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Which field and why.
        message: String,
    },
}
