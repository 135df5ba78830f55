#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Reporting over stored location samples.
//!
//! Everything here is a pure reduction over an already-fetched sample
//! slice. Narrow the slice with [`filter::filter_samples`] first.

pub mod compliance;
pub mod coverage;
pub mod filter;

use thiserror::Error;

pub use compliance::aggregate;
pub use coverage::coverage;
pub use filter::{filter_samples, matches, parse_date, recent_violations};

/// Errors that can occur while building reports.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// A date argument could not be parsed.
    #[error("Invalid date: {message}")]
    InvalidDate {
        /// The input and the expected format.
        message: String,
    },
}

/// Rounds to two decimal places.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_keeps_two_decimals() {
        assert!((round2(66.666_666) - 66.67).abs() < 1e-9);
        assert!((round2(-0.125_1) + 0.13).abs() < 1e-9);
        assert!((round2(70.0) - 70.0).abs() < f64::EPSILON);
    }
}
