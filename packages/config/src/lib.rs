#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Configuration for the geofence engine.
//!
//! The shipped defaults live in `config/default.toml` and are embedded at
//! compile time. An override file only needs the keys it changes; it is
//! merged over the embedded defaults table by table.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use toml::{Table, Value};

/// The embedded default configuration.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Hard ceiling on `zones.max_radius_meters`.
pub const RADIUS_CEILING_METERS: u32 = 50_000;

/// Hard ceiling on `zones.max_buffer_meters`.
pub const BUFFER_CEILING_METERS: u32 = 1_000;

/// Errors from loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML or has the wrong shape.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but are inconsistent.
    #[error("Invalid config: {message}")]
    Invalid {
        /// Which setting is wrong and why.
        message: String,
    },
}

/// Bounds enforced on zone definitions before they are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneLimits {
    /// Smallest allowed radius in meters.
    pub min_radius_meters: u32,
    /// Largest allowed radius in meters.
    pub max_radius_meters: u32,
    /// Largest allowed buffer in meters.
    pub max_buffer_meters: u32,
    /// Most polygon vertices, not counting the closing point.
    pub max_polygon_points: usize,
    /// Longest allowed zone name, in characters.
    pub max_name_length: usize,
}

impl Default for ZoneLimits {
    fn default() -> Self {
        GeofenceConfig::default().zones
    }
}

/// Settings for violation reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationSettings {
    /// Number of recent violations returned when no limit is given.
    pub default_recent_limit: usize,
    /// Upper bound on any requested limit.
    pub max_recent_limit: usize,
}

impl Default for ViolationSettings {
    fn default() -> Self {
        GeofenceConfig::default().violations
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeofenceConfig {
    /// Zone definition bounds.
    pub zones: ZoneLimits,
    /// Violation reporting settings.
    pub violations: ViolationSettings,
}

impl Default for GeofenceConfig {
    /// The embedded `config/default.toml`.
    ///
    /// # Panics
    ///
    /// * If the embedded default configuration does not parse or validate
    fn default() -> Self {
        Self::from_toml_str("").expect("embedded default config is valid")
    }
}

impl GeofenceConfig {
    /// Parses `toml_str`, merges it over the embedded defaults, and
    /// validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML and
    /// [`ConfigError::Invalid`] for inconsistent values.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let mut merged: Table = toml::de::from_str(DEFAULT_CONFIG_TOML)?;
        let overrides: Table = toml::de::from_str(toml_str)?;
        merge(&mut merged, overrides);

        let config: Self = Value::Table(merged).try_into()?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// same errors as [`Self::from_toml_str`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents)?;
        log::info!("Loaded geofence config from {}", path.display());
        Ok(config)
    }

    /// Checks that the configured bounds are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let zones = &self.zones;
        if zones.min_radius_meters == 0 {
            return Err(invalid("zones.min_radius_meters must be at least 1"));
        }
        if zones.max_radius_meters > RADIUS_CEILING_METERS {
            return Err(invalid(format!(
                "zones.max_radius_meters ({}) is above {RADIUS_CEILING_METERS}",
                zones.max_radius_meters
            )));
        }
        if zones.max_radius_meters < zones.min_radius_meters {
            return Err(invalid(format!(
                "zones.max_radius_meters ({}) is below zones.min_radius_meters ({})",
                zones.max_radius_meters, zones.min_radius_meters
            )));
        }
        if zones.max_buffer_meters > BUFFER_CEILING_METERS {
            return Err(invalid(format!(
                "zones.max_buffer_meters ({}) is above {BUFFER_CEILING_METERS}",
                zones.max_buffer_meters
            )));
        }
        if zones.max_polygon_points < 3 {
            return Err(invalid("zones.max_polygon_points must be at least 3"));
        }
        if zones.max_name_length == 0 {
            return Err(invalid("zones.max_name_length must be at least 1"));
        }

        let violations = &self.violations;
        if violations.max_recent_limit == 0 {
            return Err(invalid("violations.max_recent_limit must be at least 1"));
        }
        if violations.default_recent_limit == 0
            || violations.default_recent_limit > violations.max_recent_limit
        {
            return Err(invalid(format!(
                "violations.default_recent_limit ({}) must be between 1 and \
                 violations.max_recent_limit ({})",
                violations.default_recent_limit, violations.max_recent_limit
            )));
        }

        Ok(())
    }

    /// Renders the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

/// Overlays `overrides` onto `base`, descending into tables present in both.
fn merge(base: &mut Table, overrides: Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(Value::Table(existing)), Value::Table(nested)) => merge(existing, nested),
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        message: message.into(),
    }
}
