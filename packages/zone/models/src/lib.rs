#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Geofence zone types.
//!
//! A zone is a named permitted-work area: a circle around a center point,
//! optionally refined by a polygon ring. Zones are scoped either globally
//! or to a single project, and may carry a weekly time window outside of
//! which their rules do not apply.
//!
//! [`ZoneDefinition`] and [`ZoneUpdate`] are the raw administrative
//! payloads; they are validated and normalized by `geofence_zone` before a
//! [`Zone`] is ever stored.

use chrono::{DateTime, NaiveTime, Utc};
use geofence_spatial_models::Coordinate;
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// The kind of site a zone represents.
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
pub enum ZoneType {
    /// An active construction or project site.
    ProjectSite,
    /// A company office.
    Office,
    /// A storage or logistics warehouse.
    Warehouse,
    /// A restricted area.
    Restricted,
    /// Anything else.
    Custom,
}

impl ZoneType {
    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::ProjectSite => "Project Site",
            Self::Office => "Office",
            Self::Warehouse => "Warehouse",
            Self::Restricted => "Restricted Area",
            Self::Custom => "Custom Zone",
        }
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::ProjectSite,
            Self::Office,
            Self::Warehouse,
            Self::Restricted,
            Self::Custom,
        ]
    }
}

/// Weekly window during which a zone's rules apply.
///
/// Days use `0` = Sunday through `6` = Saturday. An empty day list means
/// every day. Times are local wall-clock times serialized as `HH:MM`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeRestrictions {
    /// Whether the window is enforced at all.
    #[serde(default)]
    pub enabled: bool,
    /// Start of the daily window (inclusive).
    #[serde(default, with = "hh_mm")]
    pub start_time: Option<NaiveTime>,
    /// End of the daily window (inclusive).
    #[serde(default, with = "hh_mm")]
    pub end_time: Option<NaiveTime>,
    /// Days of the week the window applies to.
    #[serde(default)]
    pub days_of_week: Vec<u8>,
}

/// A validated, stored geofence zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Primary key.
    pub id: i64,
    /// Unique zone name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// What kind of site this is.
    pub zone_type: ZoneType,
    /// Center point; also the distance reference for polygon zones.
    pub center: Coordinate,
    /// Radius around the center, 1 to 50,000 meters.
    pub radius_meters: u32,
    /// Closed polygon ring (first point repeated as last), if any.
    #[serde(default)]
    pub polygon: Option<Vec<Coordinate>>,
    /// Owning project, `None` for a global zone.
    #[serde(default)]
    pub project_id: Option<i64>,
    /// Any location outside the zone is a violation, buffer ignored.
    pub strict_enforcement: bool,
    /// Tolerance added to the radius for non-strict zones.
    #[serde(default)]
    pub buffer_meters: u32,
    /// Inactive zones never participate in matching.
    pub active: bool,
    /// Weekly applicability window.
    #[serde(default)]
    pub time_restrictions: Option<TimeRestrictions>,
    /// When the zone was created.
    pub created_at: DateTime<Utc>,
    /// When the zone was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Zone {
    /// Whether containment is evaluated against a polygon.
    #[must_use]
    pub const fn is_polygon(&self) -> bool {
        self.polygon.is_some()
    }

    /// Whether the zone applies to every project.
    #[must_use]
    pub const fn is_global(&self) -> bool {
        self.project_id.is_none()
    }

    /// Radius plus buffer, the distance past which a non-strict zone flags
    /// a warning.
    #[must_use]
    pub fn tolerance_meters(&self) -> f64 {
        f64::from(self.radius_meters) + f64::from(self.buffer_meters)
    }
}

/// A zone that passed validation but has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewZone {
    /// Unique zone name.
    pub name: String,
    /// Free-form description.
    pub description: Option<String>,
    /// What kind of site this is.
    pub zone_type: ZoneType,
    /// Center point.
    pub center: Coordinate,
    /// Radius in meters.
    pub radius_meters: u32,
    /// Closed polygon ring, if any.
    pub polygon: Option<Vec<Coordinate>>,
    /// Owning project.
    pub project_id: Option<i64>,
    /// Strict enforcement flag.
    pub strict_enforcement: bool,
    /// Buffer in meters.
    pub buffer_meters: u32,
    /// Active flag.
    pub active: bool,
    /// Weekly applicability window.
    pub time_restrictions: Option<TimeRestrictions>,
}

impl NewZone {
    /// Turns the validated fields into a stored [`Zone`].
    #[must_use]
    pub fn into_zone(self, id: i64, now: DateTime<Utc>) -> Zone {
        Zone {
            id,
            name: self.name,
            description: self.description,
            zone_type: self.zone_type,
            center: self.center,
            radius_meters: self.radius_meters,
            polygon: self.polygon,
            project_id: self.project_id,
            strict_enforcement: self.strict_enforcement,
            buffer_meters: self.buffer_meters,
            active: self.active,
            time_restrictions: self.time_restrictions,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Payload for creating a zone.
///
/// Numeric fields are wide signed integers so that out-of-range input can
/// be reported instead of failing to parse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneDefinition {
    /// Zone name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: Option<String>,
    /// What kind of site this is.
    pub zone_type: ZoneType,
    /// Center latitude.
    pub center_latitude: f64,
    /// Center longitude.
    pub center_longitude: f64,
    /// Radius in meters.
    pub radius_meters: i64,
    /// Polygon ring; closed automatically if open.
    #[serde(default)]
    pub polygon: Option<Vec<Coordinate>>,
    /// Owning project.
    #[serde(default)]
    pub project_id: Option<i64>,
    /// Strict enforcement; defaults to `false`.
    #[serde(default)]
    pub strict_enforcement: bool,
    /// Buffer in meters; defaults to `0`.
    #[serde(default)]
    pub buffer_meters: i64,
    /// Defaults to `true`.
    #[serde(default = "default_true")]
    pub active: bool,
    /// Weekly applicability window.
    #[serde(default)]
    pub time_restrictions: Option<TimeRestrictions>,
}

/// Payload for updating a zone. Unset fields keep their stored value.
///
/// Nullable fields use `Option<Option<_>>`: absent leaves the value alone,
/// an explicit `null` clears it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ZoneUpdate {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    /// New zone type.
    #[serde(default)]
    pub zone_type: Option<ZoneType>,
    /// New center latitude.
    #[serde(default)]
    pub center_latitude: Option<f64>,
    /// New center longitude.
    #[serde(default)]
    pub center_longitude: Option<f64>,
    /// New radius in meters.
    #[serde(default)]
    pub radius_meters: Option<i64>,
    /// New polygon ring, or `null` to turn the zone back into a circle.
    #[serde(default, deserialize_with = "double_option")]
    pub polygon: Option<Option<Vec<Coordinate>>>,
    /// New owning project, or `null` to make the zone global.
    #[serde(default, deserialize_with = "double_option")]
    pub project_id: Option<Option<i64>>,
    /// New strict enforcement flag.
    #[serde(default)]
    pub strict_enforcement: Option<bool>,
    /// New buffer in meters.
    #[serde(default)]
    pub buffer_meters: Option<i64>,
    /// New active flag.
    #[serde(default)]
    pub active: Option<bool>,
    /// New time window, or `null` to remove it.
    #[serde(default, deserialize_with = "double_option")]
    pub time_restrictions: Option<Option<TimeRestrictions>>,
}

const fn default_true() -> bool {
    true
}

fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// `HH:MM` (de)serialization for optional wall-clock times. Seconds are
/// accepted on input.
mod hh_mm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        NaiveTime::parse_from_str(&raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(&raw, "%H:%M:%S"))
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("invalid time '{raw}': {e}")))
    }
}
