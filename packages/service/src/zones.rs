//! Zone administration.

use chrono::Utc;
use geofence_database::{SampleStore, ZoneStore};
use geofence_zone::{apply_zone_update, validate_zone_definition};
use geofence_zone_models::{Zone, ZoneDefinition, ZoneUpdate};

use crate::{GeofenceError, GeofenceService};

impl<S: ZoneStore + SampleStore> GeofenceService<S> {
    /// Stored zones in id order, optionally including inactive ones.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Store`] if the store cannot be read.
    pub fn list_zones(&self, include_inactive: bool) -> Result<Vec<Zone>, GeofenceError> {
        Ok(if include_inactive {
            self.store.all_zones()?
        } else {
            self.store.active_zones()?
        })
    }

    /// Fetches one zone.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Store`] for an unknown id.
    pub fn get_zone(&self, id: i64) -> Result<Zone, GeofenceError> {
        Ok(self.store.get_zone(id)?)
    }

    /// Validates and stores a new zone.
    ///
    /// # Errors
    ///
    /// * [`GeofenceError::Zone`] if the definition is invalid
    /// * [`GeofenceError::DuplicateZoneName`] if the name is taken
    /// * [`GeofenceError::Store`] if the store cannot be written
    pub fn create_zone(&self, definition: ZoneDefinition) -> Result<Zone, GeofenceError> {
        let zone = validate_zone_definition(definition, &self.config.zones)?;
        self.ensure_unique_name(&zone.name, None)?;

        let zone = self.store.insert_zone(zone, Utc::now())?;
        log::info!(
            "Created zone {} '{}' ({}, project {:?})",
            zone.id,
            zone.name,
            zone.zone_type,
            zone.project_id
        );
        Ok(zone)
    }

    /// Applies a partial update to a zone.
    ///
    /// # Errors
    ///
    /// * [`GeofenceError::Store`] for an unknown id
    /// * [`GeofenceError::Zone`] if the merged zone is invalid
    /// * [`GeofenceError::DuplicateZoneName`] if renamed onto another zone
    pub fn update_zone(&self, id: i64, update: ZoneUpdate) -> Result<Zone, GeofenceError> {
        let current = self.store.get_zone(id)?;
        let mut zone = apply_zone_update(&current, update, &self.config.zones)?;
        self.ensure_unique_name(&zone.name, Some(id))?;

        zone.updated_at = Utc::now();
        self.store.save_zone(&zone)?;
        log::info!("Updated zone {id} '{}'", zone.name);
        Ok(zone)
    }

    /// Activates or deactivates a zone. Zones are never deleted.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Store`] for an unknown id.
    pub fn set_zone_active(&self, id: i64, active: bool) -> Result<Zone, GeofenceError> {
        let mut zone = self.store.get_zone(id)?;
        if zone.active != active {
            zone.active = active;
            zone.updated_at = Utc::now();
            self.store.save_zone(&zone)?;
            log::info!(
                "Zone {id} '{}' {}",
                zone.name,
                if active { "activated" } else { "deactivated" }
            );
        }
        Ok(zone)
    }

    /// Flips a zone's active flag.
    ///
    /// # Errors
    ///
    /// Returns [`GeofenceError::Store`] for an unknown id.
    pub fn toggle_zone_active(&self, id: i64) -> Result<Zone, GeofenceError> {
        let zone = self.store.get_zone(id)?;
        self.set_zone_active(id, !zone.active)
    }

    /// Zone names are unique ignoring case and surrounding whitespace.
    fn ensure_unique_name(&self, name: &str, except: Option<i64>) -> Result<(), GeofenceError> {
        let wanted = name.trim();
        let taken = self
            .store
            .all_zones()?
            .iter()
            .filter(|z| Some(z.id) != except)
            .any(|z| z.name.trim().eq_ignore_ascii_case(wanted));

        if taken {
            return Err(GeofenceError::DuplicateZoneName {
                name: wanted.to_string(),
            });
        }
        Ok(())
    }
}
