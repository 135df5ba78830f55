//! JSON data file holding every zone and sample.

use std::path::Path;

use geofence_validation_models::LocationSample;
use geofence_zone_models::Zone;
use serde::{Deserialize, Serialize};

use crate::{InMemoryStore, StoreError};

/// On-disk shape of the data file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// Every zone, active or not.
    #[serde(default)]
    pub zones: Vec<Zone>,
    /// Every location sample.
    #[serde(default)]
    pub samples: Vec<LocationSample>,
}

impl InMemoryStore {
    /// Loads a store from `path`. A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// * [`StoreError::Io`] if the file exists but cannot be read
    /// * [`StoreError::Json`] if its contents are malformed
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            log::info!("No data file at {}, starting empty", path.display());
            return Ok(Self::new());
        }

        let data = std::fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&data)?;
        log::info!(
            "Loaded {} zones and {} samples from {}",
            snapshot.zones.len(),
            snapshot.samples.len(),
            path.display()
        );
        Ok(Self::from_snapshot(snapshot))
    }

    /// Writes the store to `path` as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// * [`StoreError::Json`] if serialization fails
    /// * [`StoreError::Io`] if the file cannot be written
    pub fn save(&self, path: &Path) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.snapshot())?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)?;
        log::debug!("Saved data file {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let path = std::env::temp_dir().join("geofence-missing-data-file.json");
        let _ = std::fs::remove_file(&path);
        let store = InMemoryStore::load(&path).unwrap();
        assert_eq!(store.snapshot(), StoreSnapshot::default());
    }

    #[test]
    fn empty_object_is_an_empty_snapshot() {
        let snapshot: StoreSnapshot = serde_json::from_str("{}").unwrap();
        assert!(snapshot.zones.is_empty());
        assert!(snapshot.samples.is_empty());
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let path = std::env::temp_dir().join(format!(
            "geofence-malformed-{}.json",
            std::process::id()
        ));
        std::fs::write(&path, "{ not json").unwrap();
        let result = InMemoryStore::load(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(StoreError::Json(_))));
    }
}
