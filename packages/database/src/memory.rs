//! In-memory store guarded by a single mutex.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use geofence_validation_models::{LocationSample, NewLocationSample};
use geofence_zone_models::{NewZone, Zone};

use crate::{SampleStore, StoreError, StoreSnapshot, ZoneStore};

#[derive(Default)]
struct State {
    zones: BTreeMap<i64, Zone>,
    samples: BTreeMap<i64, LocationSample>,
    next_zone_id: i64,
    next_sample_id: i64,
}

/// Zones and samples held in ordered maps.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from a snapshot. Fresh ids continue after the
    /// highest id present.
    #[must_use]
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        let zones: BTreeMap<i64, Zone> = snapshot.zones.into_iter().map(|z| (z.id, z)).collect();
        let samples: BTreeMap<i64, LocationSample> =
            snapshot.samples.into_iter().map(|s| (s.id, s)).collect();

        let next_zone_id = zones.keys().next_back().copied().unwrap_or(0);
        let next_sample_id = samples.keys().next_back().copied().unwrap_or(0);

        Self {
            state: Mutex::new(State {
                zones,
                samples,
                next_zone_id,
                next_sample_id,
            }),
        }
    }

    /// Copies the current contents out.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let state = self.lock();
        StoreSnapshot {
            zones: state.zones.values().cloned().collect(),
            samples: state.samples.values().cloned().collect(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ZoneStore for InMemoryStore {
    fn active_zones(&self) -> Result<Vec<Zone>, StoreError> {
        Ok(self
            .lock()
            .zones
            .values()
            .filter(|z| z.active)
            .cloned()
            .collect())
    }

    fn all_zones(&self) -> Result<Vec<Zone>, StoreError> {
        Ok(self.lock().zones.values().cloned().collect())
    }

    fn get_zone(&self, id: i64) -> Result<Zone, StoreError> {
        self.lock()
            .zones
            .get(&id)
            .cloned()
            .ok_or(StoreError::ZoneNotFound { id })
    }

    fn insert_zone(&self, zone: NewZone, now: DateTime<Utc>) -> Result<Zone, StoreError> {
        let mut state = self.lock();
        state.next_zone_id += 1;
        let zone = zone.into_zone(state.next_zone_id, now);
        state.zones.insert(zone.id, zone.clone());
        log::debug!("Inserted zone {} ({})", zone.id, zone.name);
        Ok(zone)
    }

    fn save_zone(&self, zone: &Zone) -> Result<(), StoreError> {
        let mut state = self.lock();
        let slot = state
            .zones
            .get_mut(&zone.id)
            .ok_or(StoreError::ZoneNotFound { id: zone.id })?;
        *slot = zone.clone();
        Ok(())
    }
}

impl SampleStore for InMemoryStore {
    fn get_sample(&self, id: i64) -> Result<LocationSample, StoreError> {
        self.lock()
            .samples
            .get(&id)
            .cloned()
            .ok_or(StoreError::SampleNotFound { id })
    }

    fn insert_sample(&self, sample: NewLocationSample) -> Result<LocationSample, StoreError> {
        let mut state = self.lock();
        state.next_sample_id += 1;
        let sample = sample.into_sample(state.next_sample_id);
        state.samples.insert(sample.id, sample.clone());
        Ok(sample)
    }

    fn save_sample(&self, sample: &LocationSample) -> Result<LocationSample, StoreError> {
        let mut state = self.lock();
        let stored = state
            .samples
            .get_mut(&sample.id)
            .ok_or(StoreError::SampleNotFound { id: sample.id })?;

        if stored.version != sample.version {
            log::warn!(
                "Rejected stale write to sample {} (version {} vs stored {})",
                sample.id,
                sample.version,
                stored.version
            );
            return Err(StoreError::Conflict {
                id: sample.id,
                expected: sample.version,
                found: stored.version,
            });
        }

        let mut updated = sample.clone();
        updated.version += 1;
        *stored = updated.clone();
        Ok(updated)
    }

    fn samples(&self) -> Result<Vec<LocationSample>, StoreError> {
        Ok(self.lock().samples.values().cloned().collect())
    }
}
