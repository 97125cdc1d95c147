//! In-process stores. Every write happens inside one lock critical section,
//! so readers never observe a half-applied update.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{LocationStore, ProfileStore, StoreError, VendorProfile, VendorSnapshot};
use crate::geo::Coordinates;
use crate::location::VendorLocationState;

#[derive(Debug, Default)]
pub struct MemoryLocationStore {
    // 插入顺序即扫描顺序，保证同距离时结果稳定
    records: RwLock<Vec<(String, VendorLocationState)>>,
}

impl MemoryLocationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn get(&self, vendor_id: &str) -> Result<Option<VendorLocationState>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .iter()
            .find(|(id, _)| id == vendor_id)
            .map(|(_, state)| *state))
    }

    async fn set_location(
        &self,
        vendor_id: &str,
        coordinates: Coordinates,
        at: DateTime<Utc>,
    ) -> Result<Option<VendorLocationState>, StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        let Some((_, state)) = records.iter_mut().find(|(id, _)| id == vendor_id) else {
            return Ok(None);
        };
        match state.with_location(coordinates, at) {
            Ok(next) => {
                *state = next;
                Ok(Some(next))
            }
            Err(_) => Ok(None),
        }
    }

    async fn set_active(
        &self,
        vendor_id: &str,
        active: bool,
    ) -> Result<VendorLocationState, StoreError> {
        let mut records = self.records.write().map_err(|_| StoreError::Poisoned)?;
        if let Some((_, state)) = records.iter_mut().find(|(id, _)| id == vendor_id) {
            *state = state.with_active(active);
            return Ok(*state);
        }
        let state = VendorLocationState::default().with_active(active);
        records.push((vendor_id.to_string(), state));
        Ok(state)
    }

    async fn scan_active(&self) -> Result<Vec<VendorSnapshot>, StoreError> {
        let records = self.records.read().map_err(|_| StoreError::Poisoned)?;
        Ok(records
            .iter()
            .filter(|(_, state)| state.active)
            .map(|(vendor_id, state)| VendorSnapshot {
                vendor_id: vendor_id.clone(),
                state: *state,
            })
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct MemoryProfileStore {
    profiles: RwLock<HashMap<String, VendorProfile>>,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, profile: VendorProfile) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().map_err(|_| StoreError::Poisoned)?;
        profiles.insert(profile.vendor_id.clone(), profile);
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn profile(&self, vendor_id: &str) -> Result<Option<VendorProfile>, StoreError> {
        let profiles = self.profiles.read().map_err(|_| StoreError::Poisoned)?;
        Ok(profiles.get(vendor_id).cloned())
    }

    async fn profiles(
        &self,
        vendor_ids: &[String],
    ) -> Result<HashMap<String, VendorProfile>, StoreError> {
        let profiles = self.profiles.read().map_err(|_| StoreError::Poisoned)?;
        Ok(vendor_ids
            .iter()
            .filter_map(|id| profiles.get(id).map(|p| (id.clone(), p.clone())))
            .collect())
    }
}
