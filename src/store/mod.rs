use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::Coordinates;
use crate::location::VendorLocationState;

pub mod memory;
pub mod postgres;

pub use memory::{MemoryLocationStore, MemoryProfileStore};
pub use postgres::{PgLocationStore, PgProfileStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Profile fields joined onto discovery results. Read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorProfile {
    pub vendor_id: String,
    pub business_name: String,
    pub owner_name: String,
    pub phone: String,
    pub description: String,
    pub offerings: Vec<String>,
}

/// One row of an active-vendor scan.
#[derive(Debug, Clone, PartialEq)]
pub struct VendorSnapshot {
    pub vendor_id: String,
    pub state: VendorLocationState,
}

/// Location state persistence. Each write is applied as one indivisible
/// update of a single vendor's record.
#[async_trait]
pub trait LocationStore: Send + Sync {
    async fn get(&self, vendor_id: &str) -> Result<Option<VendorLocationState>, StoreError>;

    /// Writes coordinates and `at` together. Returns `None` when the vendor
    /// has no record or is not active, in which case nothing is written.
    async fn set_location(
        &self,
        vendor_id: &str,
        coordinates: Coordinates,
        at: DateTime<Utc>,
    ) -> Result<Option<VendorLocationState>, StoreError>;

    /// Creates the record when missing. Deactivation clears the position in
    /// the same update.
    async fn set_active(
        &self,
        vendor_id: &str,
        active: bool,
    ) -> Result<VendorLocationState, StoreError>;

    async fn scan_active(&self) -> Result<Vec<VendorSnapshot>, StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn profile(&self, vendor_id: &str) -> Result<Option<VendorProfile>, StoreError>;

    /// Batch lookup keyed by vendor id. Unknown ids are simply absent.
    async fn profiles(
        &self,
        vendor_ids: &[String],
    ) -> Result<HashMap<String, VendorProfile>, StoreError>;
}
