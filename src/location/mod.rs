mod freshness;
mod state;

pub use freshness::{DEFAULT_STALE_AFTER_SECS, Freshness};
pub use state::{InactiveVendor, Position, VendorLocationState};

use chrono::{DateTime, Utc};

use crate::error::AppError;
use crate::geo::Coordinates;
use crate::store::{LocationStore, ProfileStore};
use crate::utils::{Caller, Role};

/// 只有商户本人可以修改自己的位置状态
fn authorize_owner(caller: &Caller, vendor_id: &str) -> Result<(), AppError> {
    if caller.role != Role::Vendor || caller.vendor_id.as_deref() != Some(vendor_id) {
        return Err(AppError::PermissionDenied(format!(
            "caller {} does not own vendor {}",
            caller.user_id, vendor_id
        )));
    }
    Ok(())
}

async fn ensure_vendor_exists(profiles: &dyn ProfileStore, vendor_id: &str) -> Result<(), AppError> {
    match profiles.profile(vendor_id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::NotFound(format!("vendor {} not found", vendor_id))),
    }
}

/// Records the caller's current position. The vendor must already be active.
/// Raw coordinates are validated only once the caller is known to own the
/// vendor.
pub async fn set_location(
    locations: &dyn LocationStore,
    profiles: &dyn ProfileStore,
    caller: &Caller,
    vendor_id: &str,
    latitude: f64,
    longitude: f64,
    now: DateTime<Utc>,
) -> Result<VendorLocationState, AppError> {
    authorize_owner(caller, vendor_id)?;
    ensure_vendor_exists(profiles, vendor_id).await?;
    let coordinates = Coordinates::new(latitude, longitude)?;

    match locations.set_location(vendor_id, coordinates, now).await? {
        Some(state) => {
            tracing::debug!(
                "Vendor {} reported location ({}, {})",
                vendor_id,
                coordinates.latitude(),
                coordinates.longitude()
            );
            Ok(state)
        }
        None => Err(AppError::Inactive(format!(
            "vendor {} is not active; activate before reporting a location",
            vendor_id
        ))),
    }
}

pub async fn set_active(
    locations: &dyn LocationStore,
    profiles: &dyn ProfileStore,
    caller: &Caller,
    vendor_id: &str,
    active: bool,
) -> Result<VendorLocationState, AppError> {
    authorize_owner(caller, vendor_id)?;
    ensure_vendor_exists(profiles, vendor_id).await?;

    let state = locations.set_active(vendor_id, active).await?;
    tracing::info!("Vendor {} is now {}", vendor_id, if active { "active" } else { "inactive" });
    Ok(state)
}

/// Stored state for the owner. A registered vendor without a record yet
/// reads as the default inactive state.
pub async fn get_state(
    locations: &dyn LocationStore,
    profiles: &dyn ProfileStore,
    caller: &Caller,
    vendor_id: &str,
) -> Result<VendorLocationState, AppError> {
    authorize_owner(caller, vendor_id)?;
    ensure_vendor_exists(profiles, vendor_id).await?;

    Ok(locations.get(vendor_id).await?.unwrap_or_default())
}
