//! Live vendor discovery: active scan, freshness filter, radius filter,
//! nearest-first ranking, then the profile join.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::geo::Coordinates;
use crate::location::Freshness;
use crate::store::{LocationStore, ProfileStore, StoreError, VendorSnapshot};

/// 默认搜索半径（英里）
pub const DEFAULT_RADIUS_MILES: f64 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiscoveryQuery {
    pub origin: Option<Coordinates>,
    pub radius_miles: f64,
}

impl Default for DiscoveryQuery {
    fn default() -> Self {
        Self {
            origin: None,
            radius_miles: DEFAULT_RADIUS_MILES,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub vendor_id: String,
    pub coordinates: Coordinates,
    pub last_update: DateTime<Utc>,
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveVendor {
    pub vendor_id: String,
    pub business_name: String,
    pub owner_name: String,
    pub phone: String,
    pub description: String,
    pub offerings: Vec<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub last_update: DateTime<Utc>,
    pub distance: f64,
}

/// Filters and orders a scan of active records.
///
/// Records that are inactive, stale, or missing a position are dropped. With
/// an origin, survivors beyond the radius are dropped and the rest sorted by
/// distance (stable, so ties keep scan order). Without one, scan order is
/// kept and every distance is 0.
pub fn rank(
    snapshots: Vec<VendorSnapshot>,
    freshness: &Freshness,
    query: &DiscoveryQuery,
    now: DateTime<Utc>,
) -> Vec<Candidate> {
    let live = snapshots.into_iter().filter_map(|snapshot| {
        if !snapshot.state.active || !freshness.is_fresh(snapshot.state.last_update(), now) {
            return None;
        }
        let position = snapshot.state.position?;
        Some(Candidate {
            vendor_id: snapshot.vendor_id,
            coordinates: position.coordinates,
            last_update: position.last_update,
            distance: 0.0,
        })
    });

    let Some(origin) = query.origin else {
        return live.collect();
    };

    let mut nearby: Vec<Candidate> = live
        .map(|mut candidate| {
            candidate.distance = origin.distance_to(&candidate.coordinates);
            candidate
        })
        .filter(|candidate| candidate.distance <= query.radius_miles)
        .collect();

    // 按距离排序
    nearby.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    nearby
}

/// Runs a discovery query against the stores. Any store failure aborts the
/// whole query; a live vendor without a profile row is skipped.
pub async fn find_live_vendors(
    locations: &dyn LocationStore,
    profiles: &dyn ProfileStore,
    freshness: &Freshness,
    query: &DiscoveryQuery,
    now: DateTime<Utc>,
) -> Result<Vec<LiveVendor>, StoreError> {
    let snapshots = locations.scan_active().await?;
    let scanned = snapshots.len();
    let candidates = rank(snapshots, freshness, query, now);

    let ids: Vec<String> = candidates.iter().map(|c| c.vendor_id.clone()).collect();
    let mut profiles = profiles.profiles(&ids).await?;

    let vendors: Vec<LiveVendor> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let Some(profile) = profiles.remove(&candidate.vendor_id) else {
                tracing::warn!("Skipping live vendor {} without profile", candidate.vendor_id);
                return None;
            };
            Some(LiveVendor {
                vendor_id: candidate.vendor_id,
                business_name: profile.business_name,
                owner_name: profile.owner_name,
                phone: profile.phone,
                description: profile.description,
                offerings: profile.offerings,
                latitude: candidate.coordinates.latitude(),
                longitude: candidate.coordinates.longitude(),
                last_update: candidate.last_update,
                distance: candidate.distance,
            })
        })
        .collect();

    tracing::debug!(
        "Discovery scanned {} active vendors, returning {}",
        scanned,
        vendors.len()
    );
    Ok(vendors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::EARTH_RADIUS_MILES;
    use crate::location::{Position, VendorLocationState};
    use crate::store::{MemoryLocationStore, MemoryProfileStore, VendorProfile};
    use chrono::{TimeDelta, TimeZone};
    use std::f64::consts::PI;

    const MILES_PER_DEGREE: f64 = EARTH_RADIUS_MILES * PI / 180.0;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    fn origin() -> Coordinates {
        Coordinates::new(40.0, -75.0).unwrap()
    }

    /// A point due north of the origin at the given distance.
    fn north_of_origin(miles: f64) -> Coordinates {
        Coordinates::new(40.0 + miles / MILES_PER_DEGREE, -75.0).unwrap()
    }

    fn live(vendor_id: &str, coordinates: Coordinates, at: DateTime<Utc>) -> VendorSnapshot {
        VendorSnapshot {
            vendor_id: vendor_id.to_string(),
            state: VendorLocationState {
                active: true,
                position: Some(Position {
                    coordinates,
                    last_update: at,
                }),
            },
        }
    }

    fn near(radius_miles: f64) -> DiscoveryQuery {
        DiscoveryQuery {
            origin: Some(origin()),
            radius_miles,
        }
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.vendor_id.as_str()).collect()
    }

    #[test]
    fn fresh_vendor_at_origin_is_found_then_expires() {
        let f = Freshness::default();
        let scan = || vec![live("v", origin(), t0())];

        let found = rank(scan(), &f, &near(10.0), t0() + TimeDelta::minutes(5));
        assert_eq!(ids(&found), ["v"]);
        assert!(found[0].distance.abs() < 1e-9);

        let expired = rank(scan(), &f, &near(10.0), t0() + TimeDelta::minutes(20));
        assert!(expired.is_empty());
    }

    #[test]
    fn results_are_nearest_first() {
        let scan = vec![
            live("v2", north_of_origin(8.0), t0()),
            live("v1", north_of_origin(2.0), t0()),
        ];
        let found = rank(scan, &Freshness::default(), &near(50.0), t0());
        assert_eq!(ids(&found), ["v1", "v2"]);
        assert!((found[0].distance - 2.0).abs() < 1e-6);
        assert!((found[1].distance - 8.0).abs() < 1e-6);
    }

    #[test]
    fn vendor_outside_radius_is_excluded() {
        let scan = vec![live("far", north_of_origin(60.0), t0())];
        assert!(rank(scan, &Freshness::default(), &near(50.0), t0()).is_empty());
    }

    #[test]
    fn without_origin_keeps_scan_order_and_zero_distance() {
        let scan = vec![
            live("a", north_of_origin(60.0), t0()),
            live("b", north_of_origin(1.0), t0()),
        ];
        let found = rank(scan, &Freshness::default(), &DiscoveryQuery::default(), t0());
        assert_eq!(ids(&found), ["a", "b"]);
        assert!(found.iter().all(|c| c.distance == 0.0));
    }

    #[test]
    fn inactive_and_positionless_records_are_dropped() {
        let mut inactive = live("inactive", origin(), t0());
        inactive.state.active = false;
        let positionless = VendorSnapshot {
            vendor_id: "positionless".into(),
            state: VendorLocationState {
                active: true,
                position: None,
            },
        };
        let scan = vec![inactive, positionless, live("ok", origin(), t0())];
        let found = rank(scan, &Freshness::default(), &near(1.0), t0());
        assert_eq!(ids(&found), ["ok"]);
    }

    #[test]
    fn empty_scan_is_empty_result() {
        let found = rank(Vec::new(), &Freshness::default(), &DiscoveryQuery::default(), t0());
        assert!(found.is_empty());
    }

    fn profile(vendor_id: &str, business_name: &str) -> VendorProfile {
        VendorProfile {
            vendor_id: vendor_id.into(),
            business_name: business_name.into(),
            owner_name: "Owner".into(),
            phone: "555-0100".into(),
            description: String::new(),
            offerings: vec!["tacos".into(), "horchata".into()],
        }
    }

    #[tokio::test]
    async fn joins_profiles_and_skips_vendors_without_one() {
        let locations = MemoryLocationStore::new();
        let profiles = MemoryProfileStore::new();
        profiles.insert(profile("v1", "Taco Truck")).unwrap();

        for (id, miles) in [("v1", 3.0), ("orphan", 1.0)] {
            locations.set_active(id, true).await.unwrap();
            locations
                .set_location(id, north_of_origin(miles), t0())
                .await
                .unwrap();
        }

        let found = find_live_vendors(
            &locations,
            &profiles,
            &Freshness::default(),
            &near(50.0),
            t0() + TimeDelta::minutes(1),
        )
        .await
        .unwrap();

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].vendor_id, "v1");
        assert_eq!(found[0].business_name, "Taco Truck");
        assert_eq!(found[0].offerings, ["tacos", "horchata"]);
        assert!((found[0].distance - 3.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn no_live_vendors_is_empty_not_error() {
        let found = find_live_vendors(
            &MemoryLocationStore::new(),
            &MemoryProfileStore::new(),
            &Freshness::default(),
            &DiscoveryQuery::default(),
            t0(),
        )
        .await
        .unwrap();
        assert!(found.is_empty());
    }
}
