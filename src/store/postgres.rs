use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client as RedisClient};
use sqlx::PgPool;

use super::{LocationStore, ProfileStore, StoreError, VendorProfile, VendorSnapshot};
use crate::geo::Coordinates;
use crate::location::{Position, VendorLocationState};

// 缓存相关常量
const PROFILE_CACHE_EXPIRE: u64 = 600; // 商户资料缓存过期时间，单位秒
const PROFILE_CACHE_PREFIX: &str = "vendor:profile:"; // 商户资料缓存前缀

#[derive(Debug, sqlx::FromRow)]
struct LocationRow {
    vendor_id: String,
    active: bool,
    latitude: Option<f64>,
    longitude: Option<f64>,
    last_update: Option<DateTime<Utc>>,
}

impl LocationRow {
    fn into_state(self) -> VendorLocationState {
        let position = match (self.latitude, self.longitude, self.last_update) {
            (Some(lat), Some(lng), Some(last_update)) => match Coordinates::new(lat, lng) {
                Ok(coordinates) => Some(Position {
                    coordinates,
                    last_update,
                }),
                Err(e) => {
                    tracing::warn!("Ignoring invalid stored position for {}: {}", self.vendor_id, e);
                    None
                }
            },
            (None, None, None) => None,
            _ => {
                tracing::warn!("Ignoring partial stored position for {}", self.vendor_id);
                None
            }
        };
        VendorLocationState {
            active: self.active,
            position,
        }
    }

    fn into_snapshot(self) -> VendorSnapshot {
        VendorSnapshot {
            vendor_id: self.vendor_id.clone(),
            state: self.into_state(),
        }
    }
}

/// Postgres-backed location state. Each operation is one SQL statement, so
/// coordinates and timestamp are written or cleared together.
#[derive(Clone)]
pub struct PgLocationStore {
    pool: PgPool,
}

impl PgLocationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LocationStore for PgLocationStore {
    async fn get(&self, vendor_id: &str) -> Result<Option<VendorLocationState>, StoreError> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT vendor_id, active, latitude, longitude, last_update
            FROM vendor_locations
            WHERE vendor_id = $1
            "#,
        )
        .bind(vendor_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LocationRow::into_state))
    }

    async fn set_location(
        &self,
        vendor_id: &str,
        coordinates: Coordinates,
        at: DateTime<Utc>,
    ) -> Result<Option<VendorLocationState>, StoreError> {
        // 仅更新处于活跃状态的记录，条件判断与写入在同一语句内完成
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            UPDATE vendor_locations
            SET latitude = $2, longitude = $3, last_update = $4
            WHERE vendor_id = $1 AND active
            RETURNING vendor_id, active, latitude, longitude, last_update
            "#,
        )
        .bind(vendor_id)
        .bind(coordinates.latitude())
        .bind(coordinates.longitude())
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LocationRow::into_state))
    }

    async fn set_active(
        &self,
        vendor_id: &str,
        active: bool,
    ) -> Result<VendorLocationState, StoreError> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            INSERT INTO vendor_locations (vendor_id, active, latitude, longitude, last_update)
            VALUES ($1, $2, NULL, NULL, NULL)
            ON CONFLICT (vendor_id)
            DO UPDATE SET
                active = EXCLUDED.active,
                latitude = CASE WHEN EXCLUDED.active THEN vendor_locations.latitude END,
                longitude = CASE WHEN EXCLUDED.active THEN vendor_locations.longitude END,
                last_update = CASE WHEN EXCLUDED.active THEN vendor_locations.last_update END
            RETURNING vendor_id, active, latitude, longitude, last_update
            "#,
        )
        .bind(vendor_id)
        .bind(active)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Vendor {} active set to {}", vendor_id, active);
        Ok(row.into_state())
    }

    async fn scan_active(&self) -> Result<Vec<VendorSnapshot>, StoreError> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT vendor_id, active, latitude, longitude, last_update
            FROM vendor_locations
            WHERE active
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LocationRow::into_snapshot).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    vendor_id: String,
    business_name: String,
    owner_name: String,
    phone: String,
    description: String,
    offerings: Vec<String>,
}

impl From<ProfileRow> for VendorProfile {
    fn from(row: ProfileRow) -> Self {
        Self {
            vendor_id: row.vendor_id,
            business_name: row.business_name,
            owner_name: row.owner_name,
            phone: row.phone,
            description: row.description,
            offerings: row.offerings,
        }
    }
}

const PROFILE_SELECT: &str = r#"
    SELECT
        v.vendor_id, v.business_name, v.owner_name, v.phone, v.description,
        COALESCE(
            ARRAY_AGG(o.name ORDER BY o.position) FILTER (WHERE o.name IS NOT NULL),
            '{}'
        ) AS offerings
    FROM vendors v
    LEFT JOIN vendor_offerings o ON o.vendor_id = v.vendor_id
"#;

/// Profile reads with a short-lived redis cache on single lookups.
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
    redis: Option<Arc<RedisClient>>,
}

impl PgProfileStore {
    pub fn new(pool: PgPool, redis: Option<Arc<RedisClient>>) -> Self {
        Self { pool, redis }
    }

    async fn cached(&self, cache_key: &str) -> Option<VendorProfile> {
        let redis = self.redis.as_ref()?;
        let mut conn = redis.get_multiplexed_async_connection().await.ok()?;
        let json_str: String = conn.get(cache_key).await.ok()?;
        let profile = serde_json::from_str::<VendorProfile>(&json_str).ok()?;
        tracing::debug!("Get vendor profile from cache: {}", cache_key);
        Some(profile)
    }

    async fn cache(&self, cache_key: &str, profile: &VendorProfile) {
        let Some(redis) = self.redis.as_ref() else {
            return;
        };
        if let Ok(mut conn) = redis.get_multiplexed_async_connection().await {
            if let Ok(json_str) = serde_json::to_string(profile) {
                let _: Result<(), redis::RedisError> =
                    conn.set_ex(cache_key, json_str, PROFILE_CACHE_EXPIRE).await;
                tracing::debug!("Set vendor profile to cache: {}", cache_key);
            }
        }
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn profile(&self, vendor_id: &str) -> Result<Option<VendorProfile>, StoreError> {
        let cache_key = format!("{}{}", PROFILE_CACHE_PREFIX, vendor_id);
        if let Some(profile) = self.cached(&cache_key).await {
            return Ok(Some(profile));
        }

        let sql = format!("{PROFILE_SELECT} WHERE v.vendor_id = $1 GROUP BY v.vendor_id");
        let profile = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(vendor_id)
            .fetch_optional(&self.pool)
            .await?
            .map(VendorProfile::from);

        if let Some(ref p) = profile {
            self.cache(&cache_key, p).await;
        }

        Ok(profile)
    }

    async fn profiles(
        &self,
        vendor_ids: &[String],
    ) -> Result<HashMap<String, VendorProfile>, StoreError> {
        if vendor_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let sql = format!("{PROFILE_SELECT} WHERE v.vendor_id = ANY($1) GROUP BY v.vendor_id");
        let rows = sqlx::query_as::<_, ProfileRow>(&sql)
            .bind(vendor_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|row| (row.vendor_id.clone(), VendorProfile::from(row)))
            .collect())
    }
}
