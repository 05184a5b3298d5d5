use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::application::ports::{SettingsError, SettingsProvider};

const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(60);

/// Operator-tunable defaults written on startup. `ON CONFLICT DO NOTHING`
/// keeps live overrides intact across restarts.
const SEED_DEFAULTS: &[(&str, &str)] = &[
    ("hourly_rate", "80000"),
    ("min_hours", "2"),
    ("base_price", "100000"),
    ("job_searching_timeout_minutes", "15"),
    ("gps_check_radius_meters", "150"),
    ("require_checkin_photo", "false"),
    ("trust_penalty_cancel_searching", "-0.02"),
    ("trust_penalty_cancel_locked", "-0.07"),
    ("trust_reward_rating_5", "0.05"),
    ("trust_reward_rating_4", "0.02"),
    ("trust_penalty_rating_2", "-0.05"),
    ("trust_penalty_rating_1", "-0.10"),
];

struct Cache {
    values: HashMap<String, String>,
    loaded_at: Option<tokio::time::Instant>,
}

/// Key/value settings backed by the `system_settings` table, cached whole
/// with a TTL so hot paths do not hit the database per key.
pub struct PgSettingsProvider {
    pool: PgPool,
    ttl: Duration,
    cache: RwLock<Cache>,
}

impl PgSettingsProvider {
    pub fn new(pool: PgPool) -> Self {
        Self::with_ttl(pool, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(pool: PgPool, ttl: Duration) -> Self {
        Self {
            pool,
            ttl,
            cache: RwLock::new(Cache {
                values: HashMap::new(),
                loaded_at: None,
            }),
        }
    }

    #[instrument(skip(self))]
    pub async fn seed_defaults(&self) -> Result<(), SettingsError> {
        for (key, value) in SEED_DEFAULTS {
            sqlx::query(
                "INSERT INTO system_settings (key, value) VALUES ($1, $2) \
                 ON CONFLICT (key) DO NOTHING",
            )
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await
            .map_err(|e| SettingsError::Unavailable(e.to_string()))?;
        }
        self.invalidate().await;
        Ok(())
    }

    #[instrument(skip(self, value))]
    pub async fn update(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        sqlx::query(
            "INSERT INTO system_settings (key, value) VALUES ($1, $2) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(|e| SettingsError::Unavailable(e.to_string()))?;
        self.invalidate().await;
        Ok(())
    }

    /// Drops the cache so the next read refetches immediately.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        cache.loaded_at = None;
    }

    async fn refresh(&self) -> Result<(), SettingsError> {
        let rows = sqlx::query("SELECT key, value FROM system_settings")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SettingsError::Unavailable(e.to_string()))?;

        let mut values = HashMap::with_capacity(rows.len());
        for row in rows {
            values.insert(row.get::<String, _>("key"), row.get::<String, _>("value"));
        }
        debug!(entries = values.len(), "settings cache refreshed");

        let mut cache = self.cache.write().await;
        cache.values = values;
        cache.loaded_at = Some(tokio::time::Instant::now());
        Ok(())
    }

    async fn cache_is_fresh(&self) -> bool {
        let cache = self.cache.read().await;
        cache
            .loaded_at
            .is_some_and(|loaded| loaded.elapsed() < self.ttl)
    }
}

#[async_trait]
impl SettingsProvider for PgSettingsProvider {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        if !self.cache_is_fresh().await {
            self.refresh().await?;
        }
        let cache = self.cache.read().await;
        Ok(cache.values.get(key).cloned())
    }
}

/// Fixed in-memory settings for tests and offline runs.
#[derive(Default)]
pub struct StaticSettings {
    values: HashMap<String, String>,
}

impl StaticSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }
}

#[async_trait]
impl SettingsProvider for StaticSettings {
    async fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.values.get(key).cloned())
    }
}
