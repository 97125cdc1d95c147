use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::discovery::DEFAULT_RADIUS_MILES;
use crate::location::{DEFAULT_STALE_AFTER_SECS, Freshness};

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub stale_after_secs: i64,
    pub default_search_radius: f64,
    pub max_search_radius: f64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(#[from] env::VarError),
    #[error("invalid {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

fn var_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Defaults for everything except the two required settings.
    pub fn new(database_url: String, jwt_secret: String) -> Self {
        Config {
            database_url,
            redis_url: None,
            jwt_secret,
            server_host: "::".to_string(),
            server_port: 3000,
            api_base_uri: "/api".to_string(),
            rate_limit_window_secs: 60,
            rate_limit_requests: 100,
            stale_after_secs: DEFAULT_STALE_AFTER_SECS,
            default_search_radius: DEFAULT_RADIUS_MILES,
            max_search_radius: 500.0,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let defaults = Config::new(env::var("DATABASE_URL")?, env::var("JWT_SECRET")?);
        let config = Config {
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.is_empty()),
            server_host: var_or("SERVER_HOST", defaults.server_host.clone()),
            server_port: var_or("SERVER_PORT", defaults.server_port),
            api_base_uri: var_or("API_BASE_URI", defaults.api_base_uri.clone()),
            rate_limit_window_secs: var_or("RATE_LIMIT_WINDOW", defaults.rate_limit_window_secs),
            rate_limit_requests: var_or("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests),
            stale_after_secs: var_or("STALE_AFTER_SECS", defaults.stale_after_secs),
            default_search_radius: var_or("DEFAULT_SEARCH_RADIUS", defaults.default_search_radius),
            max_search_radius: var_or("MAX_SEARCH_RADIUS", defaults.max_search_radius),
            ..defaults
        };
        config.validate()?;
        Ok(config)
    }

    /// 检查过期阈值与搜索半径是否可用
    pub fn validate(&self) -> Result<(), ConfigError> {
        if Freshness::try_from_secs(self.stale_after_secs).is_none() {
            return Err(ConfigError::Invalid {
                key: "STALE_AFTER_SECS",
                reason: format!("must be a positive number of seconds, got {}", self.stale_after_secs),
            });
        }
        for (key, radius) in [
            ("DEFAULT_SEARCH_RADIUS", self.default_search_radius),
            ("MAX_SEARCH_RADIUS", self.max_search_radius),
        ] {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: format!("must be a positive number of miles, got {}", radius),
                });
            }
        }
        Ok(())
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// Staleness window from `stale_after_secs`. A config that skipped
    /// [`Config::validate`] falls back to the default window.
    pub fn freshness(&self) -> Freshness {
        Freshness::try_from_secs(self.stale_after_secs).unwrap_or_else(|| {
            tracing::warn!(
                "Unusable stale_after_secs {}, using default window",
                self.stale_after_secs
            );
            Freshness::default()
        })
    }
}
