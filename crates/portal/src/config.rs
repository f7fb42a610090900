//! Portal configuration.

use std::env;

use common::{CacheConfig, DatabaseConfig, MediaConfig, SessionBackend, SessionConfig};
use user_service_lib::config::UserServiceConfig;

/// Portal configuration.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    pub database: DatabaseConfig,
    /// Redis used by the session store
    pub cache: CacheConfig,
    pub session: SessionConfig,
    pub media: MediaConfig,
}

impl PortalConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let session_defaults = SessionConfig::default();
        let media_defaults = MediaConfig::default();

        Self {
            host: env::var("PORTAL_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_parse("PORTAL_PORT").unwrap_or(3000),
            database: UserServiceConfig::from_env().database,
            cache: CacheConfig {
                url: env::var("PORTAL_REDIS_URL")
                    .or_else(|_| env::var("REDIS_URL"))
                    .unwrap_or_else(|_| CacheConfig::default().url),
            },
            session: SessionConfig {
                backend: env_parse::<SessionBackend>("PORTAL_SESSION_BACKEND")
                    .unwrap_or(session_defaults.backend),
                ttl_seconds: env_parse("PORTAL_SESSION_TTL_SECONDS")
                    .unwrap_or(session_defaults.ttl_seconds),
                cookie_name: env::var("PORTAL_SESSION_COOKIE")
                    .unwrap_or(session_defaults.cookie_name),
                cookie_secure: env_parse("PORTAL_COOKIE_SECURE")
                    .unwrap_or(session_defaults.cookie_secure),
            },
            media: MediaConfig {
                root: env::var("PORTAL_MEDIA_ROOT").unwrap_or(media_defaults.root),
                max_upload_bytes: env_parse("PORTAL_MAX_UPLOAD_BYTES")
                    .unwrap_or(media_defaults.max_upload_bytes),
            },
        }
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            database: DatabaseConfig::default(),
            cache: CacheConfig::default(),
            session: SessionConfig::default(),
            media: MediaConfig::default(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}
