//! Member service configuration.

use std::env;
use std::str::FromStr;

use common::{DatabaseConfig, LockoutConfig, RepositoryConfig};

/// Member service configuration.
#[derive(Debug, Clone, Default)]
pub struct MemberServiceConfig {
    pub database: DatabaseConfig,
    pub lockout: LockoutConfig,
    pub repository: RepositoryConfig,
}

impl MemberServiceConfig {
    /// Load configuration from `.env` and environment variables.
    ///
    /// Missing or unparsable values fall back to their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        Self {
            database: DatabaseConfig {
                url: env::var("MEMBER_SERVICE_DATABASE_URL")
                    .or_else(|_| env::var("DATABASE_URL"))
                    .unwrap_or(defaults.database.url),
                max_connections: env_parse(
                    "DATABASE_MAX_CONNECTIONS",
                    defaults.database.max_connections,
                ),
                min_connections: env_parse(
                    "DATABASE_MIN_CONNECTIONS",
                    defaults.database.min_connections,
                ),
            },
            lockout: LockoutConfig {
                max_failed_attempts: env_parse(
                    "LOGIN_MAX_FAILED_ATTEMPTS",
                    defaults.lockout.max_failed_attempts,
                ),
                lockout_minutes: env_parse("LOGIN_LOCKOUT_MINUTES", defaults.lockout.lockout_minutes),
                idle_eviction_minutes: env_parse(
                    "LOGIN_IDLE_EVICTION_MINUTES",
                    defaults.lockout.idle_eviction_minutes,
                ),
            },
            repository: RepositoryConfig {
                default_chunk_size: env_parse(
                    "REPOSITORY_CHUNK_SIZE",
                    defaults.repository.default_chunk_size,
                ),
            },
        }
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
