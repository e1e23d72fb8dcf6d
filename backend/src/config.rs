//! Engine configuration loaded via OrthoConfig.
//!
//! Values come from `AIRLINE_*` environment variables or a configuration
//! file. Optional fields fall back to defaults in their accessors.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::BookingPolicy;
use crate::outbound::persistence::PoolConfig;

const DEFAULT_POOL_MAX_SIZE: u32 = 10;
const DEFAULT_POOL_MIN_IDLE: u32 = 2;
const DEFAULT_POOL_CONNECTION_TIMEOUT_SECS: u64 = 30;

/// Settings for the booking engine and its PostgreSQL store.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "AIRLINE")]
pub struct BookingSettings {
    /// PostgreSQL connection URL. Without it only the in-memory store is
    /// available.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    pub pool_max_size: Option<u32>,
    /// Idle connections kept warm.
    pub pool_min_idle: Option<u32>,
    /// Seconds to wait for a pooled connection.
    pub pool_connection_timeout_secs: Option<u64>,
    /// Retries after a lost ticket allocation race.
    #[ortho_config(default = 3)]
    pub allocation_retry_limit: u32,
}

impl BookingSettings {
    /// Configured database URL, if any.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn pool_max_size(&self) -> u32 {
        self.pool_max_size.unwrap_or(DEFAULT_POOL_MAX_SIZE)
    }

    pub fn pool_min_idle(&self) -> u32 {
        self.pool_min_idle.unwrap_or(DEFAULT_POOL_MIN_IDLE)
    }

    pub fn pool_connection_timeout(&self) -> Duration {
        Duration::from_secs(
            self.pool_connection_timeout_secs
                .unwrap_or(DEFAULT_POOL_CONNECTION_TIMEOUT_SECS),
        )
    }

    /// Pool configuration for `database_url`, or `None` when no URL is set.
    pub fn pool_config(&self) -> Option<PoolConfig> {
        self.database_url().map(|url| {
            PoolConfig::new(url)
                .with_max_size(self.pool_max_size())
                .with_min_idle(Some(self.pool_min_idle()))
                .with_connection_timeout(self.pool_connection_timeout())
        })
    }

    /// Booking engine tunables.
    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy::new(self.allocation_retry_limit)
    }
}
