//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::config::StorefrontConfig;
use crate::gateway::Gateway;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    gateway: Gateway,
}

impl AppState {
    /// Create a new application state backed by Firebase.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `pool` - `PostgreSQL` connection pool (sessions)
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        let gateway = Gateway::firebase(&config.firebase);
        Self::with_gateway(config, pool, gateway)
    }

    /// Create application state with an explicit gateway.
    #[must_use]
    pub fn with_gateway(config: StorefrontConfig, pool: PgPool, gateway: Gateway) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                gateway,
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Get a reference to the remote data gateway.
    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.inner.gateway
    }
}
