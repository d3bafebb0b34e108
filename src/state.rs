//! Application state for Axum web framework.

use crate::config::ReservationsConfig;
use crate::db::AsyncDbPool;
use crate::repositories::Repositories;
use crate::services::Services;

/// Shared services and resources handed to every handler.
///
/// Cloning is cheap since both Services and AsyncDbPool use Arc internally.
#[derive(Clone)]
pub struct AppState {
    pub services: Services,
    /// Direct pool access for the health probes
    pub db_pool: AsyncDbPool,
}

impl AppState {
    /// Wires the PostgreSQL stores and the services on top of `pool`.
    ///
    /// # Example
    /// ```ignore
    /// let pool = establish_async_connection_pool(&settings.database).await?;
    /// let state = AppState::new(pool, settings.reservations);
    /// ```
    pub fn new(pool: AsyncDbPool, policy: ReservationsConfig) -> Self {
        let repos = Repositories::new(pool.clone());
        let services = Services::new(repos, policy);
        Self {
            services,
            db_pool: pool,
        }
    }
}
