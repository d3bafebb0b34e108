//! Repository layer for data access operations.
//!
//! Each reservation kind is reached through a store trait so the services can
//! run against PostgreSQL in production and in-memory doubles in tests.

mod material_reservation_repo;
#[cfg(test)]
pub mod memory;
mod traits;
mod vehicle_reservation_repo;

pub use material_reservation_repo::MaterialReservationRepository;
pub use traits::{Booking, MaterialReservationStore, ReservationFilter, VehicleReservationStore};
pub use vehicle_reservation_repo::VehicleReservationRepository;

use std::sync::Arc;

use crate::db::AsyncDbPool;

/// Aggregates all stores for convenient access.
///
/// Stores are shared behind `Arc`, so cloning is cheap.
#[derive(Clone)]
pub struct Repositories {
    pub material_reservations: Arc<dyn MaterialReservationStore>,
    pub vehicle_reservations: Arc<dyn VehicleReservationStore>,
}

impl Repositories {
    /// Creates the PostgreSQL-backed stores sharing one pool.
    pub fn new(pool: AsyncDbPool) -> Self {
        Self {
            material_reservations: Arc::new(MaterialReservationRepository::new(pool.clone())),
            vehicle_reservations: Arc::new(VehicleReservationRepository::new(pool)),
        }
    }
}
