//! Service layer for business logic operations.
//!
//! Services apply the reservation policies and translate store outcomes
//! into `AppError`s for the handlers.

mod material_reservation_service;
mod vehicle_reservation_service;

pub use material_reservation_service::MaterialReservationService;
pub use vehicle_reservation_service::VehicleReservationService;

use crate::config::ReservationsConfig;
use crate::repositories::Repositories;

/// Aggregates all services for convenient access.
///
/// This struct is designed to be used as Axum application state.
/// Cloning is cheap since the stores are shared behind `Arc`.
#[derive(Clone)]
pub struct Services {
    pub material_reservations: MaterialReservationService,
    pub vehicle_reservations: VehicleReservationService,
}

impl Services {
    /// Creates a new Services instance from Repositories.
    pub fn new(repos: Repositories, policy: ReservationsConfig) -> Self {
        Self {
            material_reservations: MaterialReservationService::new(
                repos.material_reservations,
                policy,
            ),
            vehicle_reservations: VehicleReservationService::new(repos.vehicle_reservations, policy),
        }
    }
}
