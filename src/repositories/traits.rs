//! Store contracts consumed by the services.
//!
//! The PostgreSQL implementations live next to this file; tests swap in the
//! in-memory doubles from `repositories::memory`.

use async_trait::async_trait;

use crate::availability::{MaterialAvailability, VehicleAvailability, Window, WindowBounds};
use crate::config::ReservationsConfig;
use crate::error::AppResult;
use crate::models::{
    MaterialReservationChanges, MaterialReservationDetails, NewMaterialReservation,
    NewVehicleReservation, Vehicle, VehicleReservationChanges, VehicleReservationDetails,
};

/// Filters accepted by the list operations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationFilter {
    pub bounds: WindowBounds,
    pub stato: Option<String>,
    /// `materiale_id` or `veicolo_id`
    pub resource_id: Option<i32>,
}

/// Result of a write guarded by an availability check
#[derive(Debug, Clone, PartialEq)]
pub enum Booking<T, A> {
    Accepted(T),
    Rejected(A),
}

#[async_trait]
pub trait MaterialReservationStore: Send + Sync {
    /// Reservations matching the filter, ordered by `data_inizio`
    async fn list(&self, filter: &ReservationFilter) -> AppResult<Vec<MaterialReservationDetails>>;

    async fn find(&self, id: i32) -> AppResult<Option<MaterialReservationDetails>>;

    /// Fails with `NotFound` when the material does not exist
    async fn check_availability(
        &self,
        materiale_id: i32,
        window: Window,
        quantita: i32,
        exclude_id: Option<i32>,
    ) -> AppResult<MaterialAvailability>;

    /// Re-checks availability and inserts under a lock on the material row.
    ///
    /// # Arguments
    /// * `reservation` - Row to insert, status already defaulted
    ///
    /// # Returns
    /// `Accepted` with the stored reservation, or `Rejected` with the figures
    /// that fell short
    async fn create(
        &self,
        reservation: NewMaterialReservation,
    ) -> AppResult<Booking<MaterialReservationDetails, MaterialAvailability>>;

    /// Applies a partial change set inside one transaction.
    ///
    /// # Arguments
    /// * `id` - Reservation to change
    /// * `changes` - Fields to overwrite; `None` keeps the stored value
    /// * `policy` - Decides whether status transitions and availability are checked
    ///
    /// # Returns
    /// `None` when the reservation does not exist
    async fn update(
        &self,
        id: i32,
        changes: MaterialReservationChanges,
        policy: ReservationsConfig,
    ) -> AppResult<Option<Booking<MaterialReservationDetails, MaterialAvailability>>>;

    /// Hard delete.
    ///
    /// # Returns
    /// The removed record, or `None` when nothing was deleted (including when
    /// a concurrent delete got there first)
    async fn delete(&self, id: i32) -> AppResult<Option<MaterialReservationDetails>>;
}

#[async_trait]
pub trait VehicleReservationStore: Send + Sync {
    async fn list(&self, filter: &ReservationFilter) -> AppResult<Vec<VehicleReservationDetails>>;

    async fn find(&self, id: i32) -> AppResult<Option<VehicleReservationDetails>>;

    /// Fails with `NotFound` when the vehicle does not exist
    async fn check_availability(
        &self,
        veicolo_id: i32,
        window: Window,
        exclude_id: Option<i32>,
    ) -> AppResult<VehicleAvailability>;

    /// Bookable vehicles without an overlapping active reservation.
    ///
    /// # Arguments
    /// * `window` - Period the vehicle must be free for
    /// * `tipo` - Restricts the listing to one vehicle type
    /// * `exclude_maintenance` - Also drops vehicles with overlapping maintenance
    ///
    /// # Returns
    /// Matching vehicles ordered by plate
    async fn list_available(
        &self,
        window: Window,
        tipo: Option<&str>,
        exclude_maintenance: bool,
    ) -> AppResult<Vec<Vehicle>>;

    /// Runs the full three-source check and inserts under a lock on the
    /// vehicle row
    async fn create(
        &self,
        reservation: NewVehicleReservation,
    ) -> AppResult<Booking<VehicleReservationDetails, VehicleAvailability>>;

    async fn update(
        &self,
        id: i32,
        changes: VehicleReservationChanges,
        policy: ReservationsConfig,
    ) -> AppResult<Option<Booking<VehicleReservationDetails, VehicleAvailability>>>;

    /// Same contract as [`MaterialReservationStore::delete`]
    async fn delete(&self, id: i32) -> AppResult<Option<VehicleReservationDetails>>;
}
