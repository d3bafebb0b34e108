//! Material reservation business rules.
//!
//! Wraps a `MaterialReservationStore`, turning missing rows into `NotFound`
//! and rejected availability checks into 400 conflicts.

use std::sync::Arc;

use tracing::{info, warn};

use crate::availability::{MaterialAvailability, Window};
use crate::config::ReservationsConfig;
use crate::error::{AppError, AppResult};
use crate::models::{MaterialReservationChanges, MaterialReservationDetails, NewMaterialReservation};
use crate::repositories::{Booking, MaterialReservationStore, ReservationFilter};

fn ensure_positive_quantity(quantita: i32) -> AppResult<()> {
    if quantita < 1 {
        return Err(AppError::validation(
            "quantita",
            "La quantità deve essere almeno 1",
        ));
    }
    Ok(())
}

#[derive(Clone)]
pub struct MaterialReservationService {
    store: Arc<dyn MaterialReservationStore>,
    policy: ReservationsConfig,
}

impl MaterialReservationService {
    pub fn new(store: Arc<dyn MaterialReservationStore>, policy: ReservationsConfig) -> Self {
        Self { store, policy }
    }

    pub async fn list(&self, filter: &ReservationFilter) -> AppResult<Vec<MaterialReservationDetails>> {
        self.store.list(filter).await
    }

    /// Gets one reservation, or `NotFound`
    pub async fn get(&self, id: i32) -> AppResult<MaterialReservationDetails> {
        self.store
            .find(id)
            .await?
            .ok_or_else(AppError::reservation_not_found)
    }

    /// Computes availability without writing anything.
    ///
    /// # Arguments
    /// * `materiale_id` - Material to check
    /// * `window` - Requested period, bounds included
    /// * `quantita` - Units wanted, at least 1
    /// * `exclude_id` - Reservation left out of the count, used when editing it
    ///
    /// # Returns
    /// The raw figures and whether they cover `quantita`, or `NotFound`
    pub async fn check_availability(
        &self,
        materiale_id: i32,
        window: Window,
        quantita: i32,
        exclude_id: Option<i32>,
    ) -> AppResult<MaterialAvailability> {
        ensure_positive_quantity(quantita)?;
        self.store
            .check_availability(materiale_id, window, quantita, exclude_id)
            .await
    }

    /// Books the material if the window still has enough stock.
    ///
    /// # Errors
    /// `Conflict` with the computed figures when the quantity is short,
    /// `NotFound` when the material does not exist.
    pub async fn create(
        &self,
        reservation: NewMaterialReservation,
    ) -> AppResult<MaterialReservationDetails> {
        ensure_positive_quantity(reservation.quantita)?;
        let materiale_id = reservation.materiale_id;

        match self.store.create(reservation).await? {
            Booking::Accepted(details) => {
                info!(
                    reservation_id = details.reservation.id,
                    materiale_id,
                    quantita = details.reservation.quantita,
                    "Material reservation created"
                );
                Ok(details)
            }
            Booking::Rejected(availability) => {
                warn!(
                    materiale_id,
                    richiesta = availability.richiesta,
                    disponibile = availability.disponibile,
                    "Material reservation rejected"
                );
                Err(availability.into_conflict())
            }
        }
    }

    /// Partial update. Availability is re-checked only when
    /// `reservations.revalidate_on_update` is set.
    pub async fn update(
        &self,
        id: i32,
        changes: MaterialReservationChanges,
    ) -> AppResult<MaterialReservationDetails> {
        if let Some(quantita) = changes.quantita {
            ensure_positive_quantity(quantita)?;
        }

        match self.store.update(id, changes, self.policy).await? {
            Some(Booking::Accepted(details)) => {
                info!(
                    reservation_id = id,
                    stato = %details.reservation.stato,
                    "Material reservation updated"
                );
                Ok(details)
            }
            Some(Booking::Rejected(availability)) => {
                warn!(
                    reservation_id = id,
                    richiesta = availability.richiesta,
                    disponibile = availability.disponibile,
                    "Material reservation update rejected"
                );
                Err(availability.into_conflict())
            }
            None => Err(AppError::reservation_not_found()),
        }
    }

    /// Deletes a reservation.
    ///
    /// # Arguments
    /// * `id` - The reservation's ID
    ///
    /// # Returns
    /// The removed record, or `NotFound` error
    pub async fn delete(&self, id: i32) -> AppResult<MaterialReservationDetails> {
        let deleted = self
            .store
            .delete(id)
            .await?
            .ok_or_else(AppError::reservation_not_found)?;
        info!(reservation_id = id, "Material reservation deleted");
        Ok(deleted)
    }
}
