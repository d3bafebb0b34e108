//! Vehicle reservation business rules.

use std::sync::Arc;

use tracing::{info, warn};

use crate::availability::{VehicleAvailability, Window};
use crate::config::ReservationsConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    NewVehicleReservation, Vehicle, VehicleReservationChanges, VehicleReservationDetails,
};
use crate::repositories::{Booking, ReservationFilter, VehicleReservationStore};

#[derive(Clone)]
pub struct VehicleReservationService {
    store: Arc<dyn VehicleReservationStore>,
    policy: ReservationsConfig,
}

impl VehicleReservationService {
    pub fn new(store: Arc<dyn VehicleReservationStore>, policy: ReservationsConfig) -> Self {
        Self { store, policy }
    }

    pub async fn list(&self, filter: &ReservationFilter) -> AppResult<Vec<VehicleReservationDetails>> {
        self.store.list(filter).await
    }

    /// Gets a reservation by its ID.
    ///
    /// # Returns
    /// The reservation with vehicle and creator fields, or `NotFound` error
    pub async fn get(&self, id: i32) -> AppResult<VehicleReservationDetails> {
        self.store
            .find(id)
            .await?
            .ok_or_else(AppError::reservation_not_found)
    }

    pub async fn check_availability(
        &self,
        veicolo_id: i32,
        window: Window,
        exclude_id: Option<i32>,
    ) -> AppResult<VehicleAvailability> {
        self.store
            .check_availability(veicolo_id, window, exclude_id)
            .await
    }

    /// Vehicles free over `window`, optionally of one `tipo`.
    ///
    /// Maintenance is only taken into account when
    /// `reservations.available_listing_excludes_maintenance` is set.
    pub async fn list_available(&self, window: Window, tipo: Option<&str>) -> AppResult<Vec<Vehicle>> {
        self.store
            .list_available(
                window,
                tipo,
                self.policy.available_listing_excludes_maintenance,
            )
            .await
    }

    /// Books the vehicle after checking reservations, maintenance and the
    /// vehicle status.
    pub async fn create(
        &self,
        reservation: NewVehicleReservation,
    ) -> AppResult<VehicleReservationDetails> {
        let veicolo_id = reservation.veicolo_id;

        match self.store.create(reservation).await? {
            Booking::Accepted(details) => {
                info!(
                    reservation_id = details.reservation.id,
                    veicolo_id, "Vehicle reservation created"
                );
                Ok(details)
            }
            Booking::Rejected(availability) => {
                warn!(
                    veicolo_id,
                    motivo = availability.motivo.as_deref().unwrap_or_default(),
                    "Vehicle reservation rejected"
                );
                Err(availability.into_conflict())
            }
        }
    }

    /// Updates a reservation.
    ///
    /// # Arguments
    /// * `id` - The reservation's ID
    /// * `changes` - Partial change set, merged over the stored row
    ///
    /// # Returns
    /// The updated record, `Conflict` when revalidation fails, or `NotFound`
    pub async fn update(
        &self,
        id: i32,
        changes: VehicleReservationChanges,
    ) -> AppResult<VehicleReservationDetails> {
        match self.store.update(id, changes, self.policy).await? {
            Some(Booking::Accepted(details)) => {
                info!(
                    reservation_id = id,
                    stato = %details.reservation.stato,
                    "Vehicle reservation updated"
                );
                Ok(details)
            }
            Some(Booking::Rejected(availability)) => {
                warn!(
                    reservation_id = id,
                    motivo = availability.motivo.as_deref().unwrap_or_default(),
                    "Vehicle reservation update rejected"
                );
                Err(availability.into_conflict())
            }
            None => Err(AppError::reservation_not_found()),
        }
    }

    pub async fn delete(&self, id: i32) -> AppResult<VehicleReservationDetails> {
        let deleted = self
            .store
            .delete(id)
            .await?
            .ok_or_else(AppError::reservation_not_found)?;
        info!(reservation_id = id, "Vehicle reservation deleted");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::availability::vehicle::{REASON_BOOKED, REASON_MAINTENANCE};
    use crate::models::ReservationStatus;
    use crate::repositories::memory::MemoryVehicleStore;
    use jiff::civil::{DateTime, date};
    use jiff_diesel::ToDiesel;

    fn day(d: i8) -> DateTime {
        date(2024, 1, d).at(0, 0, 0, 0)
    }

    fn window(a: i8, b: i8) -> Window {
        Window::new(day(a), day(b)).unwrap()
    }

    fn new_reservation(veicolo_id: i32, a: i8, b: i8) -> NewVehicleReservation {
        NewVehicleReservation {
            veicolo_id,
            data_inizio: day(a).to_diesel(),
            data_fine: day(b).to_diesel(),
            stato: ReservationStatus::INITIAL.as_str().to_string(),
            missione: Some("Trasporto".to_string()),
            conducente: Some("Luigi".to_string()),
            destinazione: None,
            note: None,
            created_by: None,
        }
    }

    fn store() -> MemoryVehicleStore {
        MemoryVehicleStore::new()
            .with_vehicle(1, "AB123CD", "furgone", "disponibile")
            .with_vehicle(2, "EF456GH", "auto", "disponibile")
            .with_vehicle(3, "IL789MN", "furgone", "in_manutenzione")
            .with_maintenance(2, day(10), day(12), "programmata")
            .with_maintenance(1, day(20), day(22), "completata")
    }

    fn service_with(policy: ReservationsConfig) -> VehicleReservationService {
        VehicleReservationService::new(Arc::new(store()), policy)
    }

    fn service() -> VehicleReservationService {
        service_with(ReservationsConfig::default())
    }

    #[tokio::test]
    async fn test_free_vehicle_then_booked() {
        let service = service();

        let before = service.check_availability(1, window(1, 5), None).await.unwrap();
        assert!(before.disponibile);
        assert_eq!(before.motivo, None);

        service.create(new_reservation(1, 1, 5)).await.unwrap();

        let after = service.check_availability(1, window(3, 8), None).await.unwrap();
        assert!(!after.disponibile);
        assert_eq!(after.motivo.as_deref(), Some(REASON_BOOKED));
        assert_eq!(after.prenotazioni_in_conflitto, 1);
    }

    #[tokio::test]
    async fn test_touching_windows_do_not_conflict() {
        let service = service();
        service.create(new_reservation(1, 1, 5)).await.unwrap();

        assert!(service.create(new_reservation(1, 5, 10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_checks_maintenance_and_status() {
        let service = service();

        match service.create(new_reservation(2, 11, 13)).await.unwrap_err() {
            AppError::Conflict { message, details } => {
                assert_eq!(message, REASON_MAINTENANCE);
                assert_eq!(details["manutenzioni_in_conflitto"], 1);
            }
            other => panic!("Expected Conflict, got {:?}", other),
        }

        match service.create(new_reservation(3, 1, 2)).await.unwrap_err() {
            AppError::Conflict { message, .. } => {
                assert_eq!(message, "Veicolo non disponibile (stato: in_manutenzione)");
            }
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_completed_maintenance_is_ignored() {
        let availability = service()
            .check_availability(1, window(20, 22), None)
            .await
            .unwrap();
        assert!(availability.disponibile);
    }

    #[tokio::test]
    async fn test_unknown_vehicle() {
        let error = service()
            .check_availability(42, window(1, 2), None)
            .await
            .unwrap_err();
        assert_eq!(error.to_string(), "Veicolo non trovato");
    }

    #[tokio::test]
    async fn test_available_listing() {
        let service = service();
        service.create(new_reservation(1, 10, 11)).await.unwrap();

        let free = service.list_available(window(10, 12), None).await.unwrap();
        let ids: Vec<_> = free.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![2]);

        let vans = service
            .list_available(window(1, 2), Some("furgone"))
            .await
            .unwrap();
        let ids: Vec<_> = vans.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_available_listing_can_exclude_maintenance() {
        let service = service_with(ReservationsConfig {
            available_listing_excludes_maintenance: true,
            ..Default::default()
        });

        let free = service.list_available(window(10, 12), None).await.unwrap();
        let ids: Vec<_> = free.iter().map(|v| v.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[tokio::test]
    async fn test_cancelled_reservation_frees_vehicle() {
        let service = service();
        let created = service.create(new_reservation(1, 1, 5)).await.unwrap();

        let cancel = VehicleReservationChanges {
            stato: Some("annullata".to_string()),
            ..Default::default()
        };
        service.update(created.reservation.id, cancel).await.unwrap();

        let availability = service.check_availability(1, window(1, 5), None).await.unwrap();
        assert!(availability.disponibile);
    }

    #[tokio::test]
    async fn test_update_revalidates_when_enabled() {
        let service = service_with(ReservationsConfig {
            revalidate_on_update: true,
            ..Default::default()
        });
        service.create(new_reservation(1, 1, 5)).await.unwrap();
        let second = service.create(new_reservation(1, 6, 8)).await.unwrap();

        let overlap = VehicleReservationChanges {
            data_inizio: Some(day(4).to_diesel()),
            ..Default::default()
        };
        let error = service.update(second.reservation.id, overlap).await.unwrap_err();
        assert!(matches!(error, AppError::Conflict { .. }));

        let extend = VehicleReservationChanges {
            data_fine: Some(day(9).to_diesel()),
            ..Default::default()
        };
        assert!(service.update(second.reservation.id, extend).await.is_ok());
    }

    #[tokio::test]
    async fn test_list_by_vehicle_and_delete() {
        let service = service();
        let first = service.create(new_reservation(1, 1, 2)).await.unwrap();
        service.create(new_reservation(2, 1, 2)).await.unwrap();

        let filter = ReservationFilter {
            resource_id: Some(1),
            ..Default::default()
        };
        let listed = service.list(&filter).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].veicolo_targa, "AB123CD");

        service.delete(first.reservation.id).await.unwrap();
        assert!(service.list(&filter).await.unwrap().is_empty());
        assert!(matches!(
            service.get(first.reservation.id).await.unwrap_err(),
            AppError::NotFound { .. }
        ));
    }
}
