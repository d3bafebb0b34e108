//! In-memory store doubles for service tests.
//!
//! They evaluate the same availability rules as the SQL queries, using the
//! pure functions from `crate::availability`.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use jiff::civil::DateTime;

use crate::availability::material::{self, BookedQuantity, MaterialAvailability};
use crate::availability::vehicle::{self, VehicleAvailability};
use crate::availability::Window;
use crate::config::ReservationsConfig;
use crate::error::{AppError, AppResult};
use crate::models::{
    Material, MaterialReservation, MaterialReservationChanges,
    MaterialReservationDetails, NewMaterialReservation, NewVehicleReservation, Vehicle,
    VehicleReservation, VehicleReservationChanges, VehicleReservationDetails, check_status_change,
    display_name, timestamp_now,
};
use crate::repositories::traits::{
    Booking, MaterialReservationStore, ReservationFilter, VehicleReservationStore,
};

type User = (i32, String, String);

/// Workshop slot blocking a vehicle
struct Maintenance {
    veicolo_id: i32,
    window: Window,
    stato: String,
}

fn creator_name(users: &[User], created_by: Option<i32>) -> Option<String> {
    let created_by = created_by?;
    users
        .iter()
        .find(|(id, _, _)| *id == created_by)
        .map(|(_, nome, cognome)| display_name(nome, cognome))
}

fn matches_filter(
    filter: &ReservationFilter,
    window: AppResult<Window>,
    stato: &str,
    resource_id: i32,
) -> bool {
    window.is_ok_and(|w| filter.bounds.matches(&w))
        && filter.stato.as_deref().is_none_or(|s| s == stato)
        && filter.resource_id.is_none_or(|id| id == resource_id)
}

#[derive(Default)]
struct MaterialState {
    materials: Vec<Material>,
    reservations: Vec<MaterialReservation>,
    users: Vec<User>,
    next_id: i32,
}

impl MaterialState {
    fn details(&self, reservation: &MaterialReservation) -> MaterialReservationDetails {
        let material = self
            .materials
            .iter()
            .find(|m| m.id == reservation.materiale_id);
        MaterialReservationDetails {
            reservation: reservation.clone(),
            materiale_nome: material.map(|m| m.nome.clone()).unwrap_or_default(),
            materiale_categoria: material.and_then(|m| m.categoria.clone()),
            created_by_nome: creator_name(&self.users, reservation.created_by),
        }
    }

    fn availability(
        &self,
        materiale_id: i32,
        window: &Window,
        quantita: i32,
        exclude_id: Option<i32>,
    ) -> AppResult<MaterialAvailability> {
        let material = self
            .materials
            .iter()
            .find(|m| m.id == materiale_id)
            .ok_or_else(AppError::material_not_found)?;

        let bookings = self.reservations.iter().filter_map(|r| {
            r.window().ok().map(|w| BookedQuantity {
                id: r.id,
                materiale_id: r.materiale_id,
                quantita: r.quantita,
                window: w,
                stato: r.stato.as_str(),
            })
        });
        let reserved = material::reserved_in_window(bookings, materiale_id, window, exclude_id);

        Ok(MaterialAvailability::compute(
            material.id,
            material.quantita_totale,
            material.quantita_assegnata,
            reserved,
            quantita,
        ))
    }
}

/// Material store backed by vectors behind a mutex
#[derive(Default)]
pub struct MemoryMaterialStore {
    state: Mutex<MaterialState>,
}

impl MemoryMaterialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_material(self, id: i32, nome: &str, totale: i32, assegnata: i32) -> Self {
        self.lock().materials.push(Material {
            id,
            nome: nome.to_string(),
            categoria: None,
            quantita_totale: totale,
            quantita_assegnata: assegnata,
        });
        self
    }

    pub fn with_user(self, id: i32, nome: &str, cognome: &str) -> Self {
        self.lock()
            .users
            .push((id, nome.to_string(), cognome.to_string()));
        self
    }

    fn lock(&self) -> MutexGuard<'_, MaterialState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl MaterialReservationStore for MemoryMaterialStore {
    async fn list(&self, filter: &ReservationFilter) -> AppResult<Vec<MaterialReservationDetails>> {
        let state = self.lock();
        let mut matching: Vec<&MaterialReservation> = state
            .reservations
            .iter()
            .filter(|r| matches_filter(filter, r.window(), &r.stato, r.materiale_id))
            .collect();
        matching.sort_by_key(|r| (r.data_inizio.to_jiff(), r.id));
        Ok(matching.into_iter().map(|r| state.details(r)).collect())
    }

    async fn find(&self, id: i32) -> AppResult<Option<MaterialReservationDetails>> {
        let state = self.lock();
        Ok(state
            .reservations
            .iter()
            .find(|r| r.id == id)
            .map(|r| state.details(r)))
    }

    async fn check_availability(
        &self,
        materiale_id: i32,
        window: Window,
        quantita: i32,
        exclude_id: Option<i32>,
    ) -> AppResult<MaterialAvailability> {
        self.lock()
            .availability(materiale_id, &window, quantita, exclude_id)
    }

    async fn create(
        &self,
        reservation: NewMaterialReservation,
    ) -> AppResult<Booking<MaterialReservationDetails, MaterialAvailability>> {
        let window = Window::new(
            reservation.data_inizio.to_jiff(),
            reservation.data_fine.to_jiff(),
        )?;
        let mut state = self.lock();

        let availability =
            state.availability(reservation.materiale_id, &window, reservation.quantita, None)?;
        if !availability.sufficiente {
            return Ok(Booking::Rejected(availability));
        }

        state.next_id += 1;
        let now = timestamp_now();
        let created = MaterialReservation {
            id: state.next_id,
            materiale_id: reservation.materiale_id,
            quantita: reservation.quantita,
            data_inizio: reservation.data_inizio,
            data_fine: reservation.data_fine,
            stato: reservation.stato,
            evento: reservation.evento,
            richiedente: reservation.richiedente,
            note: reservation.note,
            created_by: reservation.created_by,
            created_at: now,
            updated_at: now,
        };
        let details = state.details(&created);
        state.reservations.push(created);
        Ok(Booking::Accepted(details))
    }

    async fn update(
        &self,
        id: i32,
        changes: MaterialReservationChanges,
        policy: ReservationsConfig,
    ) -> AppResult<Option<Booking<MaterialReservationDetails, MaterialAvailability>>> {
        let changes = MaterialReservationChanges {
            updated_at: Some(timestamp_now()),
            ..changes
        };
        let mut state = self.lock();
        let Some(position) = state.reservations.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let current = &state.reservations[position];

        if let Some(next) = changes.stato.as_deref() {
            check_status_change(&current.stato, next, policy.enforce_status_transitions)?;
        }
        let merged = changes.merged(current);
        let window = merged.window()?;

        if policy.revalidate_on_update && material::ACTIVE_STATUSES.contains(&merged.stato.as_str())
        {
            let availability =
                state.availability(merged.materiale_id, &window, merged.quantita, Some(id))?;
            if !availability.sufficiente {
                return Ok(Some(Booking::Rejected(availability)));
            }
        }

        let details = state.details(&merged);
        state.reservations[position] = merged;
        Ok(Some(Booking::Accepted(details)))
    }

    async fn delete(&self, id: i32) -> AppResult<Option<MaterialReservationDetails>> {
        let mut state = self.lock();
        let Some(position) = state.reservations.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let details = state.details(&state.reservations[position]);
        state.reservations.remove(position);
        Ok(Some(details))
    }
}

#[derive(Default)]
struct VehicleState {
    vehicles: Vec<Vehicle>,
    maintenance: Vec<Maintenance>,
    reservations: Vec<VehicleReservation>,
    users: Vec<User>,
    next_id: i32,
}

impl VehicleState {
    fn details(&self, reservation: &VehicleReservation) -> VehicleReservationDetails {
        let vehicle = self
            .vehicles
            .iter()
            .find(|v| v.id == reservation.veicolo_id);
        VehicleReservationDetails {
            reservation: reservation.clone(),
            veicolo_targa: vehicle.map(|v| v.targa.clone()).unwrap_or_default(),
            veicolo_modello: vehicle.and_then(|v| v.modello.clone()),
            veicolo_tipo: vehicle.and_then(|v| v.tipo.clone()),
            created_by_nome: creator_name(&self.users, reservation.created_by),
        }
    }

    fn booking_conflicts(&self, veicolo_id: i32, window: &Window, exclude_id: Option<i32>) -> i64 {
        self.reservations
            .iter()
            .filter(|r| r.veicolo_id == veicolo_id && Some(r.id) != exclude_id)
            .filter(|r| vehicle::ACTIVE_RESERVATION_STATUSES.contains(&r.stato.as_str()))
            .filter(|r| r.window().is_ok_and(|w| w.overlaps(window, vehicle::OVERLAP_RULE)))
            .count() as i64
    }

    fn maintenance_conflicts(&self, veicolo_id: i32, window: &Window) -> i64 {
        self.maintenance
            .iter()
            .filter(|m| m.veicolo_id == veicolo_id)
            .filter(|m| vehicle::ACTIVE_MAINTENANCE_STATUSES.contains(&m.stato.as_str()))
            .filter(|m| m.window.overlaps(window, vehicle::OVERLAP_RULE))
            .count() as i64
    }

    fn availability(
        &self,
        veicolo_id: i32,
        window: &Window,
        exclude_id: Option<i32>,
    ) -> AppResult<VehicleAvailability> {
        let found = self
            .vehicles
            .iter()
            .find(|v| v.id == veicolo_id)
            .ok_or_else(AppError::vehicle_not_found)?;

        Ok(VehicleAvailability::resolve(
            found.id,
            &found.stato,
            self.booking_conflicts(veicolo_id, window, exclude_id),
            self.maintenance_conflicts(veicolo_id, window),
        ))
    }
}

/// Vehicle store backed by vectors behind a mutex
#[derive(Default)]
pub struct MemoryVehicleStore {
    state: Mutex<VehicleState>,
}

impl MemoryVehicleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_vehicle(self, id: i32, targa: &str, tipo: &str, stato: &str) -> Self {
        self.lock().vehicles.push(Vehicle {
            id,
            targa: targa.to_string(),
            modello: None,
            tipo: Some(tipo.to_string()),
            stato: stato.to_string(),
        });
        self
    }

    pub fn with_maintenance(
        self,
        veicolo_id: i32,
        start: DateTime,
        end: DateTime,
        stato: &str,
    ) -> Self {
        self.lock().maintenance.push(Maintenance {
            veicolo_id,
            window: Window::new(start, end).unwrap(),
            stato: stato.to_string(),
        });
        self
    }

    pub fn with_user(self, id: i32, nome: &str, cognome: &str) -> Self {
        self.lock()
            .users
            .push((id, nome.to_string(), cognome.to_string()));
        self
    }

    fn lock(&self) -> MutexGuard<'_, VehicleState> {
        self.state.lock().unwrap()
    }
}

#[async_trait]
impl VehicleReservationStore for MemoryVehicleStore {
    async fn list(&self, filter: &ReservationFilter) -> AppResult<Vec<VehicleReservationDetails>> {
        let state = self.lock();
        let mut matching: Vec<&VehicleReservation> = state
            .reservations
            .iter()
            .filter(|r| matches_filter(filter, r.window(), &r.stato, r.veicolo_id))
            .collect();
        matching.sort_by_key(|r| (r.data_inizio.to_jiff(), r.id));
        Ok(matching.into_iter().map(|r| state.details(r)).collect())
    }

    async fn find(&self, id: i32) -> AppResult<Option<VehicleReservationDetails>> {
        let state = self.lock();
        Ok(state
            .reservations
            .iter()
            .find(|r| r.id == id)
            .map(|r| state.details(r)))
    }

    async fn check_availability(
        &self,
        veicolo_id: i32,
        window: Window,
        exclude_id: Option<i32>,
    ) -> AppResult<VehicleAvailability> {
        self.lock().availability(veicolo_id, &window, exclude_id)
    }

    async fn list_available(
        &self,
        window: Window,
        tipo: Option<&str>,
        exclude_maintenance: bool,
    ) -> AppResult<Vec<Vehicle>> {
        let state = self.lock();
        let mut available: Vec<Vehicle> = state
            .vehicles
            .iter()
            .filter(|v| v.stato == vehicle::BOOKABLE_VEHICLE_STATUS)
            .filter(|v| tipo.is_none_or(|t| v.tipo.as_deref() == Some(t)))
            .filter(|v| state.booking_conflicts(v.id, &window, None) == 0)
            .filter(|v| !exclude_maintenance || state.maintenance_conflicts(v.id, &window) == 0)
            .cloned()
            .collect();
        available.sort_by(|a, b| a.targa.cmp(&b.targa));
        Ok(available)
    }

    async fn create(
        &self,
        reservation: NewVehicleReservation,
    ) -> AppResult<Booking<VehicleReservationDetails, VehicleAvailability>> {
        let window = Window::new(
            reservation.data_inizio.to_jiff(),
            reservation.data_fine.to_jiff(),
        )?;
        let mut state = self.lock();

        let availability = state.availability(reservation.veicolo_id, &window, None)?;
        if !availability.disponibile {
            return Ok(Booking::Rejected(availability));
        }

        state.next_id += 1;
        let now = timestamp_now();
        let created = VehicleReservation {
            id: state.next_id,
            veicolo_id: reservation.veicolo_id,
            data_inizio: reservation.data_inizio,
            data_fine: reservation.data_fine,
            stato: reservation.stato,
            missione: reservation.missione,
            conducente: reservation.conducente,
            destinazione: reservation.destinazione,
            note: reservation.note,
            created_by: reservation.created_by,
            created_at: now,
            updated_at: now,
        };
        let details = state.details(&created);
        state.reservations.push(created);
        Ok(Booking::Accepted(details))
    }

    async fn update(
        &self,
        id: i32,
        changes: VehicleReservationChanges,
        policy: ReservationsConfig,
    ) -> AppResult<Option<Booking<VehicleReservationDetails, VehicleAvailability>>> {
        let changes = VehicleReservationChanges {
            updated_at: Some(timestamp_now()),
            ..changes
        };
        let mut state = self.lock();
        let Some(position) = state.reservations.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let current = &state.reservations[position];

        if let Some(next) = changes.stato.as_deref() {
            check_status_change(&current.stato, next, policy.enforce_status_transitions)?;
        }
        let merged = changes.merged(current);
        let window = merged.window()?;

        if policy.revalidate_on_update
            && vehicle::ACTIVE_RESERVATION_STATUSES.contains(&merged.stato.as_str())
        {
            let availability = state.availability(merged.veicolo_id, &window, Some(id))?;
            if !availability.disponibile {
                return Ok(Some(Booking::Rejected(availability)));
            }
        }

        let details = state.details(&merged);
        state.reservations[position] = merged;
        Ok(Some(Booking::Accepted(details)))
    }

    async fn delete(&self, id: i32) -> AppResult<Option<VehicleReservationDetails>> {
        let mut state = self.lock();
        let Some(position) = state.reservations.iter().position(|r| r.id == id) else {
            return Ok(None);
        };
        let details = state.details(&state.reservations[position]);
        state.reservations.remove(position);
        Ok(Some(details))
    }
}
