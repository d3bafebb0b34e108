use diesel::prelude::*;
use jiff_diesel::DateTime;

use crate::availability::Window;
use crate::error::AppResult;

/// Vehicle master record (read-only for this service)
#[derive(Debug, Queryable, Selectable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::veicoli)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Vehicle {
    pub id: i32,
    pub targa: String,
    pub modello: Option<String>,
    pub tipo: Option<String>,
    pub stato: String,
}

#[derive(Debug, Queryable, Selectable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::prenotazioni_mezzi)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct VehicleReservation {
    pub id: i32,
    pub veicolo_id: i32,
    pub data_inizio: DateTime,
    pub data_fine: DateTime,
    pub stato: String,
    pub missione: Option<String>,
    pub conducente: Option<String>,
    pub destinazione: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl VehicleReservation {
    pub fn window(&self) -> AppResult<Window> {
        Window::new(self.data_inizio.to_jiff(), self.data_fine.to_jiff())
    }
}

/// Reservation joined with vehicle and creator display fields
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleReservationDetails {
    pub reservation: VehicleReservation,
    pub veicolo_targa: String,
    pub veicolo_modello: Option<String>,
    pub veicolo_tipo: Option<String>,
    pub created_by_nome: Option<String>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::prenotazioni_mezzi)]
pub struct NewVehicleReservation {
    pub veicolo_id: i32,
    pub data_inizio: DateTime,
    pub data_fine: DateTime,
    pub stato: String,
    pub missione: Option<String>,
    pub conducente: Option<String>,
    pub destinazione: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::prenotazioni_mezzi)]
pub struct VehicleReservationChanges {
    pub veicolo_id: Option<i32>,
    pub data_inizio: Option<DateTime>,
    pub data_fine: Option<DateTime>,
    pub stato: Option<String>,
    pub missione: Option<String>,
    pub conducente: Option<String>,
    pub destinazione: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
    pub updated_at: Option<DateTime>,
}

impl VehicleReservationChanges {
    pub fn merged(&self, current: &VehicleReservation) -> VehicleReservation {
        VehicleReservation {
            id: current.id,
            veicolo_id: self.veicolo_id.unwrap_or(current.veicolo_id),
            data_inizio: self.data_inizio.unwrap_or(current.data_inizio),
            data_fine: self.data_fine.unwrap_or(current.data_fine),
            stato: self.stato.clone().unwrap_or_else(|| current.stato.clone()),
            missione: self.missione.clone().or_else(|| current.missione.clone()),
            conducente: self.conducente.clone().or_else(|| current.conducente.clone()),
            destinazione: self
                .destinazione
                .clone()
                .or_else(|| current.destinazione.clone()),
            note: self.note.clone().or_else(|| current.note.clone()),
            created_by: self.created_by.or(current.created_by),
            created_at: current.created_at,
            updated_at: self.updated_at.unwrap_or(current.updated_at),
        }
    }
}
