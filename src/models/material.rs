use diesel::prelude::*;
use jiff_diesel::DateTime;

use crate::availability::Window;
use crate::error::AppResult;

/// Material master record (read-only for this service)
#[derive(Debug, Queryable, Selectable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::materiali)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Material {
    pub id: i32,
    pub nome: String,
    pub categoria: Option<String>,
    pub quantita_totale: i32,
    pub quantita_assegnata: i32,
}

#[derive(Debug, Queryable, Selectable, Clone, PartialEq)]
#[diesel(table_name = crate::schema::prenotazioni_materiali)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MaterialReservation {
    pub id: i32,
    pub materiale_id: i32,
    pub quantita: i32,
    pub data_inizio: DateTime,
    pub data_fine: DateTime,
    pub stato: String,
    pub evento: Option<String>,
    pub richiedente: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl MaterialReservation {
    pub fn window(&self) -> AppResult<Window> {
        Window::new(self.data_inizio.to_jiff(), self.data_fine.to_jiff())
    }
}

/// Reservation joined with material and creator display fields
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialReservationDetails {
    pub reservation: MaterialReservation,
    pub materiale_nome: String,
    pub materiale_categoria: Option<String>,
    pub created_by_nome: Option<String>,
}

#[derive(Debug, Insertable, Clone)]
#[diesel(table_name = crate::schema::prenotazioni_materiali)]
pub struct NewMaterialReservation {
    pub materiale_id: i32,
    pub quantita: i32,
    pub data_inizio: DateTime,
    pub data_fine: DateTime,
    pub stato: String,
    pub evento: Option<String>,
    pub richiedente: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
}

/// Partial update; `None` keeps the stored value
#[derive(Debug, AsChangeset, Clone, Default)]
#[diesel(table_name = crate::schema::prenotazioni_materiali)]
pub struct MaterialReservationChanges {
    pub materiale_id: Option<i32>,
    pub quantita: Option<i32>,
    pub data_inizio: Option<DateTime>,
    pub data_fine: Option<DateTime>,
    pub stato: Option<String>,
    pub evento: Option<String>,
    pub richiedente: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
    pub updated_at: Option<DateTime>,
}

impl MaterialReservationChanges {
    /// The record as it will look once the changes are written
    pub fn merged(&self, current: &MaterialReservation) -> MaterialReservation {
        MaterialReservation {
            id: current.id,
            materiale_id: self.materiale_id.unwrap_or(current.materiale_id),
            quantita: self.quantita.unwrap_or(current.quantita),
            data_inizio: self.data_inizio.unwrap_or(current.data_inizio),
            data_fine: self.data_fine.unwrap_or(current.data_fine),
            stato: self.stato.clone().unwrap_or_else(|| current.stato.clone()),
            evento: self.evento.clone().or_else(|| current.evento.clone()),
            richiedente: self.richiedente.clone().or_else(|| current.richiedente.clone()),
            note: self.note.clone().or_else(|| current.note.clone()),
            created_by: self.created_by.or(current.created_by),
            created_at: current.created_at,
            updated_at: self.updated_at.unwrap_or(current.updated_at),
        }
    }
}
