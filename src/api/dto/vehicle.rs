//! Vehicle reservation DTOs for API requests and responses.

use jiff::civil::DateTime;
use jiff_diesel::ToDiesel;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::dto::datetime;
use crate::availability::{Window, WindowBounds};
use crate::error::AppResult;
use crate::models::{
    NewVehicleReservation, ReservationStatus, Vehicle, VehicleReservationChanges,
    VehicleReservationDetails,
};
use crate::repositories::ReservationFilter;

// ============================================================================
// Request DTOs
// ============================================================================

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct VehicleReservationListQuery {
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    #[param(value_type = Option<String>, example = "2024-01-01")]
    pub data_inizio: Option<DateTime>,
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    #[param(value_type = Option<String>, example = "2024-01-31")]
    pub data_fine: Option<DateTime>,
    pub stato: Option<String>,
    pub veicolo_id: Option<i32>,
}

impl VehicleReservationListQuery {
    pub fn into_filter(self) -> ReservationFilter {
        ReservationFilter {
            bounds: WindowBounds {
                from: self.data_inizio,
                to: self.data_fine,
            },
            stato: self.stato,
            resource_id: self.veicolo_id,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct VehicleAvailabilityQuery {
    pub veicolo_id: i32,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[param(value_type = String, example = "2024-01-01")]
    pub data_inizio: DateTime,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[param(value_type = String, example = "2024-01-05")]
    pub data_fine: DateTime,
    pub exclude_id: Option<i32>,
}

impl VehicleAvailabilityQuery {
    pub fn window(&self) -> AppResult<Window> {
        Window::new(self.data_inizio, self.data_fine)
    }
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct AvailableVehiclesQuery {
    #[serde(deserialize_with = "datetime::deserialize")]
    #[param(value_type = String, example = "2024-01-01")]
    pub data_inizio: DateTime,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[param(value_type = String, example = "2024-01-05")]
    pub data_fine: DateTime,
    #[validate(length(min = 1, message = "Il tipo non può essere vuoto"))]
    #[param(example = "furgone")]
    pub tipo: Option<String>,
}

impl AvailableVehiclesQuery {
    pub fn window(&self) -> AppResult<Window> {
        Window::new(self.data_inizio, self.data_fine)
    }
}

#[derive(Debug, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "veicolo_id": 2,
    "data_inizio": "2024-01-01T08:00:00",
    "data_fine": "2024-01-01T18:00:00",
    "missione": "Trasporto materiale",
    "conducente": "Luigi Bianchi",
    "destinazione": "Campo base",
    "note": null,
    "created_by": 5
}))]
pub struct CreateVehicleReservationRequest {
    pub veicolo_id: i32,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[schema(value_type = String)]
    pub data_inizio: DateTime,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[schema(value_type = String)]
    pub data_fine: DateTime,
    pub missione: Option<String>,
    pub conducente: Option<String>,
    pub destinazione: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
}

impl CreateVehicleReservationRequest {
    pub fn into_new_reservation(self) -> AppResult<NewVehicleReservation> {
        let window = Window::new(self.data_inizio, self.data_fine)?;
        Ok(NewVehicleReservation {
            veicolo_id: self.veicolo_id,
            data_inizio: window.start.to_diesel(),
            data_fine: window.end.to_diesel(),
            stato: ReservationStatus::INITIAL.as_str().to_string(),
            missione: self.missione,
            conducente: self.conducente,
            destinazione: self.destinazione,
            note: self.note,
            created_by: self.created_by,
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateVehicleReservationRequest {
    pub veicolo_id: Option<i32>,
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    #[schema(value_type = Option<String>)]
    pub data_inizio: Option<DateTime>,
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    #[schema(value_type = Option<String>)]
    pub data_fine: Option<DateTime>,
    #[schema(example = "in_corso")]
    pub stato: Option<String>,
    pub missione: Option<String>,
    pub conducente: Option<String>,
    pub destinazione: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
}

impl UpdateVehicleReservationRequest {
    pub fn into_changes(self) -> VehicleReservationChanges {
        VehicleReservationChanges {
            veicolo_id: self.veicolo_id,
            data_inizio: self.data_inizio.map(|d| d.to_diesel()),
            data_fine: self.data_fine.map(|d| d.to_diesel()),
            stato: self.stato,
            missione: self.missione,
            conducente: self.conducente,
            destinazione: self.destinazione,
            note: self.note,
            created_by: self.created_by,
            updated_at: None,
        }
    }
}

// ============================================================================
// Response DTOs
// ============================================================================

#[derive(Debug, Serialize, ToSchema)]
pub struct VehicleReservationResponse {
    pub id: i32,
    pub veicolo_id: i32,
    pub data_inizio: String,
    pub data_fine: String,
    pub stato: String,
    pub missione: Option<String>,
    pub conducente: Option<String>,
    pub destinazione: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
    pub veicolo_targa: String,
    pub veicolo_modello: Option<String>,
    pub veicolo_tipo: Option<String>,
    pub created_by_nome: Option<String>,
}

impl From<VehicleReservationDetails> for VehicleReservationResponse {
    fn from(details: VehicleReservationDetails) -> Self {
        let r = details.reservation;
        Self {
            id: r.id,
            veicolo_id: r.veicolo_id,
            data_inizio: datetime::format_stored(r.data_inizio),
            data_fine: datetime::format_stored(r.data_fine),
            stato: r.stato,
            missione: r.missione,
            conducente: r.conducente,
            destinazione: r.destinazione,
            note: r.note,
            created_by: r.created_by,
            created_at: datetime::format_stored(r.created_at),
            updated_at: datetime::format_stored(r.updated_at),
            veicolo_targa: details.veicolo_targa,
            veicolo_modello: details.veicolo_modello,
            veicolo_tipo: details.veicolo_tipo,
            created_by_nome: details.created_by_nome,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct VehicleResponse {
    pub id: i32,
    pub targa: String,
    pub modello: Option<String>,
    pub tipo: Option<String>,
    pub stato: String,
}

impl From<Vehicle> for VehicleResponse {
    fn from(v: Vehicle) -> Self {
        Self {
            id: v.id,
            targa: v.targa,
            modello: v.modello,
            tipo: v.tipo,
            stato: v.stato,
        }
    }
}
