//! Material reservation DTOs for API requests and responses.

use jiff::civil::DateTime;
use jiff_diesel::ToDiesel;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::api::dto::datetime;
use crate::availability::{Window, WindowBounds};
use crate::error::AppResult;
use crate::models::{
    MaterialReservationChanges, MaterialReservationDetails, NewMaterialReservation,
    ReservationStatus,
};
use crate::repositories::ReservationFilter;

// ============================================================================
// Request DTOs
// ============================================================================

/// Filters for the reservation list; every field is optional.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct MaterialReservationListQuery {
    /// Keep reservations ending on or after this instant
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    #[param(value_type = Option<String>, example = "2024-01-01")]
    pub data_inizio: Option<DateTime>,
    /// Keep reservations starting on or before this instant
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    #[param(value_type = Option<String>, example = "2024-01-31")]
    pub data_fine: Option<DateTime>,
    pub stato: Option<String>,
    pub materiale_id: Option<i32>,
}

impl MaterialReservationListQuery {
    pub fn into_filter(self) -> ReservationFilter {
        ReservationFilter {
            bounds: WindowBounds {
                from: self.data_inizio,
                to: self.data_fine,
            },
            stato: self.stato,
            resource_id: self.materiale_id,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct MaterialAvailabilityQuery {
    pub materiale_id: i32,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[param(value_type = String, example = "2024-01-01")]
    pub data_inizio: DateTime,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[param(value_type = String, example = "2024-01-05")]
    pub data_fine: DateTime,
    #[validate(range(min = 1, message = "La quantità deve essere almeno 1"))]
    pub quantita: i32,
    /// Reservation to leave out of the count, typically the one being edited
    pub exclude_id: Option<i32>,
}

impl MaterialAvailabilityQuery {
    pub fn window(&self) -> AppResult<Window> {
        Window::new(self.data_inizio, self.data_fine)
    }
}

/// Request body for booking a material.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[schema(example = json!({
    "materiale_id": 1,
    "quantita": 4,
    "data_inizio": "2024-01-01",
    "data_fine": "2024-01-05T18:00:00",
    "evento": "Esercitazione",
    "richiedente": "Squadra A",
    "note": null,
    "created_by": 5
}))]
pub struct CreateMaterialReservationRequest {
    pub materiale_id: i32,
    #[validate(range(min = 1, message = "La quantità deve essere almeno 1"))]
    pub quantita: i32,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[schema(value_type = String)]
    pub data_inizio: DateTime,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[schema(value_type = String)]
    pub data_fine: DateTime,
    pub evento: Option<String>,
    pub richiedente: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
}

impl CreateMaterialReservationRequest {
    /// New reservations always start as `prenotata`
    pub fn into_new_reservation(self) -> AppResult<NewMaterialReservation> {
        let window = Window::new(self.data_inizio, self.data_fine)?;
        Ok(NewMaterialReservation {
            materiale_id: self.materiale_id,
            quantita: self.quantita,
            data_inizio: window.start.to_diesel(),
            data_fine: window.end.to_diesel(),
            stato: ReservationStatus::INITIAL.as_str().to_string(),
            evento: self.evento,
            richiedente: self.richiedente,
            note: self.note,
            created_by: self.created_by,
        })
    }
}

/// Partial update; omitted or null fields keep their stored value.
#[derive(Debug, Default, Deserialize, ToSchema, Validate)]
pub struct UpdateMaterialReservationRequest {
    pub materiale_id: Option<i32>,
    #[validate(range(min = 1, message = "La quantità deve essere almeno 1"))]
    pub quantita: Option<i32>,
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    #[schema(value_type = Option<String>)]
    pub data_inizio: Option<DateTime>,
    #[serde(default, deserialize_with = "datetime::deserialize_option")]
    #[schema(value_type = Option<String>)]
    pub data_fine: Option<DateTime>,
    #[schema(example = "confermata")]
    pub stato: Option<String>,
    pub evento: Option<String>,
    pub richiedente: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
}

impl UpdateMaterialReservationRequest {
    pub fn into_changes(self) -> MaterialReservationChanges {
        MaterialReservationChanges {
            materiale_id: self.materiale_id,
            quantita: self.quantita,
            data_inizio: self.data_inizio.map(|d| d.to_diesel()),
            data_fine: self.data_fine.map(|d| d.to_diesel()),
            stato: self.stato,
            evento: self.evento,
            richiedente: self.richiedente,
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
pub struct MaterialReservationResponse {
    pub id: i32,
    pub materiale_id: i32,
    pub quantita: i32,
    #[schema(example = "2024-01-01T00:00:00")]
    pub data_inizio: String,
    #[schema(example = "2024-01-05T18:00:00")]
    pub data_fine: String,
    pub stato: String,
    pub evento: Option<String>,
    pub richiedente: Option<String>,
    pub note: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: String,
    pub updated_at: String,
    pub materiale_nome: String,
    pub materiale_categoria: Option<String>,
    pub created_by_nome: Option<String>,
}

impl From<MaterialReservationDetails> for MaterialReservationResponse {
    fn from(details: MaterialReservationDetails) -> Self {
        let r = details.reservation;
        Self {
            id: r.id,
            materiale_id: r.materiale_id,
            quantita: r.quantita,
            data_inizio: datetime::format_stored(r.data_inizio),
            data_fine: datetime::format_stored(r.data_fine),
            stato: r.stato,
            evento: r.evento,
            richiedente: r.richiedente,
            note: r.note,
            created_by: r.created_by,
            created_at: datetime::format_stored(r.created_at),
            updated_at: datetime::format_stored(r.updated_at),
            materiale_nome: details.materiale_nome,
            materiale_categoria: details.materiale_categoria,
            created_by_nome: details.created_by_nome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    #[test]
    fn test_create_request_accepts_bare_dates() {
        let request: CreateMaterialReservationRequest = serde_json::from_str(
            r#"{"materiale_id": 1, "quantita": 2, "data_inizio": "2024-01-01", "data_fine": "2024-01-05T12:00:00"}"#,
        )
        .unwrap();

        let new = request.into_new_reservation().unwrap();
        assert_eq!(new.stato, "prenotata");
        assert_eq!(new.data_inizio.to_jiff(), date(2024, 1, 1).at(0, 0, 0, 0));
        assert_eq!(new.data_fine.to_jiff(), date(2024, 1, 5).at(12, 0, 0, 0));
        assert_eq!(new.evento, None);
    }

    #[test]
    fn test_create_request_rejects_inverted_window() {
        let request: CreateMaterialReservationRequest = serde_json::from_str(
            r#"{"materiale_id": 1, "quantita": 2, "data_inizio": "2024-01-05", "data_fine": "2024-01-01"}"#,
        )
        .unwrap();

        assert!(request.into_new_reservation().is_err());
    }

    #[test]
    fn test_zero_quantity_fails_validation() {
        let request: CreateMaterialReservationRequest = serde_json::from_str(
            r#"{"materiale_id": 1, "quantita": 0, "data_inizio": "2024-01-01", "data_fine": "2024-01-02"}"#,
        )
        .unwrap();

        let errors = request.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("quantita"));
    }

    #[test]
    fn test_update_request_keeps_missing_fields_empty() {
        let request: UpdateMaterialReservationRequest =
            serde_json::from_str(r#"{"stato": "confermata"}"#).unwrap();
        let changes = request.into_changes();

        assert_eq!(changes.stato.as_deref(), Some("confermata"));
        assert!(changes.quantita.is_none());
        assert!(changes.data_inizio.is_none());
        assert!(changes.updated_at.is_none());
    }

    #[test]
    fn test_list_query_builds_filter() {
        let query = MaterialReservationListQuery {
            data_inizio: Some(date(2024, 1, 1).at(0, 0, 0, 0)),
            data_fine: None,
            stato: Some("prenotata".to_string()),
            materiale_id: Some(3),
        };

        let filter = query.into_filter();
        assert_eq!(filter.bounds.from, Some(date(2024, 1, 1).at(0, 0, 0, 0)));
        assert_eq!(filter.bounds.to, None);
        assert_eq!(filter.resource_id, Some(3));
    }
}
