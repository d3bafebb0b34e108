//! Conflict resolution for vehicle bookings

use serde::Serialize;

use crate::availability::window::OverlapRule;
use crate::error::AppError;

/// Reservations that keep a vehicle busy
pub const ACTIVE_RESERVATION_STATUSES: [&str; 3] = ["prenotata", "confermata", "in_corso"];

/// Maintenance entries that keep a vehicle in the workshop
pub const ACTIVE_MAINTENANCE_STATUSES: [&str; 2] = ["programmata", "in_corso"];

/// Vehicle status that allows booking
pub const BOOKABLE_VEHICLE_STATUS: &str = "disponibile";

/// A booking ending when the next starts is not a conflict
pub const OVERLAP_RULE: OverlapRule = OverlapRule::Exclusive;

pub const REASON_BOOKED: &str = "Veicolo già prenotato nel periodo";
pub const REASON_MAINTENANCE: &str = "Veicolo in manutenzione nel periodo";
pub const REASON_UNAVAILABLE: &str = "Veicolo non disponibile";

/// Outcome of a vehicle availability check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[schema(example = json!({
    "veicolo_id": 2,
    "disponibile": false,
    "motivo": "Veicolo già prenotato nel periodo",
    "prenotazioni_in_conflitto": 1,
    "manutenzioni_in_conflitto": 0,
    "stato_veicolo": "disponibile"
}))]
pub struct VehicleAvailability {
    pub veicolo_id: i32,
    pub disponibile: bool,
    /// Null when the vehicle is available
    pub motivo: Option<String>,
    pub prenotazioni_in_conflitto: i64,
    pub manutenzioni_in_conflitto: i64,
    pub stato_veicolo: String,
}

impl VehicleAvailability {
    /// Combines the three conflict sources. The first failing source names
    /// the reason: bookings, then maintenance, then vehicle status.
    pub fn resolve(
        veicolo_id: i32,
        stato_veicolo: &str,
        booking_conflicts: i64,
        maintenance_conflicts: i64,
    ) -> Self {
        let status_ok = stato_veicolo == BOOKABLE_VEHICLE_STATUS;
        let disponibile = booking_conflicts == 0 && maintenance_conflicts == 0 && status_ok;

        let motivo = if disponibile {
            None
        } else if booking_conflicts > 0 {
            Some(REASON_BOOKED.to_string())
        } else if maintenance_conflicts > 0 {
            Some(REASON_MAINTENANCE.to_string())
        } else if !status_ok {
            Some(format!("{} (stato: {})", REASON_UNAVAILABLE, stato_veicolo))
        } else {
            Some(REASON_UNAVAILABLE.to_string())
        };

        Self {
            veicolo_id,
            disponibile,
            motivo,
            prenotazioni_in_conflitto: booking_conflicts,
            manutenzioni_in_conflitto: maintenance_conflicts,
            stato_veicolo: stato_veicolo.to_string(),
        }
    }

    /// 400 body for a rejected booking
    pub fn into_conflict(self) -> AppError {
        let message = self
            .motivo
            .clone()
            .unwrap_or_else(|| REASON_UNAVAILABLE.to_string());
        AppError::conflict(message, &self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_vehicle_is_available() {
        let availability = VehicleAvailability::resolve(7, "disponibile", 0, 0);
        assert!(availability.disponibile);
        assert_eq!(availability.motivo, None);
    }

    #[test]
    fn test_available_motivo_serializes_as_null() {
        let json = serde_json::to_value(VehicleAvailability::resolve(1, "disponibile", 0, 0)).unwrap();

        assert_eq!(json["disponibile"], true);
        assert!(json["motivo"].is_null());
        assert_eq!(json["stato_veicolo"], "disponibile");
    }

    #[test]
    fn test_reason_priority() {
        let cases = [
            (1, 1, "non_disponibile", REASON_BOOKED.to_string()),
            (0, 2, "non_disponibile", REASON_MAINTENANCE.to_string()),
            (
                0,
                0,
                "in_manutenzione",
                "Veicolo non disponibile (stato: in_manutenzione)".to_string(),
            ),
        ];

        for (bookings, maintenance, stato, expected) in cases {
            let availability = VehicleAvailability::resolve(1, stato, bookings, maintenance);
            assert!(!availability.disponibile);
            assert_eq!(availability.motivo.as_deref(), Some(expected.as_str()));
        }
    }

    #[test]
    fn test_conflict_carries_counts() {
        let error = VehicleAvailability::resolve(3, "disponibile", 2, 1).into_conflict();

        match error {
            AppError::Conflict { message, details } => {
                assert_eq!(message, REASON_BOOKED);
                assert_eq!(details["prenotazioni_in_conflitto"], 2);
                assert_eq!(details["manutenzioni_in_conflitto"], 1);
                assert_eq!(details["disponibile"], false);
                assert_eq!(details["motivo"], REASON_BOOKED);
            }
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }
}
