//! Quantity accounting for material bookings

use serde::Serialize;
use serde_json::json;

use crate::availability::window::{OverlapRule, Window};
use crate::error::AppError;

/// Material reservations counted against capacity
pub const ACTIVE_STATUSES: [&str; 2] = ["prenotata", "confermata"];

/// Material windows compete when they touch
pub const OVERLAP_RULE: OverlapRule = OverlapRule::Inclusive;

/// Outcome of a material availability check, raw components included
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
#[schema(example = json!({
    "materiale_id": 1,
    "quantita_totale": 10,
    "quantita_assegnata": 2,
    "disponibile_ora": 8,
    "prenotata_nel_periodo": 3,
    "disponibile": 5,
    "richiesta": 4,
    "sufficiente": true
}))]
pub struct MaterialAvailability {
    pub materiale_id: i32,
    pub quantita_totale: i64,
    pub quantita_assegnata: i64,
    /// `quantita_totale - quantita_assegnata`
    pub disponibile_ora: i64,
    /// Sum booked by active reservations overlapping the window
    pub prenotata_nel_periodo: i64,
    /// `disponibile_ora - prenotata_nel_periodo`, may be negative
    pub disponibile: i64,
    pub richiesta: i64,
    pub sufficiente: bool,
}

impl MaterialAvailability {
    pub fn compute(
        materiale_id: i32,
        quantita_totale: i32,
        quantita_assegnata: i32,
        reserved_in_window: i64,
        requested: i32,
    ) -> Self {
        let disponibile_ora = i64::from(quantita_totale) - i64::from(quantita_assegnata);
        let disponibile = disponibile_ora - reserved_in_window;
        let richiesta = i64::from(requested);

        Self {
            materiale_id,
            quantita_totale: i64::from(quantita_totale),
            quantita_assegnata: i64::from(quantita_assegnata),
            disponibile_ora,
            prenotata_nel_periodo: reserved_in_window,
            disponibile,
            richiesta,
            sufficiente: disponibile >= richiesta,
        }
    }

    pub fn shortfall(&self) -> i64 {
        (self.richiesta - self.disponibile).max(0)
    }

    /// 400 body for a rejected booking
    pub fn into_conflict(self) -> AppError {
        let message = format!(
            "Quantità non disponibile: richiesti {}, disponibili {}",
            self.richiesta, self.disponibile
        );
        let mancante = self.shortfall();
        AppError::conflict(message, &self).with_detail("mancante", json!(mancante))
    }
}

/// One booking as seen by the in-memory sum
pub struct BookedQuantity<'a> {
    pub id: i32,
    pub materiale_id: i32,
    pub quantita: i32,
    pub window: Window,
    pub stato: &'a str,
}

/// In-memory counterpart of the SQL sum used by the PostgreSQL store
pub fn reserved_in_window<'a>(
    bookings: impl IntoIterator<Item = BookedQuantity<'a>>,
    materiale_id: i32,
    window: &Window,
    exclude_id: Option<i32>,
) -> i64 {
    bookings
        .into_iter()
        .filter(|b| b.materiale_id == materiale_id)
        .filter(|b| Some(b.id) != exclude_id)
        .filter(|b| ACTIVE_STATUSES.contains(&b.stato))
        .filter(|b| b.window.overlaps(window, OVERLAP_RULE))
        .map(|b| i64::from(b.quantita))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;
    use proptest::prelude::*;

    fn window(a: i8, b: i8) -> Window {
        Window::new(date(2024, 1, a).at(0, 0, 0, 0), date(2024, 1, b).at(0, 0, 0, 0)).unwrap()
    }

    fn booking(id: i32, quantita: i32, w: Window, stato: &str) -> BookedQuantity<'_> {
        BookedQuantity {
            id,
            materiale_id: 1,
            quantita,
            window: w,
            stato,
        }
    }

    #[test]
    fn test_no_reservations_leaves_unassigned_stock() {
        let availability = MaterialAvailability::compute(1, 10, 2, 0, 8);

        assert_eq!(availability.disponibile_ora, 8);
        assert_eq!(availability.disponibile, 8);
        assert!(availability.sufficiente);
        assert_eq!(availability.shortfall(), 0);
    }

    #[test]
    fn test_shortfall_reported_in_conflict() {
        let availability = MaterialAvailability::compute(1, 10, 2, 0, 9);
        assert!(!availability.sufficiente);

        match availability.into_conflict() {
            AppError::Conflict { details, .. } => {
                assert_eq!(details["disponibile"], 8);
                assert_eq!(details["richiesta"], 9);
                assert_eq!(details["mancante"], 1);
                assert_eq!(details["quantita_totale"], 10);
                assert_eq!(details["sufficiente"], false);
            }
            other => panic!("Expected Conflict, got {:?}", other),
        }
    }

    #[test]
    fn test_reserved_sum_filters_status_material_and_excluded() {
        let target = window(5, 10);
        let mut other_material = booking(4, 100, window(5, 6), "prenotata");
        other_material.materiale_id = 2;

        let bookings = vec![
            booking(1, 3, window(1, 5), "prenotata"),
            booking(2, 2, window(9, 12), "confermata"),
            booking(3, 7, window(6, 7), "annullata"),
            other_material,
            booking(5, 4, window(6, 8), "prenotata"),
            booking(6, 9, window(11, 12), "prenotata"),
        ];

        assert_eq!(reserved_in_window(bookings, 1, &target, Some(5)), 5);
    }

    proptest! {
        #[test]
        fn prop_available_is_total_minus_assigned_minus_reserved(
            total in 0i32..1000,
            assigned_ratio in 0.0f64..=1.0,
            reserved in 0i64..2000,
            requested in 1i32..1000,
        ) {
            let assigned = (f64::from(total) * assigned_ratio) as i32;
            let availability = MaterialAvailability::compute(1, total, assigned, reserved, requested);

            prop_assert_eq!(
                availability.disponibile,
                i64::from(total) - i64::from(assigned) - reserved
            );
            prop_assert_eq!(
                availability.sufficiente,
                i64::from(requested) <= availability.disponibile
            );
            prop_assert_eq!(availability.shortfall() > 0, !availability.sufficiente);
        }
    }
}
