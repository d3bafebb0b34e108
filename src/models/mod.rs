use jiff_diesel::ToDiesel;

mod material;
mod status;
mod vehicle;

pub use material::{
    Material, MaterialReservation, MaterialReservationChanges, MaterialReservationDetails,
    NewMaterialReservation,
};
pub use status::{ReservationStatus, check_status_change};
pub use vehicle::{
    NewVehicleReservation, Vehicle, VehicleReservation, VehicleReservationChanges,
    VehicleReservationDetails,
};

/// Creator display name as shown next to a reservation
pub fn display_name(nome: &str, cognome: &str) -> String {
    format!("{} {}", nome, cognome).trim().to_string()
}

/// Current local time as stored in `created_at` / `updated_at`
pub fn timestamp_now() -> jiff_diesel::DateTime {
    jiff::Zoned::now().datetime().to_diesel()
}
