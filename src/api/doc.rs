use utoipa::OpenApi;

pub const MATERIAL_TAG: &str = "Prenotazioni materiali";
pub const VEHICLE_TAG: &str = "Prenotazioni mezzi";
pub const HEALTH_TAG: &str = "Health";

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Prenota",
        description = "Reservation service for shared materials and vehicles",
    ),
    tags(
        (name = MATERIAL_TAG, description = "Material bookings and quantity checks"),
        (name = VEHICLE_TAG, description = "Vehicle bookings, availability and free-vehicle search"),
        (name = HEALTH_TAG, description = "Health check endpoints"),
    )
)]
pub struct ApiDoc;
