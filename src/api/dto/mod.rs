//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `material` - material reservation requests, responses and availability
//! - `vehicle` - vehicle reservation requests, responses and availability
//! - `health` - health check responses
//! - `error` - the shared error envelope
//! - `datetime` - lenient date-time parsing shared by all request bodies

pub mod datetime;
mod error;
mod health;
mod material;
mod vehicle;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use material::{
    CreateMaterialReservationRequest, MaterialAvailabilityQuery, MaterialReservationListQuery,
    MaterialReservationResponse, UpdateMaterialReservationRequest,
};
pub use vehicle::{
    AvailableVehiclesQuery, CreateVehicleReservationRequest, UpdateVehicleReservationRequest,
    VehicleAvailabilityQuery, VehicleReservationListQuery, VehicleReservationResponse,
    VehicleResponse,
};
