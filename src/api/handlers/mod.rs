//! HTTP request handlers for API endpoints.
//!
//! One module per resource; each exposes an `OpenApiRouter` so routes and
//! their documentation are registered together.

pub mod health;
pub mod material_reservations;
pub mod vehicle_reservations;
