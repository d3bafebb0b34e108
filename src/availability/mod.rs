//! Availability rules shared by the stores and services.
//!
//! Everything here is pure: the PostgreSQL store evaluates the same rules in
//! SQL, the in-memory store calls these functions directly.

pub mod material;
pub mod vehicle;
pub mod window;

pub use material::MaterialAvailability;
pub use vehicle::VehicleAvailability;
pub use window::{OverlapRule, Window, WindowBounds};
