pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{BookingError, BookingRequest};
pub use router::appointment_routes;
pub use services::{AppointmentLifecycleService, BookingTransaction};
