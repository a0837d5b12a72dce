pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::TaskError;
pub use router::staff_routes;
pub use services::{spawn_booking_follow_up, ReminderService, TaskService};
