pub mod availability;
pub mod schedule;
pub mod slots;

pub use availability::{mark_availability, AvailabilityResolver};
pub use schedule::ScheduleService;
pub use slots::{generate_slots, is_on_grid};
