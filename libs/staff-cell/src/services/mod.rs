pub mod follow_up;
pub mod reminders;
pub mod stats;
pub mod tasks;

pub use follow_up::{spawn_booking_follow_up, BookingFollowUp};
pub use reminders::ReminderService;
pub use stats::{ReminderStats, TaskStats};
pub use tasks::TaskService;
