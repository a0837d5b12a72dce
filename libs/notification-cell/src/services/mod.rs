pub mod hub;
pub mod sources;

pub use hub::NotificationHub;
pub use sources::{FeedSource, MessageSource, NotificationSource, ReminderSource, TaskSource};
