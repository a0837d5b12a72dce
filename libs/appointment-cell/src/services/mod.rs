pub mod booking;
pub mod lifecycle;

pub use booking::BookingTransaction;
pub use lifecycle::AppointmentLifecycleService;
