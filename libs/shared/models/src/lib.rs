pub mod appointment;
pub mod error;
pub mod events;
pub mod inbox;
pub mod schedule;
pub mod staff;
