use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::appointment::AppointmentStatus;
use crate::staff::{ReminderStatus, TaskStatus};

/// Outbound domain events. Delivery (push, SMS, toasts) belongs to subscribers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum DomainEvent {
    BookingCreated {
        appointment_id: Uuid,
        clinic_id: Uuid,
        patient_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
        status: AppointmentStatus,
    },
    BookingConflict {
        clinic_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    },
    TaskStatusChanged {
        task_id: Uuid,
        clinic_id: Uuid,
        status: TaskStatus,
    },
    ReminderStatusChanged {
        reminder_id: Uuid,
        clinic_id: Uuid,
        status: ReminderStatus,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::BookingCreated { .. } => "booking_created",
            DomainEvent::BookingConflict { .. } => "booking_conflict",
            DomainEvent::TaskStatusChanged { .. } => "task_status_changed",
            DomainEvent::ReminderStatusChanged { .. } => "reminder_status_changed",
        }
    }

    pub fn clinic_id(&self) -> Uuid {
        match self {
            DomainEvent::BookingCreated { clinic_id, .. }
            | DomainEvent::BookingConflict { clinic_id, .. }
            | DomainEvent::TaskStatusChanged { clinic_id, .. }
            | DomainEvent::ReminderStatusChanged { clinic_id, .. } => *clinic_id,
        }
    }
}
