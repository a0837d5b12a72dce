use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use shared_models::appointment::{Appointment, Patient, PatientInfo};
use shared_models::inbox::{InboxMessage, InboxNotification};
use shared_models::schedule::ClinicScheduleConfig;
use shared_models::staff::{ReminderFilter, StaffReminder, StaffTask, TaskFilter};

use crate::error::StoreResult;
use crate::memory::InMemoryStore;

#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn get_clinic_schedule(&self, clinic_id: Uuid) -> StoreResult<ClinicScheduleConfig>;

    async fn upsert_clinic_schedule(
        &self,
        schedule: ClinicScheduleConfig,
    ) -> StoreResult<ClinicScheduleConfig>;
}

#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Non-cancelled appointments for one clinic day, ordered by time.
    async fn list_appointments(&self, clinic_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>>;

    async fn get_appointment(&self, appointment_id: Uuid) -> StoreResult<Appointment>;

    /// Atomic check-and-insert. Fails with `StoreError::Conflict` when a
    /// non-cancelled appointment already holds `(clinic_id, date, time)`.
    async fn insert_appointment_if_slot_free(&self, appointment: Appointment) -> StoreResult<Appointment>;

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment>;
}

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn find_or_create_patient(&self, clinic_id: Uuid, info: &PatientInfo) -> StoreResult<Patient>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list_tasks(&self, clinic_id: Uuid, filter: &TaskFilter) -> StoreResult<Vec<StaffTask>>;

    async fn get_task(&self, task_id: Uuid) -> StoreResult<StaffTask>;

    async fn upsert_task(&self, task: StaffTask) -> StoreResult<StaffTask>;

    async fn delete_task(&self, task_id: Uuid) -> StoreResult<()>;
}

#[async_trait]
pub trait ReminderStore: Send + Sync {
    async fn list_reminders(&self, clinic_id: Uuid, filter: &ReminderFilter) -> StoreResult<Vec<StaffReminder>>;

    async fn get_reminder(&self, reminder_id: Uuid) -> StoreResult<StaffReminder>;

    async fn upsert_reminder(&self, reminder: StaffReminder) -> StoreResult<StaffReminder>;

    async fn delete_reminder(&self, reminder_id: Uuid) -> StoreResult<()>;
}

/// Notifications and messages written by collaborators outside this core.
#[async_trait]
pub trait InboxStore: Send + Sync {
    async fn list_notifications(
        &self,
        clinic_id: Uuid,
        recipient_staff_id: Option<&str>,
    ) -> StoreResult<Vec<InboxNotification>>;

    async fn insert_notification(&self, notification: InboxNotification) -> StoreResult<InboxNotification>;

    async fn mark_notification_read(&self, notification_id: Uuid) -> StoreResult<InboxNotification>;

    async fn list_messages(
        &self,
        clinic_id: Uuid,
        recipient_staff_id: Option<&str>,
    ) -> StoreResult<Vec<InboxMessage>>;

    async fn insert_message(&self, message: InboxMessage) -> StoreResult<InboxMessage>;

    async fn mark_message_read(&self, message_id: Uuid) -> StoreResult<InboxMessage>;
}

/// Injected store handles, one per concern. Components take only the ones they use.
#[derive(Clone)]
pub struct Stores {
    pub schedules: Arc<dyn ScheduleStore>,
    pub appointments: Arc<dyn AppointmentStore>,
    pub patients: Arc<dyn PatientStore>,
    pub tasks: Arc<dyn TaskStore>,
    pub reminders: Arc<dyn ReminderStore>,
    pub inbox: Arc<dyn InboxStore>,
}

impl Stores {
    pub fn from_backend<B>(backend: Arc<B>) -> Self
    where
        B: ScheduleStore + AppointmentStore + PatientStore + TaskStore + ReminderStore + InboxStore + 'static,
    {
        Self {
            schedules: backend.clone(),
            appointments: backend.clone(),
            patients: backend.clone(),
            tasks: backend.clone(),
            reminders: backend.clone(),
            inbox: backend,
        }
    }

    pub fn in_memory() -> Self {
        Self::from_backend(Arc::new(InMemoryStore::new()))
    }
}
