use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime, Utc};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_models::appointment::{Appointment, Patient, PatientInfo};
use shared_models::inbox::{InboxMessage, InboxNotification};
use shared_models::schedule::ClinicScheduleConfig;
use shared_models::staff::{ReminderFilter, StaffReminder, StaffTask, TaskFilter};

use crate::error::{StoreError, StoreResult};
use crate::store::{
    AppointmentStore, InboxStore, PatientStore, ReminderStore, ScheduleStore, TaskStore,
};

trait ClinicRow: Clone {
    fn row_id(&self) -> Uuid;
    fn clinic_id(&self) -> Uuid;
}

macro_rules! clinic_row {
    ($($ty:ty),*) => {
        $(impl ClinicRow for $ty {
            fn row_id(&self) -> Uuid {
                self.id
            }
            fn clinic_id(&self) -> Uuid {
                self.clinic_id
            }
        })*
    };
}

clinic_row!(Patient, StaffTask, StaffReminder, InboxNotification, InboxMessage);

/// Rows keyed by id with a per-clinic index kept in insertion order.
struct ClinicTable<T> {
    rows: HashMap<Uuid, T>,
    by_clinic: HashMap<Uuid, Vec<Uuid>>,
}

impl<T> Default for ClinicTable<T> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            by_clinic: HashMap::new(),
        }
    }
}

impl<T: ClinicRow> ClinicTable<T> {
    fn upsert(&mut self, row: T) -> T {
        let id = row.row_id();
        match self.rows.get(&id) {
            Some(existing) if existing.clinic_id() != row.clinic_id() => {
                let old_clinic = existing.clinic_id();
                if let Some(ids) = self.by_clinic.get_mut(&old_clinic) {
                    ids.retain(|other| *other != id);
                }
                self.by_clinic.entry(row.clinic_id()).or_default().push(id);
            }
            Some(_) => {}
            None => self.by_clinic.entry(row.clinic_id()).or_default().push(id),
        }
        self.rows.insert(id, row.clone());
        row
    }

    fn remove(&mut self, id: Uuid) -> Option<T> {
        let row = self.rows.remove(&id)?;
        if let Some(ids) = self.by_clinic.get_mut(&row.clinic_id()) {
            ids.retain(|other| *other != id);
        }
        Some(row)
    }

    fn get(&self, id: Uuid) -> Option<&T> {
        self.rows.get(&id)
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut T> {
        self.rows.get_mut(&id)
    }

    fn for_clinic(&self, clinic_id: Uuid) -> impl Iterator<Item = &T> {
        self.by_clinic
            .get(&clinic_id)
            .into_iter()
            .flatten()
            .filter_map(|id| self.rows.get(id))
    }
}

type SlotKey = (Uuid, NaiveDate, NaiveTime);

#[derive(Default)]
struct AppointmentTable {
    rows: HashMap<Uuid, Appointment>,
    by_clinic_day: HashMap<(Uuid, NaiveDate), Vec<Uuid>>,
    /// Holder of each occupied slot. Cancelled appointments are never indexed here.
    active_slots: HashMap<SlotKey, Uuid>,
}

impl AppointmentTable {
    fn slot_key(appointment: &Appointment) -> SlotKey {
        (appointment.clinic_id, appointment.date, appointment.time)
    }

    fn slot_holder(&self, key: &SlotKey) -> Option<Uuid> {
        self.active_slots.get(key).copied()
    }

    fn write(&mut self, appointment: Appointment) {
        if let Some(previous) = self.rows.get(&appointment.id) {
            let old_key = Self::slot_key(previous);
            if self.active_slots.get(&old_key) == Some(&previous.id) {
                self.active_slots.remove(&old_key);
            }
            if (previous.clinic_id, previous.date) != (appointment.clinic_id, appointment.date) {
                if let Some(ids) = self.by_clinic_day.get_mut(&(previous.clinic_id, previous.date)) {
                    ids.retain(|id| *id != appointment.id);
                }
                self.by_clinic_day
                    .entry((appointment.clinic_id, appointment.date))
                    .or_default()
                    .push(appointment.id);
            }
        } else {
            self.by_clinic_day
                .entry((appointment.clinic_id, appointment.date))
                .or_default()
                .push(appointment.id);
        }

        if appointment.status.occupies_slot() {
            self.active_slots.insert(Self::slot_key(&appointment), appointment.id);
        }
        self.rows.insert(appointment.id, appointment);
    }
}

/// Process-local backend. Each collection has its own lock; the appointment
/// lock is the only one whose critical section spans a check and a write.
#[derive(Default)]
pub struct InMemoryStore {
    schedules: RwLock<HashMap<Uuid, ClinicScheduleConfig>>,
    appointments: RwLock<AppointmentTable>,
    patients: RwLock<ClinicTable<Patient>>,
    tasks: RwLock<ClinicTable<StaffTask>>,
    reminders: RwLock<ClinicTable<StaffReminder>>,
    notifications: RwLock<ClinicTable<InboxNotification>>,
    messages: RwLock<ClinicTable<InboxMessage>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ScheduleStore for InMemoryStore {
    async fn get_clinic_schedule(&self, clinic_id: Uuid) -> StoreResult<ClinicScheduleConfig> {
        self.schedules
            .read()
            .await
            .get(&clinic_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Clinic {}", clinic_id)))
    }

    async fn upsert_clinic_schedule(
        &self,
        schedule: ClinicScheduleConfig,
    ) -> StoreResult<ClinicScheduleConfig> {
        self.schedules
            .write()
            .await
            .insert(schedule.clinic_id, schedule.clone());
        Ok(schedule)
    }
}

#[async_trait]
impl AppointmentStore for InMemoryStore {
    async fn list_appointments(&self, clinic_id: Uuid, date: NaiveDate) -> StoreResult<Vec<Appointment>> {
        let table = self.appointments.read().await;
        let mut appointments: Vec<Appointment> = table
            .by_clinic_day
            .get(&(clinic_id, date))
            .into_iter()
            .flatten()
            .filter_map(|id| table.rows.get(id))
            .filter(|a| a.status.occupies_slot())
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.time);
        Ok(appointments)
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> StoreResult<Appointment> {
        self.appointments
            .read()
            .await
            .rows
            .get(&appointment_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Appointment {}", appointment_id)))
    }

    async fn insert_appointment_if_slot_free(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let mut table = self.appointments.write().await;

        if table.rows.contains_key(&appointment.id) {
            return Err(StoreError::Conflict(format!(
                "Appointment {} already exists",
                appointment.id
            )));
        }

        let key = AppointmentTable::slot_key(&appointment);
        if let Some(holder) = table.slot_holder(&key) {
            debug!(
                "Slot {} {} at clinic {} already held by {}",
                appointment.date, appointment.time, appointment.clinic_id, holder
            );
            return Err(StoreError::Conflict(format!(
                "Slot {} {} is already booked",
                appointment.date,
                appointment.time.format("%H:%M")
            )));
        }

        table.write(appointment.clone());
        Ok(appointment)
    }

    async fn update_appointment(&self, appointment: Appointment) -> StoreResult<Appointment> {
        let mut table = self.appointments.write().await;

        if !table.rows.contains_key(&appointment.id) {
            return Err(StoreError::NotFound(format!("Appointment {}", appointment.id)));
        }

        if appointment.status.occupies_slot() {
            let key = AppointmentTable::slot_key(&appointment);
            if let Some(holder) = table.slot_holder(&key) {
                if holder != appointment.id {
                    return Err(StoreError::Conflict(format!(
                        "Slot {} {} is already booked",
                        appointment.date,
                        appointment.time.format("%H:%M")
                    )));
                }
            }
        }

        table.write(appointment.clone());
        Ok(appointment)
    }
}

#[async_trait]
impl PatientStore for InMemoryStore {
    async fn find_or_create_patient(&self, clinic_id: Uuid, info: &PatientInfo) -> StoreResult<Patient> {
        let mut patients = self.patients.write().await;

        if let Some(existing) = patients.for_clinic(clinic_id).find(|p| info.matches(p)) {
            return Ok(existing.clone());
        }

        let patient = Patient {
            id: Uuid::new_v4(),
            clinic_id,
            name: info.name.trim().to_string(),
            phone: info.phone.clone(),
            email: info.email.clone(),
            created_at: Utc::now(),
        };
        Ok(patients.upsert(patient))
    }
}

#[async_trait]
impl TaskStore for InMemoryStore {
    async fn list_tasks(&self, clinic_id: Uuid, filter: &TaskFilter) -> StoreResult<Vec<StaffTask>> {
        Ok(self
            .tasks
            .read()
            .await
            .for_clinic(clinic_id)
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }

    async fn get_task(&self, task_id: Uuid) -> StoreResult<StaffTask> {
        self.tasks
            .read()
            .await
            .get(task_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Task {}", task_id)))
    }

    async fn upsert_task(&self, task: StaffTask) -> StoreResult<StaffTask> {
        Ok(self.tasks.write().await.upsert(task))
    }

    async fn delete_task(&self, task_id: Uuid) -> StoreResult<()> {
        self.tasks
            .write()
            .await
            .remove(task_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Task {}", task_id)))
    }
}

#[async_trait]
impl ReminderStore for InMemoryStore {
    async fn list_reminders(&self, clinic_id: Uuid, filter: &ReminderFilter) -> StoreResult<Vec<StaffReminder>> {
        Ok(self
            .reminders
            .read()
            .await
            .for_clinic(clinic_id)
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn get_reminder(&self, reminder_id: Uuid) -> StoreResult<StaffReminder> {
        self.reminders
            .read()
            .await
            .get(reminder_id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("Reminder {}", reminder_id)))
    }

    async fn upsert_reminder(&self, reminder: StaffReminder) -> StoreResult<StaffReminder> {
        Ok(self.reminders.write().await.upsert(reminder))
    }

    async fn delete_reminder(&self, reminder_id: Uuid) -> StoreResult<()> {
        self.reminders
            .write()
            .await
            .remove(reminder_id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("Reminder {}", reminder_id)))
    }
}

#[async_trait]
impl InboxStore for InMemoryStore {
    async fn list_notifications(
        &self,
        clinic_id: Uuid,
        recipient_staff_id: Option<&str>,
    ) -> StoreResult<Vec<InboxNotification>> {
        Ok(self
            .notifications
            .read()
            .await
            .for_clinic(clinic_id)
            .filter(|n| recipient_staff_id.map_or(true, |id| n.recipient_staff_id == id))
            .cloned()
            .collect())
    }

    async fn insert_notification(&self, notification: InboxNotification) -> StoreResult<InboxNotification> {
        Ok(self.notifications.write().await.upsert(notification))
    }

    async fn mark_notification_read(&self, notification_id: Uuid) -> StoreResult<InboxNotification> {
        let mut notifications = self.notifications.write().await;
        let notification = notifications
            .get_mut(notification_id)
            .ok_or_else(|| StoreError::NotFound(format!("Notification {}", notification_id)))?;
        notification.read = true;
        Ok(notification.clone())
    }

    async fn list_messages(
        &self,
        clinic_id: Uuid,
        recipient_staff_id: Option<&str>,
    ) -> StoreResult<Vec<InboxMessage>> {
        Ok(self
            .messages
            .read()
            .await
            .for_clinic(clinic_id)
            .filter(|m| recipient_staff_id.map_or(true, |id| m.to_staff_id == id))
            .cloned()
            .collect())
    }

    async fn insert_message(&self, message: InboxMessage) -> StoreResult<InboxMessage> {
        Ok(self.messages.write().await.upsert(message))
    }

    async fn mark_message_read(&self, message_id: Uuid) -> StoreResult<InboxMessage> {
        let mut messages = self.messages.write().await;
        let message = messages
            .get_mut(message_id)
            .ok_or_else(|| StoreError::NotFound(format!("Message {}", message_id)))?;
        message.read = true;
        Ok(message.clone())
    }
}
