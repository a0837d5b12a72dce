use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{with_retry, ReminderStore, RetryPolicy};
use shared_models::events::DomainEvent;
use shared_models::staff::{ReminderAction, ReminderFilter, ReminderStatus, StaffReminder};
use shared_utils::{AppState, Clock, EventBus, KeyedLocks};

use crate::models::{CreateReminderRequest, TaskError, DEFAULT_REMINDER_TYPE};
use crate::services::stats::ReminderStats;
use crate::services::tasks::require;

pub struct ReminderService {
    reminders: Arc<dyn ReminderStore>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    locks: Arc<KeyedLocks<Uuid>>,
    retry: RetryPolicy,
}

impl ReminderService {
    pub fn new(state: &AppState) -> Self {
        Self {
            reminders: state.stores.reminders.clone(),
            events: state.events.clone(),
            clock: state.clock.clone(),
            locks: state.entity_locks.clone(),
            retry: state.retry_policy(),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub async fn create_reminder(
        &self,
        clinic_id: Uuid,
        request: CreateReminderRequest,
    ) -> Result<StaffReminder, TaskError> {
        require("title", &request.title)?;
        require("to_staff_id", &request.to_staff_id)?;
        require("from_staff_id", &request.from_staff_id)?;

        let now = self.clock.now();
        let reminder = StaffReminder {
            id: Uuid::new_v4(),
            clinic_id,
            from_staff_id: request.from_staff_id,
            to_staff_id: request.to_staff_id,
            title: request.title.trim().to_string(),
            message: request.message,
            reminder_time: request.reminder_time,
            reminder_type: request
                .reminder_type
                .unwrap_or_else(|| DEFAULT_REMINDER_TYPE.to_string()),
            status: ReminderStatus::Pending,
            snoozed_until: None,
            created_at: now,
            updated_at: now,
        };

        let saved = self.save(reminder).await?;
        info!("Reminder {} set for {} at {}", saved.id, saved.to_staff_id, saved.reminder_time);
        Ok(saved)
    }

    pub async fn get_reminder(&self, reminder_id: Uuid) -> Result<StaffReminder, TaskError> {
        let store = &self.reminders;
        with_retry(self.retry, "get_reminder", move || store.get_reminder(reminder_id))
            .await
            .map_err(|e| TaskError::reminder_store(reminder_id, e))
    }

    pub async fn list_reminders(
        &self,
        clinic_id: Uuid,
        filter: &ReminderFilter,
    ) -> Result<Vec<StaffReminder>, TaskError> {
        let store = &self.reminders;
        with_retry(self.retry, "list_reminders", move || store.list_reminders(clinic_id, filter))
            .await
            .map_err(TaskError::from_store)
    }

    pub async fn delete_reminder(&self, reminder_id: Uuid) -> Result<(), TaskError> {
        let _guard = self.locks.lock(reminder_id).await;
        let store = &self.reminders;
        with_retry(self.retry, "delete_reminder", move || store.delete_reminder(reminder_id))
            .await
            .map_err(|e| TaskError::reminder_store(reminder_id, e))?;

        info!("Reminder {} deleted", reminder_id);
        Ok(())
    }

    pub async fn acknowledge_reminder(&self, reminder_id: Uuid) -> Result<StaffReminder, TaskError> {
        self.act(reminder_id, ReminderAction::Acknowledge, None).await
    }

    pub async fn dismiss_reminder(&self, reminder_id: Uuid) -> Result<StaffReminder, TaskError> {
        self.act(reminder_id, ReminderAction::Dismiss, None).await
    }

    /// Hides the reminder until `until`, which must lie in the future.
    pub async fn snooze_reminder(
        &self,
        reminder_id: Uuid,
        until: DateTime<Utc>,
    ) -> Result<StaffReminder, TaskError> {
        if until <= self.clock.now() {
            return Err(TaskError::Validation(
                "Snooze time must be in the future".to_string(),
            ));
        }
        self.act(reminder_id, ReminderAction::Snooze, Some(until)).await
    }

    pub async fn stats(&self, clinic_id: Uuid, filter: &ReminderFilter) -> Result<ReminderStats, TaskError> {
        let reminders = self.list_reminders(clinic_id, filter).await?;
        Ok(ReminderStats::from_reminders(&reminders, self.clock.now()))
    }

    async fn act(
        &self,
        reminder_id: Uuid,
        action: ReminderAction,
        snooze_until: Option<DateTime<Utc>>,
    ) -> Result<StaffReminder, TaskError> {
        let _guard = self.locks.lock(reminder_id).await;
        let mut reminder = self.get_reminder(reminder_id).await?;
        let now = self.clock.now();
        let current = reminder.effective_status(now);

        let next = current.apply(action).ok_or_else(|| TaskError::InvalidTransition {
            entity: "reminder",
            status: current.to_string(),
            action: action.to_string(),
            valid_actions: current.valid_actions().iter().map(|a| a.to_string()).collect(),
        })?;

        reminder.status = next;
        reminder.snoozed_until = snooze_until;
        reminder.updated_at = now;

        let saved = self.save(reminder).await?;
        debug!("Reminder {} is now {}", saved.id, saved.status);

        self.events.publish(DomainEvent::ReminderStatusChanged {
            reminder_id: saved.id,
            clinic_id: saved.clinic_id,
            status: saved.status,
        });

        Ok(saved)
    }

    async fn save(&self, reminder: StaffReminder) -> Result<StaffReminder, TaskError> {
        let store = &self.reminders;
        let reminder_id = reminder.id;
        with_retry(self.retry, "upsert_reminder", move || store.upsert_reminder(reminder.clone()))
            .await
            .map_err(|e| TaskError::reminder_store(reminder_id, e))
    }
}
