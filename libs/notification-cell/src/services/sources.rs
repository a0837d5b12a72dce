use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use shared_database::{InboxStore, ReminderStore, StoreResult, TaskStore};
use shared_models::inbox::{InboxMessage, InboxNotification};
use shared_models::staff::{Priority, ReminderFilter, ReminderStatus, StaffReminder, StaffTask, TaskFilter, TaskStatus};

use crate::models::{FeedItem, FeedItemType, MarkReadOutcome};

/// One origin of feed items.
#[async_trait]
pub trait FeedSource: Send + Sync {
    fn item_type(&self) -> FeedItemType;

    async fn fetch(
        &self,
        clinic_id: Uuid,
        staff_id: Option<&str>,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<FeedItem>>;

    async fn mark_read(&self, id: Uuid) -> StoreResult<MarkReadOutcome>;
}

// ==============================================================================
// PROJECTIONS
// ==============================================================================

pub fn project_notification(notification: InboxNotification) -> FeedItem {
    FeedItem {
        id: notification.id,
        item_type: FeedItemType::Notification,
        title: notification.title,
        body: notification.body,
        timestamp: notification.created_at,
        read: notification.read,
        priority: notification.priority,
        from_staff_id: None,
        status: None,
    }
}

pub fn project_message(message: InboxMessage) -> FeedItem {
    FeedItem {
        id: message.id,
        item_type: FeedItemType::Message,
        title: message.subject,
        body: message.body,
        timestamp: message.sent_at,
        read: message.read,
        priority: Priority::Medium,
        from_staff_id: Some(message.from_staff_id),
        status: None,
    }
}

/// A task counts as read once it has left `pending`.
pub fn project_task(task: StaffTask) -> FeedItem {
    FeedItem {
        id: task.id,
        item_type: FeedItemType::Task,
        read: task.status != TaskStatus::Pending,
        status: Some(task.status.to_string()),
        title: task.title,
        body: task.description,
        timestamp: task.created_at,
        priority: task.priority,
        from_staff_id: Some(task.from_staff_id),
    }
}

/// Reminders sort by when they next fire and escalate once due.
pub fn project_reminder(reminder: StaffReminder, now: DateTime<Utc>) -> FeedItem {
    let status = reminder.effective_status(now);
    let priority = if reminder.is_due(now) { Priority::High } else { Priority::Medium };

    FeedItem {
        id: reminder.id,
        item_type: FeedItemType::Reminder,
        timestamp: reminder.due_at(),
        read: status != ReminderStatus::Pending,
        status: Some(status.to_string()),
        priority,
        title: reminder.title,
        body: reminder.message,
        from_staff_id: Some(reminder.from_staff_id),
    }
}

// ==============================================================================
// SOURCES
// ==============================================================================

pub struct NotificationSource {
    inbox: Arc<dyn InboxStore>,
}

impl NotificationSource {
    pub fn new(inbox: Arc<dyn InboxStore>) -> Self {
        Self { inbox }
    }
}

#[async_trait]
impl FeedSource for NotificationSource {
    fn item_type(&self) -> FeedItemType {
        FeedItemType::Notification
    }

    async fn fetch(&self, clinic_id: Uuid, staff_id: Option<&str>, _now: DateTime<Utc>) -> StoreResult<Vec<FeedItem>> {
        let notifications = self.inbox.list_notifications(clinic_id, staff_id).await?;
        Ok(notifications.into_iter().map(project_notification).collect())
    }

    async fn mark_read(&self, id: Uuid) -> StoreResult<MarkReadOutcome> {
        self.inbox.mark_notification_read(id).await?;
        Ok(MarkReadOutcome::Marked)
    }
}

pub struct MessageSource {
    inbox: Arc<dyn InboxStore>,
}

impl MessageSource {
    pub fn new(inbox: Arc<dyn InboxStore>) -> Self {
        Self { inbox }
    }
}

#[async_trait]
impl FeedSource for MessageSource {
    fn item_type(&self) -> FeedItemType {
        FeedItemType::Message
    }

    async fn fetch(&self, clinic_id: Uuid, staff_id: Option<&str>, _now: DateTime<Utc>) -> StoreResult<Vec<FeedItem>> {
        let messages = self.inbox.list_messages(clinic_id, staff_id).await?;
        Ok(messages.into_iter().map(project_message).collect())
    }

    async fn mark_read(&self, id: Uuid) -> StoreResult<MarkReadOutcome> {
        self.inbox.mark_message_read(id).await?;
        Ok(MarkReadOutcome::Marked)
    }
}

pub struct TaskSource {
    tasks: Arc<dyn TaskStore>,
}

impl TaskSource {
    pub fn new(tasks: Arc<dyn TaskStore>) -> Self {
        Self { tasks }
    }
}

#[async_trait]
impl FeedSource for TaskSource {
    fn item_type(&self) -> FeedItemType {
        FeedItemType::Task
    }

    async fn fetch(&self, clinic_id: Uuid, staff_id: Option<&str>, _now: DateTime<Utc>) -> StoreResult<Vec<FeedItem>> {
        let filter = TaskFilter {
            to_staff_id: staff_id.map(str::to_string),
            ..Default::default()
        };
        let tasks = self.tasks.list_tasks(clinic_id, &filter).await?;
        Ok(tasks.into_iter().map(project_task).collect())
    }

    async fn mark_read(&self, id: Uuid) -> StoreResult<MarkReadOutcome> {
        self.tasks.get_task(id).await?;
        Ok(MarkReadOutcome::RequiresAction)
    }
}

pub struct ReminderSource {
    reminders: Arc<dyn ReminderStore>,
}

impl ReminderSource {
    pub fn new(reminders: Arc<dyn ReminderStore>) -> Self {
        Self { reminders }
    }
}

#[async_trait]
impl FeedSource for ReminderSource {
    fn item_type(&self) -> FeedItemType {
        FeedItemType::Reminder
    }

    async fn fetch(&self, clinic_id: Uuid, staff_id: Option<&str>, now: DateTime<Utc>) -> StoreResult<Vec<FeedItem>> {
        let filter = ReminderFilter {
            to_staff_id: staff_id.map(str::to_string),
            ..Default::default()
        };
        let reminders = self.reminders.list_reminders(clinic_id, &filter).await?;
        Ok(reminders.into_iter().map(|r| project_reminder(r, now)).collect())
    }

    async fn mark_read(&self, id: Uuid) -> StoreResult<MarkReadOutcome> {
        self.reminders.get_reminder(id).await?;
        Ok(MarkReadOutcome::RequiresAction)
    }
}
