use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
        }
    }
}

// ==============================================================================
// STAFF TASKS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    Accepted,
    Rejected,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    Accept,
    Reject,
    Complete,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Rejected | TaskStatus::Completed)
    }

    /// Target status for `action`, or `None` when the machine forbids it.
    pub fn apply(&self, action: TaskAction) -> Option<TaskStatus> {
        match (self, action) {
            (TaskStatus::Pending, TaskAction::Accept) => Some(TaskStatus::Accepted),
            (TaskStatus::Pending, TaskAction::Reject) => Some(TaskStatus::Rejected),
            (TaskStatus::Accepted, TaskAction::Complete) => Some(TaskStatus::Completed),
            _ => None,
        }
    }

    pub fn valid_actions(&self) -> Vec<TaskAction> {
        match self {
            TaskStatus::Pending => vec![TaskAction::Accept, TaskAction::Reject],
            TaskStatus::Accepted => vec![TaskAction::Complete],
            TaskStatus::Rejected | TaskStatus::Completed => vec![],
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskStatus::Pending => write!(f, "pending"),
            TaskStatus::Accepted => write!(f, "accepted"),
            TaskStatus::Rejected => write!(f, "rejected"),
            TaskStatus::Completed => write!(f, "completed"),
        }
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskAction::Accept => write!(f, "accept"),
            TaskAction::Reject => write!(f, "reject"),
            TaskAction::Complete => write!(f, "complete"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffTask {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub from_staff_id: String,
    pub to_staff_id: String,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub task_type: String,
    pub related_entity_id: Option<Uuid>,
    pub related_entity_type: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskFilter {
    pub to_staff_id: Option<String>,
    pub from_staff_id: Option<String>,
    pub status: Option<TaskStatus>,
    pub task_type: Option<String>,
    pub priority: Option<Priority>,
}

impl TaskFilter {
    pub fn matches(&self, task: &StaffTask) -> bool {
        self.to_staff_id.as_ref().map_or(true, |id| *id == task.to_staff_id)
            && self.from_staff_id.as_ref().map_or(true, |id| *id == task.from_staff_id)
            && self.status.map_or(true, |s| s == task.status)
            && self.task_type.as_ref().map_or(true, |t| *t == task.task_type)
            && self.priority.map_or(true, |p| p == task.priority)
    }
}

// ==============================================================================
// STAFF REMINDERS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderStatus {
    Pending,
    Acknowledged,
    Snoozed,
    Dismissed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderAction {
    Acknowledge,
    Snooze,
    Dismiss,
}

impl ReminderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReminderStatus::Acknowledged | ReminderStatus::Dismissed)
    }

    pub fn apply(&self, action: ReminderAction) -> Option<ReminderStatus> {
        if self.is_terminal() {
            return None;
        }
        Some(match action {
            ReminderAction::Acknowledge => ReminderStatus::Acknowledged,
            ReminderAction::Snooze => ReminderStatus::Snoozed,
            ReminderAction::Dismiss => ReminderStatus::Dismissed,
        })
    }

    pub fn valid_actions(&self) -> Vec<ReminderAction> {
        if self.is_terminal() {
            vec![]
        } else {
            vec![ReminderAction::Acknowledge, ReminderAction::Snooze, ReminderAction::Dismiss]
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderStatus::Pending => write!(f, "pending"),
            ReminderStatus::Acknowledged => write!(f, "acknowledged"),
            ReminderStatus::Snoozed => write!(f, "snoozed"),
            ReminderStatus::Dismissed => write!(f, "dismissed"),
        }
    }
}

impl fmt::Display for ReminderAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReminderAction::Acknowledge => write!(f, "acknowledge"),
            ReminderAction::Snooze => write!(f, "snooze"),
            ReminderAction::Dismiss => write!(f, "dismiss"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaffReminder {
    pub id: Uuid,
    pub clinic_id: Uuid,
    pub from_staff_id: String,
    pub to_staff_id: String,
    pub title: String,
    pub message: Option<String>,
    pub reminder_time: DateTime<Utc>,
    pub reminder_type: String,
    pub status: ReminderStatus,
    pub snoozed_until: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StaffReminder {
    /// Status as seen at `now`. A snooze that has run out reads as pending;
    /// the stored status is left untouched.
    pub fn effective_status(&self, now: DateTime<Utc>) -> ReminderStatus {
        match (self.status, self.snoozed_until) {
            (ReminderStatus::Snoozed, Some(until)) if until <= now => ReminderStatus::Pending,
            (ReminderStatus::Snoozed, None) => ReminderStatus::Pending,
            (status, _) => status,
        }
    }

    /// The instant this reminder next demands attention.
    pub fn due_at(&self) -> DateTime<Utc> {
        match (self.status, self.snoozed_until) {
            (ReminderStatus::Snoozed, Some(until)) => until.max(self.reminder_time),
            _ => self.reminder_time,
        }
    }

    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == ReminderStatus::Pending && self.due_at() <= now
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReminderFilter {
    pub to_staff_id: Option<String>,
    pub from_staff_id: Option<String>,
    pub reminder_type: Option<String>,
}

impl ReminderFilter {
    pub fn matches(&self, reminder: &StaffReminder) -> bool {
        self.to_staff_id.as_ref().map_or(true, |id| *id == reminder.to_staff_id)
            && self.from_staff_id.as_ref().map_or(true, |id| *id == reminder.from_staff_id)
            && self.reminder_type.as_ref().map_or(true, |t| *t == reminder.reminder_type)
    }
}
