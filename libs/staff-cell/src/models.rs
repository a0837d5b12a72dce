use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::staff::{Priority, ReminderStatus, StaffReminder, TaskAction, TaskStatus};

pub const DEFAULT_TASK_TYPE: &str = "general";
pub const DEFAULT_REMINDER_TYPE: &str = "general";

// ==============================================================================
// TASK REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub from_staff_id: String,
    pub to_staff_id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub task_type: Option<String>,
    pub related_entity_id: Option<Uuid>,
    pub related_entity_type: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Edits allowed while a task is still pending. Absent fields are left alone.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransitionTaskRequest {
    pub action: TaskAction,
}

// ==============================================================================
// REMINDER REQUESTS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateReminderRequest {
    pub from_staff_id: String,
    pub to_staff_id: String,
    pub title: String,
    pub message: Option<String>,
    pub reminder_time: DateTime<Utc>,
    pub reminder_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnoozeReminderRequest {
    pub until: DateTime<Utc>,
}

/// A reminder together with how it reads at the moment it was fetched.
#[derive(Debug, Clone, Serialize)]
pub struct ReminderView {
    #[serde(flatten)]
    pub reminder: StaffReminder,
    pub effective_status: ReminderStatus,
    pub is_due: bool,
}

impl ReminderView {
    pub fn at(reminder: StaffReminder, now: DateTime<Utc>) -> Self {
        Self {
            effective_status: reminder.effective_status(now),
            is_due: reminder.is_due(now),
            reminder,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum TaskError {
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    #[error("Reminder {0} not found")]
    ReminderNotFound(Uuid),

    #[error("Cannot {action} a {status} {entity}")]
    InvalidTransition {
        entity: &'static str,
        status: String,
        action: String,
        valid_actions: Vec<String>,
    },

    #[error("Only pending tasks can be edited; task is {0}")]
    NotEditable(TaskStatus),

    #[error("{0}")]
    Validation(String),

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl TaskError {
    pub(crate) fn task_store(task_id: Uuid, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => TaskError::TaskNotFound(task_id),
            other => Self::from_store(other),
        }
    }

    pub(crate) fn reminder_store(reminder_id: Uuid, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => TaskError::ReminderNotFound(reminder_id),
            other => Self::from_store(other),
        }
    }

    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => TaskError::StoreUnavailable(msg),
            StoreError::Rejected(msg) => TaskError::Validation(msg),
            other => TaskError::Store(other.to_string()),
        }
    }
}

impl From<TaskError> for AppError {
    fn from(err: TaskError) -> Self {
        match err {
            TaskError::TaskNotFound(_) | TaskError::ReminderNotFound(_) => AppError::NotFound(err.to_string()),
            TaskError::InvalidTransition { ref valid_actions, .. } => AppError::InvalidTransition {
                valid_actions: valid_actions.clone(),
                message: err.to_string(),
            },
            TaskError::NotEditable(_) => AppError::conflict(err.to_string()),
            TaskError::Validation(msg) => AppError::ValidationError(msg),
            TaskError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            TaskError::Store(msg) => AppError::Internal(msg),
        }
    }
}
