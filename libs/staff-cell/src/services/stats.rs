use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use shared_models::staff::{Priority, ReminderStatus, StaffReminder, StaffTask, TaskStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub low: usize,
    pub medium: usize,
    pub high: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub completed: usize,
    pub by_type: BTreeMap<String, usize>,
    pub by_priority: PriorityCounts,
    /// Open tasks due on the current UTC date.
    pub due_today: usize,
    /// Open tasks whose due date has passed.
    pub overdue: usize,
}

impl TaskStats {
    pub fn from_tasks(tasks: &[StaffTask], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();

        tasks.iter().fold(TaskStats::default(), |mut stats, task| {
            stats.total += 1;

            match task.status {
                TaskStatus::Pending => stats.pending += 1,
                TaskStatus::Accepted => stats.accepted += 1,
                TaskStatus::Rejected => stats.rejected += 1,
                TaskStatus::Completed => stats.completed += 1,
            }

            match task.priority {
                Priority::Low => stats.by_priority.low += 1,
                Priority::Medium => stats.by_priority.medium += 1,
                Priority::High => stats.by_priority.high += 1,
            }

            *stats.by_type.entry(task.task_type.clone()).or_default() += 1;

            if let (Some(due), false) = (task.due_date, task.status.is_terminal()) {
                if due.date_naive() == today {
                    stats.due_today += 1;
                }
                if due < now {
                    stats.overdue += 1;
                }
            }

            stats
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderStats {
    pub total: usize,
    pub pending: usize,
    pub acknowledged: usize,
    pub snoozed: usize,
    pub dismissed: usize,
    pub by_type: BTreeMap<String, usize>,
    pub due_today: usize,
    /// Due and still pending from before today.
    pub overdue: usize,
    pub due_now: usize,
}

impl ReminderStats {
    /// Counts use each reminder's effective status at `now`.
    pub fn from_reminders(reminders: &[StaffReminder], now: DateTime<Utc>) -> Self {
        let today = now.date_naive();

        reminders.iter().fold(ReminderStats::default(), |mut stats, reminder| {
            stats.total += 1;

            let status = reminder.effective_status(now);
            match status {
                ReminderStatus::Pending => stats.pending += 1,
                ReminderStatus::Acknowledged => stats.acknowledged += 1,
                ReminderStatus::Snoozed => stats.snoozed += 1,
                ReminderStatus::Dismissed => stats.dismissed += 1,
            }

            *stats.by_type.entry(reminder.reminder_type.clone()).or_default() += 1;

            if !status.is_terminal() {
                let due = reminder.due_at();
                if due.date_naive() == today {
                    stats.due_today += 1;
                }
                if reminder.is_due(now) {
                    stats.due_now += 1;
                    if due.date_naive() < today {
                        stats.overdue += 1;
                    }
                }
            }

            stats
        })
    }
}
