use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use shared_database::{with_retry, RetryPolicy, TaskStore};
use shared_models::events::DomainEvent;
use shared_models::staff::{StaffTask, TaskAction, TaskFilter, TaskStatus};
use shared_utils::{AppState, Clock, EventBus, KeyedLocks};

use crate::models::{CreateTaskRequest, TaskError, UpdateTaskRequest, DEFAULT_TASK_TYPE};
use crate::services::stats::TaskStats;

pub struct TaskService {
    tasks: Arc<dyn TaskStore>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    locks: Arc<KeyedLocks<Uuid>>,
    retry: RetryPolicy,
}

impl TaskService {
    pub fn new(state: &AppState) -> Self {
        Self {
            tasks: state.stores.tasks.clone(),
            events: state.events.clone(),
            clock: state.clock.clone(),
            locks: state.entity_locks.clone(),
            retry: state.retry_policy(),
        }
    }

    pub async fn create_task(&self, clinic_id: Uuid, request: CreateTaskRequest) -> Result<StaffTask, TaskError> {
        require("title", &request.title)?;
        require("to_staff_id", &request.to_staff_id)?;
        require("from_staff_id", &request.from_staff_id)?;

        let now = self.clock.now();
        let task = StaffTask {
            id: Uuid::new_v4(),
            clinic_id,
            from_staff_id: request.from_staff_id,
            to_staff_id: request.to_staff_id,
            title: request.title.trim().to_string(),
            description: request.description,
            priority: request.priority,
            status: TaskStatus::Pending,
            task_type: request.task_type.unwrap_or_else(|| DEFAULT_TASK_TYPE.to_string()),
            related_entity_id: request.related_entity_id,
            related_entity_type: request.related_entity_type,
            due_date: request.due_date,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };

        let saved = self.save(task).await?;
        info!("Task {} created for {} ({})", saved.id, saved.to_staff_id, saved.task_type);
        Ok(saved)
    }

    pub async fn get_task(&self, task_id: Uuid) -> Result<StaffTask, TaskError> {
        let store = &self.tasks;
        with_retry(self.retry, "get_task", move || store.get_task(task_id))
            .await
            .map_err(|e| TaskError::task_store(task_id, e))
    }

    pub async fn list_tasks(&self, clinic_id: Uuid, filter: &TaskFilter) -> Result<Vec<StaffTask>, TaskError> {
        let store = &self.tasks;
        with_retry(self.retry, "list_tasks", move || store.list_tasks(clinic_id, filter))
            .await
            .map_err(TaskError::from_store)
    }

    pub async fn update_task(&self, task_id: Uuid, request: UpdateTaskRequest) -> Result<StaffTask, TaskError> {
        let _guard = self.locks.lock(task_id).await;
        let mut task = self.get_task(task_id).await?;

        if task.status != TaskStatus::Pending {
            return Err(TaskError::NotEditable(task.status));
        }

        if let Some(title) = request.title {
            require("title", &title)?;
            task.title = title.trim().to_string();
        }
        if let Some(description) = request.description {
            task.description = Some(description);
        }
        if let Some(priority) = request.priority {
            task.priority = priority;
        }
        if let Some(due_date) = request.due_date {
            task.due_date = Some(due_date);
        }
        task.updated_at = self.clock.now();

        self.save(task).await
    }

    pub async fn delete_task(&self, task_id: Uuid) -> Result<(), TaskError> {
        let _guard = self.locks.lock(task_id).await;
        let store = &self.tasks;
        with_retry(self.retry, "delete_task", move || store.delete_task(task_id))
            .await
            .map_err(|e| TaskError::task_store(task_id, e))?;

        info!("Task {} deleted", task_id);
        Ok(())
    }

    /// Applies `action`, rejecting anything the task state machine does not allow.
    /// Concurrent actions on one task are checked one after another.
    pub async fn transition_task(&self, task_id: Uuid, action: TaskAction) -> Result<StaffTask, TaskError> {
        let _guard = self.locks.lock(task_id).await;
        let mut task = self.get_task(task_id).await?;

        let next = task.status.apply(action).ok_or_else(|| TaskError::InvalidTransition {
            entity: "task",
            status: task.status.to_string(),
            action: action.to_string(),
            valid_actions: task.status.valid_actions().iter().map(|a| a.to_string()).collect(),
        })?;

        let now = self.clock.now();
        task.status = next;
        task.updated_at = now;
        if next == TaskStatus::Completed {
            task.completed_at = Some(now);
        }

        let saved = self.save(task).await?;
        debug!("Task {} is now {}", saved.id, saved.status);

        self.events.publish(DomainEvent::TaskStatusChanged {
            task_id: saved.id,
            clinic_id: saved.clinic_id,
            status: saved.status,
        });

        Ok(saved)
    }

    pub async fn stats(&self, clinic_id: Uuid, filter: &TaskFilter) -> Result<TaskStats, TaskError> {
        let tasks = self.list_tasks(clinic_id, filter).await?;
        Ok(TaskStats::from_tasks(&tasks, self.clock.now()))
    }

    async fn save(&self, task: StaffTask) -> Result<StaffTask, TaskError> {
        let store = &self.tasks;
        let task_id = task.id;
        with_retry(self.retry, "upsert_task", move || store.upsert_task(task.clone()))
            .await
            .map_err(|e| TaskError::task_store(task_id, e))
    }
}

pub(crate) fn require(field: &str, value: &str) -> Result<(), TaskError> {
    if value.trim().is_empty() {
        return Err(TaskError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}
