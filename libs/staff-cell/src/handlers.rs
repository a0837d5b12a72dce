use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_models::staff::{ReminderFilter, TaskFilter};
use shared_utils::AppState;

use crate::models::{
    CreateReminderRequest, CreateTaskRequest, ReminderView, SnoozeReminderRequest,
    TransitionTaskRequest, UpdateTaskRequest,
};
use crate::services::{ReminderService, TaskService};

// ==============================================================================
// TASK HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_task(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Json(request): Json<CreateTaskRequest>,
) -> Result<Json<Value>, AppError> {
    let service = TaskService::new(&state);
    let task = service.create_task(clinic_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "task": task,
        "message": "Task created"
    })))
}

#[axum::debug_handler]
pub async fn list_tasks(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Value>, AppError> {
    let service = TaskService::new(&state);
    let tasks = service.list_tasks(clinic_id, &filter).await?;

    Ok(Json(json!({
        "success": true,
        "tasks": tasks,
        "total": tasks.len()
    })))
}

#[axum::debug_handler]
pub async fn task_stats(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Query(filter): Query<TaskFilter>,
) -> Result<Json<Value>, AppError> {
    let service = TaskService::new(&state);
    let stats = service.stats(clinic_id, &filter).await?;

    Ok(Json(json!({
        "success": true,
        "stats": stats
    })))
}

#[axum::debug_handler]
pub async fn get_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = TaskService::new(&state);
    let task = service.get_task(task_id).await?;

    Ok(Json(json!(task)))
}

#[axum::debug_handler]
pub async fn update_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<UpdateTaskRequest>,
) -> Result<Json<Value>, AppError> {
    let service = TaskService::new(&state);
    let task = service.update_task(task_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "task": task
    })))
}

#[axum::debug_handler]
pub async fn delete_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = TaskService::new(&state);
    service.delete_task(task_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Task deleted"
    })))
}

#[axum::debug_handler]
pub async fn transition_task(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
    Json(request): Json<TransitionTaskRequest>,
) -> Result<Json<Value>, AppError> {
    let service = TaskService::new(&state);
    let task = service.transition_task(task_id, request.action).await?;

    Ok(Json(json!({
        "success": true,
        "task": task,
        "valid_actions": task.status.valid_actions()
    })))
}

// ==============================================================================
// REMINDER HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn create_reminder(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Json(request): Json<CreateReminderRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let reminder = service.create_reminder(clinic_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "reminder": ReminderView::at(reminder, service.now()),
        "message": "Reminder created"
    })))
}

#[axum::debug_handler]
pub async fn list_reminders(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Query(filter): Query<ReminderFilter>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let now = service.now();
    let reminders: Vec<ReminderView> = service
        .list_reminders(clinic_id, &filter)
        .await?
        .into_iter()
        .map(|r| ReminderView::at(r, now))
        .collect();

    Ok(Json(json!({
        "success": true,
        "total": reminders.len(),
        "reminders": reminders
    })))
}

#[axum::debug_handler]
pub async fn reminder_stats(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Query(filter): Query<ReminderFilter>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let stats = service.stats(clinic_id, &filter).await?;

    Ok(Json(json!({
        "success": true,
        "stats": stats
    })))
}

#[axum::debug_handler]
pub async fn get_reminder(
    State(state): State<Arc<AppState>>,
    Path(reminder_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let reminder = service.get_reminder(reminder_id).await?;

    Ok(Json(json!(ReminderView::at(reminder, service.now()))))
}

#[axum::debug_handler]
pub async fn delete_reminder(
    State(state): State<Arc<AppState>>,
    Path(reminder_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    service.delete_reminder(reminder_id).await?;

    Ok(Json(json!({
        "success": true,
        "message": "Reminder deleted"
    })))
}

#[axum::debug_handler]
pub async fn acknowledge_reminder(
    State(state): State<Arc<AppState>>,
    Path(reminder_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let reminder = service.acknowledge_reminder(reminder_id).await?;

    Ok(Json(json!({
        "success": true,
        "reminder": ReminderView::at(reminder, service.now())
    })))
}

#[axum::debug_handler]
pub async fn snooze_reminder(
    State(state): State<Arc<AppState>>,
    Path(reminder_id): Path<Uuid>,
    Json(request): Json<SnoozeReminderRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let reminder = service.snooze_reminder(reminder_id, request.until).await?;

    Ok(Json(json!({
        "success": true,
        "reminder": ReminderView::at(reminder, service.now())
    })))
}

#[axum::debug_handler]
pub async fn dismiss_reminder(
    State(state): State<Arc<AppState>>,
    Path(reminder_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ReminderService::new(&state);
    let reminder = service.dismiss_reminder(reminder_id).await?;

    Ok(Json(json!({
        "success": true,
        "reminder": ReminderView::at(reminder, service.now())
    })))
}
