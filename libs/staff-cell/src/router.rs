use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers;

pub fn staff_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Tasks
        .route(
            "/clinics/{clinic_id}/tasks",
            get(handlers::list_tasks).post(handlers::create_task),
        )
        .route("/clinics/{clinic_id}/tasks/stats", get(handlers::task_stats))
        .route(
            "/tasks/{task_id}",
            get(handlers::get_task)
                .patch(handlers::update_task)
                .delete(handlers::delete_task),
        )
        .route("/tasks/{task_id}/transition", post(handlers::transition_task))
        // Reminders
        .route(
            "/clinics/{clinic_id}/reminders",
            get(handlers::list_reminders).post(handlers::create_reminder),
        )
        .route("/clinics/{clinic_id}/reminders/stats", get(handlers::reminder_stats))
        .route(
            "/reminders/{reminder_id}",
            get(handlers::get_reminder).delete(handlers::delete_reminder),
        )
        .route("/reminders/{reminder_id}/acknowledge", post(handlers::acknowledge_reminder))
        .route("/reminders/{reminder_id}/snooze", post(handlers::snooze_reminder))
        .route("/reminders/{reminder_id}/dismiss", post(handlers::dismiss_reminder))
        .with_state(state)
}
