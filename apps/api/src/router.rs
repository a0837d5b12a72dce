use std::sync::Arc;

use axum::{routing::get, Router};

use appointment_cell::appointment_routes;
use notification_cell::notification_routes;
use schedule_cell::schedule_routes;
use shared_utils::AppState;
use staff_cell::staff_routes;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { "Clinic scheduling API is running!" }))
        .merge(schedule_routes(state.clone()))
        .merge(appointment_routes(state.clone()))
        .merge(staff_routes(state.clone()))
        .merge(notification_routes(state))
}
