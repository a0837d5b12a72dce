use std::sync::Arc;

use axum::{routing::get, Router};

use shared_utils::AppState;

use crate::handlers;

pub fn schedule_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/clinics/{clinic_id}/schedule",
            get(handlers::get_schedule).put(handlers::upsert_schedule),
        )
        .route("/clinics/{clinic_id}/slots", get(handlers::get_online_slots))
        .route("/clinics/{clinic_id}/slots/staff", get(handlers::get_staff_slots))
        .with_state(state)
}
