use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers;

pub fn notification_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/clinics/{clinic_id}/feed", get(handlers::list_feed))
        .route("/clinics/{clinic_id}/feed/unread", get(handlers::unread_counts))
        .route("/feed/{item_type}/{item_id}/read", post(handlers::mark_as_read))
        .with_state(state)
}
