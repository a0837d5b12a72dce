use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_utils::AppState;

use crate::handlers;

pub fn appointment_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Booking surfaces
        .route("/clinics/{clinic_id}/bookings", post(handlers::create_online_booking))
        .route(
            "/clinics/{clinic_id}/appointments",
            post(handlers::create_manual_appointment).get(handlers::list_appointments),
        )
        // Lifecycle
        .route("/appointments/{appointment_id}", get(handlers::get_appointment))
        .route("/appointments/{appointment_id}/status", post(handlers::update_status))
        .route("/appointments/{appointment_id}/cancel", post(handlers::cancel_appointment))
        .with_state(state)
}
