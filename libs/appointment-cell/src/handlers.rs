use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};
use tracing::warn;
use uuid::Uuid;

use schedule_cell::services::AvailabilityResolver;
use shared_models::appointment::BookingSource;
use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{
    AppointmentListQuery, BookingError, BookingRequest, CancelAppointmentRequest,
    CreateBookingRequest, UpdateStatusRequest,
};
use crate::services::{AppointmentLifecycleService, BookingTransaction};

// ==============================================================================
// BOOKING HANDLERS
// ==============================================================================

/// Patient self-service booking.
#[axum::debug_handler]
pub async fn create_online_booking(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    commit(&state, BookingRequest::from_http(clinic_id, request, BookingSource::OnlineBooking)).await
}

/// Staff entering a booking on a patient's behalf.
#[axum::debug_handler]
pub async fn create_manual_appointment(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Json(request): Json<CreateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    commit(&state, BookingRequest::from_http(clinic_id, request, BookingSource::Manual)).await
}

async fn commit(state: &AppState, request: BookingRequest) -> Result<Json<Value>, AppError> {
    let source = request.source;
    let transaction = BookingTransaction::new(state);

    match transaction.commit_booking(request).await {
        Ok(appointment) => Ok(Json(json!({
            "success": true,
            "appointment": appointment,
            "message": "Appointment booked successfully"
        }))),
        Err(BookingError::SlotUnavailable { clinic_id, date, time }) => {
            Err(slot_conflict(state, source, clinic_id, date, time).await)
        }
        Err(e) => Err(e.into()),
    }
}

/// 409 carrying the slot list as it stands now, so the caller can pick again.
async fn slot_conflict(
    state: &AppState,
    source: BookingSource,
    clinic_id: Uuid,
    date: NaiveDate,
    time: NaiveTime,
) -> AppError {
    let resolver = AvailabilityResolver::new(state);
    let refreshed = match source {
        BookingSource::OnlineBooking => resolver.resolve_online(clinic_id, date).await,
        BookingSource::Manual => resolver.resolve_for_staff(clinic_id, date).await,
    };

    let slots = match refreshed {
        Ok(slots) => json!(slots),
        Err(e) => {
            warn!("Could not refresh slots after conflict: {}", e);
            Value::Null
        }
    };

    AppError::Conflict {
        message: BookingError::SlotUnavailable { clinic_id, date, time }.to_string(),
        details: Some(json!({
            "date": date,
            "requested_time": time,
            "slots": slots
        })),
    }
}

// ==============================================================================
// LIFECYCLE HANDLERS
// ==============================================================================

#[axum::debug_handler]
pub async fn list_appointments(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Query(query): Query<AppointmentListQuery>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::new(&state);
    let appointments = service.list_appointments(clinic_id, query.date).await?;

    Ok(Json(json!({
        "success": true,
        "appointments": appointments,
        "total": appointments.len()
    })))
}

#[axum::debug_handler]
pub async fn get_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::new(&state);
    let appointment = service.get_appointment(appointment_id).await?;

    Ok(Json(json!(appointment)))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::new(&state);
    let appointment = service
        .transition_appointment(appointment_id, request.status)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": format!("Appointment is now {}", appointment.status)
    })))
}

#[axum::debug_handler]
pub async fn cancel_appointment(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Json(request): Json<CancelAppointmentRequest>,
) -> Result<Json<Value>, AppError> {
    let service = AppointmentLifecycleService::new(&state);
    let appointment = service
        .cancel_appointment(appointment_id, request.reason)
        .await?;

    Ok(Json(json!({
        "success": true,
        "appointment": appointment,
        "message": "Appointment cancelled"
    })))
}
