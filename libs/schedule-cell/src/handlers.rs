use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{SlotQuery, UpsertScheduleRequest};
use crate::services::{AvailabilityResolver, ScheduleService};

#[axum::debug_handler]
pub async fn get_schedule(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    let schedule = service.get_schedule(clinic_id).await?;

    Ok(Json(json!({
        "success": true,
        "schedule": schedule
    })))
}

#[axum::debug_handler]
pub async fn upsert_schedule(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Json(request): Json<UpsertScheduleRequest>,
) -> Result<Json<Value>, AppError> {
    let service = ScheduleService::new(&state);
    let schedule = service.upsert_schedule(clinic_id, request).await?;

    Ok(Json(json!({
        "success": true,
        "schedule": schedule,
        "message": "Schedule saved"
    })))
}

/// Patient-facing availability.
#[axum::debug_handler]
pub async fn get_online_slots(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let resolver = AvailabilityResolver::new(&state);
    let slots = resolver.resolve_online(clinic_id, query.date).await?;

    Ok(Json(json!({
        "success": true,
        "clinic_id": clinic_id,
        "date": query.date,
        "slots": slots
    })))
}

#[axum::debug_handler]
pub async fn get_staff_slots(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Query(query): Query<SlotQuery>,
) -> Result<Json<Value>, AppError> {
    let resolver = AvailabilityResolver::new(&state);
    let slots = resolver.resolve_for_staff(clinic_id, query.date).await?;

    Ok(Json(json!({
        "success": true,
        "clinic_id": clinic_id,
        "date": query.date,
        "slots": slots
    })))
}
