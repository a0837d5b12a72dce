use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::error::AppError;
use shared_utils::AppState;

use crate::models::{FeedFilter, FeedItemType, FeedQuery, MarkReadOutcome};
use crate::services::NotificationHub;

#[axum::debug_handler]
pub async fn list_feed(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = FeedFilter::try_from(query)?;
    let hub = NotificationHub::new(&state);
    let feed = hub.list_items(clinic_id, &filter).await?;

    Ok(Json(json!({
        "success": true,
        "total": feed.items.len(),
        "items": feed.items,
        "degraded_sources": feed.degraded_sources
    })))
}

#[axum::debug_handler]
pub async fn unread_counts(
    State(state): State<Arc<AppState>>,
    Path(clinic_id): Path<Uuid>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Value>, AppError> {
    let filter = FeedFilter::try_from(query)?;
    let hub = NotificationHub::new(&state);
    let counts = hub.unread_counts(clinic_id, &filter).await?;

    Ok(Json(json!({
        "success": true,
        "counts": counts
    })))
}

#[axum::debug_handler]
pub async fn mark_as_read(
    State(state): State<Arc<AppState>>,
    Path((item_type, item_id)): Path<(String, Uuid)>,
) -> Result<Json<Value>, AppError> {
    let item_type: FeedItemType = item_type.parse()?;
    let hub = NotificationHub::new(&state);
    let outcome = hub.mark_as_read(item_type, item_id).await?;

    let message = match outcome {
        MarkReadOutcome::Marked => format!("{} marked as read", item_type),
        MarkReadOutcome::RequiresAction => format!("{} stays unread until it is actioned", item_type),
    };

    Ok(Json(json!({
        "success": true,
        "outcome": outcome,
        "message": message
    })))
}
