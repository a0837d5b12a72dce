use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use shared_utils::test_utils::{default_now, test_state};
use staff_cell::staff_routes;

async fn send(app: Router, method: &str, uri: String, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

#[tokio::test]
async fn test_task_transition_errors_list_valid_actions() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();

    let (status, body) = send(
        staff_routes(state.clone()),
        "POST",
        format!("/clinics/{}/tasks", clinic_id),
        Some(json!({
            "from_staff_id": "dr_walsh",
            "to_staff_id": "nurse_kelly",
            "title": "Prepare surgery 2",
            "priority": "high"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["task_type"], "general");
    let task_id = body["task"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        staff_routes(state.clone()),
        "POST",
        format!("/tasks/{}/transition", task_id),
        Some(json!({ "action": "reject" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        staff_routes(state.clone()),
        "POST",
        format!("/tasks/{}/transition", task_id),
        Some(json!({ "action": "complete" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["valid_actions"], json!([]));

    let (_, body) = send(staff_routes(state), "GET", format!("/tasks/{}", task_id), None).await;
    assert_eq!(body["status"], "rejected");
}

#[tokio::test]
async fn test_task_list_filter_and_stats() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();

    for (to, priority) in [("nurse_kelly", "high"), ("front_desk", "low"), ("nurse_kelly", "medium")] {
        send(
            staff_routes(state.clone()),
            "POST",
            format!("/clinics/{}/tasks", clinic_id),
            Some(json!({
                "from_staff_id": "dr_walsh",
                "to_staff_id": to,
                "title": "Restock gloves",
                "priority": priority,
                "task_type": "supplies"
            })),
        )
        .await;
    }

    let (_, body) = send(
        staff_routes(state.clone()),
        "GET",
        format!("/clinics/{}/tasks?to_staff_id=nurse_kelly", clinic_id),
        None,
    )
    .await;
    assert_eq!(body["total"], 2);

    let (_, body) = send(staff_routes(state), "GET", format!("/clinics/{}/tasks/stats", clinic_id), None).await;
    assert_eq!(body["stats"]["total"], 3);
    assert_eq!(body["stats"]["by_type"]["supplies"], 3);
    assert_eq!(body["stats"]["by_priority"]["high"], 1);
}

#[tokio::test]
async fn test_patch_and_delete_task() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();

    let (_, body) = send(
        staff_routes(state.clone()),
        "POST",
        format!("/clinics/{}/tasks", clinic_id),
        Some(json!({ "from_staff_id": "dr_walsh", "to_staff_id": "front_desk", "title": "Call lab" })),
    )
    .await;
    let task_id = body["task"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        staff_routes(state.clone()),
        "PATCH",
        format!("/tasks/{}", task_id),
        Some(json!({ "description": "Ask about the delayed crown" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["task"]["description"], "Ask about the delayed crown");

    let (status, _) = send(staff_routes(state.clone()), "DELETE", format!("/tasks/{}", task_id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(staff_routes(state), "GET", format!("/tasks/{}", task_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reminder_snooze_over_http() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();

    let (_, body) = send(
        staff_routes(state.clone()),
        "POST",
        format!("/clinics/{}/reminders", clinic_id),
        Some(json!({
            "from_staff_id": "dr_walsh",
            "to_staff_id": "nurse_kelly",
            "title": "Patient recall list",
            "reminder_time": default_now() - Duration::minutes(1)
        })),
    )
    .await;
    assert_eq!(body["reminder"]["is_due"], true);
    let reminder_id = body["reminder"]["id"].as_str().unwrap().to_string();

    let (status, _) = send(
        staff_routes(state.clone()),
        "POST",
        format!("/reminders/{}/snooze", reminder_id),
        Some(json!({ "until": default_now() - Duration::minutes(5) })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        staff_routes(state.clone()),
        "POST",
        format!("/reminders/{}/snooze", reminder_id),
        Some(json!({ "until": default_now() + Duration::hours(1) })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["reminder"]["effective_status"], "snoozed");
    assert_eq!(body["reminder"]["is_due"], false);

    let (_, body) = send(
        staff_routes(state),
        "GET",
        format!("/clinics/{}/reminders/stats", clinic_id),
        None,
    )
    .await;
    assert_eq!(body["stats"]["snoozed"], 1);
    assert_eq!(body["stats"]["due_now"], 0);
}
