use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime, Utc};
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::{
    with_retry, AppointmentStore, RetryPolicy, ScheduleStore, StoreError, SupabaseStore, TaskStore,
};
use shared_models::appointment::{Appointment, AppointmentStatus, BookingSource};
use shared_models::staff::TaskFilter;

fn test_config(uri: String) -> AppConfig {
    AppConfig {
        supabase_url: uri,
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    }
}

fn test_appointment(clinic_id: Uuid) -> Appointment {
    let now = Utc::now();
    Appointment {
        id: Uuid::new_v4(),
        clinic_id,
        patient_id: Uuid::new_v4(),
        date: NaiveDate::from_ymd_opt(2030, 1, 7).unwrap(),
        time: NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
        duration_minutes: 30,
        status: AppointmentStatus::Scheduled,
        source: BookingSource::OnlineBooking,
        treatment: Some("Check-up".to_string()),
        notes: None,
        cancellation_reason: None,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn test_insert_maps_unique_violation_to_conflict() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("apikey", "test-anon-key"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint \"appointments_active_slot_key\""
        })))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(mock_server.uri()));
    let result = store
        .insert_appointment_if_slot_free(test_appointment(Uuid::new_v4()))
        .await;

    assert_matches!(result, Err(StoreError::Conflict(_)));
}

#[tokio::test]
async fn test_insert_returns_stored_row() {
    let mock_server = MockServer::start().await;
    let appointment = test_appointment(Uuid::new_v4());

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("Prefer", "return=representation"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([appointment])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(mock_server.uri()));
    let stored = store.insert_appointment_if_slot_free(appointment.clone()).await.unwrap();

    assert_eq!(stored.id, appointment.id);
    assert_eq!(stored.time, appointment.time);
}

#[tokio::test]
async fn test_list_appointments_excludes_cancelled_in_query() {
    let mock_server = MockServer::start().await;
    let clinic_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/appointments"))
        .and(query_param("clinic_id", format!("eq.{}", clinic_id)))
        .and(query_param("date", "eq.2030-01-07"))
        .and(query_param("status", "neq.cancelled"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([test_appointment(clinic_id)])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(mock_server.uri()));
    let appointments = store
        .list_appointments(clinic_id, NaiveDate::from_ymd_opt(2030, 1, 7).unwrap())
        .await
        .unwrap();

    assert_eq!(appointments.len(), 1);
}

#[tokio::test]
async fn test_missing_schedule_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/clinic_schedules"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(mock_server.uri()));
    let result = store.get_clinic_schedule(Uuid::new_v4()).await;

    assert_matches!(result, Err(StoreError::NotFound(_)));
}

#[tokio::test]
async fn test_server_errors_are_transient_and_retried() {
    let mock_server = MockServer::start().await;
    let clinic_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/staff_tasks"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/staff_tasks"))
        .and(query_param("to_staff_id", "eq.front_desk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(mock_server.uri()));
    let filter = TaskFilter {
        to_staff_id: Some("front_desk".to_string()),
        ..Default::default()
    };

    let policy = RetryPolicy {
        max_retries: 1,
        backoff: std::time::Duration::from_millis(1),
    };
    let tasks = with_retry(policy, "list_tasks", || store.list_tasks(clinic_id, &filter))
        .await
        .unwrap();

    assert!(tasks.is_empty());
}

#[tokio::test]
async fn test_client_errors_are_not_transient() {
    let mock_server = MockServer::start().await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/staff_tasks"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad filter"))
        .mount(&mock_server)
        .await;

    let store = SupabaseStore::new(&test_config(mock_server.uri()));
    let err = store.delete_task(Uuid::new_v4()).await.unwrap_err();

    assert_matches!(err, StoreError::Rejected(_));
    assert!(!err.is_transient());
}
