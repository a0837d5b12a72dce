use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use chrono::{NaiveTime, Utc};
use uuid::Uuid;

use schedule_cell::models::{ScheduleError, UpsertScheduleRequest};
use schedule_cell::services::{AvailabilityResolver, ScheduleService};
use shared_database::{InMemoryStore, ScheduleStore, StoreError, StoreResult, Stores};
use shared_models::appointment::{Appointment, AppointmentStatus, BookingSource};
use shared_models::schedule::ClinicScheduleConfig;
use shared_utils::test_utils::{monday, seeded_state, sunday, test_config, test_state, test_state_with, time, TestSchedule};
use shared_utils::AppState;

async fn book(state: &AppState, clinic_id: Uuid, at: NaiveTime) -> Appointment {
    let now = Utc::now();
    state
        .stores
        .appointments
        .insert_appointment_if_slot_free(Appointment {
            id: Uuid::new_v4(),
            clinic_id,
            patient_id: Uuid::new_v4(),
            date: monday(),
            time: at,
            duration_minutes: 30,
            status: AppointmentStatus::Scheduled,
            source: BookingSource::Manual,
            treatment: None,
            notes: None,
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        })
        .await
        .unwrap()
}

#[tokio::test]
async fn test_online_slots_for_open_day() {
    let (state, _clock, clinic_id) = seeded_state().await;
    let resolver = AvailabilityResolver::new(&state);

    let slots = resolver.resolve_online(clinic_id, monday()).await.unwrap();

    let times: Vec<_> = slots.iter().map(|s| s.time).collect();
    assert_eq!(times, vec![time(9, 0), time(9, 30), time(10, 30), time(11, 0), time(11, 30)]);
    assert!(slots.iter().all(|s| s.available && s.clinic_id == clinic_id && s.date == monday()));
}

#[tokio::test]
async fn test_existing_booking_marks_only_its_slot() {
    let (state, _clock, clinic_id) = seeded_state().await;
    book(&state, clinic_id, time(9, 30)).await;

    let slots = AvailabilityResolver::new(&state)
        .resolve_online(clinic_id, monday())
        .await
        .unwrap();

    for slot in &slots {
        assert_eq!(slot.available, slot.time != time(9, 30), "slot {}", slot.time);
    }
}

#[tokio::test]
async fn test_cancelled_booking_frees_slot() {
    let (state, _clock, clinic_id) = seeded_state().await;
    let mut appointment = book(&state, clinic_id, time(11, 0)).await;
    appointment.status = AppointmentStatus::Cancelled;
    state.stores.appointments.update_appointment(appointment).await.unwrap();

    let slots = AvailabilityResolver::new(&state)
        .resolve_for_staff(clinic_id, monday())
        .await
        .unwrap();

    assert!(slots.iter().all(|s| s.available));
}

#[tokio::test]
async fn test_closed_day_has_no_slots() {
    let (state, _clock, clinic_id) = seeded_state().await;

    let slots = AvailabilityResolver::new(&state)
        .resolve_online(clinic_id, sunday())
        .await
        .unwrap();

    assert!(slots.is_empty());
}

#[tokio::test]
async fn test_online_flag_only_hides_online_surface() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();
    state
        .stores
        .schedules
        .upsert_clinic_schedule(TestSchedule::morning_clinic(clinic_id).online_booking(false).build())
        .await
        .unwrap();
    let resolver = AvailabilityResolver::new(&state);

    assert!(resolver.resolve_online(clinic_id, monday()).await.unwrap().is_empty());
    assert_eq!(resolver.resolve_for_staff(clinic_id, monday()).await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_unknown_clinic_is_not_found() {
    let (state, _clock) = test_state();
    let unknown = Uuid::new_v4();

    let result = AvailabilityResolver::new(&state).resolve_online(unknown, monday()).await;

    assert_matches!(result, Err(ScheduleError::ClinicNotFound(id)) if id == unknown);
}

/// Schedule store that fails a fixed number of reads before delegating.
struct FlakySchedules {
    inner: InMemoryStore,
    failures_left: AtomicU32,
}

#[async_trait]
impl ScheduleStore for FlakySchedules {
    async fn get_clinic_schedule(&self, clinic_id: Uuid) -> StoreResult<ClinicScheduleConfig> {
        if self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Err(StoreError::Unavailable("connection reset".to_string()));
        }
        self.inner.get_clinic_schedule(clinic_id).await
    }

    async fn upsert_clinic_schedule(&self, schedule: ClinicScheduleConfig) -> StoreResult<ClinicScheduleConfig> {
        self.inner.upsert_clinic_schedule(schedule).await
    }
}

async fn flaky_state(failures: u32) -> (Arc<AppState>, Uuid) {
    let clinic_id = Uuid::new_v4();
    let flaky = Arc::new(FlakySchedules {
        inner: InMemoryStore::new(),
        failures_left: AtomicU32::new(failures),
    });
    flaky
        .upsert_clinic_schedule(TestSchedule::morning_clinic(clinic_id).build())
        .await
        .unwrap();

    let mut stores = Stores::in_memory();
    stores.schedules = flaky;
    let (state, _clock) = test_state_with(test_config(), stores);
    (state, clinic_id)
}

#[tokio::test]
async fn test_transient_read_failure_is_retried() {
    let (state, clinic_id) = flaky_state(1).await;

    let slots = AvailabilityResolver::new(&state).resolve_online(clinic_id, monday()).await;

    assert_eq!(slots.unwrap().len(), 5);
}

#[tokio::test]
async fn test_persistent_read_failure_surfaces_as_unavailable() {
    let (state, clinic_id) = flaky_state(5).await;

    let result = AvailabilityResolver::new(&state).resolve_online(clinic_id, monday()).await;

    assert_matches!(result, Err(ScheduleError::StoreUnavailable(_)));
}

#[tokio::test]
async fn test_upsert_validates_and_normalizes_breaks() {
    let (state, _clock) = test_state();
    let clinic_id = Uuid::new_v4();
    let base = TestSchedule::morning_clinic(clinic_id).build();
    let service = ScheduleService::new(&state);

    let request = UpsertScheduleRequest {
        working_hours: base.working_hours.clone(),
        slot_duration_minutes: 30,
        break_times: vec![base.break_times[0], base.break_times[0]],
        online_booking_enabled: None,
    };
    let saved = service.upsert_schedule(clinic_id, request).await.unwrap();

    assert_eq!(saved.break_times.len(), 1);
    assert!(saved.online_booking_enabled);
    assert_eq!(service.get_schedule(clinic_id).await.unwrap(), saved);

    let invalid = UpsertScheduleRequest {
        working_hours: base.working_hours,
        slot_duration_minutes: 0,
        break_times: vec![],
        online_booking_enabled: Some(true),
    };
    assert_matches!(
        service.upsert_schedule(clinic_id, invalid).await,
        Err(ScheduleError::Validation(_))
    );
}
