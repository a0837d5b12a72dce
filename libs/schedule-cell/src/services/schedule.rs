use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use shared_database::{with_retry, RetryPolicy, ScheduleStore};
use shared_models::schedule::ClinicScheduleConfig;
use shared_utils::{AppState, Clock};

use crate::models::{ScheduleError, UpsertScheduleRequest};

pub struct ScheduleService {
    schedules: Arc<dyn ScheduleStore>,
    clock: Arc<dyn Clock>,
    retry: RetryPolicy,
}

impl ScheduleService {
    pub fn new(state: &AppState) -> Self {
        Self {
            schedules: state.stores.schedules.clone(),
            clock: state.clock.clone(),
            retry: state.retry_policy(),
        }
    }

    pub async fn get_schedule(&self, clinic_id: Uuid) -> Result<ClinicScheduleConfig, ScheduleError> {
        let store = &self.schedules;
        with_retry(self.retry, "get_clinic_schedule", move || store.get_clinic_schedule(clinic_id))
            .await
            .map_err(|e| ScheduleError::from_store(clinic_id, e))
    }

    /// Validates and stores a clinic's schedule. Breaks are kept sorted and
    /// deduplicated.
    pub async fn upsert_schedule(
        &self,
        clinic_id: Uuid,
        request: UpsertScheduleRequest,
    ) -> Result<ClinicScheduleConfig, ScheduleError> {
        let mut break_times = request.break_times;
        break_times.sort();
        break_times.dedup();

        let schedule = ClinicScheduleConfig {
            clinic_id,
            working_hours: request.working_hours,
            slot_duration_minutes: request.slot_duration_minutes,
            break_times,
            online_booking_enabled: request.online_booking_enabled.unwrap_or(true),
            updated_at: self.clock.now(),
        };

        schedule.validate().map_err(ScheduleError::Validation)?;

        let store = &self.schedules;
        let saved = with_retry(self.retry, "upsert_clinic_schedule", move || {
            store.upsert_clinic_schedule(schedule.clone())
        })
        .await
        .map_err(|e| ScheduleError::from_store(clinic_id, e))?;

        info!(
            "Schedule for clinic {} saved ({} minute slots, online booking {})",
            clinic_id,
            saved.slot_duration_minutes,
            if saved.online_booking_enabled { "on" } else { "off" }
        );

        Ok(saved)
    }
}
