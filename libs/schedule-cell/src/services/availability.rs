use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, NaiveDate, NaiveTime};
use tracing::debug;
use uuid::Uuid;

use shared_database::{with_retry, AppointmentStore, RetryPolicy, ScheduleStore};
use shared_models::appointment::Appointment;
use shared_models::schedule::ClinicScheduleConfig;
use shared_utils::AppState;

use crate::models::{ScheduleError, TimeSlot};
use crate::services::slots::generate_slots;

/// Marks each generated slot available unless an active appointment holds it.
pub fn mark_availability(
    schedule: &ClinicScheduleConfig,
    date: NaiveDate,
    slots: &[NaiveTime],
    appointments: &[Appointment],
) -> Vec<TimeSlot> {
    let taken: HashSet<NaiveTime> = appointments
        .iter()
        .filter(|a| a.occupies(schedule.clinic_id, date, a.time))
        .map(|a| a.time)
        .collect();

    let duration = Duration::minutes(schedule.slot_duration_minutes as i64);

    slots
        .iter()
        .map(|&time| TimeSlot {
            time,
            end_time: time + duration,
            available: !taken.contains(&time),
            clinic_id: schedule.clinic_id,
            date,
        })
        .collect()
}

pub struct AvailabilityResolver {
    schedules: Arc<dyn ScheduleStore>,
    appointments: Arc<dyn AppointmentStore>,
    retry: RetryPolicy,
}

impl AvailabilityResolver {
    pub fn new(state: &AppState) -> Self {
        Self {
            schedules: state.stores.schedules.clone(),
            appointments: state.stores.appointments.clone(),
            retry: state.retry_policy(),
        }
    }

    pub async fn load_schedule(&self, clinic_id: Uuid) -> Result<ClinicScheduleConfig, ScheduleError> {
        let store = &self.schedules;
        with_retry(self.retry, "get_clinic_schedule", move || store.get_clinic_schedule(clinic_id))
            .await
            .map_err(|e| ScheduleError::from_store(clinic_id, e))
    }

    /// Slots offered to patients. Empty when the clinic has online booking switched off.
    pub async fn resolve_online(&self, clinic_id: Uuid, date: NaiveDate) -> Result<Vec<TimeSlot>, ScheduleError> {
        let schedule = self.load_schedule(clinic_id).await?;

        if !schedule.online_booking_enabled {
            debug!("Online booking disabled for clinic {}", clinic_id);
            return Ok(Vec::new());
        }

        self.resolve(&schedule, date).await
    }

    /// Slots offered to staff entering bookings by hand; ignores the online flag.
    pub async fn resolve_for_staff(&self, clinic_id: Uuid, date: NaiveDate) -> Result<Vec<TimeSlot>, ScheduleError> {
        let schedule = self.load_schedule(clinic_id).await?;
        self.resolve(&schedule, date).await
    }

    /// Marks `schedule`'s slots for `date` against the stored appointments.
    pub async fn resolve(&self, schedule: &ClinicScheduleConfig, date: NaiveDate) -> Result<Vec<TimeSlot>, ScheduleError> {
        let slots = generate_slots(schedule, date);
        if slots.is_empty() {
            return Ok(Vec::new());
        }

        let clinic_id = schedule.clinic_id;
        let store = &self.appointments;
        let appointments = with_retry(self.retry, "list_appointments", move || {
            store.list_appointments(clinic_id, date)
        })
        .await
        .map_err(|e| ScheduleError::from_store(clinic_id, e))?;

        debug!(
            "Resolved {} slots against {} appointments for clinic {} on {}",
            slots.len(),
            appointments.len(),
            clinic_id,
            date
        );

        Ok(mark_availability(schedule, date, &slots, &appointments))
    }
}
