use std::sync::Arc;

use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use shared_database::{with_retry, AppointmentStore, RetryPolicy};
use shared_models::appointment::{Appointment, AppointmentStatus};
use shared_utils::{AppState, Clock, KeyedLocks};

use crate::models::BookingError;

/// Status changes on existing appointments. Appointments are never deleted;
/// cancellation is a terminal status that releases the slot.
pub struct AppointmentLifecycleService {
    appointments: Arc<dyn AppointmentStore>,
    clock: Arc<dyn Clock>,
    locks: Arc<KeyedLocks<Uuid>>,
    retry: RetryPolicy,
}

impl AppointmentLifecycleService {
    pub fn new(state: &AppState) -> Self {
        Self {
            appointments: state.stores.appointments.clone(),
            clock: state.clock.clone(),
            locks: state.entity_locks.clone(),
            retry: state.retry_policy(),
        }
    }

    pub async fn get_appointment(&self, appointment_id: Uuid) -> Result<Appointment, BookingError> {
        let store = &self.appointments;
        with_retry(self.retry, "get_appointment", move || store.get_appointment(appointment_id))
            .await
            .map_err(|e| BookingError::appointment_store(appointment_id, e))
    }

    /// Active appointments for one clinic day, by time.
    pub async fn list_appointments(&self, clinic_id: Uuid, date: NaiveDate) -> Result<Vec<Appointment>, BookingError> {
        let store = &self.appointments;
        with_retry(self.retry, "list_appointments", move || store.list_appointments(clinic_id, date))
            .await
            .map_err(BookingError::from_store)
    }

    pub async fn transition_appointment(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
    ) -> Result<Appointment, BookingError> {
        self.apply(appointment_id, new_status, None).await
    }

    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        reason: Option<String>,
    ) -> Result<Appointment, BookingError> {
        self.apply(appointment_id, AppointmentStatus::Cancelled, reason).await
    }

    async fn apply(
        &self,
        appointment_id: Uuid,
        new_status: AppointmentStatus,
        reason: Option<String>,
    ) -> Result<Appointment, BookingError> {
        let _guard = self.locks.lock(appointment_id).await;
        let mut appointment = self.get_appointment(appointment_id).await?;
        let current = appointment.status;

        if !current.can_transition_to(new_status) {
            return Err(BookingError::InvalidTransition {
                from: current,
                to: new_status,
                valid: current.valid_transitions(),
            });
        }

        appointment.status = new_status;
        appointment.updated_at = self.clock.now();
        if new_status == AppointmentStatus::Cancelled {
            appointment.cancellation_reason = reason;
        }

        let store = &self.appointments;
        let updated = with_retry(self.retry, "update_appointment", move || {
            store.update_appointment(appointment.clone())
        })
        .await
        .map_err(|e| BookingError::appointment_store(appointment_id, e))?;

        info!("Appointment {} moved from {} to {}", appointment_id, current, new_status);

        Ok(updated)
    }
}
