use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use schedule_cell::services::AvailabilityResolver;
use shared_config::AppConfig;
use shared_database::{with_retry, AppointmentStore, PatientStore, RetryPolicy, StoreError};
use shared_models::appointment::{Appointment, AppointmentStatus, BookingSource};
use shared_models::events::DomainEvent;
use shared_utils::{AppState, Clock, EventBus, KeyedLocks, SlotKey};

use crate::models::{BookingError, BookingRequest};

const TIMEOUT_CANCELLATION_REASON: &str = "Booking attempt timed out";

/// Commits bookings so that a clinic/date/time never backs more than one
/// active appointment.
///
/// Attempts on the same slot are serialized in-process; the store's atomic
/// insert guards against writers in other processes.
pub struct BookingTransaction {
    resolver: AvailabilityResolver,
    appointments: Arc<dyn AppointmentStore>,
    patients: Arc<dyn PatientStore>,
    events: EventBus,
    clock: Arc<dyn Clock>,
    locks: Arc<KeyedLocks<SlotKey>>,
    entity_locks: Arc<KeyedLocks<Uuid>>,
    config: Arc<AppConfig>,
    retry: RetryPolicy,
}

impl BookingTransaction {
    pub fn new(state: &AppState) -> Self {
        Self {
            resolver: AvailabilityResolver::new(state),
            appointments: state.stores.appointments.clone(),
            patients: state.stores.patients.clone(),
            events: state.events.clone(),
            clock: state.clock.clone(),
            locks: state.booking_locks.clone(),
            entity_locks: state.entity_locks.clone(),
            config: state.config.clone(),
            retry: state.retry_policy(),
        }
    }

    #[instrument(skip(self, request), fields(clinic_id = %request.clinic_id, date = %request.date, time = %request.time, source = %request.source))]
    pub async fn commit_booking(&self, request: BookingRequest) -> Result<Appointment, BookingError> {
        validate_request(&request)?;

        let appointment_id = Uuid::new_v4();
        let limit = Duration::from_millis(self.config.booking_timeout_ms);

        match tokio::time::timeout(limit, self.commit_serialized(appointment_id, &request)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    "Booking {} for clinic {} timed out after {:?}",
                    appointment_id, request.clinic_id, limit
                );
                self.compensate(appointment_id).await;
                Err(BookingError::Timeout(self.config.booking_timeout_ms))
            }
        }
    }

    async fn commit_serialized(
        &self,
        appointment_id: Uuid,
        request: &BookingRequest,
    ) -> Result<Appointment, BookingError> {
        let _guard = self
            .locks
            .lock((request.clinic_id, request.date, request.time))
            .await;

        let schedule = self.resolver.load_schedule(request.clinic_id).await?;

        if request.source == BookingSource::OnlineBooking && !schedule.online_booking_enabled {
            return Err(BookingError::OnlineBookingDisabled(request.clinic_id));
        }

        self.check_not_past(request)?;

        // Re-resolve under the slot lock: this is both the grid check and the
        // availability check the caller saw earlier.
        let slots = self.resolver.resolve(&schedule, request.date).await?;
        let slot = slots.iter().find(|s| s.time == request.time).ok_or_else(|| {
            BookingError::Validation(format!(
                "{} is not a bookable slot on {}",
                request.time.format("%H:%M"),
                request.date
            ))
        })?;

        if !slot.available {
            return Err(self.reject_conflict(request));
        }

        let patients = &self.patients;
        let patient_info = &request.patient;
        let clinic_id = request.clinic_id;
        let patient = with_retry(self.retry, "find_or_create_patient", move || {
            patients.find_or_create_patient(clinic_id, patient_info)
        })
        .await
        .map_err(BookingError::from_store)?;

        let now = self.clock.now();
        let appointment = Appointment {
            id: appointment_id,
            clinic_id: request.clinic_id,
            patient_id: patient.id,
            date: request.date,
            time: request.time,
            duration_minutes: schedule.slot_duration_minutes,
            status: AppointmentStatus::Scheduled,
            source: request.source,
            treatment: request.treatment.clone(),
            notes: request.notes.clone(),
            cancellation_reason: None,
            created_at: now,
            updated_at: now,
        };

        let store = &self.appointments;
        let inserted = with_retry(self.retry, "insert_appointment_if_slot_free", move || {
            store.insert_appointment_if_slot_free(appointment.clone())
        })
        .await;

        let saved = match inserted {
            Ok(saved) => saved,
            Err(StoreError::Conflict(reason)) => {
                // A retried insert may be colliding with its own first attempt.
                match self.appointments.get_appointment(appointment_id).await {
                    Ok(existing) if existing.status.occupies_slot() => existing,
                    _ => {
                        debug!("Atomic insert rejected: {}", reason);
                        return Err(self.reject_conflict(request));
                    }
                }
            }
            Err(e) => return Err(BookingError::from_store(e)),
        };

        info!(
            "Booked appointment {} for patient {} at {} {}",
            saved.id, saved.patient_id, saved.date, saved.time
        );

        self.events.publish(DomainEvent::BookingCreated {
            appointment_id: saved.id,
            clinic_id: saved.clinic_id,
            patient_id: saved.patient_id,
            date: saved.date,
            time: saved.time,
            status: saved.status,
        });

        Ok(saved)
    }

    /// Online slots must not have started yet. Manual entries only look at
    /// the date, and only when back-dating is switched off.
    fn check_not_past(&self, request: &BookingRequest) -> Result<(), BookingError> {
        let now = self.clock.now().naive_utc();

        match request.source {
            BookingSource::OnlineBooking if request.date.and_time(request.time) <= now => {
                Err(BookingError::Validation(format!(
                    "Cannot book {} {} online: the slot has already started",
                    request.date,
                    request.time.format("%H:%M")
                )))
            }
            BookingSource::Manual if !self.config.allow_past_manual_bookings && request.date < now.date() => {
                Err(BookingError::Validation(format!(
                    "Cannot book {} for a past date",
                    request.date
                )))
            }
            _ => Ok(()),
        }
    }

    fn reject_conflict(&self, request: &BookingRequest) -> BookingError {
        warn!(
            "Slot {} {} at clinic {} already taken",
            request.date, request.time, request.clinic_id
        );
        self.events.publish(DomainEvent::BookingConflict {
            clinic_id: request.clinic_id,
            date: request.date,
            time: request.time,
        });
        BookingError::SlotUnavailable {
            clinic_id: request.clinic_id,
            date: request.date,
            time: request.time,
        }
    }

    /// Cancels the pre-allocated appointment if the abandoned attempt managed
    /// to write it.
    async fn compensate(&self, appointment_id: Uuid) {
        let _guard = self.entity_locks.lock(appointment_id).await;
        match self.appointments.get_appointment(appointment_id).await {
            Ok(mut orphan) if orphan.status.occupies_slot() => {
                orphan.status = AppointmentStatus::Cancelled;
                orphan.cancellation_reason = Some(TIMEOUT_CANCELLATION_REASON.to_string());
                orphan.updated_at = self.clock.now();

                match self.appointments.update_appointment(orphan).await {
                    Ok(_) => info!("Cancelled orphaned appointment {}", appointment_id),
                    Err(e) => warn!("Failed to cancel orphaned appointment {}: {}", appointment_id, e),
                }
            }
            Ok(_) | Err(StoreError::NotFound(_)) => {
                debug!("Timed out booking {} left nothing behind", appointment_id);
            }
            Err(e) => warn!("Could not check timed out booking {}: {}", appointment_id, e),
        }
    }
}

fn validate_request(request: &BookingRequest) -> Result<(), BookingError> {
    if request.patient.name.trim().is_empty() {
        return Err(BookingError::Validation("Patient name is required".to_string()));
    }

    if request.source == BookingSource::OnlineBooking && !request.patient.has_contact() {
        return Err(BookingError::Validation(
            "Online bookings need a phone number or email".to_string(),
        ));
    }

    Ok(())
}
