use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use schedule_cell::ScheduleError;
use shared_database::StoreError;
use shared_models::appointment::{AppointmentStatus, BookingSource, PatientInfo};
use shared_models::error::AppError;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookingRequest {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub patient: PatientInfo,
    pub treatment: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelAppointmentRequest {
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentListQuery {
    pub date: NaiveDate,
}

/// A fully specified booking attempt against one slot.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub clinic_id: Uuid,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub patient: PatientInfo,
    pub treatment: Option<String>,
    pub notes: Option<String>,
    pub source: BookingSource,
}

impl BookingRequest {
    pub fn from_http(clinic_id: Uuid, request: CreateBookingRequest, source: BookingSource) -> Self {
        Self {
            clinic_id,
            date: request.date,
            time: request.time,
            patient: request.patient,
            treatment: request.treatment,
            notes: request.notes,
            source,
        }
    }
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Error)]
pub enum BookingError {
    #[error("No schedule configured for clinic {0}")]
    ClinicNotFound(Uuid),

    #[error("Appointment {0} not found")]
    AppointmentNotFound(Uuid),

    #[error("Slot {date} {} is no longer available", .time.format("%H:%M"))]
    SlotUnavailable {
        clinic_id: Uuid,
        date: NaiveDate,
        time: NaiveTime,
    },

    #[error("Online booking is not enabled for clinic {0}")]
    OnlineBookingDisabled(Uuid),

    #[error("{0}")]
    Validation(String),

    #[error("Cannot move appointment from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
        valid: Vec<AppointmentStatus>,
    },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Booking did not complete within {0} ms")]
    Timeout(u64),

    #[error("Store error: {0}")]
    Store(String),
}

impl BookingError {
    pub(crate) fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => BookingError::StoreUnavailable(msg),
            StoreError::Rejected(msg) => BookingError::Validation(msg),
            other => BookingError::Store(other.to_string()),
        }
    }

    pub(crate) fn appointment_store(appointment_id: Uuid, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => BookingError::AppointmentNotFound(appointment_id),
            other => Self::from_store(other),
        }
    }
}

impl From<ScheduleError> for BookingError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::ClinicNotFound(id) => BookingError::ClinicNotFound(id),
            ScheduleError::Validation(msg) => BookingError::Validation(msg),
            ScheduleError::StoreUnavailable(msg) => BookingError::StoreUnavailable(msg),
            ScheduleError::Store(msg) => BookingError::Store(msg),
        }
    }
}

impl From<BookingError> for AppError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::ClinicNotFound(_) | BookingError::AppointmentNotFound(_) => {
                AppError::NotFound(err.to_string())
            }
            BookingError::SlotUnavailable { .. } | BookingError::OnlineBookingDisabled(_) => {
                AppError::conflict(err.to_string())
            }
            BookingError::Validation(msg) => AppError::ValidationError(msg),
            BookingError::InvalidTransition { ref valid, .. } => AppError::InvalidTransition {
                valid_actions: valid.iter().map(|s| s.to_string()).collect(),
                message: err.to_string(),
            },
            BookingError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            BookingError::Timeout(_) => AppError::Timeout(err.to_string()),
            BookingError::Store(msg) => AppError::Internal(msg),
        }
    }
}
