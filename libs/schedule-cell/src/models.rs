use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::error::AppError;
use shared_models::schedule::{BreakTime, DayOfWeek, WorkingDay};

/// One candidate start time for a clinic day, marked against existing bookings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub time: NaiveTime,
    pub end_time: NaiveTime,
    pub available: bool,
    pub clinic_id: Uuid,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertScheduleRequest {
    pub working_hours: BTreeMap<DayOfWeek, WorkingDay>,
    pub slot_duration_minutes: u32,
    #[serde(default)]
    pub break_times: Vec<BreakTime>,
    pub online_booking_enabled: Option<bool>,
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("No schedule configured for clinic {0}")]
    ClinicNotFound(Uuid),

    #[error("Invalid schedule: {0}")]
    Validation(String),

    #[error("Schedule store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Schedule store error: {0}")]
    Store(String),
}

impl ScheduleError {
    pub(crate) fn from_store(clinic_id: Uuid, err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ScheduleError::ClinicNotFound(clinic_id),
            StoreError::Unavailable(msg) => ScheduleError::StoreUnavailable(msg),
            other => ScheduleError::Store(other.to_string()),
        }
    }
}

impl From<ScheduleError> for AppError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::ClinicNotFound(_) => AppError::NotFound(err.to_string()),
            ScheduleError::Validation(msg) => AppError::ValidationError(msg),
            ScheduleError::StoreUnavailable(msg) => AppError::StoreUnavailable(msg),
            ScheduleError::Store(msg) => AppError::Internal(msg),
        }
    }
}
