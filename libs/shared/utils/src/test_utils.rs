use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::Stores;
use shared_models::appointment::PatientInfo;
use shared_models::schedule::{BreakTime, ClinicScheduleConfig, DayOfWeek, WorkingDay};

use crate::clock::FixedClock;
use crate::state::AppState;

pub fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

/// 2030-01-07, a Monday.
pub fn monday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 7).unwrap_or(NaiveDate::MIN)
}

/// 2030-01-06, the Sunday before [`monday`].
pub fn sunday() -> NaiveDate {
    NaiveDate::from_ymd_opt(2030, 1, 6).unwrap_or(NaiveDate::MIN)
}

/// Early morning on the Friday before [`monday`].
pub fn default_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2030, 1, 4, 7, 30, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub struct TestSchedule {
    schedule: ClinicScheduleConfig,
}

impl TestSchedule {
    /// Weekdays 09:00-12:00 in 30 minute slots with a 10:00-10:30 break; weekends closed.
    pub fn morning_clinic(clinic_id: Uuid) -> Self {
        let mut working_hours = BTreeMap::new();
        for day in DayOfWeek::ALL {
            let hours = match day {
                DayOfWeek::Saturday | DayOfWeek::Sunday => WorkingDay::closed(),
                _ => WorkingDay::open(time(9, 0), time(12, 0)),
            };
            working_hours.insert(day, hours);
        }

        Self {
            schedule: ClinicScheduleConfig {
                clinic_id,
                working_hours,
                slot_duration_minutes: 30,
                break_times: vec![BreakTime { start: time(10, 0), end: time(10, 30) }],
                online_booking_enabled: true,
                updated_at: default_now(),
            },
        }
    }

    pub fn slot_minutes(mut self, minutes: u32) -> Self {
        self.schedule.slot_duration_minutes = minutes;
        self
    }

    pub fn hours(mut self, day: DayOfWeek, open: NaiveTime, close: NaiveTime) -> Self {
        self.schedule.working_hours.insert(day, WorkingDay::open(open, close));
        self
    }

    pub fn closed_on(mut self, day: DayOfWeek) -> Self {
        self.schedule.working_hours.insert(day, WorkingDay::closed());
        self
    }

    pub fn breaks(mut self, breaks: Vec<(NaiveTime, NaiveTime)>) -> Self {
        self.schedule.break_times = breaks
            .into_iter()
            .map(|(start, end)| BreakTime { start, end })
            .collect();
        self
    }

    pub fn online_booking(mut self, enabled: bool) -> Self {
        self.schedule.online_booking_enabled = enabled;
        self
    }

    pub fn build(self) -> ClinicScheduleConfig {
        self.schedule
    }
}

pub fn test_patient(name: &str, phone: &str) -> PatientInfo {
    PatientInfo {
        name: name.to_string(),
        phone: Some(phone.to_string()),
        email: None,
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        store_retry_backoff_ms: 1,
        booking_timeout_ms: 2000,
        ..AppConfig::default()
    }
}

/// In-memory state driven by a fixed clock set to [`default_now`].
pub fn test_state() -> (Arc<AppState>, Arc<FixedClock>) {
    test_state_with(test_config(), Stores::in_memory())
}

pub fn test_state_with(config: AppConfig, stores: Stores) -> (Arc<AppState>, Arc<FixedClock>) {
    let clock = Arc::new(FixedClock::new(default_now()));
    let state = AppState::new(config, stores).with_clock(clock.clone());
    (Arc::new(state), clock)
}

/// Test state with the morning clinic schedule already stored.
pub async fn seeded_state() -> (Arc<AppState>, Arc<FixedClock>, Uuid) {
    let (state, clock) = test_state();
    let clinic_id = Uuid::new_v4();
    let _ = state
        .stores
        .schedules
        .upsert_clinic_schedule(TestSchedule::morning_clinic(clinic_id).build())
        .await;
    (state, clock, clinic_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::Clock;

    #[test]
    fn test_fixture_dates() {
        assert_eq!(DayOfWeek::of(monday()), DayOfWeek::Monday);
        assert_eq!(DayOfWeek::of(sunday()), DayOfWeek::Sunday);
        assert!(default_now().date_naive() < monday());
    }

    #[test]
    fn test_morning_clinic_is_valid() {
        let schedule = TestSchedule::morning_clinic(Uuid::new_v4()).build();
        assert!(schedule.validate().is_ok());
        assert!(!schedule.working_hours[&DayOfWeek::Sunday].is_open);
    }

    #[tokio::test]
    async fn test_seeded_state_has_schedule_and_fixed_clock() {
        let (state, _clock, clinic_id) = seeded_state().await;

        assert!(state.stores.schedules.get_clinic_schedule(clinic_id).await.is_ok());
        assert_eq!(state.clock.now(), default_now());
    }
}
