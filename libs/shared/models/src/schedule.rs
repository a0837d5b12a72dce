use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayOfWeek {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl DayOfWeek {
    pub const ALL: [DayOfWeek; 7] = [
        DayOfWeek::Monday,
        DayOfWeek::Tuesday,
        DayOfWeek::Wednesday,
        DayOfWeek::Thursday,
        DayOfWeek::Friday,
        DayOfWeek::Saturday,
        DayOfWeek::Sunday,
    ];

    pub fn of(date: NaiveDate) -> Self {
        date.weekday().into()
    }
}

impl From<Weekday> for DayOfWeek {
    fn from(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => DayOfWeek::Monday,
            Weekday::Tue => DayOfWeek::Tuesday,
            Weekday::Wed => DayOfWeek::Wednesday,
            Weekday::Thu => DayOfWeek::Thursday,
            Weekday::Fri => DayOfWeek::Friday,
            Weekday::Sat => DayOfWeek::Saturday,
            Weekday::Sun => DayOfWeek::Sunday,
        }
    }
}

impl fmt::Display for DayOfWeek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DayOfWeek::Monday => "monday",
            DayOfWeek::Tuesday => "tuesday",
            DayOfWeek::Wednesday => "wednesday",
            DayOfWeek::Thursday => "thursday",
            DayOfWeek::Friday => "friday",
            DayOfWeek::Saturday => "saturday",
            DayOfWeek::Sunday => "sunday",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingDay {
    pub open: NaiveTime,
    pub close: NaiveTime,
    pub is_open: bool,
}

impl WorkingDay {
    pub fn open(open: NaiveTime, close: NaiveTime) -> Self {
        Self { open, close, is_open: true }
    }

    pub fn closed() -> Self {
        Self {
            open: NaiveTime::MIN,
            close: NaiveTime::MIN,
            is_open: false,
        }
    }
}

/// Clinic-wide interval during which no slot may start. Half-open: `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BreakTime {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl BreakTime {
    pub fn contains(&self, time: NaiveTime) -> bool {
        time >= self.start && time < self.end
    }
}

/// A slot can never be longer than the day it sits in.
pub const MAX_SLOT_DURATION_MINUTES: u32 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClinicScheduleConfig {
    pub clinic_id: Uuid,
    pub working_hours: BTreeMap<DayOfWeek, WorkingDay>,
    pub slot_duration_minutes: u32,
    #[serde(default)]
    pub break_times: Vec<BreakTime>,
    #[serde(default = "default_online_booking")]
    pub online_booking_enabled: bool,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_online_booking() -> bool {
    true
}

impl ClinicScheduleConfig {
    pub fn working_day(&self, date: NaiveDate) -> Option<&WorkingDay> {
        self.working_hours.get(&DayOfWeek::of(date))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.slot_duration_minutes == 0 {
            return Err("Slot duration must be a positive number of minutes".to_string());
        }

        if self.slot_duration_minutes > MAX_SLOT_DURATION_MINUTES {
            return Err(format!(
                "Slot duration must not exceed {} minutes",
                MAX_SLOT_DURATION_MINUTES
            ));
        }

        for day in DayOfWeek::ALL {
            let hours = self
                .working_hours
                .get(&day)
                .ok_or_else(|| format!("Working hours missing for {}", day))?;

            if hours.is_open && hours.open >= hours.close {
                return Err(format!("Opening time must be before closing time on {}", day));
            }
        }

        if let Some(invalid) = self.break_times.iter().find(|b| b.start >= b.end) {
            return Err(format!(
                "Break starting at {} must end after it starts",
                invalid.start.format("%H:%M")
            ));
        }

        Ok(())
    }
}
