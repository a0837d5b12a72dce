use chrono::{NaiveDate, NaiveTime, Timelike};

use shared_models::schedule::ClinicScheduleConfig;

/// Candidate slot start times for `date`, ascending.
///
/// Slots are laid out from opening time in steps of the slot duration. A
/// slot is offered only when it finishes by closing time, and never when it
/// starts inside a break. Closed days and days missing from the schedule
/// yield nothing.
pub fn generate_slots(schedule: &ClinicScheduleConfig, date: NaiveDate) -> Vec<NaiveTime> {
    let hours = match schedule.working_day(date) {
        Some(hours) if hours.is_open => hours,
        _ => return Vec::new(),
    };

    if schedule.slot_duration_minutes == 0 {
        return Vec::new();
    }

    // Walk in u64 seconds since midnight: neither a late closing time nor an
    // unvalidated duration can wrap.
    let step = u64::from(schedule.slot_duration_minutes) * 60;
    let close = u64::from(hours.close.num_seconds_from_midnight());
    let mut start = u64::from(hours.open.num_seconds_from_midnight());
    let mut slots = Vec::new();

    while start + step <= close {
        let candidate = u32::try_from(start)
            .ok()
            .and_then(|secs| NaiveTime::from_num_seconds_from_midnight_opt(secs, 0));
        if let Some(candidate) = candidate {
            if !schedule.break_times.iter().any(|b| b.contains(candidate)) {
                slots.push(candidate);
            }
        }
        start += step;
    }

    slots
}

/// Whether `time` is one of the generated candidates for `date`.
pub fn is_on_grid(schedule: &ClinicScheduleConfig, date: NaiveDate, time: NaiveTime) -> bool {
    generate_slots(schedule, date).contains(&time)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_models::schedule::DayOfWeek;
    use shared_utils::test_utils::{monday, sunday, time, TestSchedule};
    use uuid::Uuid;

    #[test]
    fn test_morning_with_break() {
        let schedule = TestSchedule::morning_clinic(Uuid::new_v4()).build();

        assert_eq!(
            generate_slots(&schedule, monday()),
            vec![time(9, 0), time(9, 30), time(10, 30), time(11, 0), time(11, 30)]
        );
    }

    #[test]
    fn test_closed_day_is_empty() {
        let schedule = TestSchedule::morning_clinic(Uuid::new_v4()).build();
        assert!(generate_slots(&schedule, sunday()).is_empty());
    }

    #[test]
    fn test_trailing_partial_slot_is_dropped() {
        let schedule = TestSchedule::morning_clinic(Uuid::new_v4())
            .hours(DayOfWeek::Monday, time(9, 0), time(10, 0))
            .slot_minutes(25)
            .breaks(vec![])
            .build();

        assert_eq!(generate_slots(&schedule, monday()), vec![time(9, 0), time(9, 25)]);
    }

    #[test]
    fn test_break_excludes_starts_not_overlaps() {
        // 09:45 ends inside the break but starts before it, so it stays.
        let schedule = TestSchedule::morning_clinic(Uuid::new_v4())
            .slot_minutes(45)
            .breaks(vec![(time(10, 0), time(10, 30))])
            .build();

        assert_eq!(
            generate_slots(&schedule, monday()),
            vec![time(9, 0), time(9, 45), time(10, 30), time(11, 15)]
        );
    }

    #[test]
    fn test_overlapping_breaks_match_their_union() {
        let clinic_id = Uuid::new_v4();
        let overlapping = TestSchedule::morning_clinic(clinic_id)
            .breaks(vec![(time(10, 0), time(10, 30)), (time(10, 15), time(11, 0)), (time(10, 0), time(10, 30))])
            .build();
        let merged = TestSchedule::morning_clinic(clinic_id)
            .breaks(vec![(time(10, 0), time(11, 0))])
            .build();

        assert_eq!(generate_slots(&overlapping, monday()), generate_slots(&merged, monday()));
    }

    #[test]
    fn test_day_ending_at_midnight_does_not_wrap() {
        let schedule = TestSchedule::morning_clinic(Uuid::new_v4())
            .hours(DayOfWeek::Monday, time(22, 0), NaiveTime::from_hms_opt(23, 59, 59).unwrap())
            .slot_minutes(60)
            .breaks(vec![])
            .build();

        assert_eq!(generate_slots(&schedule, monday()), vec![time(22, 0)]);
    }

    #[test]
    fn test_slots_are_ascending_and_deterministic() {
        let schedule = TestSchedule::morning_clinic(Uuid::new_v4()).slot_minutes(10).build();

        let first = generate_slots(&schedule, monday());
        let second = generate_slots(&schedule, monday());

        assert_eq!(first, second);
        assert!(first.windows(2).all(|w| w[0] < w[1]));
        assert!(first.iter().all(|t| *t < time(10, 0) || *t >= time(10, 30)));
    }

    #[test]
    fn test_oversized_duration_yields_no_slots() {
        let schedule = TestSchedule::morning_clinic(Uuid::new_v4())
            .slot_minutes(80_000_000)
            .build();

        assert!(schedule.validate().is_err());
        assert!(generate_slots(&schedule, monday()).is_empty());

        let whole_day = TestSchedule::morning_clinic(Uuid::new_v4())
            .slot_minutes(u32::MAX)
            .build();
        assert!(generate_slots(&whole_day, monday()).is_empty());
    }

    #[test]
    fn test_is_on_grid() {
        let schedule = TestSchedule::morning_clinic(Uuid::new_v4()).build();

        assert!(is_on_grid(&schedule, monday(), time(11, 0)));
        assert!(!is_on_grid(&schedule, monday(), time(11, 15)));
        assert!(!is_on_grid(&schedule, monday(), time(10, 0)));
        assert!(!is_on_grid(&schedule, sunday(), time(9, 0)));
    }
}
