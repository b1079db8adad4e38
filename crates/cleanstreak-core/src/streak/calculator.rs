//! Elapsed clean time since a habit's reference point.
//!
//! Plain millisecond subtraction with 24h days and 60m hours. No calendar or
//! DST handling, so a day boundary can appear shifted by up to an hour around
//! a DST change.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::habit::TrackedHabit;

const MS_PER_MINUTE: i64 = 60 * 1000;
const MS_PER_HOUR: i64 = 60 * MS_PER_MINUTE;
const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

/// Streak split into whole days, the remaining hours and minutes, plus the
/// total number of whole hours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakBreakdown {
    pub days: u64,
    pub hours: u64,
    pub minutes: u64,
    pub total_hours: u64,
}

impl StreakBreakdown {
    pub fn for_habit(habit: &TrackedHabit, now: DateTime<Utc>) -> Self {
        compute_streak(habit.start_date, habit.last_relapse, now)
    }

    /// Whole days, saturated to `u32`.
    pub fn whole_days(&self) -> u32 {
        u32::try_from(self.days).unwrap_or(u32::MAX)
    }
}

/// Compute the streak measured from `last_relapse` (or `start_date` when the
/// habit never relapsed) up to `now`.
///
/// A reference point in the future yields an all-zero breakdown.
pub fn compute_streak(
    start_date: DateTime<Utc>,
    last_relapse: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> StreakBreakdown {
    let reference = last_relapse.unwrap_or(start_date);
    let elapsed_ms = (now - reference).num_milliseconds();
    if elapsed_ms <= 0 {
        return StreakBreakdown::default();
    }

    StreakBreakdown {
        days: (elapsed_ms / MS_PER_DAY) as u64,
        hours: ((elapsed_ms % MS_PER_DAY) / MS_PER_HOUR) as u64,
        minutes: ((elapsed_ms % MS_PER_HOUR) / MS_PER_MINUTE) as u64,
        total_hours: (elapsed_ms / MS_PER_HOUR) as u64,
    }
}

/// Whole elapsed days of the habit's current streak.
pub fn current_streak_days(habit: &TrackedHabit, now: DateTime<Utc>) -> u32 {
    StreakBreakdown::for_habit(habit, now).whole_days()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use proptest::prelude::*;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
    }

    #[test]
    fn splits_elapsed_time_into_components() {
        let now = t0() + Duration::days(7) + Duration::hours(1) + Duration::minutes(5);
        let streak = compute_streak(t0(), None, now);
        assert_eq!(streak.days, 7);
        assert_eq!(streak.hours, 1);
        assert_eq!(streak.minutes, 5);
        assert_eq!(streak.total_hours, 7 * 24 + 1);
    }

    #[test]
    fn relapse_is_the_reference_point() {
        let relapse = t0() + Duration::days(20);
        let now = relapse + Duration::hours(30);
        let streak = compute_streak(t0(), Some(relapse), now);
        assert_eq!(streak.days, 1);
        assert_eq!(streak.hours, 6);
    }

    #[test]
    fn future_reference_point_is_zero() {
        let now = t0();
        let streak = compute_streak(now + Duration::hours(5), None, now);
        assert_eq!(streak, StreakBreakdown::default());

        let streak = compute_streak(
            t0() - Duration::days(3),
            Some(now + Duration::minutes(1)),
            now,
        );
        assert_eq!(streak, StreakBreakdown::default());
    }

    #[test]
    fn partial_day_is_not_counted() {
        let now = t0() + Duration::days(1) - Duration::milliseconds(1);
        let streak = compute_streak(t0(), None, now);
        assert_eq!(streak.days, 0);
        assert_eq!(streak.hours, 23);
        assert_eq!(streak.minutes, 59);
    }

    proptest! {
        #[test]
        fn days_never_decrease_as_time_moves_forward(
            offset_ms in -10_000_000_000i64..100_000_000_000i64,
            step_ms in 1i64..10_000_000_000i64,
        ) {
            let now1 = t0() + Duration::milliseconds(offset_ms);
            let now2 = now1 + Duration::milliseconds(step_ms);
            let a = compute_streak(t0(), None, now1);
            let b = compute_streak(t0(), None, now2);
            prop_assert!(b.days >= a.days);
            prop_assert!(b.total_hours >= a.total_hours);
        }

        #[test]
        fn future_reference_always_yields_zero(ahead_ms in 1i64..100_000_000_000i64) {
            let now = t0();
            let streak = compute_streak(
                t0() - Duration::days(400),
                Some(now + Duration::milliseconds(ahead_ms)),
                now,
            );
            prop_assert_eq!(streak, StreakBreakdown::default());
        }

        #[test]
        fn components_stay_in_range(elapsed_ms in 0i64..100_000_000_000i64) {
            let streak = compute_streak(t0(), None, t0() + Duration::milliseconds(elapsed_ms));
            prop_assert!(streak.hours < 24);
            prop_assert!(streak.minutes < 60);
            prop_assert_eq!(streak.total_hours / 24, streak.days);
        }
    }
}
