//! Unlock counts per habit and across all habits.

use serde::Serialize;

use super::catalog::ACHIEVEMENTS;
use super::engine::UnlockedAchievement;
use crate::habit::{HabitId, TrackedHabit};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementProgress {
    pub habit_id: HabitId,
    pub unlocked: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverallProgress {
    pub per_habit: Vec<AchievementProgress>,
    pub unlocked: usize,
    pub possible: usize,
    pub percent: f64,
}

/// Count unlocks for each habit. Unlocks belonging to habits not in
/// `habits` (e.g. soft-deleted ones) are not counted.
pub fn overall_progress(
    habits: &[TrackedHabit],
    achievements: &[UnlockedAchievement],
) -> OverallProgress {
    let per_habit: Vec<AchievementProgress> = habits
        .iter()
        .map(|habit| AchievementProgress {
            habit_id: habit.id,
            unlocked: achievements
                .iter()
                .filter(|a| a.habit_id == habit.id)
                .count(),
            total: ACHIEVEMENTS.len(),
        })
        .collect();

    let unlocked = per_habit.iter().map(|p| p.unlocked).sum();
    let possible = habits.len() * ACHIEVEMENTS.len();
    let percent = if possible > 0 {
        unlocked as f64 / possible as f64 * 100.0
    } else {
        0.0
    };

    OverallProgress {
        per_habit,
        unlocked,
        possible,
        percent,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::achievement::AchievementType;
    use crate::habit::NewHabit;
    use chrono::Utc;
    use uuid::Uuid;

    fn unlock(habit_id: HabitId, kind: AchievementType) -> UnlockedAchievement {
        UnlockedAchievement {
            id: Uuid::new_v4(),
            user_id: "u".into(),
            habit_id,
            kind,
            streak_days: kind.definition().days,
            unlocked_at: Utc::now(),
        }
    }

    #[test]
    fn empty_is_zero_percent() {
        let p = overall_progress(&[], &[]);
        assert_eq!(p.possible, 0);
        assert_eq!(p.percent, 0.0);
    }

    #[test]
    fn counts_only_listed_habits() {
        let now = Utc::now();
        let a = NewHabit::new("u", "A", "beer", now).into_habit(Uuid::new_v4(), now);
        let b = NewHabit::new("u", "B", "tv", now).into_habit(Uuid::new_v4(), now);
        let gone = Uuid::new_v4();
        let achievements = vec![
            unlock(a.id, AchievementType::FirstWeek),
            unlock(a.id, AchievementType::OneMonth),
            unlock(b.id, AchievementType::FirstWeek),
            unlock(gone, AchievementType::FirstWeek),
        ];

        let p = overall_progress(&[a.clone(), b], &achievements);
        assert_eq!(p.possible, 10);
        assert_eq!(p.unlocked, 3);
        assert_eq!(p.percent, 30.0);
        assert_eq!(p.per_habit[0].habit_id, a.id);
        assert_eq!(p.per_habit[0].unlocked, 2);
        assert_eq!(p.per_habit[0].total, 5);
    }
}
