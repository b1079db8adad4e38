//! Decides which milestones a streak newly qualifies for.
//!
//! The already-unlocked set is the only dedup mechanism here. Callers run on
//! a single logical thread per session, so no locking is involved.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::catalog::{AchievementDefinition, AchievementType, ACHIEVEMENTS};
use crate::habit::{HabitId, UserId};

pub type AchievementId = Uuid;

/// A milestone a habit has reached. At most one per `(habit_id, kind)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlockedAchievement {
    pub id: AchievementId,
    pub user_id: UserId,
    pub habit_id: HabitId,
    #[serde(rename = "achievement_type")]
    pub kind: AchievementType,
    /// Streak value the milestone was evaluated against.
    pub streak_days: u32,
    pub unlocked_at: DateTime<Utc>,
}

impl UnlockedAchievement {
    pub fn definition(&self) -> &'static AchievementDefinition {
        self.kind.definition()
    }
}

/// Insert payload for an unlock. The backend assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAchievement {
    pub user_id: UserId,
    pub habit_id: HabitId,
    #[serde(rename = "achievement_type")]
    pub kind: AchievementType,
    pub streak_days: u32,
    pub unlocked_at: DateTime<Utc>,
}

impl NewAchievement {
    pub fn into_unlocked(self, id: AchievementId) -> UnlockedAchievement {
        UnlockedAchievement {
            id,
            user_id: self.user_id,
            habit_id: self.habit_id,
            kind: self.kind,
            streak_days: self.streak_days,
            unlocked_at: self.unlocked_at,
        }
    }
}

/// Catalog entries met by `current_streak` and missing from
/// `already_unlocked`, in catalog order.
pub fn pending_unlocks(
    current_streak: u32,
    already_unlocked: &HashSet<AchievementType>,
) -> Vec<&'static AchievementDefinition> {
    ACHIEVEMENTS
        .iter()
        .take_while(|def| current_streak >= def.days)
        .filter(|def| !already_unlocked.contains(&def.kind))
        .collect()
}

/// Builds unlock records for a habit.
pub struct UnlockEngine;

impl UnlockEngine {
    /// Every crossed threshold is planned in one pass, not only the highest.
    pub fn plan(
        user_id: &str,
        habit_id: HabitId,
        current_streak: u32,
        already_unlocked: &HashSet<AchievementType>,
        now: DateTime<Utc>,
    ) -> Vec<NewAchievement> {
        pending_unlocks(current_streak, already_unlocked)
            .into_iter()
            .map(|def| NewAchievement {
                user_id: user_id.to_string(),
                habit_id,
                kind: def.kind,
                streak_days: current_streak,
                unlocked_at: now,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(defs: &[&AchievementDefinition]) -> Vec<AchievementType> {
        defs.iter().map(|d| d.kind).collect()
    }

    #[test]
    fn nothing_below_first_threshold() {
        assert!(pending_unlocks(0, &HashSet::new()).is_empty());
        assert!(pending_unlocks(6, &HashSet::new()).is_empty());
    }

    #[test]
    fn threshold_is_inclusive() {
        assert_eq!(
            kinds(&pending_unlocks(7, &HashSet::new())),
            vec![AchievementType::FirstWeek]
        );
    }

    #[test]
    fn crosses_several_thresholds_in_one_pass() {
        let pending = pending_unlocks(95, &HashSet::new());
        assert_eq!(
            kinds(&pending),
            vec![
                AchievementType::FirstWeek,
                AchievementType::OneMonth,
                AchievementType::Quarter,
            ]
        );
    }

    #[test]
    fn skips_already_unlocked_types() {
        let unlocked: HashSet<_> = [AchievementType::FirstWeek, AchievementType::Quarter]
            .into_iter()
            .collect();
        assert_eq!(
            kinds(&pending_unlocks(200, &unlocked)),
            vec![AchievementType::OneMonth, AchievementType::HalfYear]
        );
    }

    #[test]
    fn plan_records_streak_and_timestamp() {
        let habit_id = Uuid::new_v4();
        let now = Utc::now();
        let planned = UnlockEngine::plan("user-1", habit_id, 31, &HashSet::new(), now);
        assert_eq!(planned.len(), 2);
        for record in &planned {
            assert_eq!(record.user_id, "user-1");
            assert_eq!(record.habit_id, habit_id);
            assert_eq!(record.streak_days, 31);
            assert_eq!(record.unlocked_at, now);
        }
    }

    #[test]
    fn replanning_with_the_result_yields_nothing() {
        let habit_id = Uuid::new_v4();
        let now = Utc::now();
        let first = UnlockEngine::plan("u", habit_id, 400, &HashSet::new(), now);
        assert_eq!(first.len(), 5);
        let unlocked: HashSet<_> = first.iter().map(|a| a.kind).collect();
        assert!(UnlockEngine::plan("u", habit_id, 400, &unlocked, now).is_empty());
    }

    #[test]
    fn serializes_kind_as_achievement_type() {
        let record = NewAchievement {
            user_id: "u".into(),
            habit_id: Uuid::nil(),
            kind: AchievementType::Legend,
            streak_days: 365,
            unlocked_at: Utc::now(),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["achievement_type"], "legend");
    }
}
