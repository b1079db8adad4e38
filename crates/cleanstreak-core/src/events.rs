use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievement::UnlockedAchievement;
use crate::habit::{HabitId, RelapseEvent};

/// Every confirmed state change in the [`StateStore`](crate::store::StateStore)
/// produces an Event. The presentation layer subscribes to them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StoreEvent {
    HabitCreated {
        habit_id: HabitId,
        at: DateTime<Utc>,
    },
    HabitUpdated {
        habit_id: HabitId,
        at: DateTime<Utc>,
    },
    /// Soft delete; history is kept.
    HabitDeleted {
        habit_id: HabitId,
        at: DateTime<Utc>,
    },
    RelapseRecorded {
        relapse: RelapseEvent,
        previous_streak_days: u32,
        max_streak_days: u32,
    },
    AchievementUnlocked {
        achievement: UnlockedAchievement,
    },
}
