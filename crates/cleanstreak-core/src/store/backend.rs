use async_trait::async_trait;

use crate::achievement::{NewAchievement, UnlockedAchievement};
use crate::error::StoreError;
use crate::habit::{
    HabitFilter, HabitId, HabitUpdate, NewHabit, NewRelapse, RelapseEvent, TrackedHabit,
};

/// Durable storage behind the [`StateStore`](super::StateStore).
///
/// The backend is the source of truth: it assigns ids and `created_at`, and
/// every fetch replaces the in-memory mirror with what it returns.
/// Implementations must return lists in the documented order.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Habits matching `filter`, newest `created_at` first.
    async fn list_habits(&self, filter: &HabitFilter) -> Result<Vec<TrackedHabit>, StoreError>;

    async fn insert_habit(&self, habit: NewHabit) -> Result<TrackedHabit, StoreError>;

    /// Apply a partial update. Unknown ids are [`StoreError::NotFound`].
    async fn update_habit(&self, id: HabitId, changes: &HabitUpdate) -> Result<(), StoreError>;

    /// Relapses of every habit owned by `user_id`, newest `relapse_date` first.
    async fn list_relapses(&self, user_id: &str) -> Result<Vec<RelapseEvent>, StoreError>;

    async fn insert_relapse(&self, relapse: NewRelapse) -> Result<RelapseEvent, StoreError>;

    /// Unlocks owned by `user_id`, newest `unlocked_at` first.
    async fn list_achievements(&self, user_id: &str)
        -> Result<Vec<UnlockedAchievement>, StoreError>;

    async fn insert_achievement(
        &self,
        achievement: NewAchievement,
    ) -> Result<UnlockedAchievement, StoreError>;
}
