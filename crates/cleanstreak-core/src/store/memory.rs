//! In-process backend for tests and demos.
//!
//! Mirrors the constraints of the SQLite backend (ids assigned on insert,
//! unique `(habit, achievement type)` pairs) and can be told to fail the next
//! call of a given kind.

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use super::backend::Backend;
use crate::achievement::{NewAchievement, UnlockedAchievement};
use crate::error::StoreError;
use crate::habit::{
    HabitFilter, HabitId, HabitUpdate, NewHabit, NewRelapse, RelapseEvent, TrackedHabit,
};

/// Backend call kinds, used for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    ListHabits,
    InsertHabit,
    UpdateHabit,
    ListRelapses,
    InsertRelapse,
    ListAchievements,
    InsertAchievement,
}

#[derive(Default)]
struct Tables {
    // Insertion order is kept; listing sorts.
    habits: Vec<TrackedHabit>,
    relapses: Vec<RelapseEvent>,
    achievements: Vec<UnlockedAchievement>,
    fail_next: HashSet<Operation>,
    calls: Vec<Operation>,
}

impl Tables {
    fn enter(&mut self, op: Operation) -> Result<(), StoreError> {
        self.calls.push(op);
        if self.fail_next.remove(&op) {
            return Err(StoreError::Unavailable(format!("injected failure for {op:?}")));
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryBackend {
    tables: Mutex<Tables>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>, StoreError> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Unavailable("memory backend poisoned".into()))
    }

    /// Make the next call of kind `op` fail with [`StoreError::Unavailable`].
    pub fn fail_next(&self, op: Operation) {
        if let Ok(mut tables) = self.lock() {
            tables.fail_next.insert(op);
        }
    }

    /// Every call received so far, in order.
    pub fn calls(&self) -> Vec<Operation> {
        self.lock().map(|t| t.calls.clone()).unwrap_or_default()
    }

    /// Stored copy of a habit, active or not.
    pub fn stored_habit(&self, id: HabitId) -> Option<TrackedHabit> {
        self.lock()
            .ok()?
            .habits
            .iter()
            .find(|h| h.id == id)
            .cloned()
    }

    pub fn stored_relapses(&self) -> Vec<RelapseEvent> {
        self.lock().map(|t| t.relapses.clone()).unwrap_or_default()
    }

    pub fn stored_achievements(&self) -> Vec<UnlockedAchievement> {
        self.lock().map(|t| t.achievements.clone()).unwrap_or_default()
    }

    /// Seed a fully formed habit, bypassing insert defaults.
    pub fn seed_habit(&self, habit: TrackedHabit) {
        if let Ok(mut tables) = self.lock() {
            tables.habits.push(habit);
        }
    }
}

/// Newest first by `key`; later inserts win ties.
fn newest_first<T: Clone, K: Ord>(rows: &[T], key: impl Fn(&T) -> K) -> Vec<T> {
    let mut indexed: Vec<(usize, &T)> = rows.iter().enumerate().collect();
    indexed.sort_by(|(ia, a), (ib, b)| key(b).cmp(&key(a)).then(ib.cmp(ia)));
    indexed.into_iter().map(|(_, row)| row.clone()).collect()
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn list_habits(&self, filter: &HabitFilter) -> Result<Vec<TrackedHabit>, StoreError> {
        let mut tables = self.lock()?;
        tables.enter(Operation::ListHabits)?;
        let matching: Vec<TrackedHabit> = tables
            .habits
            .iter()
            .filter(|h| filter.matches(h))
            .cloned()
            .collect();
        Ok(newest_first(&matching, |h| h.created_at))
    }

    async fn insert_habit(&self, habit: NewHabit) -> Result<TrackedHabit, StoreError> {
        let mut tables = self.lock()?;
        tables.enter(Operation::InsertHabit)?;
        let stored = habit.into_habit(Uuid::new_v4(), Utc::now());
        tables.habits.push(stored.clone());
        Ok(stored)
    }

    async fn update_habit(&self, id: HabitId, changes: &HabitUpdate) -> Result<(), StoreError> {
        let mut tables = self.lock()?;
        tables.enter(Operation::UpdateHabit)?;
        let habit = tables
            .habits
            .iter_mut()
            .find(|h| h.id == id)
            .ok_or_else(|| StoreError::NotFound {
                collection: "habits",
                id: id.to_string(),
            })?;
        changes.apply_to(habit);
        Ok(())
    }

    async fn list_relapses(&self, user_id: &str) -> Result<Vec<RelapseEvent>, StoreError> {
        let mut tables = self.lock()?;
        tables.enter(Operation::ListRelapses)?;
        let owned: HashSet<HabitId> = tables
            .habits
            .iter()
            .filter(|h| h.user_id == user_id)
            .map(|h| h.id)
            .collect();
        let matching: Vec<RelapseEvent> = tables
            .relapses
            .iter()
            .filter(|r| owned.contains(&r.habit_id))
            .cloned()
            .collect();
        Ok(newest_first(&matching, |r| r.relapse_date))
    }

    async fn insert_relapse(&self, relapse: NewRelapse) -> Result<RelapseEvent, StoreError> {
        let mut tables = self.lock()?;
        tables.enter(Operation::InsertRelapse)?;
        if !tables.habits.iter().any(|h| h.id == relapse.habit_id) {
            return Err(StoreError::NotFound {
                collection: "habits",
                id: relapse.habit_id.to_string(),
            });
        }
        let stored = relapse.into_event(Uuid::new_v4(), Utc::now());
        tables.relapses.push(stored.clone());
        Ok(stored)
    }

    async fn list_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<UnlockedAchievement>, StoreError> {
        let mut tables = self.lock()?;
        tables.enter(Operation::ListAchievements)?;
        let matching: Vec<UnlockedAchievement> = tables
            .achievements
            .iter()
            .filter(|a| a.user_id == user_id)
            .cloned()
            .collect();
        Ok(newest_first(&matching, |a| a.unlocked_at))
    }

    async fn insert_achievement(
        &self,
        achievement: NewAchievement,
    ) -> Result<UnlockedAchievement, StoreError> {
        let mut tables = self.lock()?;
        tables.enter(Operation::InsertAchievement)?;
        let duplicate = tables
            .achievements
            .iter()
            .any(|a| a.habit_id == achievement.habit_id && a.kind == achievement.kind);
        if duplicate {
            return Err(StoreError::Conflict(format!(
                "{} already unlocked for habit {}",
                achievement.kind, achievement.habit_id
            )));
        }
        let stored = achievement.into_unlocked(Uuid::new_v4());
        tables.achievements.push(stored.clone());
        Ok(stored)
    }
}
