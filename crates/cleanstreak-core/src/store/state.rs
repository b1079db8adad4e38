//! In-session state coordinating streaks, unlocks and persistence.
//!
//! Every mutating operation awaits its backend writes in order and only then
//! mirrors the result into memory. A failed write leaves the in-memory
//! collections exactly as they were.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::backend::Backend;
use crate::achievement::{
    overall_progress, AchievementType, OverallProgress, UnlockEngine, UnlockedAchievement,
};
use crate::error::{CoreError, Result, StoreError, ValidationError};
use crate::events::StoreEvent;
use crate::habit::{
    HabitFilter, HabitId, HabitUpdate, NewHabit, NewRelapse, RelapseEvent, TrackedHabit,
};
use crate::streak::current_streak_days;

const EVENT_CAPACITY: usize = 64;

/// Result of a confirmed relapse.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelapseOutcome {
    pub relapse: RelapseEvent,
    /// Streak that the relapse ended.
    pub previous_streak_days: u32,
    pub max_streak_days: u32,
    /// Milestones unlocked against the best streak.
    pub unlocked: Vec<UnlockedAchievement>,
    /// First unlock insert that failed. The relapse itself is applied either
    /// way; a later unlock pass picks the milestone up again.
    #[serde(skip)]
    pub unlock_error: Option<StoreError>,
}

/// Aggregate view for a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub active_habits: usize,
    /// Sum of every active habit's personal best.
    pub total_best_days: u64,
    pub longest_current_streak_days: u32,
    pub achievements: OverallProgress,
}

/// Holds the active user's habits, relapse log and unlocks.
pub struct StateStore<B: Backend> {
    backend: B,
    habits: Vec<TrackedHabit>,
    relapses: Vec<RelapseEvent>,
    achievements: Vec<UnlockedAchievement>,
    pending_achievement: Option<UnlockedAchievement>,
    events: broadcast::Sender<StoreEvent>,
}

impl<B: Backend> StateStore<B> {
    pub fn new(backend: B) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            backend,
            habits: Vec::new(),
            relapses: Vec::new(),
            achievements: Vec::new(),
            pending_achievement: None,
            events,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Receive every event emitted after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    // ── Read access ──────────────────────────────────────────────────

    /// Active habits, newest first.
    pub fn habits(&self) -> &[TrackedHabit] {
        &self.habits
    }

    pub fn habit(&self, id: HabitId) -> Option<&TrackedHabit> {
        self.habits.iter().find(|h| h.id == id)
    }

    pub fn relapses(&self) -> &[RelapseEvent] {
        &self.relapses
    }

    pub fn relapses_for(&self, habit_id: HabitId) -> impl Iterator<Item = &RelapseEvent> {
        self.relapses.iter().filter(move |r| r.habit_id == habit_id)
    }

    pub fn achievements(&self) -> &[UnlockedAchievement] {
        &self.achievements
    }

    pub fn achievements_for(
        &self,
        habit_id: HabitId,
    ) -> impl Iterator<Item = &UnlockedAchievement> {
        self.achievements
            .iter()
            .filter(move |a| a.habit_id == habit_id)
    }

    fn unlocked_types(&self, habit_id: HabitId) -> HashSet<AchievementType> {
        self.achievements_for(habit_id).map(|a| a.kind).collect()
    }

    // ── Fetch ────────────────────────────────────────────────────────

    /// Replace the habit collection with the user's active habits.
    pub async fn fetch_habits(&mut self, user_id: &str) -> Result<()> {
        let habits = self
            .backend
            .list_habits(&HabitFilter::active_for(user_id))
            .await?;
        debug!(user_id, count = habits.len(), "fetched habits");
        self.habits = habits;
        Ok(())
    }

    pub async fn fetch_relapses(&mut self, user_id: &str) -> Result<()> {
        let relapses = self.backend.list_relapses(user_id).await?;
        debug!(user_id, count = relapses.len(), "fetched relapses");
        self.relapses = relapses;
        Ok(())
    }

    pub async fn fetch_achievements(&mut self, user_id: &str) -> Result<()> {
        let achievements = self.backend.list_achievements(user_id).await?;
        debug!(user_id, count = achievements.len(), "fetched achievements");
        self.achievements = achievements;
        Ok(())
    }

    /// Fetch all three collections. Stops at the first failure.
    pub async fn fetch_all(&mut self, user_id: &str) -> Result<()> {
        self.fetch_habits(user_id).await?;
        self.fetch_relapses(user_id).await?;
        self.fetch_achievements(user_id).await
    }

    // ── Habit CRUD ───────────────────────────────────────────────────

    pub async fn create_habit(&mut self, habit: NewHabit) -> Result<TrackedHabit> {
        let stored = self.backend.insert_habit(habit).await.map_err(|e| {
            warn!(error = %e, "habit insert failed");
            e
        })?;
        info!(habit_id = %stored.id, name = %stored.name, "habit created");
        self.habits.insert(0, stored.clone());
        self.emit(StoreEvent::HabitCreated {
            habit_id: stored.id,
            at: stored.created_at,
        });
        Ok(stored)
    }

    /// Write a partial update and merge it locally. Lowering
    /// `max_streak_days` is rejected before anything is written.
    pub async fn update_habit(&mut self, id: HabitId, changes: HabitUpdate) -> Result<()> {
        let current = self.habit(id).ok_or(CoreError::HabitNotFound(id))?;
        if let Some(requested) = changes.max_streak_days {
            if requested < current.max_streak_days {
                return Err(ValidationError::MaxStreakDecrease {
                    current: current.max_streak_days,
                    requested,
                }
                .into());
            }
        }

        self.backend.update_habit(id, &changes).await.map_err(|e| {
            warn!(habit_id = %id, error = %e, "habit update failed");
            e
        })?;

        let deactivated = changes.is_active == Some(false);
        if deactivated {
            self.habits.retain(|h| h.id != id);
        } else if let Some(habit) = self.habits.iter_mut().find(|h| h.id == id) {
            changes.apply_to(habit);
        }
        self.emit(StoreEvent::HabitUpdated {
            habit_id: id,
            at: Utc::now(),
        });
        Ok(())
    }

    /// Soft delete: flips `is_active` and drops the habit from the active
    /// collection. Relapses and unlocks stay.
    pub async fn delete_habit(&mut self, id: HabitId) -> Result<()> {
        if self.habit(id).is_none() {
            return Err(CoreError::HabitNotFound(id));
        }
        self.backend
            .update_habit(id, &HabitUpdate::deactivate())
            .await
            .map_err(|e| {
                warn!(habit_id = %id, error = %e, "habit soft delete failed");
                e
            })?;
        info!(habit_id = %id, "habit deactivated");
        self.habits.retain(|h| h.id != id);
        self.emit(StoreEvent::HabitDeleted {
            habit_id: id,
            at: Utc::now(),
        });
        Ok(())
    }

    // ── Relapse ──────────────────────────────────────────────────────

    pub async fn record_relapse(
        &mut self,
        habit_id: HabitId,
        note: Option<String>,
    ) -> Result<RelapseOutcome> {
        self.record_relapse_at(habit_id, note, Utc::now()).await
    }

    /// Log a relapse at `now`, reset the streak and keep the best one.
    ///
    /// The relapse insert and the habit update must both succeed before any
    /// local state changes. Unlocks are then evaluated against the best
    /// streak, not the reset value. Once both writes succeed the call returns
    /// `Ok`; an unlock failure is reported in [`RelapseOutcome::unlock_error`].
    pub async fn record_relapse_at(
        &mut self,
        habit_id: HabitId,
        note: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<RelapseOutcome> {
        let habit = self
            .habit(habit_id)
            .cloned()
            .ok_or(CoreError::HabitNotFound(habit_id))?;

        let previous_streak_days = current_streak_days(&habit, now);
        let max_streak_days = previous_streak_days.max(habit.max_streak_days);

        let relapse = self
            .backend
            .insert_relapse(NewRelapse::new(habit_id, now, note))
            .await
            .map_err(|e| {
                warn!(habit_id = %habit_id, error = %e, "relapse insert failed");
                e
            })?;

        let update = HabitUpdate::relapse(now, max_streak_days);
        self.backend
            .update_habit(habit_id, &update)
            .await
            .map_err(|e| {
                warn!(
                    habit_id = %habit_id,
                    relapse_id = %relapse.id,
                    error = %e,
                    "habit update after relapse failed"
                );
                e
            })?;

        if let Some(local) = self.habits.iter_mut().find(|h| h.id == habit_id) {
            update.apply_to(local);
        }
        self.relapses.insert(0, relapse.clone());
        info!(
            habit_id = %habit_id,
            previous_streak_days,
            max_streak_days,
            "relapse recorded"
        );
        self.emit(StoreEvent::RelapseRecorded {
            relapse: relapse.clone(),
            previous_streak_days,
            max_streak_days,
        });

        let (unlocked, unlock_error) = self
            .unlock_pass(&habit.user_id, habit_id, max_streak_days, now)
            .await;

        Ok(RelapseOutcome {
            relapse,
            previous_streak_days,
            max_streak_days,
            unlocked,
            unlock_error,
        })
    }

    // ── Achievements ─────────────────────────────────────────────────

    pub async fn check_and_unlock_achievements(
        &mut self,
        user_id: &str,
        habit_id: HabitId,
        current_streak: u32,
    ) -> Result<Vec<UnlockedAchievement>> {
        self.check_and_unlock_achievements_at(user_id, habit_id, current_streak, Utc::now())
            .await
    }

    /// Persist every milestone `current_streak` qualifies for that the habit
    /// does not have yet.
    ///
    /// Each stored unlock is mirrored as soon as its insert succeeds; the
    /// last one becomes the pending notification. A failed insert skips only
    /// that milestone. The pass goes on with the rest and the first failure
    /// is returned at the end, with every successful unlock already applied.
    pub async fn check_and_unlock_achievements_at(
        &mut self,
        user_id: &str,
        habit_id: HabitId,
        current_streak: u32,
        now: DateTime<Utc>,
    ) -> Result<Vec<UnlockedAchievement>> {
        match self.unlock_pass(user_id, habit_id, current_streak, now).await {
            (_, Some(e)) => Err(e.into()),
            (unlocked, None) => Ok(unlocked),
        }
    }

    async fn unlock_pass(
        &mut self,
        user_id: &str,
        habit_id: HabitId,
        current_streak: u32,
        now: DateTime<Utc>,
    ) -> (Vec<UnlockedAchievement>, Option<StoreError>) {
        let already = self.unlocked_types(habit_id);
        let planned = UnlockEngine::plan(user_id, habit_id, current_streak, &already, now);
        let mut unlocked = Vec::with_capacity(planned.len());
        let mut first_error = None;

        for record in planned {
            let kind = record.kind;
            let stored = match self.backend.insert_achievement(record).await {
                Ok(stored) => stored,
                Err(e) => {
                    warn!(
                        habit_id = %habit_id,
                        achievement = %kind,
                        error = %e,
                        "unlock insert failed"
                    );
                    first_error.get_or_insert(e);
                    continue;
                }
            };
            info!(
                habit_id = %habit_id,
                achievement = %stored.kind,
                streak_days = stored.streak_days,
                "achievement unlocked"
            );
            self.achievements.insert(0, stored.clone());
            self.pending_achievement = Some(stored.clone());
            self.emit(StoreEvent::AchievementUnlocked {
                achievement: stored.clone(),
            });
            unlocked.push(stored);
        }

        (unlocked, first_error)
    }

    /// Run the unlock check for every active habit with a live streak of at
    /// least one day. A failing habit does not stop the others; the first
    /// failure is returned once every habit has been checked.
    pub async fn evaluate_streaks_at(
        &mut self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<UnlockedAchievement>> {
        let due: Vec<(HabitId, u32)> = self
            .habits
            .iter()
            .map(|h| (h.id, current_streak_days(h, now)))
            .filter(|(_, days)| *days > 0)
            .collect();

        let mut unlocked = Vec::new();
        let mut first_error = None;
        for (habit_id, days) in due {
            let (stored, error) = self.unlock_pass(user_id, habit_id, days, now).await;
            unlocked.extend(stored);
            if let Some(e) = error {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e.into()),
            None => Ok(unlocked),
        }
    }

    // ── Notification slot ────────────────────────────────────────────

    pub fn pending_achievement(&self) -> Option<&UnlockedAchievement> {
        self.pending_achievement.as_ref()
    }

    /// Consume the pending notification.
    pub fn take_pending_achievement(&mut self) -> Option<UnlockedAchievement> {
        self.pending_achievement.take()
    }

    pub fn clear_pending_achievement(&mut self) {
        self.pending_achievement = None;
    }

    // ── Summary ──────────────────────────────────────────────────────

    pub fn dashboard_at(&self, now: DateTime<Utc>) -> Dashboard {
        Dashboard {
            active_habits: self.habits.len(),
            total_best_days: self
                .habits
                .iter()
                .map(|h| u64::from(h.max_streak_days))
                .sum(),
            longest_current_streak_days: self
                .habits
                .iter()
                .map(|h| current_streak_days(h, now))
                .max()
                .unwrap_or(0),
            achievements: overall_progress(&self.habits, &self.achievements),
        }
    }
}
