//! Tracked habits and the relapse log.
//!
//! A habit is created once, mutated on every relapse, and soft-deleted by
//! flipping `is_active`. Relapse events are append-only.

mod icons;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use icons::{icon_label, HabitIcon, HABIT_ICONS};

pub type HabitId = Uuid;
pub type RelapseId = Uuid;

/// Opaque user id issued by the external auth collaborator.
pub type UserId = String;

/// One thing the user is quitting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedHabit {
    pub id: HabitId,
    pub user_id: UserId,
    pub name: String,
    pub icon: String,
    pub start_date: DateTime<Utc>,
    pub last_relapse: Option<DateTime<Utc>>,
    /// Personal best in whole days. Never decreases.
    pub max_streak_days: u32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl TrackedHabit {
    /// The instant the current streak is measured from.
    pub fn reference_point(&self) -> DateTime<Utc> {
        self.last_relapse.unwrap_or(self.start_date)
    }
}

/// Insert payload for a habit. The backend assigns id and `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHabit {
    pub user_id: UserId,
    pub name: String,
    pub icon: String,
    pub start_date: DateTime<Utc>,
}

impl NewHabit {
    pub fn new(
        user_id: impl Into<UserId>,
        name: impl Into<String>,
        icon: impl Into<String>,
        start_date: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            name: name.into(),
            icon: icon.into(),
            start_date,
        }
    }

    /// Materialize the stored record with fresh-habit defaults.
    pub fn into_habit(self, id: HabitId, created_at: DateTime<Utc>) -> TrackedHabit {
        TrackedHabit {
            id,
            user_id: self.user_id,
            name: self.name,
            icon: self.icon,
            start_date: self.start_date,
            last_relapse: None,
            max_streak_days: 0,
            is_active: true,
            created_at,
        }
    }
}

/// Partial field set for a habit update. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<DateTime<Utc>>,
    /// `Some(None)` clears the last relapse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_relapse: Option<Option<DateTime<Utc>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_streak_days: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl HabitUpdate {
    /// Update written by a relapse.
    pub fn relapse(at: DateTime<Utc>, max_streak_days: u32) -> Self {
        Self {
            last_relapse: Some(Some(at)),
            max_streak_days: Some(max_streak_days),
            ..Default::default()
        }
    }

    /// Soft delete.
    pub fn deactivate() -> Self {
        Self {
            is_active: Some(false),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge the set fields into `habit`.
    pub fn apply_to(&self, habit: &mut TrackedHabit) {
        if let Some(name) = &self.name {
            habit.name = name.clone();
        }
        if let Some(icon) = &self.icon {
            habit.icon = icon.clone();
        }
        if let Some(start_date) = self.start_date {
            habit.start_date = start_date;
        }
        if let Some(last_relapse) = self.last_relapse {
            habit.last_relapse = last_relapse;
        }
        if let Some(max) = self.max_streak_days {
            habit.max_streak_days = max;
        }
        if let Some(active) = self.is_active {
            habit.is_active = active;
        }
    }
}

/// Filter for listing habits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitFilter {
    pub user_id: UserId,
    pub active_only: bool,
}

impl HabitFilter {
    pub fn active_for(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
            active_only: true,
        }
    }

    pub fn matches(&self, habit: &TrackedHabit) -> bool {
        habit.user_id == self.user_id && (!self.active_only || habit.is_active)
    }
}

/// Immutable relapse log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelapseEvent {
    pub id: RelapseId,
    pub habit_id: HabitId,
    pub relapse_date: DateTime<Utc>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a relapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRelapse {
    pub habit_id: HabitId,
    pub relapse_date: DateTime<Utc>,
    pub note: Option<String>,
}

impl NewRelapse {
    /// Blank notes are stored as `None`.
    pub fn new(habit_id: HabitId, relapse_date: DateTime<Utc>, note: Option<String>) -> Self {
        let note = note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());
        Self {
            habit_id,
            relapse_date,
            note,
        }
    }

    pub fn into_event(self, id: RelapseId, created_at: DateTime<Utc>) -> RelapseEvent {
        RelapseEvent {
            id,
            habit_id: self.habit_id,
            relapse_date: self.relapse_date,
            note: self.note,
            created_at,
        }
    }
}
