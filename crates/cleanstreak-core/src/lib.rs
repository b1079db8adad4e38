//! # cleanstreak Core Library
//!
//! Business logic for cleanstreak, a tracker for habits the user is quitting.
//! The CLI binary is a thin presentation layer over this library; any other
//! front end drives the same [`StateStore`].
//!
//! ## Architecture
//!
//! - **Streaks**: pure elapsed-time breakdown since the last relapse or the
//!   start date
//! - **Achievements**: a compiled-in milestone catalog (7, 30, 90, 180, 365
//!   days) and an engine that picks the milestones a streak newly qualifies for
//! - **Store**: an explicitly constructed state holder that mirrors the
//!   durable collections and performs relapse transitions
//! - **Storage**: a SQLite [`Backend`] and TOML-based configuration
//!
//! ## Key Components
//!
//! - [`StateStore`]: in-session state and the relapse state machine
//! - [`Backend`]: trait for the external persistence collaborator
//! - [`compute_streak`]: streak calculator
//! - [`UnlockEngine`]: milestone unlock planning

pub mod achievement;
pub mod error;
pub mod events;
pub mod habit;
pub mod storage;
pub mod store;
pub mod streak;

pub use achievement::{
    next_milestone, overall_progress, pending_unlocks, AchievementDefinition, AchievementType,
    NewAchievement, UnlockEngine, UnlockedAchievement, ACHIEVEMENTS,
};
pub use error::{ConfigError, CoreError, StoreError, ValidationError};
pub use events::StoreEvent;
pub use habit::{HabitFilter, HabitId, HabitUpdate, NewHabit, RelapseEvent, TrackedHabit, UserId};
pub use storage::{Config, SqliteBackend};
pub use store::{Backend, Dashboard, MemoryBackend, RelapseOutcome, StateStore};
pub use streak::{compute_streak, current_streak_days, format_streak_text, StreakBreakdown};
