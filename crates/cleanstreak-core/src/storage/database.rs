//! SQLite-backed [`Backend`].
//!
//! Provides persistent storage for:
//! - Tracked habits (soft-deleted, never removed)
//! - The append-only relapse log
//! - Unlocked achievements, unique per habit and type

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, Connection, OptionalExtension, Row};
use uuid::Uuid;

use super::{data_dir, migrations};
use crate::achievement::{AchievementType, NewAchievement, UnlockedAchievement};
use crate::error::StoreError;
use crate::habit::{
    HabitFilter, HabitId, HabitUpdate, NewHabit, NewRelapse, RelapseEvent, TrackedHabit,
};
use crate::store::Backend;

/// Default database file name inside [`data_dir`].
pub const DATABASE_FILE: &str = "cleanstreak.db";

/// SQLite database holding habits, relapses and achievements.
pub struct SqliteBackend {
    conn: Mutex<Connection>,
}

fn format_ts(ts: DateTime<Utc>) -> String {
    // Fixed width so TEXT ordering matches time ordering.
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_ts(column: &str, value: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("{column} '{value}': {e}")))
}

fn parse_id(column: &str, value: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(value).map_err(|e| StoreError::Corrupt(format!("{column} '{value}': {e}")))
}

struct HabitRow {
    id: String,
    user_id: String,
    name: String,
    icon: String,
    start_date: String,
    last_relapse: Option<String>,
    is_active: bool,
    created_at: String,
    max_streak_days: u32,
}

impl HabitRow {
    const COLUMNS: &'static str =
        "id, user_id, name, icon, start_date, last_relapse, is_active, created_at, max_streak_days";

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            name: row.get(2)?,
            icon: row.get(3)?,
            start_date: row.get(4)?,
            last_relapse: row.get(5)?,
            is_active: row.get(6)?,
            created_at: row.get(7)?,
            max_streak_days: row.get(8)?,
        })
    }

    fn decode(self) -> Result<TrackedHabit, StoreError> {
        Ok(TrackedHabit {
            id: parse_id("habits.id", &self.id)?,
            user_id: self.user_id,
            name: self.name,
            icon: self.icon,
            start_date: parse_ts("habits.start_date", &self.start_date)?,
            last_relapse: self
                .last_relapse
                .as_deref()
                .map(|v| parse_ts("habits.last_relapse", v))
                .transpose()?,
            max_streak_days: self.max_streak_days,
            is_active: self.is_active,
            created_at: parse_ts("habits.created_at", &self.created_at)?,
        })
    }
}

struct RelapseRow {
    id: String,
    habit_id: String,
    relapse_date: String,
    notes: Option<String>,
    created_at: String,
}

impl RelapseRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            habit_id: row.get(1)?,
            relapse_date: row.get(2)?,
            notes: row.get(3)?,
            created_at: row.get(4)?,
        })
    }

    fn decode(self) -> Result<RelapseEvent, StoreError> {
        Ok(RelapseEvent {
            id: parse_id("relapses.id", &self.id)?,
            habit_id: parse_id("relapses.habit_id", &self.habit_id)?,
            relapse_date: parse_ts("relapses.relapse_date", &self.relapse_date)?,
            note: self.notes,
            created_at: parse_ts("relapses.created_at", &self.created_at)?,
        })
    }
}

struct AchievementRow {
    id: String,
    user_id: String,
    habit_id: String,
    achievement_type: String,
    streak_days: u32,
    unlocked_at: String,
}

impl AchievementRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            habit_id: row.get(2)?,
            achievement_type: row.get(3)?,
            streak_days: row.get(4)?,
            unlocked_at: row.get(5)?,
        })
    }

    fn decode(self) -> Result<UnlockedAchievement, StoreError> {
        Ok(UnlockedAchievement {
            id: parse_id("achievements.id", &self.id)?,
            user_id: self.user_id,
            habit_id: parse_id("achievements.habit_id", &self.habit_id)?,
            kind: self
                .achievement_type
                .parse::<AchievementType>()
                .map_err(StoreError::Corrupt)?,
            streak_days: self.streak_days,
            unlocked_at: parse_ts("achievements.unlocked_at", &self.unlocked_at)?,
        })
    }
}

impl SqliteBackend {
    /// Open the database at `<data_dir>/cleanstreak.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, StoreError> {
        let dir = data_dir().map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Self::open_at(dir.join(DATABASE_FILE))
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            StoreError::Unavailable(format!("{}: {e}", path.as_ref().display()))
        })?;
        Self::from_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        migrations::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Unavailable("database connection poisoned".into()))
    }

    fn habit_exists(conn: &Connection, id: HabitId) -> Result<bool, StoreError> {
        let found = conn
            .query_row(
                "SELECT 1 FROM habits WHERE id = ?1",
                params![id.to_string()],
                |_| Ok(()),
            )
            .optional()?;
        Ok(found.is_some())
    }
}

#[async_trait]
impl Backend for SqliteBackend {
    async fn list_habits(&self, filter: &HabitFilter) -> Result<Vec<TrackedHabit>, StoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM habits
             WHERE user_id = ?1 AND (?2 = 0 OR is_active = 1)
             ORDER BY created_at DESC, rowid DESC",
            HabitRow::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![filter.user_id, filter.active_only], HabitRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(HabitRow::decode).collect()
    }

    async fn insert_habit(&self, habit: NewHabit) -> Result<TrackedHabit, StoreError> {
        let stored = habit.into_habit(Uuid::new_v4(), Utc::now());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO habits
                 (id, user_id, name, icon, start_date, last_relapse, is_active, created_at, max_streak_days)
             VALUES (?1, ?2, ?3, ?4, ?5, NULL, 1, ?6, 0)",
            params![
                stored.id.to_string(),
                stored.user_id,
                stored.name,
                stored.icon,
                format_ts(stored.start_date),
                format_ts(stored.created_at),
            ],
        )?;
        Ok(stored)
    }

    async fn update_habit(&self, id: HabitId, changes: &HabitUpdate) -> Result<(), StoreError> {
        let mut columns: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(name) = &changes.name {
            columns.push("name");
            values.push(Box::new(name.clone()));
        }
        if let Some(icon) = &changes.icon {
            columns.push("icon");
            values.push(Box::new(icon.clone()));
        }
        if let Some(start_date) = changes.start_date {
            columns.push("start_date");
            values.push(Box::new(format_ts(start_date)));
        }
        if let Some(last_relapse) = changes.last_relapse {
            columns.push("last_relapse");
            values.push(Box::new(last_relapse.map(format_ts)));
        }
        if let Some(max) = changes.max_streak_days {
            columns.push("max_streak_days");
            values.push(Box::new(max));
        }
        if let Some(active) = changes.is_active {
            columns.push("is_active");
            values.push(Box::new(active));
        }

        let conn = self.conn()?;
        let not_found = || StoreError::NotFound {
            collection: "habits",
            id: id.to_string(),
        };

        if columns.is_empty() {
            return if Self::habit_exists(&conn, id)? {
                Ok(())
            } else {
                Err(not_found())
            };
        }

        let assignments: Vec<String> = columns
            .iter()
            .enumerate()
            .map(|(i, col)| format!("{col} = ?{}", i + 1))
            .collect();
        let sql = format!(
            "UPDATE habits SET {} WHERE id = ?{}",
            assignments.join(", "),
            columns.len() + 1
        );
        values.push(Box::new(id.to_string()));

        let bound: Vec<&dyn ToSql> = values.iter().map(|v| v.as_ref()).collect();
        let changed = conn.execute(&sql, bound.as_slice())?;
        if changed == 0 {
            return Err(not_found());
        }
        Ok(())
    }

    async fn list_relapses(&self, user_id: &str) -> Result<Vec<RelapseEvent>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT r.id, r.habit_id, r.relapse_date, r.notes, r.created_at
             FROM relapses r
             JOIN habits h ON h.id = r.habit_id
             WHERE h.user_id = ?1
             ORDER BY r.relapse_date DESC, r.rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id], RelapseRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(RelapseRow::decode).collect()
    }

    async fn insert_relapse(&self, relapse: NewRelapse) -> Result<RelapseEvent, StoreError> {
        let conn = self.conn()?;
        if !Self::habit_exists(&conn, relapse.habit_id)? {
            return Err(StoreError::NotFound {
                collection: "habits",
                id: relapse.habit_id.to_string(),
            });
        }
        let stored = relapse.into_event(Uuid::new_v4(), Utc::now());
        conn.execute(
            "INSERT INTO relapses (id, habit_id, relapse_date, notes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                stored.id.to_string(),
                stored.habit_id.to_string(),
                format_ts(stored.relapse_date),
                stored.note,
                format_ts(stored.created_at),
            ],
        )?;
        Ok(stored)
    }

    async fn list_achievements(
        &self,
        user_id: &str,
    ) -> Result<Vec<UnlockedAchievement>, StoreError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_id, habit_id, achievement_type, streak_days, unlocked_at
             FROM achievements
             WHERE user_id = ?1
             ORDER BY unlocked_at DESC, rowid DESC",
        )?;
        let rows = stmt
            .query_map(params![user_id], AchievementRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(AchievementRow::decode).collect()
    }

    async fn insert_achievement(
        &self,
        achievement: NewAchievement,
    ) -> Result<UnlockedAchievement, StoreError> {
        let stored = achievement.into_unlocked(Uuid::new_v4());
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO achievements
                 (id, user_id, habit_id, achievement_type, streak_days, unlocked_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                stored.id.to_string(),
                stored.user_id,
                stored.habit_id.to_string(),
                stored.kind.as_str(),
                stored.streak_days,
                format_ts(stored.unlocked_at),
            ],
        )?;
        Ok(stored)
    }
}
