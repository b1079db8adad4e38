//! Database schema migrations for cleanstreak.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::warn;

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const SCHEMA_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Returns 0 if no version is set (fresh database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: habits, relapse log, unlocked achievements.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS habits (
            id              TEXT PRIMARY KEY,
            user_id         TEXT NOT NULL,
            name            TEXT NOT NULL,
            icon            TEXT NOT NULL,
            start_date      TEXT NOT NULL,
            last_relapse    TEXT,
            is_active       INTEGER NOT NULL DEFAULT 1,
            created_at      TEXT NOT NULL,
            max_streak_days INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE IF NOT EXISTS relapses (
            id           TEXT PRIMARY KEY,
            habit_id     TEXT NOT NULL REFERENCES habits(id),
            relapse_date TEXT NOT NULL,
            notes        TEXT,
            created_at   TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS achievements (
            id               TEXT PRIMARY KEY,
            user_id          TEXT NOT NULL,
            habit_id         TEXT NOT NULL REFERENCES habits(id),
            achievement_type TEXT NOT NULL,
            streak_days      INTEGER NOT NULL,
            unlocked_at      TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_habits_user_active ON habits(user_id, is_active);
        CREATE INDEX IF NOT EXISTS idx_relapses_habit ON relapses(habit_id);
        CREATE INDEX IF NOT EXISTS idx_achievements_user ON achievements(user_id);",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: one unlock per (habit, achievement type).
///
/// Duplicates left by earlier versions are collapsed to the oldest row first.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "DELETE FROM achievements
         WHERE rowid NOT IN (
             SELECT MIN(rowid) FROM achievements GROUP BY habit_id, achievement_type
         );

         CREATE UNIQUE INDEX IF NOT EXISTS idx_achievements_habit_type
             ON achievements(habit_id, achievement_type);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}
