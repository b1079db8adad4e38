//! Composition root: config, SQLite backend and a fetched state store.

use chrono::{DateTime, NaiveDate, Utc};
use cleanstreak_core::{Config, HabitId, SqliteBackend, StateStore};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

pub struct Session {
    pub config: Config,
    pub store: StateStore<SqliteBackend>,
}

impl Session {
    /// Load config, open the database and fetch the user's collections.
    pub async fn open() -> CliResult<Self> {
        let config = Config::load()?;
        let db_path = config.database_path()?;
        tracing::debug!(path = %db_path.display(), user_id = %config.user_id, "opening session");
        let backend = SqliteBackend::open_at(db_path)?;
        let mut store = StateStore::new(backend);
        store.fetch_all(&config.user_id).await?;
        Ok(Self { config, store })
    }

    pub fn user_id(&self) -> &str {
        &self.config.user_id
    }

    /// Resolve a full id or a unique prefix of an active habit's id.
    pub fn resolve_habit(&self, id: &str) -> CliResult<HabitId> {
        if let Ok(full) = id.parse::<HabitId>() {
            return Ok(full);
        }
        let needle = id.to_ascii_lowercase();
        let mut matches = self
            .store
            .habits()
            .iter()
            .filter(|h| h.id.to_string().starts_with(&needle));
        match (matches.next(), matches.next()) {
            (Some(habit), None) => Ok(habit.id),
            (Some(_), Some(_)) => Err(format!("ambiguous habit id prefix: {id}").into()),
            (None, _) => Err(format!("no active habit matches: {id}").into()),
        }
    }
}

/// Parse RFC 3339 or a bare `YYYY-MM-DD` (midnight UTC).
pub fn parse_instant(value: &str) -> CliResult<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("expected RFC 3339 timestamp or YYYY-MM-DD, got '{value}'"))?;
    let midnight = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| format!("invalid date: {value}"))?;
    Ok(midnight.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_dates_and_timestamps() {
        assert_eq!(
            parse_instant("2024-02-03").unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 3, 0, 0, 0).unwrap()
        );
        assert_eq!(
            parse_instant("2024-02-03T10:00:00+02:00").unwrap(),
            Utc.with_ymd_and_hms(2024, 2, 3, 8, 0, 0).unwrap()
        );
        assert!(parse_instant("last tuesday").is_err());
    }
}
