//! Integration tests for the state store over SQLite.

use chrono::{DateTime, Duration, TimeZone, Utc};
use cleanstreak_core::{
    AchievementType, Backend, CoreError, NewAchievement, NewHabit, SqliteBackend, StateStore,
    StoreError,
};

const USER: &str = "sqlite-user";

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2023, 6, 1, 0, 0, 0).unwrap()
}

#[tokio::test]
async fn relapse_cycle_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streaks.db");

    let habit_id = {
        let mut store = StateStore::new(SqliteBackend::open_at(&path).unwrap());
        let habit = store
            .create_habit(NewHabit::new(USER, "Alcohol", "beer", t0()))
            .await
            .unwrap();
        let outcome = store
            .record_relapse_at(habit.id, Some("wedding".into()), t0() + Duration::days(45))
            .await
            .unwrap();
        assert_eq!(outcome.max_streak_days, 45);
        assert_eq!(outcome.unlocked.len(), 2);
        habit.id
    };

    let mut store = StateStore::new(SqliteBackend::open_at(&path).unwrap());
    store.fetch_all(USER).await.unwrap();

    let habit = store.habit(habit_id).unwrap();
    assert_eq!(habit.max_streak_days, 45);
    assert_eq!(habit.last_relapse, Some(t0() + Duration::days(45)));
    assert_eq!(store.relapses().len(), 1);
    assert_eq!(store.relapses()[0].note.as_deref(), Some("wedding"));

    // Already-unlocked types are read back and not unlocked again.
    let again = store
        .check_and_unlock_achievements_at(USER, habit_id, 45, t0() + Duration::days(46))
        .await
        .unwrap();
    assert!(again.is_empty());

    let kinds: Vec<AchievementType> = store.achievements().iter().map(|a| a.kind).collect();
    assert_eq!(kinds.len(), 2);
    assert!(kinds.contains(&AchievementType::FirstWeek));
    assert!(kinds.contains(&AchievementType::OneMonth));
}

#[tokio::test]
async fn habits_are_listed_newest_first_and_soft_deleted() {
    let mut store = StateStore::new(SqliteBackend::open_memory().unwrap());
    let first = store
        .create_habit(NewHabit::new(USER, "First", "tv", t0()))
        .await
        .unwrap();
    let second = store
        .create_habit(NewHabit::new(USER, "Second", "moon", t0()))
        .await
        .unwrap();

    store.fetch_habits(USER).await.unwrap();
    let names: Vec<&str> = store.habits().iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, vec!["Second", "First"]);

    store.delete_habit(second.id).await.unwrap();
    store.fetch_habits(USER).await.unwrap();
    let ids: Vec<_> = store.habits().iter().map(|h| h.id).collect();
    assert_eq!(ids, vec![first.id]);
}

#[tokio::test]
async fn duplicate_unlock_is_rejected_by_the_database() {
    let mut store = StateStore::new(SqliteBackend::open_memory().unwrap());
    let habit = store
        .create_habit(NewHabit::new(USER, "Sugar", "candy", t0()))
        .await
        .unwrap();
    store
        .check_and_unlock_achievements_at(USER, habit.id, 8, t0() + Duration::days(8))
        .await
        .unwrap();

    // A writer whose unlocked set is stale still cannot store a duplicate.
    let result = store
        .backend()
        .insert_achievement(NewAchievement {
            user_id: USER.into(),
            habit_id: habit.id,
            kind: AchievementType::FirstWeek,
            streak_days: 9,
            unlocked_at: t0() + Duration::days(9),
        })
        .await;
    assert!(matches!(result, Err(StoreError::Conflict(_))));
}

#[tokio::test]
async fn stale_session_still_unlocks_higher_milestones() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streaks.db");

    let mut stale = StateStore::new(SqliteBackend::open_at(&path).unwrap());
    let habit = stale
        .create_habit(NewHabit::new(USER, "Gaming", "gamepad-2", t0()))
        .await
        .unwrap();

    let mut other = StateStore::new(SqliteBackend::open_at(&path).unwrap());
    other.fetch_all(USER).await.unwrap();
    other
        .check_and_unlock_achievements_at(USER, habit.id, 7, t0() + Duration::days(7))
        .await
        .unwrap();

    let err = stale
        .check_and_unlock_achievements_at(USER, habit.id, 31, t0() + Duration::days(31))
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Store(StoreError::Conflict(_))));

    let kinds: Vec<AchievementType> = stale.achievements().iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![AchievementType::OneMonth]);

    stale.fetch_achievements(USER).await.unwrap();
    assert_eq!(stale.achievements().len(), 2);
}
