use chrono::Utc;
use serde_json::json;

use crate::session::{CliResult, Session};

/// Evaluate live streaks for new unlocks, then print the dashboard.
pub async fn run(json: bool) -> CliResult {
    let mut session = Session::open().await?;
    let now = Utc::now();
    let user_id = session.user_id().to_string();
    session.store.evaluate_streaks_at(&user_id, now).await?;

    let fresh = session.store.take_pending_achievement();
    let dashboard = session.store.dashboard_at(now);

    if json {
        let value = json!({
            "dashboard": dashboard,
            "new_achievement": fresh,
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    if let Some(achievement) = fresh {
        println!("New achievement: {}!", achievement.definition().name);
    }
    println!("Active habits:        {}", dashboard.active_habits);
    println!("Longest streak now:   {}d", dashboard.longest_current_streak_days);
    println!("Sum of best streaks:  {}d", dashboard.total_best_days);
    println!(
        "Achievements:         {} / {} ({:.0}%)",
        dashboard.achievements.unlocked,
        dashboard.achievements.possible,
        dashboard.achievements.percent
    );
    Ok(())
}
