use clap::Subcommand;
use cleanstreak_core::ACHIEVEMENTS;

use crate::session::{CliResult, Session};

#[derive(Subcommand)]
pub enum AchievementsAction {
    /// Unlocked achievements, newest first
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// All milestones that can be unlocked
    Catalog,
}

pub async fn run(action: AchievementsAction) -> CliResult {
    match action {
        AchievementsAction::Catalog => {
            for def in &ACHIEVEMENTS {
                println!("{:>4}d  {:<16} {}", def.days, def.name, def.kind);
            }
        }
        AchievementsAction::List { json } => {
            let session = Session::open().await?;
            let achievements = session.store.achievements();
            if json {
                println!("{}", serde_json::to_string_pretty(achievements)?);
            } else if achievements.is_empty() {
                println!("No achievements yet.");
            } else {
                for achievement in achievements {
                    let habit = session
                        .store
                        .habit(achievement.habit_id)
                        .map(|h| h.name.as_str())
                        .unwrap_or("(deleted habit)");
                    println!(
                        "{}  {:<16} {:<20} at {}d",
                        achievement.unlocked_at.date_naive(),
                        achievement.definition().name,
                        habit,
                        achievement.streak_days
                    );
                }
            }
        }
    }
    Ok(())
}
