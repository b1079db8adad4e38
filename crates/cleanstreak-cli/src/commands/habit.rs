//! Habit management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use cleanstreak_core::achievement::next_milestone;
use cleanstreak_core::habit::{icon_label, HABIT_ICONS};
use cleanstreak_core::{format_streak_text, NewHabit, StreakBreakdown, TrackedHabit};
use serde_json::json;

use crate::session::{parse_instant, CliResult, Session};

#[derive(Subcommand)]
pub enum HabitAction {
    /// Start tracking a habit
    Add {
        /// Display name
        name: String,
        /// Icon token (see `habit icons`)
        #[arg(long, default_value = "cigarette")]
        icon: String,
        /// Start of the streak: RFC 3339 or YYYY-MM-DD (default: now)
        #[arg(long)]
        since: Option<String>,
    },
    /// List active habits with their current streak
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one habit with its relapse history and achievements
    Show {
        /// Habit ID or unique prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Log a relapse and restart the streak
    Relapse {
        /// Habit ID or unique prefix
        id: String,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
    },
    /// Stop tracking a habit (history is kept)
    Delete {
        /// Habit ID or unique prefix
        id: String,
    },
    /// List suggested icon tokens
    Icons,
}

fn streak_line(habit: &TrackedHabit, show_minutes: bool) -> String {
    let streak = StreakBreakdown::for_habit(habit, Utc::now());
    if show_minutes {
        format!("{}d {}h {}m", streak.days, streak.hours, streak.minutes)
    } else {
        format!("{}d {}h", streak.days, streak.hours)
    }
}

fn habit_json(habit: &TrackedHabit) -> serde_json::Value {
    let streak = StreakBreakdown::for_habit(habit, Utc::now());
    let next = next_milestone(streak.whole_days());
    json!({
        "habit": habit,
        "streak": streak,
        "streak_text": format_streak_text(streak.days),
        "next_milestone": next.map(|p| json!({
            "achievement_type": p.next.kind,
            "days_remaining": p.days_remaining,
            "percent": p.percent,
        })),
    })
}

pub async fn run(action: HabitAction) -> CliResult {
    if let HabitAction::Icons = action {
        for icon in HABIT_ICONS {
            println!("{:<14} {}", icon.icon, icon.label);
        }
        return Ok(());
    }

    let mut session = Session::open().await?;

    match action {
        HabitAction::Add { name, icon, since } => {
            let name = name.trim().to_string();
            if name.is_empty() {
                return Err("habit name must not be empty".into());
            }
            let start_date = match since {
                Some(value) => parse_instant(&value)?,
                None => Utc::now(),
            };
            let habit = NewHabit::new(session.user_id(), name, icon, start_date);
            let stored = session.store.create_habit(habit).await?;
            println!("Habit created: {}", stored.id);
        }
        HabitAction::List { json } => {
            let habits = session.store.habits();
            if json {
                let items: Vec<_> = habits.iter().map(habit_json).collect();
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if habits.is_empty() {
                println!("No active habits. Add one with `cleanstreak habit add <name>`.");
            } else {
                let display = &session.config.display;
                for habit in habits {
                    let days = StreakBreakdown::for_habit(habit, Utc::now()).whole_days();
                    let mut line = format!(
                        "{}  {:<20} {:>14}  best {}d",
                        &habit.id.to_string()[..8],
                        habit.name,
                        streak_line(habit, display.show_minutes),
                        habit.max_streak_days,
                    );
                    if display.show_next_milestone {
                        if let Some(progress) = next_milestone(days) {
                            line.push_str(&format!(
                                "  next: {} in {}d",
                                progress.next.name, progress.days_remaining
                            ));
                        }
                    }
                    println!("{line}");
                }
            }
        }
        HabitAction::Show { id, json } => {
            let habit_id = session.resolve_habit(&id)?;
            let habit = session
                .store
                .habit(habit_id)
                .ok_or_else(|| format!("no active habit with id {habit_id}"))?;
            let relapses: Vec<_> = session.store.relapses_for(habit_id).collect();
            let achievements: Vec<_> = session.store.achievements_for(habit_id).collect();

            if json {
                let mut value = habit_json(habit);
                value["relapses"] = serde_json::to_value(&relapses)?;
                value["achievements"] = serde_json::to_value(&achievements)?;
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                let days = StreakBreakdown::for_habit(habit, Utc::now()).days;
                let label = icon_label(&habit.icon).unwrap_or(habit.icon.as_str());
                println!("{} ({label})", habit.name);
                println!("  id:          {}", habit.id);
                println!("  streak:      {}", streak_line(habit, true));
                println!("               {}", format_streak_text(days));
                println!("  best streak: {}d", habit.max_streak_days);
                println!("  started:     {}", habit.start_date.to_rfc3339());
                println!("  relapses:    {}", relapses.len());
                for relapse in &relapses {
                    match &relapse.note {
                        Some(note) => println!("    {}  {note}", relapse.relapse_date.to_rfc3339()),
                        None => println!("    {}", relapse.relapse_date.to_rfc3339()),
                    }
                }
                println!("  achievements: {}", achievements.len());
                for achievement in &achievements {
                    println!(
                        "    {:<16} at {}d  {}",
                        achievement.definition().name,
                        achievement.streak_days,
                        achievement.unlocked_at.date_naive()
                    );
                }
            }
        }
        HabitAction::Relapse { id, note } => {
            let habit_id = session.resolve_habit(&id)?;
            let outcome = session.store.record_relapse(habit_id, note).await?;
            println!(
                "Relapse recorded. Streak of {} ended; best streak {}d.",
                format_streak_text(u64::from(outcome.previous_streak_days)),
                outcome.max_streak_days
            );
            for achievement in &outcome.unlocked {
                println!("Achievement unlocked: {}", achievement.definition().name);
            }
            if let Some(e) = &outcome.unlock_error {
                eprintln!("warning: achievement not saved ({e}); `cleanstreak status` retries it");
            }
            session.store.clear_pending_achievement();
        }
        HabitAction::Delete { id } => {
            let habit_id = session.resolve_habit(&id)?;
            session.store.delete_habit(habit_id).await?;
            println!("Habit deleted: {habit_id}");
        }
        HabitAction::Icons => {}
    }
    Ok(())
}
