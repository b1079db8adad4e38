mod catalog;
mod engine;
mod progress;

pub use catalog::{
    next_milestone, AchievementDefinition, AchievementType, MilestoneProgress, ACHIEVEMENTS,
};
pub use engine::{pending_unlocks, AchievementId, NewAchievement, UnlockEngine, UnlockedAchievement};
pub use progress::{overall_progress, AchievementProgress, OverallProgress};
