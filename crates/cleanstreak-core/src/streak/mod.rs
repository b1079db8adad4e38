mod calculator;
mod format;

pub use calculator::{compute_streak, current_streak_days, StreakBreakdown};
pub use format::format_streak_text;
