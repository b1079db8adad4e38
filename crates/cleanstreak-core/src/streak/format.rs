//! Human-readable streak lengths.

fn plural(n: u64, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

fn with_remainder(major: String, remaining_days: u64) -> String {
    if remaining_days == 0 {
        major
    } else {
        format!("{major} and {}", plural(remaining_days, "day", "days"))
    }
}

/// Describe a streak of `days` whole days.
///
/// Below a week the count is given in days, below 30 days in weeks, below
/// 365 days in 30-day months, otherwise in 365-day years.
pub fn format_streak_text(days: u64) -> String {
    match days {
        0 => "Starting".to_string(),
        1..=6 => plural(days, "day", "days"),
        7..=29 => with_remainder(plural(days / 7, "week", "weeks"), days % 7),
        30..=364 => with_remainder(plural(days / 30, "month", "months"), days % 30),
        _ => with_remainder(plural(days / 365, "year", "years"), days % 365),
    }
}
