//! Compiled-in milestone catalog.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Milestone identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementType {
    FirstWeek,
    OneMonth,
    Quarter,
    HalfYear,
    Legend,
}

impl AchievementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AchievementType::FirstWeek => "first_week",
            AchievementType::OneMonth => "one_month",
            AchievementType::Quarter => "quarter",
            AchievementType::HalfYear => "half_year",
            AchievementType::Legend => "legend",
        }
    }

    /// Catalog entry for this type.
    pub fn definition(&self) -> &'static AchievementDefinition {
        let index = match self {
            AchievementType::FirstWeek => 0,
            AchievementType::OneMonth => 1,
            AchievementType::Quarter => 2,
            AchievementType::HalfYear => 3,
            AchievementType::Legend => 4,
        };
        &ACHIEVEMENTS[index]
    }
}

impl fmt::Display for AchievementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AchievementType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_week" => Ok(AchievementType::FirstWeek),
            "one_month" => Ok(AchievementType::OneMonth),
            "quarter" => Ok(AchievementType::Quarter),
            "half_year" => Ok(AchievementType::HalfYear),
            "legend" => Ok(AchievementType::Legend),
            other => Err(format!("unknown achievement type: {other}")),
        }
    }
}

/// A milestone awarded once a streak reaches `days`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementDefinition {
    pub kind: AchievementType,
    pub name: &'static str,
    pub description: &'static str,
    pub days: u32,
    pub icon: &'static str,
}

/// Ordered ascending by threshold.
pub static ACHIEVEMENTS: [AchievementDefinition; 5] = [
    AchievementDefinition {
        kind: AchievementType::FirstWeek,
        name: "First Week",
        description: "7-day streak",
        days: 7,
        icon: "sprout",
    },
    AchievementDefinition {
        kind: AchievementType::OneMonth,
        name: "Strong Month",
        description: "30-day streak",
        days: 30,
        icon: "biceps-flexed",
    },
    AchievementDefinition {
        kind: AchievementType::Quarter,
        name: "Golden Quarter",
        description: "90-day streak",
        days: 90,
        icon: "trophy",
    },
    AchievementDefinition {
        kind: AchievementType::HalfYear,
        name: "Half Year",
        description: "180-day streak",
        days: 180,
        icon: "star",
    },
    AchievementDefinition {
        kind: AchievementType::Legend,
        name: "Legend",
        description: "365-day streak",
        days: 365,
        icon: "crown",
    },
];

/// Distance from a streak to the next milestone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MilestoneProgress {
    pub next: &'static AchievementDefinition,
    pub days_remaining: u32,
    /// 0.0 to 100.0
    pub percent: f64,
}

/// First milestone strictly above `days`, or `None` past the last one.
pub fn next_milestone(days: u32) -> Option<MilestoneProgress> {
    let next = ACHIEVEMENTS.iter().find(|def| def.days > days)?;
    Some(MilestoneProgress {
        next,
        days_remaining: next.days - days,
        percent: (f64::from(days) / f64::from(next.days) * 100.0).min(100.0),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_is_sorted_by_threshold() {
        let days: Vec<u32> = ACHIEVEMENTS.iter().map(|a| a.days).collect();
        assert_eq!(days, vec![7, 30, 90, 180, 365]);
    }

    #[test]
    fn type_tags_round_trip_through_str() {
        for def in &ACHIEVEMENTS {
            assert_eq!(def.kind.as_str().parse::<AchievementType>(), Ok(def.kind));
            assert_eq!(def.kind.definition(), def);
        }
        assert!("platinum".parse::<AchievementType>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_tags() {
        let json = serde_json::to_string(&AchievementType::HalfYear).unwrap();
        assert_eq!(json, "\"half_year\"");
    }

    #[test]
    fn next_milestone_boundaries() {
        let p = next_milestone(0).unwrap();
        assert_eq!(p.next.kind, AchievementType::FirstWeek);
        assert_eq!(p.days_remaining, 7);
        assert_eq!(p.percent, 0.0);

        // Reaching a threshold moves on to the next one.
        let p = next_milestone(7).unwrap();
        assert_eq!(p.next.kind, AchievementType::OneMonth);
        assert_eq!(p.days_remaining, 23);

        let p = next_milestone(364).unwrap();
        assert_eq!(p.next.kind, AchievementType::Legend);
        assert_eq!(p.days_remaining, 1);

        assert!(next_milestone(365).is_none());
        assert!(next_milestone(1000).is_none());
    }
}
