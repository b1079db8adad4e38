use serde::Serialize;

/// Suggested icon token for a habit, with a display label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HabitIcon {
    pub icon: &'static str,
    pub label: &'static str,
}

pub const HABIT_ICONS: &[HabitIcon] = &[
    HabitIcon {
        icon: "cigarette",
        label: "Tobacco",
    },
    HabitIcon {
        icon: "beer",
        label: "Alcohol",
    },
    HabitIcon {
        icon: "smartphone",
        label: "Social media",
    },
    HabitIcon {
        icon: "gamepad-2",
        label: "Video games",
    },
    HabitIcon {
        icon: "coffee",
        label: "Caffeine",
    },
    HabitIcon {
        icon: "candy",
        label: "Sugar",
    },
    HabitIcon {
        icon: "utensils",
        label: "Fast food",
    },
    HabitIcon {
        icon: "pill",
        label: "Medication",
    },
    HabitIcon {
        icon: "dice-5",
        label: "Gambling",
    },
    HabitIcon {
        icon: "shopping-cart",
        label: "Shopping",
    },
    HabitIcon {
        icon: "tv",
        label: "TV/Streaming",
    },
    HabitIcon {
        icon: "moon",
        label: "Late nights",
    },
];

/// Label for a known icon token.
pub fn icon_label(icon: &str) -> Option<&'static str> {
    HABIT_ICONS.iter().find(|i| i.icon == icon).map(|i| i.label)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_icons_have_labels() {
        assert_eq!(icon_label("beer"), Some("Alcohol"));
        assert_eq!(icon_label("unknown"), None);
    }

    #[test]
    fn icon_tokens_are_unique() {
        let mut tokens: Vec<_> = HABIT_ICONS.iter().map(|i| i.icon).collect();
        tokens.sort_unstable();
        tokens.dedup();
        assert_eq!(tokens.len(), HABIT_ICONS.len());
    }
}
