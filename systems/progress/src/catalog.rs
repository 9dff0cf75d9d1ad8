//! Static achievement definitions.

use island_merge_core::AchievementId;

/// Display metadata and unlock threshold of one achievement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Definition {
    /// Identifier of the achievement.
    pub id: AchievementId,
    /// Short display name.
    pub name: &'static str,
    /// Sentence describing how to unlock the achievement.
    pub description: &'static str,
    /// Glyph shown next to the name.
    pub icon: &'static str,
    /// Progress value at which the achievement unlocks.
    pub target: u32,
    /// Whether the achievement is omitted from listings until unlocked.
    pub hidden: bool,
}

/// Number of achievements the meta achievement waits for.
pub const META_TARGET: u32 = AchievementId::ALL.len() as u32 - 1;

/// Wins faster than this unlock the speed achievement.
pub const SPEEDRUN_LIMIT_SECS: u64 = 30;

/// Looks up the static definition of an achievement.
#[must_use]
pub const fn definition(id: AchievementId) -> Definition {
    let (name, description, icon, target) = match id {
        AchievementId::FirstWin => ("First Victory", "Win your first game", "🏆", 1),
        AchievementId::Speedrun => (
            "Speed Demon",
            "Complete a level in under 30 seconds",
            "⚡",
            1,
        ),
        AchievementId::Efficient => (
            "Efficiency Expert",
            "Complete a level with minimum moves",
            "🎯",
            1,
        ),
        AchievementId::TimeAttackWin => ("Time Master", "Win 5 Time Attack games", "⏰", 5),
        AchievementId::PerfectGame => ("Perfectionist", "Achieve 10 perfect games", "💎", 10),
        AchievementId::BridgeBuilder => ("Bridge Builder", "Build 100 bridges", "🌉", 100),
        AchievementId::IslandHopper => ("Island Hopper", "Win 25 games", "🏝️", 25),
        AchievementId::LevelCreator => (
            "Level Designer",
            "Create 5 levels in the editor",
            "🎨",
            5,
        ),
        AchievementId::Dedicated => (
            "Dedicated Player",
            "Play for 7 consecutive days",
            "🔥",
            7,
        ),
        AchievementId::Master => (
            "Island Master",
            "Unlock all other achievements",
            "👑",
            META_TARGET,
        ),
    };

    Definition {
        id,
        name,
        description,
        icon,
        target,
        hidden: id.is_meta(),
    }
}

#[cfg(test)]
mod tests {
    use super::{definition, META_TARGET};
    use island_merge_core::AchievementId;

    #[test]
    fn meta_target_counts_every_other_achievement() {
        assert_eq!(META_TARGET, 9);
        assert_eq!(definition(AchievementId::Master).target, META_TARGET);
    }

    #[test]
    fn only_the_meta_achievement_is_hidden() {
        let hidden: Vec<_> = AchievementId::ALL
            .into_iter()
            .filter(|id| definition(*id).hidden)
            .collect();
        assert_eq!(hidden, vec![AchievementId::Master]);
    }
}
