#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Level catalog providing built-in layouts, unlock progression, and star ratings.

mod builtin;

use std::{
    collections::{BTreeMap, BTreeSet},
    time::Duration,
};

use chrono::{DateTime, Utc};
use island_merge_core::{LevelLayout, Objective};
use log::info;
use serde::{Deserialize, Serialize};

/// Difficulty tier of a level set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    /// Small boards introducing the rules.
    Beginner,
    /// Medium boards with more islands.
    Intermediate,
    /// Large boards with time pressure.
    Expert,
    /// Hand-tuned challenges.
    Master,
}

impl Difficulty {
    /// Display name of the tier.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
            Self::Master => "Master",
        }
    }
}

/// Static description of a playable level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelDefinition {
    /// Stable identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Initial tile layout.
    pub layout: LevelLayout,
    /// Fewest bridges known to connect every island.
    pub optimal_moves: u32,
    /// Optional clock limit.
    pub time_limit: Option<Duration>,
    /// Goals shown to the player.
    pub objectives: Vec<Objective>,
}

/// Ordered group of levels sharing a difficulty tier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelSet {
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Difficulty tier.
    pub difficulty: Difficulty,
    /// Completed levels required before the set opens.
    pub unlock_threshold: usize,
    /// Levels in play order.
    pub levels: Vec<LevelDefinition>,
}

/// Best result recorded for a level.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelScore {
    /// Bridges used.
    pub moves: u32,
    /// Completion time.
    pub time: Duration,
    /// Star rating between one and three.
    pub stars: u8,
    /// Moment the result was achieved.
    pub date: DateTime<Utc>,
}

impl LevelScore {
    /// Reports whether this result should replace `other` as the best.
    ///
    /// More stars win, then fewer moves, then a faster time.
    #[must_use]
    pub fn beats(&self, other: &Self) -> bool {
        (self.stars, other.moves, other.time) > (other.stars, self.moves, self.time)
    }
}

/// Persisted unlock and completion state of the catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelRecords {
    /// Levels the player may start.
    pub unlocked: BTreeSet<String>,
    /// Levels finished at least once.
    pub completed: BTreeSet<String>,
    /// Best result per level.
    pub best: BTreeMap<String, LevelScore>,
}

/// Rates a completion between one and three stars.
///
/// Moves at or under the optimum earn three stars and up to two over earn
/// two. When the level is timed, finishing within half the limit earns three
/// stars and within three quarters at least two.
#[must_use]
pub fn stars(level: &LevelDefinition, moves: u32, elapsed: Duration) -> u8 {
    let mut stars = if moves <= level.optimal_moves {
        3
    } else if moves <= level.optimal_moves.saturating_add(2) {
        2
    } else {
        1
    };

    if let Some(limit) = level.time_limit.filter(|limit| !limit.is_zero()) {
        if elapsed <= limit / 2 {
            stars = 3;
        } else if elapsed <= limit * 3 / 4 {
            stars = stars.max(2);
        }
    }

    stars
}

/// Level sets together with the player's unlock progression.
#[derive(Clone, Debug)]
pub struct LevelCatalog {
    sets: Vec<LevelSet>,
    records: LevelRecords,
}

impl LevelCatalog {
    /// Creates the built-in catalog with only the first level unlocked.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_sets(builtin::sets())
    }

    /// Creates a catalog from arbitrary sets with only the first level unlocked.
    #[must_use]
    pub fn from_sets(sets: Vec<LevelSet>) -> Self {
        let mut catalog = Self {
            sets,
            records: LevelRecords::default(),
        };
        catalog.unlock_first();
        catalog
    }

    fn unlock_first(&mut self) {
        if let Some(first) = self.sets.iter().flat_map(|set| set.levels.first()).next() {
            let _ = self.records.unlocked.insert(first.id.clone());
        }
    }

    /// Level sets in unlock order.
    #[must_use]
    pub fn sets(&self) -> &[LevelSet] {
        &self.sets
    }

    /// Iterates over every level in play order.
    pub fn levels(&self) -> impl Iterator<Item = &LevelDefinition> {
        self.sets.iter().flat_map(|set| set.levels.iter())
    }

    /// Looks up a level by identifier.
    #[must_use]
    pub fn level(&self, id: &str) -> Option<&LevelDefinition> {
        self.levels().find(|level| level.id == id)
    }

    /// Level following `id` in play order, across set boundaries.
    #[must_use]
    pub fn next_level(&self, id: &str) -> Option<&LevelDefinition> {
        self.levels().skip_while(|level| level.id != id).nth(1)
    }

    /// Reports whether the level may be started.
    #[must_use]
    pub fn is_unlocked(&self, id: &str) -> bool {
        self.records.unlocked.contains(id)
    }

    /// Reports whether the level has been finished at least once.
    #[must_use]
    pub fn is_completed(&self, id: &str) -> bool {
        self.records.completed.contains(id)
    }

    /// Number of distinct levels finished.
    #[must_use]
    pub fn completed_count(&self) -> usize {
        self.records.completed.len()
    }

    /// Marks a level complete and returns the identifiers it newly unlocked.
    ///
    /// Completing a level opens the next level of its set. Every set whose
    /// threshold is reached and that has no open level yet opens its first
    /// level. Unknown identifiers are ignored.
    pub fn complete(&mut self, id: &str) -> Vec<String> {
        let Some((set_index, level_index)) = self.position(id) else {
            return Vec::new();
        };

        let _ = self.records.completed.insert(id.to_owned());
        let _ = self.records.unlocked.insert(id.to_owned());

        let mut opened = Vec::new();
        if let Some(next) = self.sets[set_index].levels.get(level_index + 1) {
            if self.records.unlocked.insert(next.id.clone()) {
                opened.push(next.id.clone());
            }
        }

        let completed = self.completed_count();
        for set in &self.sets {
            if set.unlock_threshold > completed {
                continue;
            }
            if set
                .levels
                .iter()
                .any(|level| self.records.unlocked.contains(&level.id))
            {
                continue;
            }
            if let Some(first) = set.levels.first() {
                opened.push(first.id.clone());
            }
        }
        for level_id in &opened {
            let _ = self.records.unlocked.insert(level_id.clone());
        }

        if !opened.is_empty() {
            info!("completing {id} unlocked {}", opened.join(", "));
        }
        opened
    }

    fn position(&self, id: &str) -> Option<(usize, usize)> {
        self.sets.iter().enumerate().find_map(|(set_index, set)| {
            set.levels
                .iter()
                .position(|level| level.id == id)
                .map(|level_index| (set_index, level_index))
        })
    }

    /// Stores the score when it beats the previous best. Returns whether it did.
    pub fn record_best(&mut self, id: &str, score: LevelScore) -> bool {
        if self.level(id).is_none() {
            return false;
        }
        match self.records.best.get(id) {
            Some(best) if !score.beats(best) => false,
            _ => {
                let _ = self.records.best.insert(id.to_owned(), score);
                true
            }
        }
    }

    /// Best recorded result for a level.
    #[must_use]
    pub fn best(&self, id: &str) -> Option<&LevelScore> {
        self.records.best.get(id)
    }

    /// Unlock and completion state for persistence.
    #[must_use]
    pub const fn records(&self) -> &LevelRecords {
        &self.records
    }

    /// Replaces unlock and completion state with persisted records.
    ///
    /// The first level always stays unlocked.
    pub fn restore(&mut self, records: LevelRecords) {
        self.records = records;
        self.unlock_first();
    }
}

#[cfg(test)]
mod tests {
    use super::{stars, LevelCatalog, LevelScore};
    use chrono::Utc;
    use std::time::Duration;

    #[test]
    fn stars_follow_move_thresholds() {
        let catalog = LevelCatalog::builtin();
        let level = catalog.level("beginner_01").expect("built-in level");
        assert_eq!(stars(level, 2, Duration::from_secs(500)), 3);
        assert_eq!(stars(level, 4, Duration::from_secs(500)), 2);
        assert_eq!(stars(level, 5, Duration::from_secs(500)), 1);
    }

    #[test]
    fn time_bonus_applies_to_timed_levels() {
        let catalog = LevelCatalog::builtin();
        let level = catalog.level("intermediate_01").expect("built-in level");
        assert_eq!(stars(level, 20, Duration::from_secs(90)), 3);
        assert_eq!(stars(level, 20, Duration::from_secs(135)), 2);
        assert_eq!(stars(level, 20, Duration::from_secs(136)), 1);
    }

    #[test]
    fn best_prefers_stars_then_moves_then_time() {
        let score = |stars, moves, secs| LevelScore {
            moves,
            time: Duration::from_secs(secs),
            stars,
            date: Utc::now(),
        };
        assert!(score(3, 9, 90).beats(&score(2, 3, 10)));
        assert!(score(2, 3, 90).beats(&score(2, 4, 10)));
        assert!(score(2, 3, 10).beats(&score(2, 3, 11)));
        assert!(!score(2, 3, 10).beats(&score(2, 3, 10)));
    }

    #[test]
    fn next_level_crosses_set_boundaries() {
        let catalog = LevelCatalog::builtin();
        let next = catalog.next_level("beginner_04").expect("next level");
        assert_eq!(next.id, "intermediate_01");
        assert!(catalog.next_level("master_01").is_none());
    }
}
