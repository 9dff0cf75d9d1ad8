#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Progress system that turns gameplay events into statistics and achievement unlocks.

mod catalog;

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    time::Duration,
};

use chrono::{DateTime, Utc};
use island_merge_core::{AchievementId, Event, GameMode};
use log::info;
use serde::{Deserialize, Serialize};

pub use catalog::{definition, Definition, META_TARGET, SPEEDRUN_LIMIT_SECS};

/// Callback invoked once per unlocked achievement.
pub type Listener = Box<dyn FnMut(&Achievement)>;

/// Mutable unlock state of a single achievement.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AchievementRecord {
    /// Whether the achievement has been unlocked. Sticky once true.
    pub unlocked: bool,
    /// Moment the achievement unlocked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<Utc>>,
    /// Progress towards the target. Never decreases.
    pub progress: u32,
}

/// Achievement definition paired with its unlock state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Achievement {
    /// Static metadata.
    pub definition: Definition,
    /// Unlock state.
    pub record: AchievementRecord,
}

impl Achievement {
    /// Identifier of the achievement.
    #[must_use]
    pub const fn id(&self) -> AchievementId {
        self.definition.id
    }

    /// Reports whether the achievement has been unlocked.
    #[must_use]
    pub const fn is_unlocked(&self) -> bool {
        self.record.unlocked
    }
}

/// Cumulative gameplay counters feeding achievement progress.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Statistics {
    /// Games started.
    pub games_played: u32,
    /// Games won.
    pub games_won: u32,
    /// Moves summed over won games.
    pub total_moves: u64,
    /// Play time summed over won games.
    pub total_time: Duration,
    /// Fastest win.
    pub best_time: Option<Duration>,
    /// Fewest moves in a win.
    pub fewest_moves: Option<u32>,
    /// Bridges built across all games.
    pub bridges_built: u32,
    /// Wins in time-attack mode.
    pub time_attack_wins: u32,
    /// Wins at or below the level's optimal move count.
    pub perfect_games: u32,
    /// Levels exported from the editor.
    pub levels_created: u32,
    /// Consecutive calendar days with at least one game started.
    pub play_streak: u32,
    /// Moment the last game started.
    pub last_played: Option<DateTime<Utc>>,
}

/// Persisted form of the progress state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressSnapshot {
    /// Unlock state per achievement.
    #[serde(default)]
    pub achievements: BTreeMap<AchievementId, AchievementRecord>,
    /// Cumulative statistics.
    #[serde(default)]
    pub statistics: Statistics,
}

/// Achievement engine scoped to one player profile.
///
/// Listeners belong to this instance; they fire in registration order, once
/// per achievement, at the moment it unlocks. An achievement relocked by
/// [`Progress::restore`] or [`Progress::wipe`] that unlocks again is not
/// delivered to listeners a second time.
pub struct Progress {
    records: BTreeMap<AchievementId, AchievementRecord>,
    statistics: Statistics,
    listeners: Vec<Listener>,
    delivered: BTreeSet<AchievementId>,
}

impl fmt::Debug for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Progress")
            .field("records", &self.records)
            .field("statistics", &self.statistics)
            .field("listeners", &self.listeners.len())
            .field("delivered", &self.delivered)
            .finish()
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new()
    }
}

impl Progress {
    /// Creates a progress engine with every achievement locked.
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: fresh_records(),
            statistics: Statistics::default(),
            listeners: Vec::new(),
            delivered: BTreeSet::new(),
        }
    }

    /// Registers a listener notified on every future unlock.
    pub fn on_unlock<F>(&mut self, listener: F)
    where
        F: FnMut(&Achievement) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Records the start of a game and updates the daily play streak.
    pub fn on_game_start(&mut self, now: DateTime<Utc>) {
        self.game_started(now, &mut Vec::new());
    }

    /// Records a win and re-evaluates every win-related achievement.
    pub fn on_game_win(
        &mut self,
        moves: u32,
        elapsed: Duration,
        timed: bool,
        perfect: bool,
        now: DateTime<Utc>,
    ) {
        self.game_won(moves, elapsed, timed, perfect, now, &mut Vec::new());
    }

    /// Records one accepted bridge.
    pub fn on_bridge_built(&mut self, now: DateTime<Utc>) {
        self.bridge_built(now, &mut Vec::new());
    }

    /// Records one level exported from the editor.
    pub fn on_level_created(&mut self, now: DateTime<Utc>) {
        self.level_created(now, &mut Vec::new());
    }

    /// Consumes gameplay events and emits one [`Event::AchievementUnlocked`] per unlock.
    pub fn handle(&mut self, events: &[Event], now: DateTime<Utc>, out: &mut Vec<Event>) {
        let mut unlocked = Vec::new();
        for event in events {
            match event {
                Event::GameStarted { .. } => self.game_started(now, &mut unlocked),
                Event::BridgeBuilt { .. } => self.bridge_built(now, &mut unlocked),
                Event::GameWon {
                    mode,
                    moves,
                    elapsed,
                    perfect,
                } => self.game_won(
                    *moves,
                    *elapsed,
                    *mode == GameMode::TimeAttack,
                    *perfect,
                    now,
                    &mut unlocked,
                ),
                Event::LevelCreated => self.level_created(now, &mut unlocked),
                _ => {}
            }
        }
        out.extend(
            unlocked
                .into_iter()
                .map(|id| Event::AchievementUnlocked { id }),
        );
    }

    fn game_started(&mut self, now: DateTime<Utc>, unlocked: &mut Vec<AchievementId>) {
        let stats = &mut self.statistics;
        stats.games_played = stats.games_played.saturating_add(1);

        stats.play_streak = match stats.last_played {
            None => 1,
            Some(last) => match (now.date_naive() - last.date_naive()).num_days() {
                1 => stats.play_streak.saturating_add(1),
                days if days > 1 => 1,
                _ => stats.play_streak.max(1),
            },
        };
        stats.last_played = Some(now);

        let streak = stats.play_streak;
        self.advance(AchievementId::Dedicated, streak);
        self.evaluate(&[AchievementId::Dedicated], now, unlocked);
    }

    fn game_won(
        &mut self,
        moves: u32,
        elapsed: Duration,
        timed: bool,
        perfect: bool,
        now: DateTime<Utc>,
        unlocked: &mut Vec<AchievementId>,
    ) {
        let stats = &mut self.statistics;
        stats.games_won = stats.games_won.saturating_add(1);
        stats.total_moves = stats.total_moves.saturating_add(u64::from(moves));
        stats.total_time = stats.total_time.saturating_add(elapsed);
        stats.best_time = Some(stats.best_time.map_or(elapsed, |best| best.min(elapsed)));
        stats.fewest_moves = Some(stats.fewest_moves.map_or(moves, |best| best.min(moves)));
        if timed {
            stats.time_attack_wins = stats.time_attack_wins.saturating_add(1);
        }
        if perfect {
            stats.perfect_games = stats.perfect_games.saturating_add(1);
        }

        let games_won = stats.games_won;
        let time_attack_wins = stats.time_attack_wins;
        let perfect_games = stats.perfect_games;

        self.advance(AchievementId::FirstWin, games_won.min(1));
        self.advance(AchievementId::IslandHopper, games_won);
        if elapsed < Duration::from_secs(SPEEDRUN_LIMIT_SECS) {
            self.advance(AchievementId::Speedrun, 1);
        }
        if timed {
            self.advance(AchievementId::TimeAttackWin, time_attack_wins);
        }
        if perfect {
            self.advance(AchievementId::Efficient, 1);
            self.advance(AchievementId::PerfectGame, perfect_games);
        }

        self.evaluate(
            &[
                AchievementId::FirstWin,
                AchievementId::Speedrun,
                AchievementId::Efficient,
                AchievementId::TimeAttackWin,
                AchievementId::PerfectGame,
                AchievementId::IslandHopper,
            ],
            now,
            unlocked,
        );
    }

    fn bridge_built(&mut self, now: DateTime<Utc>, unlocked: &mut Vec<AchievementId>) {
        self.statistics.bridges_built = self.statistics.bridges_built.saturating_add(1);
        self.advance(AchievementId::BridgeBuilder, self.statistics.bridges_built);
        self.evaluate(&[AchievementId::BridgeBuilder], now, unlocked);
    }

    fn level_created(&mut self, now: DateTime<Utc>, unlocked: &mut Vec<AchievementId>) {
        self.statistics.levels_created = self.statistics.levels_created.saturating_add(1);
        self.advance(AchievementId::LevelCreator, self.statistics.levels_created);
        self.evaluate(&[AchievementId::LevelCreator], now, unlocked);
    }

    fn advance(&mut self, id: AchievementId, value: u32) {
        let record = self.records.entry(id).or_default();
        record.progress = record.progress.max(value);
    }

    /// Evaluates candidates in ascending id order, following each regular
    /// unlock with a meta re-evaluation.
    fn evaluate(
        &mut self,
        candidates: &[AchievementId],
        now: DateTime<Utc>,
        unlocked: &mut Vec<AchievementId>,
    ) {
        let mut ordered = candidates.to_vec();
        ordered.sort_unstable();
        ordered.dedup();

        for id in ordered {
            if self.try_unlock(id, now, unlocked) && !id.is_meta() {
                let count = self.unlocked_regular_count();
                self.advance(AchievementId::Master, count);
                let _ = self.try_unlock(AchievementId::Master, now, unlocked);
            }
        }
    }

    fn try_unlock(
        &mut self,
        id: AchievementId,
        now: DateTime<Utc>,
        unlocked: &mut Vec<AchievementId>,
    ) -> bool {
        let target = definition(id).target;
        let record = self.records.entry(id).or_default();
        if record.unlocked || record.progress < target {
            return false;
        }

        record.unlocked = true;
        record.unlocked_at = Some(now);
        let achievement = Achievement {
            definition: definition(id),
            record: record.clone(),
        };

        info!("achievement unlocked: {}", achievement.definition.name);
        if self.delivered.insert(id) {
            for listener in &mut self.listeners {
                listener(&achievement);
            }
        }
        unlocked.push(id);
        true
    }

    fn unlocked_regular_count(&self) -> u32 {
        let count = self
            .records
            .iter()
            .filter(|(id, record)| !id.is_meta() && record.unlocked)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Definition and state of a single achievement.
    #[must_use]
    pub fn achievement(&self, id: AchievementId) -> Achievement {
        Achievement {
            definition: definition(id),
            record: self.records.get(&id).cloned().unwrap_or_default(),
        }
    }

    /// Achievements visible to the player in ascending id order.
    ///
    /// Hidden achievements are omitted until unlocked.
    #[must_use]
    pub fn achievements(&self) -> Vec<Achievement> {
        AchievementId::ALL
            .into_iter()
            .map(|id| self.achievement(id))
            .filter(|achievement| !achievement.definition.hidden || achievement.is_unlocked())
            .collect()
    }

    /// Cumulative statistics.
    #[must_use]
    pub const fn statistics(&self) -> &Statistics {
        &self.statistics
    }

    /// Number of unlocked achievements, including the meta achievement.
    #[must_use]
    pub fn unlocked_count(&self) -> usize {
        self.records.values().filter(|record| record.unlocked).count()
    }

    /// Number of achievements in the fixed set.
    #[must_use]
    pub const fn total_count(&self) -> usize {
        AchievementId::ALL.len()
    }

    /// One-line progress summary.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Achievements: {}/{} unlocked",
            self.unlocked_count(),
            self.total_count()
        )
    }

    /// Captures achievements and statistics for persistence.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            achievements: self.records.clone(),
            statistics: self.statistics.clone(),
        }
    }

    /// Replaces achievements and statistics with persisted state.
    ///
    /// Achievements missing from the snapshot start locked. Listeners are kept
    /// along with the record of which unlocks they already received.
    pub fn restore(&mut self, snapshot: ProgressSnapshot) {
        let mut records = fresh_records();
        for (id, record) in snapshot.achievements {
            let _ = records.insert(id, record);
        }
        self.records = records;
        self.statistics = snapshot.statistics;
    }

    /// Relocks every achievement and clears all statistics.
    ///
    /// Listeners are kept and are not notified again for achievements they
    /// already received.
    pub fn wipe(&mut self) {
        self.records = fresh_records();
        self.statistics = Statistics::default();
    }
}

fn fresh_records() -> BTreeMap<AchievementId, AchievementRecord> {
    AchievementId::ALL
        .into_iter()
        .map(|id| (id, AchievementRecord::default()))
        .collect()
}
