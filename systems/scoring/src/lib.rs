#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Scoring overlay that counts moves, tracks play time, and decides game outcomes.

use std::time::{Duration, Instant};

use island_merge_core::{Event, GameMode, Objective};
use log::info;
use serde::{Deserialize, Serialize};

/// Time limit applied to time-attack games whose level does not define one.
pub const DEFAULT_TIME_ATTACK_LIMIT: Duration = Duration::from_secs(180);

/// Rules a single game is scored under.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRules {
    /// Mode the game is played under.
    pub mode: GameMode,
    /// Clock limit; `None` means untimed.
    pub time_limit: Option<Duration>,
    /// Level's optimal move count used to judge perfect wins.
    pub optimal_moves: Option<u32>,
}

impl ScoreRules {
    /// Derives rules for the mode from a level's optional limit and optimum.
    ///
    /// Only time attack is timed; it falls back to
    /// [`DEFAULT_TIME_ATTACK_LIMIT`] when the level defines no limit.
    #[must_use]
    pub fn for_mode(
        mode: GameMode,
        level_limit: Option<Duration>,
        optimal_moves: Option<u32>,
    ) -> Self {
        let time_limit = match mode {
            GameMode::TimeAttack => Some(level_limit.unwrap_or(DEFAULT_TIME_ATTACK_LIMIT)),
            GameMode::Classic | GameMode::Puzzle => None,
        };
        Self {
            mode,
            time_limit,
            optimal_moves,
        }
    }

    /// Reports whether the move count qualifies as a perfect game.
    #[must_use]
    pub fn is_perfect(&self, moves: u32) -> bool {
        self.optimal_moves.is_some_and(|optimal| moves <= optimal)
    }
}

/// Terminal state of a scored game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The game is still running.
    #[default]
    InProgress,
    /// Every island was connected in time.
    Won,
    /// The clock ran out before the board was connected.
    TimedOut,
}

/// Read-only score snapshot handed to presentation and persistence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    /// Accepted moves in the current game.
    pub moves: u32,
    /// Play time, frozen once the game ends.
    pub elapsed: Duration,
    /// Remaining time for timed games.
    pub remaining: Option<Duration>,
    /// Outcome of the current game.
    pub outcome: Outcome,
    /// Fastest win recorded by this scorer.
    pub best_time: Option<Duration>,
    /// Fewest-move win recorded by this scorer.
    pub best_moves: Option<u32>,
}

/// Move counter and game clock for one game at a time.
///
/// Elapsed time is measured against the `Instant` supplied to each call so the
/// host controls the clock. Best-of-record fields survive [`Scoring::restart`].
#[derive(Clone, Debug)]
pub struct Scoring {
    rules: ScoreRules,
    moves: u32,
    started_at: Instant,
    carried: Duration,
    frozen: Option<Duration>,
    outcome: Outcome,
    best_time: Option<Duration>,
    best_moves: Option<u32>,
}

impl Scoring {
    /// Starts a fresh game clock at `now`.
    #[must_use]
    pub fn start(rules: ScoreRules, now: Instant) -> Self {
        Self {
            rules,
            moves: 0,
            started_at: now,
            carried: Duration::ZERO,
            frozen: None,
            outcome: Outcome::InProgress,
            best_time: None,
            best_moves: None,
        }
    }

    /// Continues a saved game that had already used `moves` and `elapsed`.
    #[must_use]
    pub fn resume(rules: ScoreRules, moves: u32, elapsed: Duration, now: Instant) -> Self {
        let mut scoring = Self::start(rules, now);
        scoring.moves = moves;
        scoring.carried = elapsed;
        scoring
    }

    /// Starts a new game while keeping best-of-record fields.
    pub fn restart(&mut self, rules: ScoreRules, now: Instant) {
        let best_time = self.best_time;
        let best_moves = self.best_moves;
        *self = Self::start(rules, now);
        self.best_time = best_time;
        self.best_moves = best_moves;
    }

    /// Seeds best-of-record fields, typically from persisted records.
    pub fn set_records(&mut self, best_time: Option<Duration>, best_moves: Option<u32>) {
        self.best_time = best_time;
        self.best_moves = best_moves;
    }

    /// Rules the current game is scored under.
    #[must_use]
    pub const fn rules(&self) -> &ScoreRules {
        &self.rules
    }

    /// Accepted moves in the current game.
    #[must_use]
    pub const fn moves(&self) -> u32 {
        self.moves
    }

    /// Outcome of the current game.
    #[must_use]
    pub const fn outcome(&self) -> Outcome {
        self.outcome
    }

    /// Counts one accepted move. Ignored once the game has ended.
    pub fn record_move(&mut self) {
        if self.outcome == Outcome::InProgress {
            self.moves = self.moves.saturating_add(1);
        }
    }

    /// Play time at `now`, or the frozen value once the game ended.
    #[must_use]
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.frozen
            .unwrap_or_else(|| self.carried + now.saturating_duration_since(self.started_at))
    }

    /// Time left before the limit, or `None` for untimed games.
    #[must_use]
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.rules
            .time_limit
            .map(|limit| limit.saturating_sub(self.elapsed(now)))
    }

    /// Snapshot of the current score.
    #[must_use]
    pub fn score(&self, now: Instant) -> Score {
        Score {
            moves: self.moves,
            elapsed: self.elapsed(now),
            remaining: self.remaining(now),
            outcome: self.outcome,
            best_time: self.best_time,
            best_moves: self.best_moves,
        }
    }

    /// Checks the clock and ends the game when the limit has been reached.
    ///
    /// Emits [`Event::GameTimedOut`] at most once per game.
    pub fn poll(&mut self, now: Instant, out: &mut Vec<Event>) {
        if self.outcome != Outcome::InProgress {
            return;
        }
        let Some(limit) = self.rules.time_limit else {
            return;
        };

        let elapsed = self.elapsed(now);
        if elapsed < limit {
            return;
        }

        self.frozen = Some(elapsed);
        self.outcome = Outcome::TimedOut;
        info!("time ran out after {} moves", self.moves);
        out.push(Event::GameTimedOut {
            moves: self.moves,
            elapsed,
        });
    }

    /// Consumes board events, counting moves and resolving wins.
    ///
    /// The clock is checked before any event so an expired game cannot be won
    /// by a connection reported in the same batch.
    pub fn handle(&mut self, events: &[Event], now: Instant, out: &mut Vec<Event>) {
        self.poll(now, out);

        for event in events {
            match event {
                Event::BridgeBuilt { .. } => self.record_move(),
                Event::BoardConnected => self.win(now, out),
                _ => {}
            }
        }
    }

    fn win(&mut self, now: Instant, out: &mut Vec<Event>) {
        if self.outcome != Outcome::InProgress {
            return;
        }

        let elapsed = self.elapsed(now);
        self.frozen = Some(elapsed);
        self.outcome = Outcome::Won;
        self.best_time = Some(self.best_time.map_or(elapsed, |best| best.min(elapsed)));
        self.best_moves = Some(self.best_moves.map_or(self.moves, |best| best.min(self.moves)));

        let perfect = self.rules.is_perfect(self.moves);
        info!(
            "game won in {} moves after {:.1}s (perfect: {perfect})",
            self.moves,
            elapsed.as_secs_f32()
        );
        out.push(Event::GameWon {
            mode: self.rules.mode,
            moves: self.moves,
            elapsed,
            perfect,
        });
    }
}

/// Reports whether a finished score satisfies the level objective.
#[must_use]
pub fn objective_met(objective: &Objective, score: &Score, connected: bool) -> bool {
    if !connected {
        return false;
    }
    match objective {
        Objective::ConnectAll => true,
        Objective::MinBridges { target } => score.moves <= *target,
        Objective::TimeLimit { limit } => score.elapsed <= *limit,
    }
}

#[cfg(test)]
mod tests {
    use super::{objective_met, Outcome, ScoreRules, Scoring, DEFAULT_TIME_ATTACK_LIMIT};
    use island_merge_core::{GameMode, Objective};
    use std::time::{Duration, Instant};

    #[test]
    fn time_attack_defaults_to_three_minutes() {
        let rules = ScoreRules::for_mode(GameMode::TimeAttack, None, Some(2));
        assert_eq!(rules.time_limit, Some(DEFAULT_TIME_ATTACK_LIMIT));

        let rules = ScoreRules::for_mode(GameMode::TimeAttack, Some(Duration::from_secs(60)), None);
        assert_eq!(rules.time_limit, Some(Duration::from_secs(60)));

        let rules = ScoreRules::for_mode(GameMode::Classic, Some(Duration::from_secs(60)), None);
        assert_eq!(rules.time_limit, None);
    }

    #[test]
    fn perfect_requires_known_optimum() {
        let rules = ScoreRules::for_mode(GameMode::Puzzle, None, Some(3));
        assert!(rules.is_perfect(3));
        assert!(!rules.is_perfect(4));
        assert!(!ScoreRules::for_mode(GameMode::Puzzle, None, None).is_perfect(0));
    }

    #[test]
    fn resume_carries_previous_time_and_moves() {
        let now = Instant::now();
        let rules = ScoreRules::for_mode(GameMode::Classic, None, None);
        let scoring = Scoring::resume(rules, 4, Duration::from_secs(20), now);
        assert_eq!(scoring.moves(), 4);
        assert_eq!(
            scoring.elapsed(now + Duration::from_secs(5)),
            Duration::from_secs(25)
        );
        assert_eq!(scoring.outcome(), Outcome::InProgress);
    }

    #[test]
    fn untimed_games_have_no_remaining_time() {
        let now = Instant::now();
        let scoring = Scoring::start(ScoreRules::for_mode(GameMode::Classic, None, None), now);
        assert_eq!(scoring.remaining(now), None);
    }

    #[test]
    fn objectives_require_connection() {
        let now = Instant::now();
        let mut scoring = Scoring::start(ScoreRules::for_mode(GameMode::Classic, None, None), now);
        scoring.record_move();
        scoring.record_move();
        let score = scoring.score(now + Duration::from_secs(40));

        assert!(!objective_met(&Objective::ConnectAll, &score, false));
        assert!(objective_met(&Objective::ConnectAll, &score, true));
        assert!(objective_met(&Objective::MinBridges { target: 2 }, &score, true));
        assert!(!objective_met(&Objective::MinBridges { target: 1 }, &score, true));
        assert!(!objective_met(
            &Objective::TimeLimit {
                limit: Duration::from_secs(30)
            },
            &score,
            true
        ));
    }
}
