#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game session that pumps board events through scoring and progress.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use island_merge_core::{CellCoord, Command, Event, GameMode, GridSize, LevelLayout};
use island_merge_system_progress::Progress;
use island_merge_system_scoring::{Outcome, Score, ScoreRules, Scoring};
use island_merge_world::{self as world, Board};
use log::{debug, info};

/// Lifecycle stage of the game wrapping the board.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Phase {
    /// No game is running.
    #[default]
    Menu,
    /// Bridges may be built.
    Playing,
    /// The board was connected in time.
    Won,
    /// The clock expired first.
    TimedOut,
}

impl Phase {
    /// Reports whether the phase ends a game.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Won | Self::TimedOut)
    }
}

/// Board, scoring and achievements for one player, driven by discrete inputs.
///
/// Every input runs the same pipeline: world commands first, then scoring, then
/// progress. All resulting events are kept for the host until drained.
#[derive(Debug)]
pub struct Session {
    board: Board,
    scoring: Scoring,
    progress: Progress,
    phase: Phase,
    events: Vec<Event>,
}

impl Session {
    /// Creates an idle session around the player's progress.
    #[must_use]
    pub fn new(progress: Progress, now: Instant) -> Self {
        let layout = LevelLayout::sea(GridSize::MIN);
        let mut board = Board::new(layout.size());
        board.load_level(&layout);
        Self {
            board,
            scoring: Scoring::start(ScoreRules::for_mode(GameMode::Classic, None, None), now),
            progress,
            phase: Phase::Menu,
            events: Vec::new(),
        }
    }

    /// Loads the layout and starts a new game under `rules`.
    ///
    /// Best-of-record fields survive from the previous game. A layout that is
    /// already connected is won immediately.
    pub fn start(
        &mut self,
        layout: LevelLayout,
        rules: ScoreRules,
        now: Instant,
        today: DateTime<Utc>,
    ) {
        self.scoring.restart(rules, now);
        self.phase = Phase::Playing;
        info!(
            "starting {} game on a {}x{} board",
            rules.mode.name(),
            layout.size().width(),
            layout.size().height()
        );

        let mut batch = vec![Event::GameStarted { mode: rules.mode }];
        world::apply(&mut self.board, Command::LoadLevel { layout }, &mut batch);
        self.pump(batch, now, today);
    }

    /// Continues a saved game on a restored board.
    ///
    /// No game-start event is emitted, so statistics are not counted twice.
    pub fn resume(
        &mut self,
        board: Board,
        rules: ScoreRules,
        moves: u32,
        elapsed: Duration,
        now: Instant,
        today: DateTime<Utc>,
    ) {
        let mut scoring = Scoring::resume(rules, moves, elapsed, now);
        let score = self.scoring.score(now);
        scoring.set_records(score.best_time, score.best_moves);
        self.scoring = scoring;
        self.board = board;
        self.phase = Phase::Playing;
        info!("resuming {} game after {moves} moves", rules.mode.name());

        let mut batch = Vec::new();
        if self.board.is_all_connected() {
            batch.push(Event::BoardConnected);
        }
        self.pump(batch, now, today);
    }

    /// Attempts to build a bridge at `cell`. Returns whether a move was accepted.
    ///
    /// The clock is checked first; clicks outside [`Phase::Playing`] are ignored.
    pub fn click(&mut self, cell: CellCoord, now: Instant, today: DateTime<Utc>) -> bool {
        self.tick(now, today);
        if self.phase != Phase::Playing {
            return false;
        }

        let mut batch = Vec::new();
        world::apply(&mut self.board, Command::BuildBridge { cell }, &mut batch);
        let accepted = batch
            .iter()
            .any(|event| matches!(event, Event::BridgeBuilt { .. }));
        if !accepted {
            debug!("click at {cell:?} rejected");
        }
        self.pump(batch, now, today);
        accepted
    }

    /// Advances the clock without input, ending timed games that ran out.
    pub fn tick(&mut self, now: Instant, today: DateTime<Utc>) {
        if self.phase == Phase::Playing {
            self.pump(Vec::new(), now, today);
        }
    }

    /// Leaves the current game and returns to the menu.
    pub fn abandon(&mut self) {
        if self.phase == Phase::Playing {
            info!("game abandoned after {} moves", self.scoring.moves());
        }
        self.phase = Phase::Menu;
    }

    /// Forwards events produced outside the board, such as editor exports, to progress.
    pub fn notify(&mut self, events: &[Event], today: DateTime<Utc>) {
        let mut unlocked = Vec::new();
        self.progress.handle(events, today, &mut unlocked);
        self.events.extend_from_slice(events);
        self.events.extend(unlocked);
    }

    fn pump(&mut self, mut batch: Vec<Event>, now: Instant, today: DateTime<Utc>) {
        let mut derived = Vec::new();
        self.scoring.handle(&batch, now, &mut derived);
        batch.extend(derived);

        let mut unlocked = Vec::new();
        self.progress.handle(&batch, today, &mut unlocked);
        batch.extend(unlocked);

        self.phase = match self.scoring.outcome() {
            Outcome::InProgress => self.phase,
            Outcome::Won => Phase::Won,
            Outcome::TimedOut => Phase::TimedOut,
        };
        self.events.extend(batch);
    }

    /// Takes every event produced since the last call.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Current lifecycle stage.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Board being played.
    #[must_use]
    pub const fn board(&self) -> &Board {
        &self.board
    }

    /// Scoring state of the current or last game.
    #[must_use]
    pub const fn scoring(&self) -> &Scoring {
        &self.scoring
    }

    /// Score snapshot at `now`.
    #[must_use]
    pub fn score(&self, now: Instant) -> Score {
        self.scoring.score(now)
    }

    /// Achievement engine fed by this session.
    #[must_use]
    pub const fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Mutable access to the achievement engine, for registering listeners.
    pub fn progress_mut(&mut self) -> &mut Progress {
        &mut self.progress
    }

    /// Consumes the session and hands back the player's progress.
    #[must_use]
    pub fn into_progress(self) -> Progress {
        self.progress
    }
}
