use std::{cell::RefCell, io, rc::Rc, time::Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use island_merge_core::{Event, LevelLayout};
use island_merge_rendering::{
    BoardPresentation, FrameInput, HudPresentation, Presentation, RenderingBackend, Scene,
    SceneStatus, ScreenLayout, TextBackend, BACKGROUND,
};
use island_merge_storage::{KeyValueStore, SaveSystem, SavedGame};
use island_merge_system_levels::{stars, LevelCatalog, LevelDefinition, LevelScore};
use island_merge_system_progress::Progress;
use island_merge_system_scoring::ScoreRules;
use island_merge_system_session::{Phase, Session};
use island_merge_world::query;
use log::{debug, info};

/// Game chosen on the command line.
#[derive(Debug)]
pub(crate) struct PlaySetup {
    /// Window title.
    pub(crate) title: String,
    /// Layout loaded on start and restart.
    pub(crate) layout: LevelLayout,
    /// Scoring rules.
    pub(crate) rules: ScoreRules,
    /// Built-in level being played, if any.
    pub(crate) level: Option<LevelDefinition>,
    /// Saved game to continue instead of starting fresh.
    pub(crate) resume: Option<SavedGame>,
}

#[derive(Debug)]
struct PlayState {
    session: Session,
    catalog: LevelCatalog,
    layout: LevelLayout,
    rules: ScoreRules,
    level: Option<LevelDefinition>,
    screen: ScreenLayout,
}

impl PlayState {
    fn update(&mut self, input: FrameInput, scene: &mut Scene) {
        let now = Instant::now();
        let today = Utc::now();
        let mut notes = Vec::new();

        if input.restart_action {
            self.session
                .start(self.layout.clone(), self.rules, now, today);
        } else if input.confirm_action {
            let size = self.session.board().size();
            match input
                .cursor_screen_space
                .and_then(|position| self.screen.screen_to_cell(position, size))
            {
                Some(cell) => {
                    scene.hovered = Some(cell);
                    let _ = self.session.click(cell, now, today);
                }
                None => {
                    self.session.tick(now, today);
                    notes.push("no cell there".to_owned());
                }
            }
        } else {
            self.session.tick(now, today);
        }

        notes.extend(self.absorb_events());
        let hovered = scene.hovered;
        *scene = self.scene(now);
        scene.hovered = hovered;
        scene.notifications = notes;
    }

    fn absorb_events(&mut self) -> Vec<String> {
        let mut notes = Vec::new();
        for event in self.session.drain_events() {
            match event {
                Event::BridgeRejected { reason, .. } => notes.push(reason.to_string()),
                Event::AchievementUnlocked { id } => {
                    let achievement = self.session.progress().achievement(id);
                    notes.push(format!(
                        "{} achievement unlocked: {}",
                        achievement.definition.icon, achievement.definition.name
                    ));
                }
                Event::GameWon { moves, elapsed, .. } => {
                    let Some(level) = &self.level else {
                        continue;
                    };
                    let rating = stars(level, moves, elapsed);
                    notes.push(format!("{} cleared with {rating} stars", level.name));
                    for opened in self.catalog.complete(&level.id) {
                        let name = self
                            .catalog
                            .level(&opened)
                            .map_or(opened.clone(), |next| next.name.clone());
                        notes.push(format!("unlocked level {name}"));
                    }
                    let score = LevelScore {
                        moves,
                        time: elapsed,
                        stars: rating,
                        date: Utc::now(),
                    };
                    if self.catalog.record_best(&level.id, score) {
                        notes.push("new personal best".to_owned());
                    }
                }
                _ => {}
            }
        }
        notes
    }

    fn scene(&self, now: Instant) -> Scene {
        let board = self.session.board();
        let status = match self.session.phase() {
            Phase::Menu => SceneStatus::Idle,
            Phase::Playing => SceneStatus::Playing,
            Phase::Won => SceneStatus::Won,
            Phase::TimedOut => SceneStatus::TimedOut,
        };
        let hud = HudPresentation::from_score(
            self.rules.mode,
            &self.session.score(now),
            board.component_count(),
            status,
        );
        Scene::new(
            BoardPresentation::from_view(query::board_view(board), self.screen),
            hud,
        )
    }
}

/// Plays one game on the terminal, then persists progress, records and the game itself.
///
/// An unfinished game is saved for later when `auto_save` is set. A finished
/// game clears any earlier save.
pub(crate) fn run<S: KeyValueStore>(
    saves: &mut SaveSystem<S>,
    catalog: LevelCatalog,
    progress: Progress,
    setup: PlaySetup,
    screen: ScreenLayout,
    auto_save: bool,
) -> Result<()> {
    let now = Instant::now();
    let today = Utc::now();
    let mut session = Session::new(progress, now);
    let rules = match setup.resume {
        Some(saved) => {
            let board = saved.board().context("saved board is corrupt")?;
            let rules = saved.rules();
            session.resume(board, rules, saved.moves, saved.elapsed, now, today);
            rules
        }
        None => {
            session.start(setup.layout.clone(), setup.rules, now, today);
            setup.rules
        }
    };

    let mut state = PlayState {
        session,
        catalog,
        layout: setup.layout,
        rules,
        level: setup.level,
        screen,
    };
    let notes = state.absorb_events();
    let mut scene = state.scene(now);
    scene.notifications = notes;

    let state = Rc::new(RefCell::new(state));
    let shared = Rc::clone(&state);
    let backend = TextBackend::new(io::stdin().lock(), io::stdout());
    backend.run(
        Presentation::new(setup.title, BACKGROUND, scene),
        move |_, input, scene| shared.borrow_mut().update(input, scene),
    )?;

    let state = state.borrow();
    let saved_at = Utc::now();
    match state.session.phase() {
        Phase::Playing if auto_save => {
            let game = SavedGame::capture(
                state.session.board(),
                &state.rules,
                &state.session.score(Instant::now()),
                state.level.as_ref().map(|level| level.id.as_str()),
                saved_at,
            );
            saves.save_game(&game).context("failed to save game")?;
            info!("saved unfinished game after {} moves", game.moves);
        }
        Phase::Playing | Phase::Menu => {}
        Phase::Won | Phase::TimedOut => {
            if saves.has_saved_game() {
                saves
                    .delete_saved_game()
                    .context("failed to remove finished game")?;
            }
        }
    }

    saves
        .save_achievements(&state.session.progress().snapshot())
        .context("failed to save achievements")?;
    saves
        .save_records(state.catalog.records())
        .context("failed to save level records")?;
    debug!("stored progress and level records");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::PlayState;
    use chrono::Utc;
    use island_merge_core::{GameMode, LevelLayout};
    use island_merge_rendering::{FrameInput, SceneStatus, ScreenLayout};
    use island_merge_system_levels::LevelCatalog;
    use island_merge_system_progress::Progress;
    use island_merge_system_scoring::ScoreRules;
    use island_merge_system_session::Session;
    use std::time::Instant;

    fn state() -> PlayState {
        let catalog = LevelCatalog::builtin();
        let level = catalog.levels().next().expect("builtin level").clone();
        let rules = ScoreRules::for_mode(GameMode::Classic, None, Some(level.optimal_moves));
        let mut session = Session::new(Progress::new(), Instant::now());
        session.start(level.layout.clone(), rules, Instant::now(), Utc::now());
        PlayState {
            session,
            catalog,
            layout: level.layout.clone(),
            rules,
            level: Some(level),
            screen: ScreenLayout::default(),
        }
    }

    #[test]
    fn clicking_outside_the_board_is_reported() {
        let mut state = state();
        let mut scene = state.scene(Instant::now());
        state.update(
            FrameInput {
                cursor_screen_space: Some(glam::Vec2::new(-10.0, -10.0)),
                confirm_action: true,
                ..FrameInput::default()
            },
            &mut scene,
        );
        assert_eq!(scene.hud.status, SceneStatus::Playing);
        assert_eq!(scene.hud.moves, 0);
        assert_eq!(scene.notifications, vec!["no cell there".to_owned()]);
    }

    #[test]
    fn restart_resets_the_board() {
        let mut state = state();
        let _ = state.absorb_events();
        let mut scene = state.scene(Instant::now());
        state.update(
            FrameInput {
                restart_action: true,
                ..FrameInput::default()
            },
            &mut scene,
        );
        assert_eq!(scene.hud.moves, 0);
        assert_eq!(scene.board.size, state.layout.size());
    }
}
