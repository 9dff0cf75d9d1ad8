use std::time::{Duration, Instant};

use island_merge_core::{CellCoord, Command, Event, GameMode, LevelLayout};
use island_merge_system_scoring::{Outcome, ScoreRules, Scoring};
use island_merge_world::{apply, Board};

fn first_steps() -> LevelLayout {
    LevelLayout::from_flags(&[
        [0u8, 0, 0, 0, 0],
        [0, 1, 0, 1, 0],
        [0, 0, 0, 0, 0],
        [0, 0, 1, 0, 0],
        [0, 0, 0, 0, 0],
    ])
    .expect("valid layout")
}

fn loaded_board() -> Board {
    let layout = first_steps();
    let mut board = Board::new(layout.size());
    let mut events = Vec::new();
    apply(&mut board, Command::LoadLevel { layout }, &mut events);
    board
}

fn click(board: &mut Board, cell: CellCoord) -> Vec<Event> {
    let mut events = Vec::new();
    apply(board, Command::BuildBridge { cell }, &mut events);
    events
}

#[test]
fn optimal_solution_scores_two_moves_and_wins() {
    let start = Instant::now();
    let mut board = loaded_board();
    let mut scoring = Scoring::start(ScoreRules::for_mode(GameMode::Classic, None, Some(2)), start);
    let mut out = Vec::new();

    let first = click(&mut board, CellCoord::new(2, 1));
    scoring.handle(&first, start + Duration::from_secs(3), &mut out);
    assert!(out.is_empty(), "no outcome before the board is connected");

    let second = click(&mut board, CellCoord::new(2, 2));
    scoring.handle(&second, start + Duration::from_secs(7), &mut out);

    assert_eq!(scoring.moves(), 2);
    assert_eq!(scoring.outcome(), Outcome::Won);
    assert_eq!(
        out,
        vec![Event::GameWon {
            mode: GameMode::Classic,
            moves: 2,
            elapsed: Duration::from_secs(7),
            perfect: true,
        }]
    );
}

#[test]
fn rejected_builds_do_not_count_as_moves() {
    let start = Instant::now();
    let mut board = loaded_board();
    let mut scoring = Scoring::start(ScoreRules::for_mode(GameMode::Classic, None, None), start);
    let mut out = Vec::new();

    for cell in [
        CellCoord::new(2, 1),
        CellCoord::new(2, 1),
        CellCoord::new(0, 0),
        CellCoord::new(1, 1),
    ] {
        let events = click(&mut board, cell);
        scoring.handle(&events, start, &mut out);
    }

    assert_eq!(scoring.moves(), 1, "only the first build was accepted");
}

#[test]
fn elapsed_time_freezes_at_win() {
    let start = Instant::now();
    let mut scoring = Scoring::start(ScoreRules::for_mode(GameMode::Classic, None, None), start);
    let mut out = Vec::new();
    scoring.handle(&[Event::BoardConnected], start + Duration::from_secs(12), &mut out);

    assert_eq!(
        scoring.elapsed(start + Duration::from_secs(600)),
        Duration::from_secs(12),
        "elapsed must be read once at the moment of the win",
    );
    scoring.record_move();
    assert_eq!(scoring.moves(), 0, "moves are frozen after the game ends");
}

#[test]
fn time_attack_expires_once() {
    let start = Instant::now();
    let rules = ScoreRules::for_mode(GameMode::TimeAttack, Some(Duration::from_secs(30)), None);
    let mut scoring = Scoring::start(rules, start);
    let mut out = Vec::new();

    scoring.poll(start + Duration::from_secs(29), &mut out);
    assert!(out.is_empty());
    assert_eq!(
        scoring.remaining(start + Duration::from_secs(29)),
        Some(Duration::from_secs(1))
    );

    scoring.poll(start + Duration::from_secs(31), &mut out);
    scoring.poll(start + Duration::from_secs(45), &mut out);
    assert_eq!(
        out,
        vec![Event::GameTimedOut {
            moves: 0,
            elapsed: Duration::from_secs(31),
        }]
    );
    assert_eq!(scoring.outcome(), Outcome::TimedOut);
}

#[test]
fn expired_clock_beats_late_connection() {
    let start = Instant::now();
    let rules = ScoreRules::for_mode(GameMode::TimeAttack, Some(Duration::from_secs(10)), None);
    let mut scoring = Scoring::start(rules, start);
    let mut out = Vec::new();

    scoring.handle(
        &[
            Event::BridgeBuilt {
                cell: CellCoord::new(2, 2),
                merges: 2,
            },
            Event::BoardConnected,
        ],
        start + Duration::from_secs(11),
        &mut out,
    );

    assert_eq!(scoring.outcome(), Outcome::TimedOut);
    assert!(matches!(out.as_slice(), [Event::GameTimedOut { .. }]));
}

#[test]
fn best_records_survive_restart() {
    let start = Instant::now();
    let rules = ScoreRules::for_mode(GameMode::Classic, None, None);
    let mut scoring = Scoring::start(rules, start);
    let mut out = Vec::new();

    scoring.record_move();
    scoring.record_move();
    scoring.handle(&[Event::BoardConnected], start + Duration::from_secs(20), &mut out);

    let second_start = start + Duration::from_secs(60);
    scoring.restart(rules, second_start);
    assert_eq!(scoring.moves(), 0);
    assert_eq!(scoring.outcome(), Outcome::InProgress);

    for _ in 0..5 {
        scoring.record_move();
    }
    scoring.handle(&[Event::BoardConnected], second_start + Duration::from_secs(8), &mut out);

    let score = scoring.score(second_start + Duration::from_secs(8));
    assert_eq!(score.best_time, Some(Duration::from_secs(8)));
    assert_eq!(score.best_moves, Some(2));
}
