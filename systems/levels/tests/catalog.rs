use std::time::Duration;

use chrono::Utc;
use island_merge_core::{CellCoord, Objective};
use island_merge_system_levels::{Difficulty, LevelCatalog, LevelRecords, LevelScore};
use island_merge_world::Board;

#[test]
fn builtin_catalog_opens_with_first_level_only() {
    let catalog = LevelCatalog::builtin();
    let names: Vec<_> = catalog.sets().iter().map(|set| set.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Island Basics",
            "Island Chains",
            "Island Archipelago",
            "Island Master"
        ]
    );
    assert_eq!(catalog.levels().count(), 10);
    assert!(catalog.is_unlocked("beginner_01"));
    assert!(!catalog.is_unlocked("beginner_02"));
    assert!(!catalog.is_unlocked("intermediate_01"));
}

#[test]
fn builtin_levels_have_expected_shapes() {
    let catalog = LevelCatalog::builtin();
    let expectations = [
        ("beginner_01", 5, 3, 2),
        ("beginner_02", 6, 4, 5),
        ("beginner_03", 7, 5, 4),
        ("beginner_04", 8, 8, 6),
        ("intermediate_01", 10, 16, 8),
        ("intermediate_02", 12, 9, 12),
        ("intermediate_03", 15, 16, 15),
    ];

    for (id, side, land, optimal) in expectations {
        let level = catalog.level(id).expect("built-in level");
        assert_eq!(level.layout.size().width(), side, "{id} width");
        assert_eq!(level.layout.size().height(), side, "{id} height");
        assert_eq!(level.layout.land_cells().count(), land, "{id} land count");
        assert_eq!(level.optimal_moves, optimal, "{id} optimum");
        assert_eq!(level.objectives.first(), Some(&Objective::ConnectAll));
    }

    let scattered = catalog.level("intermediate_01").expect("built-in level");
    assert_eq!(scattered.time_limit, Some(Duration::from_secs(180)));
    assert_eq!(scattered.difficulty, Difficulty::Intermediate);
    let cross = catalog.level("beginner_03").expect("built-in level");
    assert!(cross
        .objectives
        .contains(&Objective::MinBridges { target: 4 }));
}

#[test]
fn first_level_solves_in_optimal_moves() {
    let catalog = LevelCatalog::builtin();
    let level = catalog.level("beginner_01").expect("built-in level");
    let mut board = Board::new(level.layout.size());
    board.load_level(&level.layout);

    for cell in [CellCoord::new(2, 1), CellCoord::new(2, 2)] {
        assert!(board.build_bridge(cell).is_ok());
    }
    assert!(board.is_all_connected());
}

#[test]
fn completion_unlocks_next_level_and_sets() {
    let mut catalog = LevelCatalog::builtin();

    assert_eq!(catalog.complete("beginner_01"), vec!["beginner_02".to_owned()]);
    assert_eq!(catalog.complete("beginner_02"), vec!["beginner_03".to_owned()]);
    assert_eq!(
        catalog.complete("beginner_03"),
        vec!["beginner_04".to_owned(), "intermediate_01".to_owned()],
        "third completion opens the intermediate set",
    );
    assert!(catalog.complete("beginner_03").is_empty());
    assert_eq!(catalog.completed_count(), 3);
    assert!(catalog.complete("no_such_level").is_empty());
}

#[test]
fn every_set_is_reachable() {
    let mut catalog = LevelCatalog::builtin();
    let order: Vec<String> = catalog.levels().map(|level| level.id.clone()).collect();
    for id in &order {
        assert!(catalog.is_unlocked(id), "{id} should be open by now");
        let _ = catalog.complete(id);
    }
    assert_eq!(catalog.completed_count(), order.len());
}

#[test]
fn best_scores_only_improve() {
    let mut catalog = LevelCatalog::builtin();
    let score = |moves, secs, stars| LevelScore {
        moves,
        time: Duration::from_secs(secs),
        stars,
        date: Utc::now(),
    };

    assert!(catalog.record_best("beginner_01", score(4, 30, 2)));
    assert!(!catalog.record_best("beginner_01", score(5, 20, 1)));
    assert!(catalog.record_best("beginner_01", score(2, 40, 3)));
    assert_eq!(catalog.best("beginner_01").map(|best| best.moves), Some(2));
    assert!(!catalog.record_best("unknown", score(1, 1, 3)));
}

#[test]
fn records_survive_json_and_keep_first_level_open() {
    let mut catalog = LevelCatalog::builtin();
    let _ = catalog.complete("beginner_01");
    let encoded = serde_json::to_string(catalog.records()).expect("serialize");
    let decoded: LevelRecords = serde_json::from_str(&encoded).expect("deserialize");

    let mut restored = LevelCatalog::builtin();
    restored.restore(decoded);
    assert!(restored.is_completed("beginner_01"));
    assert!(restored.is_unlocked("beginner_02"));

    restored.restore(LevelRecords::default());
    assert!(restored.is_unlocked("beginner_01"));
}
