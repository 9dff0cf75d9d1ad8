use island_merge_core::{CellCoord, Command, Event, GridSize, LevelLayout, TileKind};
use island_merge_world::{apply, query, Board};

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

fn loaded(layout: LevelLayout) -> Board {
    let mut board = Board::new(layout.size());
    let mut events = Vec::new();
    apply(&mut board, Command::LoadLevel { layout }, &mut events);
    board
}

#[test]
fn optimal_path_connects_first_level_in_two_moves() {
    let mut board = loaded(first_steps());
    assert_eq!(query::component_count(&board), 3);
    assert!(!query::is_all_connected(&board));

    let mut moves = 0;
    let mut merges = 0;
    for cell in [CellCoord::new(2, 1), CellCoord::new(2, 2)] {
        let before = board.connectivity().component_count();
        let report = board.build_bridge(cell).expect("optimal move is legal");
        moves += 1;
        merges += report.merges;
        assert_eq!(
            before - board.connectivity().component_count(),
            report.merges as usize,
            "raw component count must drop by exactly the merges performed",
        );
    }

    assert_eq!(moves, 2);
    assert_eq!(merges, 4, "each bridge absorbs two neighbouring components");
    assert!(query::is_all_connected(&board));
    assert_eq!(query::component_count(&board), 1);
}

#[test]
fn second_build_on_same_cell_is_a_no_op() {
    let mut board = loaded(first_steps());
    let cell = CellCoord::new(2, 1);
    assert!(board.build_bridge(cell).is_ok());

    let counts = query::tile_counts(&board);
    let components = board.connectivity().component_count();
    let mut events = Vec::new();
    apply(&mut board, Command::BuildBridge { cell }, &mut events);

    assert!(
        matches!(events.as_slice(), [Event::BridgeRejected { .. }]),
        "repeat build should be rejected, got {events:?}",
    );
    assert_eq!(query::tile_counts(&board), counts);
    assert_eq!(board.connectivity().component_count(), components);
    assert!(!query::can_build_bridge(&board, cell));
}

#[test]
fn rejected_builds_never_change_tiles_or_components() {
    let mut board = loaded(
        LevelLayout::from_codes(&[[1u8, 2, 4, 2], [2, 2, 5, 1], [0, 2, 2, 2]])
            .expect("valid layout"),
    );
    let size = board.size();

    for index in 0..size.cell_count() {
        let cell = size.coord_of(index).expect("index in range");
        if query::can_build_bridge(&board, cell) {
            continue;
        }
        let counts = query::tile_counts(&board);
        let components = query::component_count(&board);
        assert!(board.build_bridge(cell).is_err());
        assert_eq!(query::tile_counts(&board), counts, "tiles changed at {cell:?}");
        assert_eq!(query::component_count(&board), components);
    }

    assert!(board.build_bridge(CellCoord::new(9, 9)).is_err());
}

#[test]
fn can_build_matches_sea_with_connective_neighbour() {
    let board = {
        let mut board = loaded(
            LevelLayout::from_codes(&[
                [2u8, 1, 2, 2, 0],
                [2, 2, 4, 2, 2],
                [1, 2, 2, 5, 2],
                [2, 2, 1, 2, 2],
            ])
            .expect("valid layout"),
        );
        let _ = board
            .build_bridge(CellCoord::new(1, 2))
            .expect("sea next to land");
        board
    };
    let size = board.size();

    for index in 0..size.cell_count() {
        let cell = size.coord_of(index).expect("index in range");
        let expected = query::tile(&board, cell) == Some(TileKind::Sea)
            && size
                .neighbors(cell)
                .any(|neighbor| query::tile(&board, neighbor).is_some_and(TileKind::is_connective));
        assert_eq!(
            query::can_build_bridge(&board, cell),
            expected,
            "buildability mismatch at {cell:?}",
        );
    }

    let buildable = query::buildable_cells(&board);
    assert!(buildable.contains(&CellCoord::new(0, 0)));
    assert!(!buildable.contains(&CellCoord::new(4, 0)));
}

#[test]
fn loading_new_level_discards_prior_bridges() {
    let mut board = loaded(first_steps());
    let _ = board
        .build_bridge(CellCoord::new(2, 1))
        .expect("legal move");
    let _ = board
        .build_bridge(CellCoord::new(2, 2))
        .expect("legal move");
    assert!(board.is_all_connected());

    let corners = LevelLayout::from_flags(&[
        [1u8, 0, 0, 0, 0, 1],
        [0, 0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0, 0],
        [0, 0, 0, 0, 0, 0],
        [1, 0, 0, 0, 0, 1],
    ])
    .expect("valid layout");
    let mut events = Vec::new();
    apply(&mut board, Command::LoadLevel { layout: corners }, &mut events);

    assert_eq!(
        events,
        vec![Event::LevelLoaded {
            size: GridSize::new(6, 6).expect("valid size"),
            islands: 4,
            components: 4,
        }]
    );
    assert_eq!(query::component_count(&board), 4);
    assert!(!query::tile_counts(&board).contains_key(&TileKind::Bridge));
    assert!(!query::is_all_connected(&board));
    assert_eq!(
        query::islands(&board),
        vec![
            CellCoord::new(0, 0),
            CellCoord::new(5, 0),
            CellCoord::new(0, 5),
            CellCoord::new(5, 5)
        ]
    );
}

#[test]
fn zero_or_one_island_is_trivially_connected() {
    for (width, height) in [(1, 1), (3, 7), (12, 2)] {
        let size = GridSize::new(width, height).expect("valid size");
        let mut board = Board::new(size);
        assert!(query::is_all_connected(&board));

        let mut layout = vec![vec![0u8; width as usize]; height as usize];
        layout[height as usize - 1][width as usize - 1] = 1;
        board.load_level(&LevelLayout::from_flags(&layout).expect("valid layout"));
        assert!(query::is_all_connected(&board));
    }
}

#[test]
fn reset_command_clears_board() {
    let mut board = loaded(first_steps());
    let size = GridSize::new(3, 2).expect("valid size");
    let mut events = Vec::new();
    apply(&mut board, Command::ResetBoard { size }, &mut events);

    assert_eq!(
        events,
        vec![Event::LevelLoaded {
            size,
            islands: 0,
            components: 0,
        }]
    );
    assert_eq!(board.connectivity().len(), 6);
    assert_eq!(query::tile_counts(&board).get(&TileKind::Sea), Some(&6));
}

#[test]
fn board_view_exposes_rows() {
    let board = loaded(first_steps());
    let view = query::board_view(&board);
    let rows: Vec<_> = view.rows().collect();
    assert_eq!(rows.len(), 5);
    assert_eq!(rows[1][1], TileKind::Land);
    assert_eq!(rows[3][2], TileKind::Land);
    assert_eq!(view.component_count(), 3);
}
