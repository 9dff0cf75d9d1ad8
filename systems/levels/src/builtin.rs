//! Built-in level content.

use std::time::Duration;

use island_merge_core::{CellCoord, GridSize, LevelLayout, Objective};

use crate::{Difficulty, LevelDefinition, LevelSet};

const fn grid(width: u32, height: u32) -> GridSize {
    match GridSize::new(width, height) {
        Ok(size) => size,
        Err(_) => panic!("built-in level dimensions must be positive"),
    }
}

const SMALL: GridSize = grid(5, 5);
const CORNERS: GridSize = grid(6, 6);
const CROSS: GridSize = grid(7, 7);
const CIRCLE: GridSize = grid(8, 8);
const SCATTERED: GridSize = grid(10, 10);
const MAZE: GridSize = grid(12, 12);
const DENSE: GridSize = grid(15, 15);
const WIDE: GridSize = grid(20, 20);
const CONTINENTAL: GridSize = grid(25, 25);

/// Every built-in level set in unlock order.
pub(crate) fn sets() -> Vec<LevelSet> {
    vec![
        LevelSet {
            name: "Island Basics".to_owned(),
            description: "Learn the fundamentals of island connecting".to_owned(),
            difficulty: Difficulty::Beginner,
            unlock_threshold: 0,
            levels: beginner(),
        },
        LevelSet {
            name: "Island Chains".to_owned(),
            description: "More complex island arrangements".to_owned(),
            difficulty: Difficulty::Intermediate,
            unlock_threshold: 3,
            levels: intermediate(),
        },
        LevelSet {
            name: "Island Archipelago".to_owned(),
            description: "Master the art of large-scale connecting".to_owned(),
            difficulty: Difficulty::Expert,
            unlock_threshold: 7,
            levels: expert(),
        },
        LevelSet {
            name: "Island Master".to_owned(),
            description: "Ultimate challenges for true masters".to_owned(),
            difficulty: Difficulty::Master,
            unlock_threshold: 9,
            levels: master(),
        },
    ]
}

fn level(
    id: &str,
    name: &str,
    description: &str,
    difficulty: Difficulty,
    layout: LevelLayout,
    optimal_moves: u32,
) -> LevelDefinition {
    LevelDefinition {
        id: id.to_owned(),
        name: name.to_owned(),
        description: description.to_owned(),
        difficulty,
        layout,
        optimal_moves,
        time_limit: None,
        objectives: vec![Objective::ConnectAll],
    }
}

fn timed(mut level: LevelDefinition, limit: Duration) -> LevelDefinition {
    level.time_limit = Some(limit);
    level.objectives.push(Objective::TimeLimit { limit });
    level
}

fn bridge_cap(mut level: LevelDefinition, target: u32) -> LevelDefinition {
    level.objectives.push(Objective::MinBridges { target });
    level
}

fn cells(points: &[(u32, u32)]) -> impl Iterator<Item = CellCoord> + '_ {
    points
        .iter()
        .map(|(column, row)| CellCoord::new(*column, *row))
}

/// Land cells marked with `1` in row strings; shorter rows are padded with sea.
fn rows(size: GridSize, pattern: &[&str]) -> LevelLayout {
    let land = pattern.iter().enumerate().flat_map(|(row, line)| {
        line.bytes()
            .enumerate()
            .filter(|(_, byte)| *byte == b'1')
            .filter_map(move |(column, _)| {
                Some(CellCoord::new(
                    u32::try_from(column).ok()?,
                    u32::try_from(row).ok()?,
                ))
            })
    });
    LevelLayout::with_land(size, land)
}

fn beginner() -> Vec<LevelDefinition> {
    vec![
        level(
            "beginner_01",
            "First Steps",
            "Connect three islands in a simple triangle",
            Difficulty::Beginner,
            LevelLayout::with_land(SMALL, cells(&[(1, 1), (3, 1), (2, 3)])),
            2,
        ),
        level(
            "beginner_02",
            "Four Corners",
            "Islands at each corner need connecting",
            Difficulty::Beginner,
            LevelLayout::with_land(CORNERS, cells(&[(0, 0), (5, 0), (0, 5), (5, 5)])),
            5,
        ),
        bridge_cap(
            level(
                "beginner_03",
                "Island Cross",
                "Connect islands arranged in a cross pattern",
                Difficulty::Beginner,
                LevelLayout::with_land(
                    CROSS,
                    cells(&[(3, 0), (0, 3), (3, 3), (6, 3), (3, 6)]),
                ),
                4,
            ),
            4,
        ),
        level(
            "beginner_04",
            "Island Circle",
            "Islands forming a circle - find the optimal path",
            Difficulty::Beginner,
            rows(
                CIRCLE,
                &[
                    "00011000", "", "01000010", "", "", "01000010", "", "00011000",
                ],
            ),
            6,
        ),
    ]
}

fn intermediate() -> Vec<LevelDefinition> {
    vec![
        timed(
            level(
                "intermediate_01",
                "Scattered Isles",
                "Many small islands scattered across the sea",
                Difficulty::Intermediate,
                rows(
                    SCATTERED,
                    &[
                        "1000000001",
                        "0001001000",
                        "",
                        "0100000010",
                        "0000110000",
                        "0000110000",
                        "0100000010",
                        "",
                        "0001001000",
                        "1000000001",
                    ],
                ),
                8,
            ),
            Duration::from_secs(180),
        ),
        bridge_cap(
            level(
                "intermediate_02",
                "Island Maze",
                "Navigate through a maze of islands",
                Difficulty::Intermediate,
                LevelLayout::with_land(
                    MAZE,
                    cells(&[
                        (1, 1),
                        (5, 1),
                        (10, 1),
                        (1, 5),
                        (5, 5),
                        (10, 5),
                        (1, 10),
                        (5, 10),
                        (10, 10),
                    ]),
                ),
                12,
            ),
            12,
        ),
        level(
            "intermediate_03",
            "Dense Archipelago",
            "Many islands clustered together",
            Difficulty::Intermediate,
            LevelLayout::with_land(
                DENSE,
                cells(&[
                    (2, 2),
                    (3, 2),
                    (2, 3),
                    (12, 2),
                    (13, 2),
                    (12, 3),
                    (7, 7),
                    (8, 7),
                    (7, 8),
                    (8, 8),
                    (2, 12),
                    (3, 12),
                    (2, 13),
                    (12, 12),
                    (13, 12),
                    (12, 13),
                ]),
            ),
            15,
        ),
    ]
}

fn expert() -> Vec<LevelDefinition> {
    vec![
        timed(
            level(
                "expert_01",
                "Spiral Galaxy",
                "Islands arranged in a vast spiral pattern",
                Difficulty::Expert,
                LevelLayout::with_land(WIDE, spiral(WIDE)),
                25,
            ),
            Duration::from_secs(300),
        ),
        bridge_cap(
            timed(
                level(
                    "expert_02",
                    "Continental Drift",
                    "The ultimate island connecting challenge",
                    Difficulty::Expert,
                    LevelLayout::with_land(CONTINENTAL, continents()),
                    35,
                ),
                Duration::from_secs(480),
            ),
            35,
        ),
    ]
}

fn master() -> Vec<LevelDefinition> {
    let mut symmetry = bridge_cap(
        level(
            "master_01",
            "Perfect Symmetry",
            "A perfectly symmetric island arrangement",
            Difficulty::Master,
            LevelLayout::with_land(WIDE, mirrored(WIDE)),
            18,
        ),
        18,
    );
    symmetry.time_limit = Some(Duration::from_secs(240));
    vec![symmetry]
}

/// Points along a slowly widening arc from the centre, two turns at 30 degree steps.
fn spiral(size: GridSize) -> Vec<CellCoord> {
    let center_column = size.width() / 2;
    let center_row = size.height() / 2;
    (0..720_u32)
        .step_by(30)
        .map(|angle| {
            let offset = (0.2 * f64::from(angle)).to_radians() as u32;
            CellCoord::new(center_column + offset, center_row + offset)
        })
        .collect()
}

/// Filled discs of land around a handful of continent centres.
fn continents() -> Vec<CellCoord> {
    const CENTRES: [(i64, i64, i64); 5] = [(6, 6, 3), (18, 6, 4), (6, 18, 3), (18, 18, 4), (12, 12, 2)];

    let mut land = Vec::new();
    for (column, row, radius) in CENTRES {
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let (Ok(x), Ok(y)) = (u32::try_from(column + dx), u32::try_from(row + dy)) else {
                    continue;
                };
                land.push(CellCoord::new(x, y));
            }
        }
    }
    land
}

/// Seed points reflected across both axes.
fn mirrored(size: GridSize) -> Vec<CellCoord> {
    const SEEDS: [(u32, u32); 5] = [(3, 3), (5, 2), (8, 4), (10, 7), (12, 3)];

    let last_column = size.width() - 1;
    let last_row = size.height() - 1;
    SEEDS
        .into_iter()
        .flat_map(|(column, row)| {
            [
                (column, row),
                (last_column.saturating_sub(column), last_row.saturating_sub(row)),
                (column, last_row.saturating_sub(row)),
                (last_column.saturating_sub(column), row),
            ]
        })
        .map(|(column, row)| CellCoord::new(column, row))
        .collect()
}
