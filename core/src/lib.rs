#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Island Merge engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative board, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the board executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for the scoring
//! and progress systems to react to deterministically.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Describes the rules a game session is played under.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameMode {
    /// Untimed play; the level ends once every island is connected.
    #[default]
    Classic,
    /// Timed play; the level is lost when the clock runs out first.
    TimeAttack,
    /// Untimed play scored against the level's optimal move count.
    Puzzle,
}

impl GameMode {
    /// Stable lowercase name used by adapters and persisted settings.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Classic => "classic",
            Self::TimeAttack => "time-attack",
            Self::Puzzle => "puzzle",
        }
    }

    /// Parses the stable name produced by [`GameMode::name`].
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "classic" => Some(Self::Classic),
            "time-attack" => Some(Self::TimeAttack),
            "puzzle" => Some(Self::Puzzle),
            _ => None,
        }
    }
}

/// Commands that express all permissible board mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards the current board and allocates an all-sea grid of the given size.
    ResetBoard {
        /// Dimensions of the fresh grid.
        size: GridSize,
    },
    /// Replaces the board contents with the provided level layout.
    LoadLevel {
        /// Tile layout applied verbatim to a freshly reset board.
        layout: LevelLayout,
    },
    /// Requests that a sea tile be converted into a bridge.
    BuildBridge {
        /// Cell targeted by the build.
        cell: CellCoord,
    },
}

/// Events broadcast by the board and systems after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Announces that a level replaced the board contents.
    LevelLoaded {
        /// Dimensions of the loaded grid.
        size: GridSize,
        /// Number of land cells registered as islands.
        islands: u32,
        /// Number of disjoint land components the level starts with.
        components: u32,
    },
    /// Confirms that a bridge was built.
    BridgeBuilt {
        /// Cell converted into a bridge.
        cell: CellCoord,
        /// Number of distinct neighbouring components merged by the build.
        merges: u32,
    },
    /// Reports that a bridge request was rejected without mutating the board.
    BridgeRejected {
        /// Cell targeted by the rejected build.
        cell: CellCoord,
        /// Specific reason the build failed.
        reason: BuildError,
    },
    /// Announces that every island now belongs to a single component.
    BoardConnected,
    /// Announces that a new game started.
    GameStarted {
        /// Mode the game is played under.
        mode: GameMode,
    },
    /// Announces that the running game was won.
    GameWon {
        /// Mode the game was played under.
        mode: GameMode,
        /// Accepted moves at the moment of the win.
        moves: u32,
        /// Elapsed play time frozen at the moment of the win.
        elapsed: Duration,
        /// Whether the win used no more moves than the level's optimum.
        perfect: bool,
    },
    /// Announces that the time limit expired before the board was connected.
    GameTimedOut {
        /// Accepted moves at the moment of the timeout.
        moves: u32,
        /// Elapsed play time frozen at the moment of the timeout.
        elapsed: Duration,
    },
    /// Announces that a level was exported from the editor.
    LevelCreated,
    /// Announces that an achievement was unlocked.
    AchievementUnlocked {
        /// Identifier of the unlocked achievement.
        id: AchievementId,
    },
}

/// Reasons a bridge build may be rejected by the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum BuildError {
    /// The requested cell lies outside the grid.
    #[error("cell lies outside the grid")]
    OutOfBounds,
    /// The requested cell is not sea.
    #[error("only sea tiles can hold a bridge")]
    NotSea,
    /// No orthogonal neighbour of the cell is land or bridge.
    #[error("bridge must touch land or another bridge")]
    NoAdjacentLand,
}

/// Closed set of kinds a tile may take.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileKind {
    /// Void cell; neither buildable nor connective.
    Empty,
    /// Island cell.
    Land,
    /// Open water that can hold a bridge.
    #[default]
    Sea,
    /// Former sea cell converted by a build.
    Bridge,
    /// Inert blocker placed by level designers.
    Obstacle,
    /// Inert decorative cell placed by level designers.
    Special,
}

impl TileKind {
    /// Every tile kind ordered by its persisted code.
    pub const ALL: [TileKind; 6] = [
        TileKind::Empty,
        TileKind::Land,
        TileKind::Sea,
        TileKind::Bridge,
        TileKind::Obstacle,
        TileKind::Special,
    ];

    /// Integer code used by persisted board snapshots and level files.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Empty => 0,
            Self::Land => 1,
            Self::Sea => 2,
            Self::Bridge => 3,
            Self::Obstacle => 4,
            Self::Special => 5,
        }
    }

    /// Decodes a persisted tile code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Empty),
            1 => Some(Self::Land),
            2 => Some(Self::Sea),
            3 => Some(Self::Bridge),
            4 => Some(Self::Obstacle),
            5 => Some(Self::Special),
            _ => None,
        }
    }

    /// Reports whether the tile joins components, i.e. land or bridge.
    #[must_use]
    pub const fn is_connective(self) -> bool {
        matches!(self, Self::Land | Self::Bridge)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Dimensions of a rectangular grid, both at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    width: u32,
    height: u32,
}

impl GridSize {
    /// Single-cell grid.
    pub const MIN: Self = Self {
        width: 1,
        height: 1,
    };

    /// Creates a size descriptor, rejecting zero-area grids.
    pub const fn new(width: u32, height: u32) -> Result<Self, LayoutError> {
        if width == 0 || height == 0 {
            return Err(LayoutError::ZeroDimension { width, height });
        }
        Ok(Self { width, height })
    }

    /// Number of columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Number of rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Total number of cells in the grid.
    #[must_use]
    pub const fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Reports whether the cell lies inside the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.width && cell.row() < self.height
    }

    /// Row-major index of the cell, or `None` outside the grid.
    #[must_use]
    pub fn index_of(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }
        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.width).ok()?;
        Some(row * width + column)
    }

    /// Inverse of [`GridSize::index_of`].
    #[must_use]
    pub fn coord_of(&self, index: usize) -> Option<CellCoord> {
        if index >= self.cell_count() {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let column = u32::try_from(index % width).ok()?;
        let row = u32::try_from(index / width).ok()?;
        Some(CellCoord::new(column, row))
    }

    /// Orthogonal neighbours of the cell that lie inside the grid.
    ///
    /// Neighbours are yielded in north, east, south, west order.
    pub fn neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> {
        let mut candidates = [None; 4];
        let mut count = 0;

        if let Some(row) = cell.row().checked_sub(1) {
            candidates[count] = Some(CellCoord::new(cell.column(), row));
            count += 1;
        }

        if let Some(column) = cell.column().checked_add(1) {
            if column < self.width {
                candidates[count] = Some(CellCoord::new(column, cell.row()));
                count += 1;
            }
        }

        if let Some(row) = cell.row().checked_add(1) {
            if row < self.height {
                candidates[count] = Some(CellCoord::new(cell.column(), row));
                count += 1;
            }
        }

        if let Some(column) = cell.column().checked_sub(1) {
            candidates[count] = Some(CellCoord::new(column, cell.row()));
            count += 1;
        }

        candidates.into_iter().take(count).flatten()
    }
}

/// Rectangular tile layout supplied by level content or the editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelLayout {
    size: GridSize,
    tiles: Vec<TileKind>,
}

impl LevelLayout {
    /// Creates an all-sea layout.
    #[must_use]
    pub fn sea(size: GridSize) -> Self {
        Self {
            size,
            tiles: vec![TileKind::Sea; size.cell_count()],
        }
    }

    /// Builds an all-sea layout with land on the given cells.
    ///
    /// Cells outside the grid are skipped.
    #[must_use]
    pub fn with_land<I>(size: GridSize, cells: I) -> Self
    where
        I: IntoIterator<Item = CellCoord>,
    {
        let mut layout = Self::sea(size);
        for cell in cells {
            let _ = layout.set_tile(cell, TileKind::Land);
        }
        layout
    }

    /// Builds a layout from a row-major tile buffer.
    pub fn from_tiles(size: GridSize, tiles: Vec<TileKind>) -> Result<Self, LayoutError> {
        if tiles.len() != size.cell_count() {
            return Err(LayoutError::TileCountMismatch {
                expected: size.cell_count(),
                actual: tiles.len(),
            });
        }
        Ok(Self { size, tiles })
    }

    /// Builds a layout from rows of land flags, where non-zero marks land.
    pub fn from_flags<R>(rows: &[R]) -> Result<Self, LayoutError>
    where
        R: AsRef<[u8]>,
    {
        Self::from_rows(rows, |flag| {
            Some(if flag == 0 {
                TileKind::Sea
            } else {
                TileKind::Land
            })
        })
    }

    /// Builds a layout from rows of persisted tile codes.
    pub fn from_codes<R>(rows: &[R]) -> Result<Self, LayoutError>
    where
        R: AsRef<[u8]>,
    {
        Self::from_rows(rows, TileKind::from_code)
    }

    fn from_rows<R, F>(rows: &[R], mut decode: F) -> Result<Self, LayoutError>
    where
        R: AsRef<[u8]>,
        F: FnMut(u8) -> Option<TileKind>,
    {
        let height = u32::try_from(rows.len()).map_err(|_| LayoutError::TooLarge)?;
        let width = rows.first().map_or(0, |row| row.as_ref().len());
        let width = u32::try_from(width).map_err(|_| LayoutError::TooLarge)?;
        let size = GridSize::new(width, height)?;

        let mut tiles = Vec::with_capacity(size.cell_count());
        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width as usize {
                return Err(LayoutError::RaggedRow {
                    row: row_index,
                    expected: width as usize,
                    actual: row.len(),
                });
            }
            for &code in row {
                tiles.push(decode(code).ok_or(LayoutError::UnknownTile { code })?);
            }
        }

        Ok(Self { size, tiles })
    }

    /// Dimensions of the layout.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Row-major tile buffer.
    #[must_use]
    pub fn tiles(&self) -> &[TileKind] {
        &self.tiles
    }

    /// Tile at the provided cell, or `None` outside the layout.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<TileKind> {
        self.size
            .index_of(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Overwrites the tile at the cell. Returns `false` outside the layout.
    pub fn set_tile(&mut self, cell: CellCoord, kind: TileKind) -> bool {
        match self.size.index_of(cell) {
            Some(index) => {
                self.tiles[index] = kind;
                true
            }
            None => false,
        }
    }

    /// Cells holding land, in row-major order.
    pub fn land_cells(&self) -> impl Iterator<Item = CellCoord> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile == TileKind::Land)
            .filter_map(|(index, _)| self.size.coord_of(index))
    }

    /// Encodes the layout as rows of persisted tile codes.
    #[must_use]
    pub fn to_codes(&self) -> Vec<Vec<u8>> {
        self.tiles
            .chunks(self.size.width() as usize)
            .map(|row| row.iter().map(|tile| tile.code()).collect())
            .collect()
    }
}

/// Errors raised while constructing grid sizes and layouts.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// Width or height was zero.
    #[error("grid dimensions must be positive (received {width}x{height})")]
    ZeroDimension {
        /// Requested width.
        width: u32,
        /// Requested height.
        height: u32,
    },
    /// A row had a different length than the first row.
    #[error("row {row} has {actual} tiles, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Length of the first row.
        expected: usize,
        /// Length of the offending row.
        actual: usize,
    },
    /// The tile buffer did not match the grid area.
    #[error("layout holds {actual} tiles, expected {expected}")]
    TileCountMismatch {
        /// Number of cells implied by the size.
        expected: usize,
        /// Number of tiles provided.
        actual: usize,
    },
    /// A tile code did not map to a known kind.
    #[error("unknown tile code {code}")]
    UnknownTile {
        /// Offending code.
        code: u8,
    },
    /// The layout dimensions do not fit the coordinate space.
    #[error("layout dimensions exceed the coordinate range")]
    TooLarge,
}

/// Typed goal attached to a level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Objective {
    /// Every island must end up in a single component.
    ConnectAll,
    /// The level must be finished within the given number of bridges.
    MinBridges {
        /// Maximum number of bridges allowed.
        target: u32,
    },
    /// The level must be finished before the clock reaches the limit.
    TimeLimit {
        /// Allowed play time.
        limit: Duration,
    },
}

impl Objective {
    /// Human readable description of the goal.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::ConnectAll => "Connect all islands".to_owned(),
            Self::MinBridges { target } => format!("Use at most {target} bridges"),
            Self::TimeLimit { limit } => {
                format!("Complete within {} seconds", limit.as_secs())
            }
        }
    }
}

/// Stable identifiers for the fixed achievement set.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum AchievementId {
    /// Win a first game.
    FirstWin,
    /// Win a game in under thirty seconds.
    Speedrun,
    /// Win a game with the optimal move count.
    Efficient,
    /// Win several time-attack games.
    TimeAttackWin,
    /// Achieve several perfect games.
    PerfectGame,
    /// Build many bridges.
    BridgeBuilder,
    /// Win many games.
    IslandHopper,
    /// Export levels from the editor.
    LevelCreator,
    /// Play on consecutive days.
    Dedicated,
    /// Unlock every other achievement.
    Master,
}

impl AchievementId {
    /// Every achievement in ascending evaluation order.
    pub const ALL: [AchievementId; 10] = [
        AchievementId::FirstWin,
        AchievementId::Speedrun,
        AchievementId::Efficient,
        AchievementId::TimeAttackWin,
        AchievementId::PerfectGame,
        AchievementId::BridgeBuilder,
        AchievementId::IslandHopper,
        AchievementId::LevelCreator,
        AchievementId::Dedicated,
        AchievementId::Master,
    ];

    /// Reports whether this is the meta achievement tracking all others.
    #[must_use]
    pub const fn is_meta(self) -> bool {
        matches!(self, Self::Master)
    }
}
