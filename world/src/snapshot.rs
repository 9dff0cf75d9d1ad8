//! Serializable board snapshots used by save files.

use island_merge_core::{GridSize, LayoutError, TileKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Board, Grid};

/// Plain-data capture of a board: dimensions, tile codes, and island registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardSnapshot {
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
    /// Tile codes, one inner vector per row.
    pub tiles: Vec<Vec<u8>>,
    /// Island registry as row-major cell indices in registration order.
    pub islands: Vec<usize>,
}

/// Errors raised while restoring a board from a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Recorded dimensions were invalid.
    #[error("snapshot dimensions are invalid: {0}")]
    Layout(#[from] LayoutError),
    /// The tile rows did not match the recorded dimensions.
    #[error("snapshot holds {actual} tiles, expected {expected}")]
    TileCount {
        /// Number of cells implied by the dimensions.
        expected: usize,
        /// Number of tiles present.
        actual: usize,
    },
    /// A tile code did not map to a known kind.
    #[error("snapshot contains unknown tile code {code}")]
    UnknownTile {
        /// Offending code.
        code: u8,
    },
    /// An island index did not point at a land tile.
    #[error("island index {index} does not refer to land")]
    StrayIsland {
        /// Offending cell index.
        index: usize,
    },
}

impl BoardSnapshot {
    /// Captures the board's tiles and island registry.
    #[must_use]
    pub fn capture(board: &Board) -> Self {
        let size = board.size();
        let width = size.width() as usize;
        Self {
            width: size.width(),
            height: size.height(),
            tiles: board
                .grid()
                .tiles()
                .chunks(width)
                .map(|row| row.iter().map(|tile| tile.code()).collect())
                .collect(),
            islands: board.grid().islands().to_vec(),
        }
    }

    /// Rebuilds a board from the snapshot.
    ///
    /// Connectivity is not persisted; it is derived again from adjacency of
    /// land and bridge tiles, which yields the same partition the board had
    /// when captured.
    pub fn restore(&self) -> Result<Board, SnapshotError> {
        let size = GridSize::new(self.width, self.height)?;

        let row_mismatch = self.tiles.len() != self.height as usize
            || self.tiles.iter().any(|row| row.len() != self.width as usize);
        if row_mismatch {
            return Err(SnapshotError::TileCount {
                expected: size.cell_count(),
                actual: self.tiles.iter().map(Vec::len).sum(),
            });
        }

        let tiles = self
            .tiles
            .iter()
            .flatten()
            .map(|&code| TileKind::from_code(code).ok_or(SnapshotError::UnknownTile { code }))
            .collect::<Result<Vec<_>, _>>()?;

        for &index in &self.islands {
            if tiles.get(index) != Some(&TileKind::Land) {
                return Err(SnapshotError::StrayIsland { index });
            }
        }

        let grid = Grid::from_parts(size, tiles, self.islands.clone());
        Ok(Board::from_grid(grid))
    }
}
