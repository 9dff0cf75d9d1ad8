#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative board state management for Island Merge.

mod connectivity;
mod grid;
mod snapshot;

use island_merge_core::{BuildError, CellCoord, Command, Event, GridSize, LevelLayout, TileKind};
use log::debug;

pub use connectivity::Connectivity;
pub use grid::Grid;
pub use snapshot::{BoardSnapshot, SnapshotError};

/// Outcome of an accepted bridge build.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BridgeReport {
    /// Cell converted into a bridge.
    pub cell: CellCoord,
    /// Number of neighbouring components merged into the bridge's component.
    pub merges: u32,
}

/// Authoritative puzzle state layering bridge rules atop grid and connectivity.
///
/// The grid and the connectivity forest always share a lifetime: every path
/// that resizes or reloads the grid rebuilds the forest from scratch.
#[derive(Clone, Debug)]
pub struct Board {
    grid: Grid,
    connectivity: Connectivity,
    connective_cells: usize,
}

impl Board {
    /// Creates an all-sea board with no islands.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self {
            grid: Grid::new(size),
            connectivity: Connectivity::new(size.cell_count()),
            connective_cells: 0,
        }
    }

    /// Builds a board around an existing grid, deriving connectivity from adjacency.
    pub(crate) fn from_grid(grid: Grid) -> Self {
        let mut board = Self {
            connectivity: Connectivity::new(grid.size().cell_count()),
            grid,
            connective_cells: 0,
        };
        board.link_connective_cells();
        board
    }

    /// Discards every tile and merge, leaving an all-sea board of the given size.
    pub fn reset(&mut self, size: GridSize) {
        self.grid.reset_to(size);
        self.connectivity = Connectivity::new(size.cell_count());
        self.connective_cells = 0;
    }

    /// Replaces the board contents with the provided layout.
    ///
    /// Every non-sea tile is applied verbatim; land registers islands.
    /// Connectivity is rebuilt from scratch, so bridges from a previous level
    /// never carry over. Land cells touching each other start merged.
    pub fn load_level(&mut self, layout: &LevelLayout) {
        let size = layout.size();
        self.reset(size);

        for (index, tile) in layout.tiles().iter().enumerate() {
            if *tile == TileKind::Sea {
                continue;
            }
            if let Some(cell) = size.coord_of(index) {
                self.grid.set(cell, *tile);
            }
        }

        self.link_connective_cells();
        debug!(
            "loaded {}x{} level with {} islands in {} components",
            size.width(),
            size.height(),
            self.grid.islands().len(),
            self.component_count()
        );
    }

    fn link_connective_cells(&mut self) {
        let size = self.grid.size();
        self.connective_cells = 0;

        for index in 0..size.cell_count() {
            let Some(cell) = size.coord_of(index) else {
                continue;
            };
            if !self.grid.get(cell).is_some_and(TileKind::is_connective) {
                continue;
            }
            self.connective_cells += 1;

            let forward = [
                CellCoord::new(cell.column().saturating_add(1), cell.row()),
                CellCoord::new(cell.column(), cell.row().saturating_add(1)),
            ];
            for neighbor in forward {
                if neighbor == cell || !self.grid.get(neighbor).is_some_and(TileKind::is_connective)
                {
                    continue;
                }
                if let Some(neighbor_index) = size.index_of(neighbor) {
                    let _ = self.connectivity.union(index, neighbor_index);
                }
            }
        }
    }

    /// Dimensions of the board.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.grid.size()
    }

    /// Tile stored at the cell, or `None` outside the board.
    #[must_use]
    pub fn tile(&self, cell: CellCoord) -> Option<TileKind> {
        self.grid.get(cell)
    }

    /// Read-only access to the tile grid.
    #[must_use]
    pub const fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Read-only access to the connectivity forest.
    #[must_use]
    pub const fn connectivity(&self) -> &Connectivity {
        &self.connectivity
    }

    /// Validates a bridge build without mutating the board.
    pub fn check_bridge(&self, cell: CellCoord) -> Result<(), BuildError> {
        match self.grid.get(cell) {
            None => Err(BuildError::OutOfBounds),
            Some(TileKind::Sea) => {
                if self.grid.connective_neighbors(cell).next().is_some() {
                    Ok(())
                } else {
                    Err(BuildError::NoAdjacentLand)
                }
            }
            Some(_) => Err(BuildError::NotSea),
        }
    }

    /// Reports whether the cell is sea touching land or bridge orthogonally.
    #[must_use]
    pub fn can_build_bridge(&self, cell: CellCoord) -> bool {
        self.check_bridge(cell).is_ok()
    }

    /// Converts a sea cell into a bridge and merges it with every connective neighbour.
    ///
    /// Rejected builds leave the board untouched.
    pub fn build_bridge(&mut self, cell: CellCoord) -> Result<BridgeReport, BuildError> {
        self.check_bridge(cell)?;
        let index = self
            .grid
            .size()
            .index_of(cell)
            .ok_or(BuildError::OutOfBounds)?;

        self.grid.set(cell, TileKind::Bridge);
        self.connective_cells += 1;

        let neighbors: Vec<usize> = self
            .grid
            .connective_neighbors(cell)
            .filter_map(|neighbor| self.grid.size().index_of(neighbor))
            .collect();

        let mut merges = 0;
        for neighbor in neighbors {
            if self.connectivity.union(index, neighbor) {
                merges += 1;
            }
        }

        debug!(
            "bridge built at ({}, {}) merging {merges} components",
            cell.column(),
            cell.row()
        );
        Ok(BridgeReport { cell, merges })
    }

    /// Reports whether every island shares the first island's component.
    ///
    /// Boards with zero or one island are trivially connected.
    #[must_use]
    pub fn is_all_connected(&self) -> bool {
        let Some((&anchor, rest)) = self.grid.islands().split_first() else {
            return true;
        };
        rest.iter()
            .all(|island| self.connectivity.same_component(anchor, *island))
    }

    /// Number of disjoint land and bridge components on the board.
    ///
    /// Sea and inert cells never take part in a merge, so they stay singletons
    /// in the forest and are subtracted out.
    #[must_use]
    pub fn component_count(&self) -> usize {
        let inert = self.grid.size().cell_count() - self.connective_cells;
        self.connectivity.component_count() - inert
    }
}

/// Applies the provided command to the board, mutating state deterministically.
pub fn apply(board: &mut Board, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::ResetBoard { size } => {
            board.reset(size);
            out_events.push(level_loaded(board));
        }
        Command::LoadLevel { layout } => {
            board.load_level(&layout);
            out_events.push(level_loaded(board));
            if board.is_all_connected() {
                out_events.push(Event::BoardConnected);
            }
        }
        Command::BuildBridge { cell } => {
            let was_connected = board.is_all_connected();
            match board.build_bridge(cell) {
                Ok(report) => {
                    out_events.push(Event::BridgeBuilt {
                        cell: report.cell,
                        merges: report.merges,
                    });
                    if !was_connected && board.is_all_connected() {
                        out_events.push(Event::BoardConnected);
                    }
                }
                Err(reason) => out_events.push(Event::BridgeRejected { cell, reason }),
            }
        }
    }
}

fn level_loaded(board: &Board) -> Event {
    Event::LevelLoaded {
        size: board.size(),
        islands: saturating_u32(board.grid.islands().len()),
        components: saturating_u32(board.component_count()),
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}

/// Query functions that provide read-only access to the board state.
pub mod query {
    use std::collections::BTreeMap;

    use super::Board;
    use island_merge_core::{CellCoord, GridSize, TileKind};

    /// Tile stored at the cell, or `None` outside the board.
    #[must_use]
    pub fn tile(board: &Board, cell: CellCoord) -> Option<TileKind> {
        board.tile(cell)
    }

    /// Dimensions of the board.
    #[must_use]
    pub fn size(board: &Board) -> GridSize {
        board.size()
    }

    /// Registered island cells in registration order.
    #[must_use]
    pub fn islands(board: &Board) -> Vec<CellCoord> {
        let size = board.size();
        board
            .grid()
            .islands()
            .iter()
            .filter_map(|index| size.coord_of(*index))
            .collect()
    }

    /// Number of disjoint land and bridge components.
    #[must_use]
    pub fn component_count(board: &Board) -> usize {
        board.component_count()
    }

    /// Reports whether every island belongs to one component.
    #[must_use]
    pub fn is_all_connected(board: &Board) -> bool {
        board.is_all_connected()
    }

    /// Reports whether a bridge may be built at the cell.
    #[must_use]
    pub fn can_build_bridge(board: &Board, cell: CellCoord) -> bool {
        board.can_build_bridge(cell)
    }

    /// Cells currently accepting a bridge, in row-major order.
    #[must_use]
    pub fn buildable_cells(board: &Board) -> Vec<CellCoord> {
        let size = board.size();
        (0..size.cell_count())
            .filter_map(|index| size.coord_of(index))
            .filter(|cell| board.can_build_bridge(*cell))
            .collect()
    }

    /// Number of tiles per kind; kinds absent from the board are omitted.
    #[must_use]
    pub fn tile_counts(board: &Board) -> BTreeMap<TileKind, usize> {
        let mut counts = BTreeMap::new();
        for tile in board.grid().tiles() {
            *counts.entry(*tile).or_insert(0) += 1;
        }
        counts
    }

    /// Captures a read-only view suitable for presentation layers.
    #[must_use]
    pub fn board_view(board: &Board) -> BoardView<'_> {
        BoardView { board }
    }

    /// Borrowed, read-only view over a board used by renderers.
    #[derive(Clone, Copy, Debug)]
    pub struct BoardView<'a> {
        board: &'a Board,
    }

    impl<'a> BoardView<'a> {
        /// Dimensions of the viewed board.
        #[must_use]
        pub fn size(&self) -> GridSize {
            self.board.size()
        }

        /// Tile at the cell, or `None` outside the board.
        #[must_use]
        pub fn tile(&self, cell: CellCoord) -> Option<TileKind> {
            self.board.tile(cell)
        }

        /// Iterates over the rows of the board, top to bottom.
        pub fn rows(&self) -> impl Iterator<Item = &'a [TileKind]> + 'a {
            let width = self.board.size().width() as usize;
            self.board.grid().tiles().chunks(width)
        }

        /// Reports whether the viewed board is fully connected.
        #[must_use]
        pub fn is_all_connected(&self) -> bool {
            self.board.is_all_connected()
        }

        /// Number of disjoint land and bridge components.
        #[must_use]
        pub fn component_count(&self) -> usize {
            self.board.component_count()
        }
    }
}
