//! Dense tile storage and the island registry.

use island_merge_core::{CellCoord, GridSize, TileKind};

/// Rectangular tile array stored row-major in a single buffer.
///
/// The grid also keeps the island registry: the ordered list of cell indices
/// currently holding land. Registration happens as land is written, so the
/// first registered island is the oldest surviving land cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    size: GridSize,
    tiles: Vec<TileKind>,
    islands: Vec<usize>,
}

impl Grid {
    /// Creates an all-sea grid with an empty island registry.
    #[must_use]
    pub fn new(size: GridSize) -> Self {
        Self {
            size,
            tiles: vec![TileKind::Sea; size.cell_count()],
            islands: Vec::new(),
        }
    }

    pub(crate) fn from_parts(size: GridSize, tiles: Vec<TileKind>, islands: Vec<usize>) -> Self {
        Self {
            size,
            tiles,
            islands,
        }
    }

    /// Dimensions of the grid.
    #[must_use]
    pub const fn size(&self) -> GridSize {
        self.size
    }

    /// Tile stored at the cell, or `None` outside the grid.
    #[must_use]
    pub fn get(&self, cell: CellCoord) -> Option<TileKind> {
        self.size
            .index_of(cell)
            .and_then(|index| self.tiles.get(index).copied())
    }

    /// Writes a tile. Out-of-range cells are ignored.
    ///
    /// Writing land registers the cell as an island unless it already holds
    /// land; overwriting land with any other kind unregisters it.
    pub fn set(&mut self, cell: CellCoord, kind: TileKind) {
        let Some(index) = self.size.index_of(cell) else {
            return;
        };
        let Some(slot) = self.tiles.get_mut(index) else {
            return;
        };

        let previous = std::mem::replace(slot, kind);
        match (previous == TileKind::Land, kind == TileKind::Land) {
            (false, true) => self.islands.push(index),
            (true, false) => self.islands.retain(|island| *island != index),
            _ => {}
        }
    }

    /// Reallocates the grid as all sea and clears the island registry.
    pub fn reset_to(&mut self, size: GridSize) {
        self.size = size;
        self.tiles.clear();
        self.tiles.resize(size.cell_count(), TileKind::Sea);
        self.islands.clear();
    }

    /// Registered island cell indices in registration order.
    #[must_use]
    pub fn islands(&self) -> &[usize] {
        &self.islands
    }

    /// Row-major tile buffer.
    #[must_use]
    pub fn tiles(&self) -> &[TileKind] {
        &self.tiles
    }

    /// Number of tiles of the given kind.
    #[must_use]
    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|tile| **tile == kind).count()
    }

    /// Orthogonal in-bounds neighbours that are land or bridge.
    pub fn connective_neighbors(&self, cell: CellCoord) -> impl Iterator<Item = CellCoord> + '_ {
        self.size
            .neighbors(cell)
            .filter(|neighbor| self.get(*neighbor).is_some_and(TileKind::is_connective))
    }
}

#[cfg(test)]
mod tests {
    use super::Grid;
    use island_merge_core::{CellCoord, GridSize, TileKind};

    fn grid(width: u32, height: u32) -> Grid {
        Grid::new(GridSize::new(width, height).expect("valid size"))
    }

    #[test]
    fn out_of_range_reads_are_none() {
        let grid = grid(3, 2);
        assert_eq!(grid.get(CellCoord::new(2, 1)), Some(TileKind::Sea));
        assert_eq!(grid.get(CellCoord::new(3, 0)), None);
        assert_eq!(grid.get(CellCoord::new(0, 2)), None);
    }

    #[test]
    fn out_of_range_writes_are_ignored() {
        let mut grid = grid(2, 2);
        let before = grid.clone();
        grid.set(CellCoord::new(5, 5), TileKind::Land);
        assert_eq!(grid, before);
    }

    #[test]
    fn land_registers_islands_once() {
        let mut grid = grid(4, 4);
        grid.set(CellCoord::new(1, 1), TileKind::Land);
        grid.set(CellCoord::new(1, 1), TileKind::Land);
        grid.set(CellCoord::new(3, 0), TileKind::Land);
        assert_eq!(grid.islands(), &[5, 3]);

        grid.set(CellCoord::new(1, 1), TileKind::Sea);
        assert_eq!(grid.islands(), &[3]);
    }

    #[test]
    fn reset_restores_sea_and_clears_registry() {
        let mut grid = grid(2, 2);
        grid.set(CellCoord::new(0, 0), TileKind::Land);
        grid.reset_to(GridSize::new(3, 1).expect("valid size"));

        assert_eq!(grid.tiles(), &[TileKind::Sea; 3]);
        assert!(grid.islands().is_empty());
        assert_eq!(grid.count(TileKind::Sea), 3);
    }

    #[test]
    fn connective_neighbors_skip_inert_tiles() {
        let mut grid = grid(3, 3);
        grid.set(CellCoord::new(1, 0), TileKind::Land);
        grid.set(CellCoord::new(2, 1), TileKind::Bridge);
        grid.set(CellCoord::new(1, 2), TileKind::Obstacle);

        let neighbors: Vec<_> = grid.connective_neighbors(CellCoord::new(1, 1)).collect();
        assert_eq!(neighbors, vec![CellCoord::new(1, 0), CellCoord::new(2, 1)]);
    }
}
