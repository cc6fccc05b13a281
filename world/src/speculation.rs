//! Scoped, reversible obstacle placement.

use std::ops::Deref;

use tracing::trace;
use wave_defence_core::{CellCoord, CellState};

use crate::Grid;

/// Grid borrow with one cell temporarily turned into an obstacle.
///
/// Only read access to the grid is exposed while the guard lives. Dropping
/// the guard writes the recorded state back, including during unwinding.
#[derive(Debug)]
pub struct SpeculativeObstacle<'grid> {
    grid: &'grid mut Grid,
    cell: CellCoord,
    index: usize,
    original: CellState,
}

impl<'grid> SpeculativeObstacle<'grid> {
    pub(crate) fn begin(grid: &'grid mut Grid, cell: CellCoord, index: usize) -> Self {
        let original = grid.replace(index, CellState::Obstacle);
        Self {
            grid,
            cell,
            index,
            original,
        }
    }

    /// Cell that is temporarily blocked.
    #[must_use]
    pub const fn cell(&self) -> CellCoord {
        self.cell
    }

    /// State the cell returns to when the guard is dropped.
    #[must_use]
    pub const fn original(&self) -> CellState {
        self.original
    }
}

impl Deref for SpeculativeObstacle<'_> {
    type Target = Grid;

    fn deref(&self) -> &Grid {
        self.grid
    }
}

impl Drop for SpeculativeObstacle<'_> {
    fn drop(&mut self) {
        let _ = self.grid.replace(self.index, self.original);
        trace!(
            column = self.cell.column(),
            row = self.cell.row(),
            "speculative obstacle reverted"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{self, AssertUnwindSafe};

    use glam::Vec2;
    use wave_defence_core::{CellCoord, CellState};

    use crate::Grid;

    fn grid() -> Grid {
        Grid::with_origin(4, 4, 1.0, Vec2::ZERO).expect("valid grid")
    }

    #[test]
    fn guard_blocks_cell_while_alive() {
        let mut grid = grid();
        let cell = CellCoord::new(2, 1);
        {
            let guard = grid.speculate(cell).expect("empty cell");
            assert_eq!(guard.cell(), cell);
            assert_eq!(guard.original(), CellState::Empty);
            assert_eq!(guard.cell_state(cell), Some(CellState::Obstacle));
            assert!(!guard.is_walkable(cell));
        }
        assert_eq!(grid.cell_state(cell), Some(CellState::Empty));
    }

    #[test]
    fn guard_refuses_non_empty_cells() {
        let mut grid = grid();
        let protected = CellCoord::new(0, 0);
        let blocked = CellCoord::new(1, 0);
        assert!(grid.mark_protected(protected));
        assert!(grid.set_obstacle(blocked));

        assert!(grid.speculate(protected).is_none());
        assert!(grid.speculate(blocked).is_none());
        assert!(grid.speculate(CellCoord::new(4, 0)).is_none());
    }

    #[test]
    fn guard_reverts_when_scope_unwinds() {
        let mut grid = grid();
        let before = grid.clone();
        let cell = CellCoord::new(3, 3);

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            let guard = grid.speculate(cell).expect("empty cell");
            assert!(!guard.is_walkable(cell));
            panic!("reachability check failed partway");
        }));

        assert!(outcome.is_err());
        assert_eq!(grid, before);
    }
}
