#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative grid state for Wave Defence.
//!
//! The [`Grid`] owns the cell classifications every other system reads. It is
//! passed around explicitly by reference; there is no ambient instance.
//! Mutations are limited to obstacle placement and removal plus the
//! protected-zone designation performed during level setup.

mod speculation;

use glam::Vec2;
use tracing::trace;
use wave_defence_core::{CellCoord, CellRect, CellState, GridError};

pub use speculation::SpeculativeObstacle;

/// Fixed-size 2D array of cell classifications.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    columns: u32,
    rows: u32,
    cell_size: f32,
    origin: Vec2,
    cells: Vec<CellState>,
}

impl Grid {
    /// Creates an empty grid centred on the world origin.
    pub fn new(columns: u32, rows: u32, cell_size: f32) -> Result<Self, GridError> {
        let origin = Vec2::new(
            -(columns as f32 * cell_size) / 2.0,
            -(rows as f32 * cell_size) / 2.0,
        );
        Self::with_origin(columns, rows, cell_size, origin)
    }

    /// Creates an empty grid whose top-left corner sits at `origin`.
    pub fn with_origin(
        columns: u32,
        rows: u32,
        cell_size: f32,
        origin: Vec2,
    ) -> Result<Self, GridError> {
        if columns == 0 || rows == 0 {
            return Err(GridError::EmptyDimensions { columns, rows });
        }

        if !cell_size.is_finite() || cell_size <= 0.0 {
            return Err(GridError::InvalidCellSize(cell_size));
        }

        if !origin.is_finite() {
            return Err(GridError::InvalidOrigin(origin));
        }

        let extent = Vec2::new(columns as f32, rows as f32) * cell_size;
        if !(origin + extent).is_finite() {
            return Err(GridError::UnboundedExtent { columns, rows });
        }

        let capacity = usize::try_from(u64::from(columns) * u64::from(rows))
            .map_err(|_| GridError::TooLarge { columns, rows })?;

        Ok(Self {
            columns,
            rows,
            cell_size,
            origin,
            cells: vec![CellState::Empty; capacity],
        })
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Provides the `(columns, rows)` dimensions of the grid.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.columns, self.rows)
    }

    /// Side length of a single square cell expressed in world units.
    #[must_use]
    pub const fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// World position of the top-left corner of cell `(0, 0)`.
    #[must_use]
    pub const fn origin(&self) -> Vec2 {
        self.origin
    }

    /// Dense cell states stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Iterates every cell together with its state in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, CellState)> + '_ {
        let columns = self.columns;
        self.cells.iter().enumerate().map(move |(index, state)| {
            let index = index as u64;
            let column = (index % u64::from(columns)) as u32;
            let row = (index / u64::from(columns)) as u32;
            (CellCoord::new(column, row), *state)
        })
    }

    /// Reports whether the cell lies within the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// Converts signed search coordinates into a cell, if in bounds.
    #[must_use]
    pub fn cell_at(&self, x: i64, y: i64) -> Option<CellCoord> {
        let column = u32::try_from(x).ok()?;
        let row = u32::try_from(y).ok()?;
        let cell = CellCoord::new(column, row);
        self.contains(cell).then_some(cell)
    }

    /// State of the cell, or `None` when it lies outside the grid.
    #[must_use]
    pub fn cell_state(&self, cell: CellCoord) -> Option<CellState> {
        self.index(cell).map(|index| self.cells[index])
    }

    /// Reports whether agents may stand on the cell.
    ///
    /// Cells outside the grid are never walkable.
    #[must_use]
    pub fn is_walkable(&self, cell: CellCoord) -> bool {
        self.cell_state(cell).is_some_and(CellState::is_walkable)
    }

    /// Places an obstacle on an empty cell.
    ///
    /// Returns `false` without changing anything when the cell is out of
    /// bounds, protected, or already blocked.
    pub fn set_obstacle(&mut self, cell: CellCoord) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };

        match self.cells[index] {
            CellState::Empty => {
                self.cells[index] = CellState::Obstacle;
                trace!(column = cell.column(), row = cell.row(), "obstacle placed");
                true
            }
            CellState::Obstacle | CellState::ProtectedZone => false,
        }
    }

    /// Removes an obstacle, returning whether the cell changed.
    pub fn clear_obstacle(&mut self, cell: CellCoord) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };

        match self.cells[index] {
            CellState::Obstacle => {
                self.cells[index] = CellState::Empty;
                trace!(column = cell.column(), row = cell.row(), "obstacle cleared");
                true
            }
            CellState::Empty | CellState::ProtectedZone => false,
        }
    }

    /// Designates a cell as part of a protected zone during level setup.
    ///
    /// Any obstacle on the cell is replaced.
    pub fn mark_protected(&mut self, cell: CellCoord) -> bool {
        let Some(index) = self.index(cell) else {
            return false;
        };

        let changed = self.cells[index] != CellState::ProtectedZone;
        self.cells[index] = CellState::ProtectedZone;
        changed
    }

    /// Designates every in-bounds cell of the rectangle as protected.
    ///
    /// Returns the number of cells that changed.
    pub fn mark_protected_rect(&mut self, rect: CellRect) -> usize {
        rect.cells().filter(|cell| self.mark_protected(*cell)).count()
    }

    /// Walkable cells on the outer ring of the grid in row-major order.
    #[must_use]
    pub fn boundary_cells(&self) -> Vec<CellCoord> {
        self.iter()
            .filter(|(cell, state)| {
                state.is_walkable()
                    && (cell.column() == 0
                        || cell.row() == 0
                        || cell.column() + 1 == self.columns
                        || cell.row() + 1 == self.rows)
            })
            .map(|(cell, _)| cell)
            .collect()
    }

    /// Protected-zone cells in row-major order.
    #[must_use]
    pub fn protected_cells(&self) -> Vec<CellCoord> {
        self.iter()
            .filter(|(_, state)| *state == CellState::ProtectedZone)
            .map(|(cell, _)| cell)
            .collect()
    }

    /// Number of cells currently holding an obstacle.
    #[must_use]
    pub fn obstacle_count(&self) -> usize {
        self.cells
            .iter()
            .filter(|state| **state == CellState::Obstacle)
            .count()
    }

    /// World position of the centre of the cell.
    ///
    /// Coordinates beyond the grid extrapolate along the same lattice, which
    /// lets callers place virtual exits one cell past an edge.
    #[must_use]
    pub fn grid_to_world(&self, cell: CellCoord) -> Vec2 {
        self.origin
            + Vec2::new(
                (cell.column() as f32 + 0.5) * self.cell_size,
                (cell.row() as f32 + 0.5) * self.cell_size,
            )
    }

    /// Cell containing the world position, or `None` outside the grid.
    #[must_use]
    pub fn world_to_grid(&self, position: Vec2) -> Option<CellCoord> {
        let local = (position - self.origin) / self.cell_size;
        if !local.is_finite() || local.x < 0.0 || local.y < 0.0 {
            return None;
        }

        let column = local.x.floor();
        let row = local.y.floor();
        if column >= self.columns as f32 || row >= self.rows as f32 {
            return None;
        }

        Some(CellCoord::new(column as u32, row as u32))
    }

    /// Temporarily blocks an empty cell.
    ///
    /// The returned guard restores the cell's recorded state when it is
    /// dropped, whichever way the caller leaves its scope. Returns `None`
    /// when the cell is out of bounds or not currently empty.
    pub fn speculate(&mut self, cell: CellCoord) -> Option<SpeculativeObstacle<'_>> {
        let index = self.index(cell)?;
        if self.cells[index] != CellState::Empty {
            return None;
        }

        Some(SpeculativeObstacle::begin(self, cell, index))
    }

    fn index(&self, cell: CellCoord) -> Option<usize> {
        if !self.contains(cell) {
            return None;
        }

        let row = usize::try_from(cell.row()).ok()?;
        let column = usize::try_from(cell.column()).ok()?;
        let width = usize::try_from(self.columns).ok()?;
        Some(row * width + column)
    }

    fn replace(&mut self, index: usize, state: CellState) -> CellState {
        std::mem::replace(&mut self.cells[index], state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_defence_core::CellRectSize;

    fn grid(columns: u32, rows: u32) -> Grid {
        Grid::with_origin(columns, rows, 10.0, Vec2::ZERO).expect("valid grid")
    }

    #[test]
    fn rejects_degenerate_configuration() {
        assert_eq!(
            Grid::new(0, 4, 1.0),
            Err(GridError::EmptyDimensions {
                columns: 0,
                rows: 4
            })
        );
        assert!(matches!(
            Grid::new(4, 4, 0.0),
            Err(GridError::InvalidCellSize(_))
        ));
        assert!(matches!(
            Grid::new(4, 4, f32::NAN),
            Err(GridError::InvalidCellSize(_))
        ));
    }

    #[test]
    fn rejects_origins_outside_finite_world_space() {
        assert!(matches!(
            Grid::new(10, 10, 1e38),
            Err(GridError::InvalidOrigin(_))
        ));
        assert!(matches!(
            Grid::with_origin(2, 2, 1.0, Vec2::new(f32::NAN, 0.0)),
            Err(GridError::InvalidOrigin(_))
        ));
        assert_eq!(
            Grid::with_origin(10, 10, 1e38, Vec2::ZERO),
            Err(GridError::UnboundedExtent {
                columns: 10,
                rows: 10
            })
        );
        assert!(Grid::with_origin(2, 2, 1.0, Vec2::new(-5.0, 3.0)).is_ok());
    }

    #[test]
    fn out_of_bounds_queries_return_sentinels() {
        let grid = grid(3, 2);
        assert_eq!(grid.cell_state(CellCoord::new(3, 0)), None);
        assert_eq!(grid.cell_state(CellCoord::new(0, 2)), None);
        assert!(!grid.is_walkable(CellCoord::new(5, 5)));
        assert_eq!(grid.cell_at(-1, 0), None);
        assert_eq!(grid.cell_at(2, 1), Some(CellCoord::new(2, 1)));
    }

    #[test]
    fn obstacles_toggle_only_on_mutable_cells() {
        let mut grid = grid(3, 3);
        let cell = CellCoord::new(1, 1);
        let protected = CellCoord::new(2, 2);
        assert!(grid.mark_protected(protected));

        assert!(grid.set_obstacle(cell));
        assert!(!grid.set_obstacle(cell));
        assert_eq!(grid.cell_state(cell), Some(CellState::Obstacle));
        assert!(!grid.is_walkable(cell));

        assert!(!grid.set_obstacle(protected));
        assert!(!grid.clear_obstacle(protected));
        assert!(grid.is_walkable(protected));

        assert!(!grid.set_obstacle(CellCoord::new(9, 9)));
        assert!(!grid.clear_obstacle(CellCoord::new(9, 9)));

        assert!(grid.clear_obstacle(cell));
        assert_eq!(grid.cell_state(cell), Some(CellState::Empty));
        assert_eq!(grid.obstacle_count(), 0);
    }

    #[test]
    fn protected_rect_overwrites_obstacles() {
        let mut grid = grid(4, 4);
        assert!(grid.set_obstacle(CellCoord::new(1, 1)));
        let rect = CellRect::from_origin_and_size(CellCoord::new(1, 1), CellRectSize::new(4, 1));

        assert_eq!(grid.mark_protected_rect(rect), 3);
        assert_eq!(
            grid.protected_cells(),
            vec![
                CellCoord::new(1, 1),
                CellCoord::new(2, 1),
                CellCoord::new(3, 1)
            ]
        );
        assert_eq!(grid.obstacle_count(), 0);
    }

    #[test]
    fn world_conversion_round_trips_cell_centres() {
        let grid = Grid::new(4, 2, 8.0).expect("valid grid");
        assert_eq!(grid.origin(), Vec2::new(-16.0, -8.0));

        for (cell, _) in grid.iter() {
            let centre = grid.grid_to_world(cell);
            assert_eq!(grid.world_to_grid(centre), Some(cell));
        }

        assert_eq!(grid.grid_to_world(CellCoord::new(0, 0)), Vec2::new(-12.0, -4.0));
        assert_eq!(grid.world_to_grid(Vec2::new(-16.5, 0.0)), None);
        assert_eq!(grid.world_to_grid(Vec2::new(16.0, 0.0)), None);
        assert_eq!(grid.world_to_grid(Vec2::new(f32::NAN, 0.0)), None);
    }

    #[test]
    fn boundary_cells_skip_blocked_ring_cells() {
        let mut grid = grid(3, 3);
        assert!(grid.set_obstacle(CellCoord::new(1, 0)));

        let boundary = grid.boundary_cells();
        assert_eq!(boundary.len(), 7);
        assert!(!boundary.contains(&CellCoord::new(1, 0)));
        assert!(!boundary.contains(&CellCoord::new(1, 1)));
    }
}
