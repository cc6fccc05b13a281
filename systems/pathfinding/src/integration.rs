//! Multi-source breadth-first distance integration.

use std::collections::VecDeque;

use wave_defence_core::{CellCoord, Direction, ExitSpec};
use wave_defence_world::Grid;

/// Distance recorded for cells the search never reached.
pub const UNREACHED: u32 = u32::MAX;

/// Neighbour set used when expanding the search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Adjacency {
    /// Four orthogonal neighbours.
    #[default]
    Cardinal,
    /// Orthogonal plus diagonal neighbours at uniform cost.
    ///
    /// A diagonal step is only allowed when both orthogonal cells it passes
    /// between are walkable, so reachability matches [`Adjacency::Cardinal`].
    Octile,
}

/// Dense graph distances from every cell to its nearest exit.
///
/// Distances default to [`UNREACHED`] for blocked or enclosed cells so
/// callers can tell walls apart from traversable cells.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DistanceField {
    columns: u32,
    rows: u32,
    distances: Vec<u32>,
}

impl DistanceField {
    /// Width of the field in cells.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Height of the field in cells.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Dense distances stored in row-major order.
    #[must_use]
    pub fn cells(&self) -> &[u32] {
        &self.distances
    }

    /// Distance to the nearest exit, or `None` if unreached or out of bounds.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        index(self.columns, self.rows, cell)
            .map(|offset| self.distances[offset])
            .filter(|distance| *distance != UNREACHED)
    }

    /// Reports whether the cell can reach an exit.
    #[must_use]
    pub fn is_reachable(&self, cell: CellCoord) -> bool {
        self.distance(cell).is_some()
    }

    /// Number of cells with a route to an exit.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.distances
            .iter()
            .filter(|distance| **distance != UNREACHED)
            .count()
    }
}

/// Runs one breadth-first pass seeded from every exit at once.
///
/// Exits that lie outside the grid or on blocked cells are ignored. For
/// [`ExitSpec::Edge`] the virtual exit line sits one step past the edge, so
/// walkable cells along that edge start at distance one.
#[must_use]
pub fn integrate_distances(grid: &Grid, exits: &ExitSpec, adjacency: Adjacency) -> DistanceField {
    let (columns, rows) = grid.dimensions();
    let mut distances = vec![UNREACHED; grid.cells().len()];
    let mut queue = VecDeque::new();

    for (cell, distance) in seeds(grid, exits) {
        let Some(offset) = index(columns, rows, cell) else {
            continue;
        };

        if !grid.is_walkable(cell) || distances[offset] <= distance {
            continue;
        }

        distances[offset] = distance;
        queue.push_back(cell);
    }

    while let Some(cell) = queue.pop_front() {
        let Some(current_index) = index(columns, rows, cell) else {
            continue;
        };
        let next_distance = distances[current_index].saturating_add(1);

        for (_, neighbor) in walkable_neighbors(grid, cell, adjacency) {
            let Some(neighbor_index) = index(columns, rows, neighbor) else {
                continue;
            };

            if distances[neighbor_index] <= next_distance {
                continue;
            }

            distances[neighbor_index] = next_distance;
            queue.push_back(neighbor);
        }
    }

    DistanceField {
        columns,
        rows,
        distances,
    }
}

/// Walkable neighbours of `cell` in the fixed check order.
///
/// Orthogonal neighbours come first (north, south, west, east), followed by
/// diagonals when `adjacency` allows them.
pub(crate) fn walkable_neighbors(
    grid: &Grid,
    cell: CellCoord,
    adjacency: Adjacency,
) -> impl Iterator<Item = (Direction, CellCoord)> + '_ {
    let cardinal: &'static [Direction] = &Direction::CARDINAL;
    let diagonals: &'static [Direction] = match adjacency {
        Adjacency::Cardinal => &[],
        Adjacency::Octile => &Direction::DIAGONAL,
    };

    cardinal
        .iter()
        .chain(diagonals)
        .filter_map(move |direction| {
            let (columns, rows) = grid.dimensions();
            let neighbor = cell.step(*direction, columns, rows)?;
            if !grid.is_walkable(neighbor) {
                return None;
            }

            if direction.is_diagonal() && !corner_is_open(grid, cell, *direction) {
                return None;
            }

            Some((*direction, neighbor))
        })
}

fn corner_is_open(grid: &Grid, cell: CellCoord, direction: Direction) -> bool {
    let horizontal = if direction.dx() < 0 {
        Direction::West
    } else {
        Direction::East
    };
    let vertical = if direction.dy() < 0 {
        Direction::North
    } else {
        Direction::South
    };
    let (columns, rows) = grid.dimensions();

    [horizontal, vertical].into_iter().all(|side| {
        cell.step(side, columns, rows)
            .is_some_and(|neighbor| grid.is_walkable(neighbor))
    })
}

fn seeds(grid: &Grid, exits: &ExitSpec) -> Vec<(CellCoord, u32)> {
    match exits {
        ExitSpec::Boundary => grid
            .boundary_cells()
            .into_iter()
            .map(|cell| (cell, 0))
            .collect(),
        ExitSpec::ProtectedZone => grid
            .protected_cells()
            .into_iter()
            .map(|cell| (cell, 0))
            .collect(),
        ExitSpec::Cells { cells } => cells.iter().map(|cell| (*cell, 0)).collect(),
        ExitSpec::Edge { edge } => edge_cells(grid, edge.outward())
            .into_iter()
            .map(|cell| (cell, 1))
            .collect(),
    }
}

/// Cells whose step in `outward` leaves the grid.
pub(crate) fn edge_cells(grid: &Grid, outward: Direction) -> Vec<CellCoord> {
    let (columns, rows) = grid.dimensions();
    grid.iter()
        .map(|(cell, _)| cell)
        .filter(|cell| cell.step(outward, columns, rows).is_none())
        .collect()
}

pub(crate) fn index(columns: u32, rows: u32, cell: CellCoord) -> Option<usize> {
    if cell.column() >= columns || cell.row() >= rows {
        return None;
    }

    let column = usize::try_from(cell.column()).ok()?;
    let row = usize::try_from(cell.row()).ok()?;
    let width = usize::try_from(columns).ok()?;
    row.checked_mul(width)?.checked_add(column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_defence_core::Edge;

    fn grid(columns: u32, rows: u32) -> Grid {
        Grid::new(columns, rows, 1.0).expect("valid grid")
    }

    #[test]
    fn explicit_exit_cells_start_at_zero() {
        let grid = grid(3, 4);
        let exits = ExitSpec::Cells {
            cells: vec![CellCoord::new(1, 2)],
        };

        let field = integrate_distances(&grid, &exits, Adjacency::Cardinal);

        assert_eq!(field.distance(CellCoord::new(1, 2)), Some(0));
        assert_eq!(field.distance(CellCoord::new(1, 1)), Some(1));
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(2));
        assert_eq!(field.distance(CellCoord::new(0, 0)), Some(3));
    }

    #[test]
    fn walls_are_routed_around() {
        let mut grid = grid(3, 4);
        let wall = CellCoord::new(1, 1);
        assert!(grid.set_obstacle(wall));
        let exits = ExitSpec::Cells {
            cells: vec![CellCoord::new(1, 2)],
        };

        let field = integrate_distances(&grid, &exits, Adjacency::Cardinal);

        assert_eq!(field.distance(wall), None);
        assert_eq!(field.distance(CellCoord::new(1, 0)), Some(4));
        assert_eq!(field.distance(CellCoord::new(0, 1)), Some(2));
    }

    #[test]
    fn blocked_and_out_of_bounds_exits_are_ignored() {
        let mut grid = grid(2, 2);
        assert!(grid.set_obstacle(CellCoord::new(0, 0)));
        let exits = ExitSpec::Cells {
            cells: vec![CellCoord::new(0, 0), CellCoord::new(5, 5)],
        };

        let field = integrate_distances(&grid, &exits, Adjacency::Cardinal);

        assert_eq!(field.reachable_count(), 0);
    }

    #[test]
    fn edge_exit_seeds_the_edge_at_one() {
        let grid = grid(4, 3);
        let exits = ExitSpec::Edge {
            edge: Edge::South,
        };

        let field = integrate_distances(&grid, &exits, Adjacency::Cardinal);

        assert_eq!(field.distance(CellCoord::new(0, 2)), Some(1));
        assert_eq!(field.distance(CellCoord::new(3, 0)), Some(3));
    }

    #[test]
    fn boundary_exits_cover_the_outer_ring() {
        let grid = grid(5, 5);
        let field = integrate_distances(&grid, &ExitSpec::Boundary, Adjacency::Cardinal);

        assert_eq!(field.distance(CellCoord::new(0, 3)), Some(0));
        assert_eq!(field.distance(CellCoord::new(1, 1)), Some(1));
        assert_eq!(field.distance(CellCoord::new(2, 2)), Some(2));
    }

    #[test]
    fn octile_shortcuts_open_diagonals_only() {
        let mut grid = grid(3, 3);
        let exits = ExitSpec::Cells {
            cells: vec![CellCoord::new(2, 2)],
        };

        let open = integrate_distances(&grid, &exits, Adjacency::Octile);
        assert_eq!(open.distance(CellCoord::new(0, 0)), Some(2));

        assert!(grid.set_obstacle(CellCoord::new(1, 2)));
        let pinched = integrate_distances(&grid, &exits, Adjacency::Octile);
        assert_eq!(pinched.distance(CellCoord::new(1, 1)), Some(2));
        assert_eq!(pinched.distance(CellCoord::new(2, 1)), Some(1));
    }
}
