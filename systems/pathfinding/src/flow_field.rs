//! Dense steering field derived from exit distances.

use tracing::debug;
use wave_defence_core::{CellCoord, Direction, ExitSpec, Route};
use wave_defence_world::Grid;

use crate::integration::{
    edge_cells, index, integrate_distances, walkable_neighbors, Adjacency, DistanceField,
};

/// Options controlling flow-field construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FlowFieldOptions {
    /// Neighbour set used for both distance integration and step selection.
    pub adjacency: Adjacency,
}

/// Per-cell "which way to step" field shared by every agent in a tick.
///
/// A field is only ever produced by [`compute_flow_field`] or
/// [`compute_flow_field_with`] and is never mutated afterwards; a grid
/// change calls for a fresh field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlowField {
    routes: Vec<Route>,
    distances: DistanceField,
}

/// Result of walking a flow field from a starting cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    /// The walk ended on an exit cell or stepped off the grid through an
    /// edge exit from `last`.
    Reached {
        /// Final cell occupied on the grid.
        last: CellCoord,
        /// Number of steps taken.
        steps: u32,
    },
    /// The walk started on or ran into a cell without a route.
    Stranded {
        /// Cell that has no route.
        cell: CellCoord,
    },
    /// The starting cell lies outside the field.
    OutOfBounds,
}

impl FlowField {
    /// Provides the `(columns, rows)` dimensions of the field.
    #[must_use]
    pub const fn dimensions(&self) -> (u32, u32) {
        (self.distances.columns(), self.distances.rows())
    }

    /// Route recorded for the cell, or `None` outside the field.
    #[must_use]
    pub fn route_at(&self, cell: CellCoord) -> Option<Route> {
        let (columns, rows) = self.dimensions();
        index(columns, rows, cell).map(|offset| self.routes[offset])
    }

    /// Step direction for the cell, if it has one.
    ///
    /// Exit cells, unreachable cells and out-of-bounds cells all report
    /// `None`; use [`FlowField::route_at`] to tell them apart.
    #[must_use]
    pub fn step_at(&self, cell: CellCoord) -> Option<Direction> {
        self.route_at(cell).and_then(Route::direction)
    }

    /// Graph distance from the cell to its nearest exit.
    #[must_use]
    pub fn distance(&self, cell: CellCoord) -> Option<u32> {
        self.distances.distance(cell)
    }

    /// Reports whether an exit is reachable from the cell.
    #[must_use]
    pub fn is_reachable(&self, cell: CellCoord) -> bool {
        self.distances.is_reachable(cell)
    }

    /// Number of cells that can reach an exit.
    #[must_use]
    pub fn reachable_count(&self) -> usize {
        self.distances.reachable_count()
    }

    /// Dense routes stored in row-major order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Underlying distance field.
    #[must_use]
    pub fn distances(&self) -> &DistanceField {
        &self.distances
    }

    /// Walks the field from `start` until an exit is reached.
    ///
    /// The walk is bounded by the cell count, which a well-formed field never
    /// exceeds because every step strictly decreases the distance.
    #[must_use]
    pub fn follow(&self, start: CellCoord) -> FollowOutcome {
        let (columns, rows) = self.dimensions();
        let limit = u64::from(columns) * u64::from(rows);
        let mut cell = start;
        let mut steps: u32 = 0;

        loop {
            let Some(route) = self.route_at(cell) else {
                return FollowOutcome::OutOfBounds;
            };

            match route {
                Route::Arrived => return FollowOutcome::Reached { last: cell, steps },
                Route::NoRoute => return FollowOutcome::Stranded { cell },
                Route::Step(direction) => {
                    if u64::from(steps) >= limit {
                        return FollowOutcome::Stranded { cell };
                    }

                    steps += 1;
                    match cell.step(direction, columns, rows) {
                        Some(next) => cell = next,
                        None => return FollowOutcome::Reached { last: cell, steps },
                    }
                }
            }
        }
    }
}

/// Computes a cardinal flow field toward the given exits.
#[must_use]
pub fn compute_flow_field(grid: &Grid, exits: &ExitSpec) -> FlowField {
    compute_flow_field_with(grid, exits, FlowFieldOptions::default())
}

/// Computes a flow field toward the given exits with explicit options.
///
/// Each reachable cell steps to the neighbour with the strictly smallest
/// distance. Ties keep the first neighbour in the check order north, south,
/// west, east, then the diagonals. Cells along an [`ExitSpec::Edge`] step
/// off the grid through that edge.
#[must_use]
pub fn compute_flow_field_with(
    grid: &Grid,
    exits: &ExitSpec,
    options: FlowFieldOptions,
) -> FlowField {
    let distances = integrate_distances(grid, exits, options.adjacency);
    let (columns, rows) = grid.dimensions();
    let mut routes = vec![Route::NoRoute; grid.cells().len()];

    if let ExitSpec::Edge { edge } = exits {
        let outward = edge.outward();
        for cell in edge_cells(grid, outward) {
            if distances.distance(cell) == Some(1) {
                if let Some(offset) = index(columns, rows, cell) {
                    routes[offset] = Route::Step(outward);
                }
            }
        }
    }

    for (cell, _) in grid.iter() {
        let Some(offset) = index(columns, rows, cell) else {
            continue;
        };
        let Some(own) = distances.distance(cell) else {
            continue;
        };

        if own == 0 {
            routes[offset] = Route::Arrived;
            continue;
        }

        if routes[offset] != Route::NoRoute {
            continue;
        }

        let mut best: Option<(u32, Direction)> = None;
        for (direction, neighbor) in walkable_neighbors(grid, cell, options.adjacency) {
            let Some(candidate) = distances.distance(neighbor) else {
                continue;
            };

            if candidate >= own {
                continue;
            }

            if best.map_or(true, |(current, _)| candidate < current) {
                best = Some((candidate, direction));
            }
        }

        if let Some((_, direction)) = best {
            routes[offset] = Route::Step(direction);
        }
    }

    let field = FlowField { routes, distances };
    debug!(
        columns,
        rows,
        reachable = field.reachable_count(),
        "flow field computed"
    );
    field
}
