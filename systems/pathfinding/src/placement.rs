//! Obstacle placement validation through speculative mutation.

use tracing::trace;
use wave_defence_core::{CellCoord, CellState, PlacementRejection, Topology};
use wave_defence_world::Grid;

use crate::integration::{integrate_distances, Adjacency};

// Octile search never cuts corners, so cardinal connectivity answers the
// reachability question for either adjacency.
const REACHABILITY: Adjacency = Adjacency::Cardinal;

/// Entry points that currently have a route to some exit.
#[must_use]
pub fn reachable_entries(grid: &Grid, topology: &Topology) -> Vec<CellCoord> {
    let field = integrate_distances(grid, &topology.exits, REACHABILITY);
    topology
        .entries
        .iter()
        .copied()
        .filter(|entry| field.is_reachable(*entry))
        .collect()
}

/// Decides whether an obstacle may be placed on `cell`.
///
/// The cell must be empty. The obstacle is then applied speculatively and
/// every entry point that could reach an exit beforehand must still reach
/// one. The grid is restored before this function returns on every path;
/// entry points that were already cut off do not block the placement.
pub fn placement_verdict(
    grid: &mut Grid,
    cell: CellCoord,
    topology: &Topology,
) -> Result<(), PlacementRejection> {
    match grid.cell_state(cell) {
        None => return reject(cell, PlacementRejection::OutOfBounds),
        Some(CellState::Obstacle) => return reject(cell, PlacementRejection::Occupied),
        Some(CellState::ProtectedZone) => return reject(cell, PlacementRejection::Protected),
        Some(CellState::Empty) => {}
    }

    let connected = reachable_entries(grid, topology);

    let Some(speculative) = grid.speculate(cell) else {
        return reject(cell, PlacementRejection::Occupied);
    };
    let field = integrate_distances(&speculative, &topology.exits, REACHABILITY);
    let sealed = connected
        .into_iter()
        .find(|entry| !field.is_reachable(*entry));
    drop(speculative);

    match sealed {
        Some(entry) => reject(cell, PlacementRejection::SealsEntry(entry)),
        None => Ok(()),
    }
}

/// Reports whether an obstacle may be placed on `cell`.
///
/// See [`placement_verdict`] for the rules; the grid is left unchanged.
pub fn can_place_obstacle_at(grid: &mut Grid, cell: CellCoord, topology: &Topology) -> bool {
    placement_verdict(grid, cell, topology).is_ok()
}

fn reject(cell: CellCoord, reason: PlacementRejection) -> Result<(), PlacementRejection> {
    trace!(
        column = cell.column(),
        row = cell.row(),
        %reason,
        "placement rejected"
    );
    Err(reason)
}
