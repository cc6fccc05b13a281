//! Grid owner that keeps the shared flow field in step with obstacle edits.

use tracing::debug;
use wave_defence_core::{CellCoord, PlacementRejection, Topology};
use wave_defence_world::Grid;

use crate::{
    astar::find_path,
    flow_field::{compute_flow_field_with, FlowField, FlowFieldOptions},
    placement::{placement_verdict, reachable_entries},
};

/// Owns a level's grid together with the flow field computed for it.
///
/// Every committed obstacle edit recomputes the field before returning, so
/// readers always observe the field that matches the latest grid. The field
/// is never recomputed on reads.
#[derive(Clone, Debug)]
pub struct Navigator {
    grid: Grid,
    topology: Topology,
    options: FlowFieldOptions,
    field: FlowField,
    revision: u64,
}

impl Navigator {
    /// Takes ownership of a prepared grid and computes its initial field.
    #[must_use]
    pub fn new(grid: Grid, topology: Topology, options: FlowFieldOptions) -> Self {
        let field = compute_flow_field_with(&grid, &topology.exits, options);
        Self {
            grid,
            topology,
            options,
            field,
            revision: 0,
        }
    }

    /// Read-only access to the grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Entry points and exits the navigator routes between.
    #[must_use]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Flow field matching the current grid.
    #[must_use]
    pub fn field(&self) -> &FlowField {
        &self.field
    }

    /// Number of committed grid edits so far.
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Reports whether an obstacle could be placed without committing it.
    pub fn can_place(&mut self, cell: CellCoord) -> bool {
        placement_verdict(&mut self.grid, cell, &self.topology).is_ok()
    }

    /// Validates and commits an obstacle, then refreshes the field.
    pub fn try_place(&mut self, cell: CellCoord) -> Result<(), PlacementRejection> {
        placement_verdict(&mut self.grid, cell, &self.topology)?;
        if self.grid.set_obstacle(cell) {
            self.refresh();
        }
        Ok(())
    }

    /// Removes an obstacle and refreshes the field if anything changed.
    pub fn remove(&mut self, cell: CellCoord) -> bool {
        if !self.grid.clear_obstacle(cell) {
            return false;
        }

        self.refresh();
        true
    }

    /// Entry points that currently have a route to an exit.
    #[must_use]
    pub fn reachable_entries(&self) -> Vec<CellCoord> {
        reachable_entries(&self.grid, &self.topology)
    }

    /// Shortest path between two cells for previews and debug overlays.
    #[must_use]
    pub fn preview_path(&self, start: CellCoord, goal: CellCoord) -> Option<Vec<CellCoord>> {
        find_path(&self.grid, start, goal)
    }

    fn refresh(&mut self) {
        self.field = compute_flow_field_with(&self.grid, &self.topology.exits, self.options);
        self.revision += 1;
        debug!(
            revision = self.revision,
            obstacles = self.grid.obstacle_count(),
            "navigation refreshed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_defence_core::{Edge, ExitSpec};

    fn navigator() -> Navigator {
        let grid = Grid::new(3, 3, 1.0).expect("valid grid");
        let topology = Topology::new(
            vec![CellCoord::new(1, 0)],
            ExitSpec::Edge { edge: Edge::South },
        );
        Navigator::new(grid, topology, FlowFieldOptions::default())
    }

    #[test]
    fn committed_placement_refreshes_the_field() {
        let mut navigator = navigator();
        let cell = CellCoord::new(1, 1);
        assert_eq!(navigator.field().distance(CellCoord::new(1, 0)), Some(3));

        assert_eq!(navigator.try_place(cell), Ok(()));

        assert_eq!(navigator.revision(), 1);
        assert_eq!(navigator.field().distance(CellCoord::new(1, 0)), Some(4));
        assert!(!navigator.field().is_reachable(cell));
    }

    #[test]
    fn rejected_placement_leaves_state_alone() {
        let mut navigator = navigator();
        assert_eq!(navigator.try_place(CellCoord::new(0, 1)), Ok(()));
        assert_eq!(navigator.try_place(CellCoord::new(1, 1)), Ok(()));
        let grid_before = navigator.grid().clone();
        let field_before = navigator.field().clone();

        assert!(!navigator.can_place(CellCoord::new(2, 1)));
        assert_eq!(
            navigator.try_place(CellCoord::new(2, 1)),
            Err(PlacementRejection::SealsEntry(CellCoord::new(1, 0)))
        );

        assert_eq!(navigator.grid(), &grid_before);
        assert_eq!(navigator.field(), &field_before);
        assert_eq!(navigator.revision(), 2);
    }

    #[test]
    fn removal_restores_the_short_route() {
        let mut navigator = navigator();
        let cell = CellCoord::new(1, 1);
        assert_eq!(navigator.try_place(cell), Ok(()));

        assert!(navigator.remove(cell));
        assert!(!navigator.remove(cell));

        assert_eq!(navigator.revision(), 2);
        assert_eq!(navigator.field().distance(CellCoord::new(1, 0)), Some(3));
        assert_eq!(navigator.reachable_entries(), vec![CellCoord::new(1, 0)]);
        assert_eq!(
            navigator.preview_path(CellCoord::new(1, 0), CellCoord::new(1, 2)),
            Some(vec![
                CellCoord::new(1, 0),
                CellCoord::new(1, 1),
                CellCoord::new(1, 2)
            ])
        );
    }
}
