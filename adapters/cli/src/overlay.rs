//! ASCII debug overlay of the grid and its flow field.

use wave_defence_core::{CellCoord, CellState, Direction, Route};
use wave_defence_system_pathfinding::Navigator;

/// Draws one character per cell, one line per row.
///
/// Enemies (`@`) take precedence over entry points (`E`), which take
/// precedence over the cell's own glyph.
pub(crate) fn render(navigator: &Navigator, enemies: &[CellCoord]) -> String {
    let grid = navigator.grid();
    let field = navigator.field();
    let entries = &navigator.topology().entries;
    let (columns, rows) = grid.dimensions();

    let mut text = String::with_capacity((columns as usize + 1) * rows as usize);
    for row in 0..rows {
        for column in 0..columns {
            let cell = CellCoord::new(column, row);
            let glyph = if enemies.contains(&cell) {
                '@'
            } else if entries.contains(&cell) {
                'E'
            } else {
                match grid.cell_state(cell) {
                    Some(CellState::Obstacle) => '#',
                    Some(CellState::ProtectedZone) => 'P',
                    _ => field.route_at(cell).map_or(' ', route_glyph),
                }
            };
            text.push(glyph);
        }
        text.push('\n');
    }
    text
}

fn route_glyph(route: Route) -> char {
    match route {
        Route::Arrived => 'o',
        Route::NoRoute => '.',
        Route::Step(direction) => match direction {
            Direction::North => '^',
            Direction::South => 'v',
            Direction::West => '<',
            Direction::East => '>',
            Direction::NorthEast | Direction::SouthWest => '/',
            Direction::NorthWest | Direction::SouthEast => '\\',
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wave_defence_core::{ExitSpec, Topology};
    use wave_defence_system_pathfinding::FlowFieldOptions;
    use wave_defence_world::Grid;

    #[test]
    fn draws_routes_walls_and_markers() {
        let mut grid = Grid::new(3, 3, 1.0).expect("valid grid");
        assert!(grid.set_obstacle(CellCoord::new(1, 1)));
        let topology = Topology::new(
            vec![CellCoord::new(0, 0)],
            ExitSpec::Cells {
                cells: vec![CellCoord::new(2, 2)],
            },
        );
        let navigator = Navigator::new(grid, topology, FlowFieldOptions::default());

        let text = render(&navigator, &[CellCoord::new(2, 0)]);
        assert_eq!(text, "E>@\nv#v\n>>o\n");
    }
}
