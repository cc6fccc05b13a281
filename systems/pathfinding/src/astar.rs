//! Single-pair A* search used for preview and debug paths.

use std::{cmp::Reverse, collections::BinaryHeap};

use wave_defence_core::CellCoord;
use wave_defence_world::Grid;

use crate::integration::{index, walkable_neighbors, Adjacency};

/// Finds a shortest 4-connected path from `start` to `goal`.
///
/// The returned sequence includes both endpoints. `None` means no path
/// exists, including when either endpoint is blocked or out of bounds.
/// Open-set ties on estimated cost are broken by insertion order.
#[must_use]
pub fn find_path(grid: &Grid, start: CellCoord, goal: CellCoord) -> Option<Vec<CellCoord>> {
    if !grid.is_walkable(start) || !grid.is_walkable(goal) {
        return None;
    }

    if start == goal {
        return Some(vec![start]);
    }

    let (columns, rows) = grid.dimensions();
    let node_count = grid.cells().len();
    let mut best_cost = vec![u32::MAX; node_count];
    let mut came_from: Vec<Option<CellCoord>> = vec![None; node_count];
    let mut closed = vec![false; node_count];
    let mut open = BinaryHeap::new();
    let mut sequence: u64 = 0;

    let start_index = index(columns, rows, start)?;
    best_cost[start_index] = 0;
    open.push(Reverse(OpenEntry {
        estimate: start.manhattan_distance(goal),
        sequence,
        cell: start,
    }));

    while let Some(Reverse(entry)) = open.pop() {
        let Some(current_index) = index(columns, rows, entry.cell) else {
            continue;
        };

        if closed[current_index] {
            continue;
        }
        closed[current_index] = true;

        if entry.cell == goal {
            return Some(reconstruct(&came_from, columns, rows, goal));
        }

        let next_cost = best_cost[current_index].saturating_add(1);
        for (_, neighbor) in walkable_neighbors(grid, entry.cell, Adjacency::Cardinal) {
            let Some(neighbor_index) = index(columns, rows, neighbor) else {
                continue;
            };

            if closed[neighbor_index] || next_cost >= best_cost[neighbor_index] {
                continue;
            }

            best_cost[neighbor_index] = next_cost;
            came_from[neighbor_index] = Some(entry.cell);
            sequence += 1;
            open.push(Reverse(OpenEntry {
                estimate: next_cost.saturating_add(neighbor.manhattan_distance(goal)),
                sequence,
                cell: neighbor,
            }));
        }
    }

    None
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenEntry {
    estimate: u32,
    sequence: u64,
    cell: CellCoord,
}

fn reconstruct(
    came_from: &[Option<CellCoord>],
    columns: u32,
    rows: u32,
    goal: CellCoord,
) -> Vec<CellCoord> {
    let mut path = vec![goal];
    let mut cursor = goal;

    while let Some(previous) = index(columns, rows, cursor).and_then(|offset| came_from[offset]) {
        path.push(previous);
        cursor = previous;
    }

    path.reverse();
    path
}
