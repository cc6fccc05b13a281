#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure navigation queries over a [`Grid`](wave_defence_world::Grid) snapshot.
//!
//! Agents never search individually. A single multi-source breadth-first
//! pass from every exit produces a [`FlowField`] that all agents read each
//! tick, and the field is rebuilt only when the grid's obstacle layout
//! changes. [`find_path`] serves previews and debug overlays, while
//! [`placement_verdict`] answers whether a proposed obstacle keeps every entry
//! point connected.

mod astar;
mod flow_field;
mod integration;
mod navigator;
mod placement;

pub use astar::find_path;
pub use flow_field::{
    compute_flow_field, compute_flow_field_with, FlowField, FlowFieldOptions, FollowOutcome,
};
pub use integration::{integrate_distances, Adjacency, DistanceField, UNREACHED};
pub use navigator::Navigator;
pub use placement::{can_place_obstacle_at, placement_verdict, reachable_entries};
