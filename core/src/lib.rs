#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Wave Defence navigation engine.
//!
//! This crate defines the value types that connect the grid model, the pure
//! pathfinding and targeting systems, and the adapters that drive them.
//! Nothing in here owns mutable simulation state: grids, flow fields and
//! spatial indices live in their own crates and exchange these types.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a single grid cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellState {
    /// Open floor that accepts obstacles and lets agents through.
    #[default]
    Empty,
    /// Cell blocked by a placed obstacle.
    Obstacle,
    /// Always walkable cell that never accepts obstacles.
    ProtectedZone,
}

impl CellState {
    /// Reports whether agents may traverse a cell in this state.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        match self {
            Self::Empty | Self::ProtectedZone => true,
            Self::Obstacle => false,
        }
    }
}

/// Unit steps available to agents following a flow field.
///
/// Rows grow downward, so [`Direction::South`] has `dy == 1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Movement toward decreasing row indices.
    North,
    /// Movement toward increasing row indices.
    South,
    /// Movement toward decreasing column indices.
    West,
    /// Movement toward increasing column indices.
    East,
    /// Diagonal step up and to the left.
    NorthWest,
    /// Diagonal step up and to the right.
    NorthEast,
    /// Diagonal step down and to the left.
    SouthWest,
    /// Diagonal step down and to the right.
    SouthEast,
}

impl Direction {
    /// Cardinal directions in the order neighbours are checked.
    pub const CARDINAL: [Direction; 4] = [Self::North, Self::South, Self::West, Self::East];

    /// Diagonal directions in the order neighbours are checked.
    pub const DIAGONAL: [Direction; 4] = [
        Self::NorthWest,
        Self::NorthEast,
        Self::SouthWest,
        Self::SouthEast,
    ];

    /// Column delta of the step.
    #[must_use]
    pub const fn dx(self) -> i32 {
        match self {
            Self::West | Self::NorthWest | Self::SouthWest => -1,
            Self::East | Self::NorthEast | Self::SouthEast => 1,
            Self::North | Self::South => 0,
        }
    }

    /// Row delta of the step.
    #[must_use]
    pub const fn dy(self) -> i32 {
        match self {
            Self::North | Self::NorthWest | Self::NorthEast => -1,
            Self::South | Self::SouthWest | Self::SouthEast => 1,
            Self::West | Self::East => 0,
        }
    }

    /// Reports whether the step moves along both axes.
    #[must_use]
    pub const fn is_diagonal(self) -> bool {
        self.dx() != 0 && self.dy() != 0
    }
}

/// Per-cell flow field value consulted by moving agents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Route {
    /// Step in the given direction to get closer to an exit.
    Step(Direction),
    /// The cell is itself an exit.
    Arrived,
    /// No exit can be reached from the cell.
    NoRoute,
}

impl Route {
    /// Direction to take, if the route continues.
    #[must_use]
    pub const fn direction(self) -> Option<Direction> {
        match self {
            Self::Step(direction) => Some(direction),
            Self::Arrived | Self::NoRoute => None,
        }
    }

    /// Reports whether an exit is reachable from the cell.
    #[must_use]
    pub const fn is_reachable(self) -> bool {
        !matches!(self, Self::NoRoute)
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }

    /// Cell reached by taking `direction`, or `None` when it would leave
    /// the `columns` by `rows` bounds.
    #[must_use]
    pub fn step(self, direction: Direction, columns: u32, rows: u32) -> Option<CellCoord> {
        let column = self.column.checked_add_signed(direction.dx())?;
        let row = self.row.checked_add_signed(direction.dy())?;
        (column < columns && row < rows).then_some(CellCoord::new(column, row))
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Iterates every cell of the rectangle in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dy| {
            (0..size.width()).filter_map(move |dx| {
                let column = origin.column().checked_add(dx)?;
                let row = origin.row().checked_add(dy)?;
                Some(CellCoord::new(column, row))
            })
        })
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Side of the grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// Row zero.
    North,
    /// Last row.
    South,
    /// Column zero.
    West,
    /// Last column.
    East,
}

impl Edge {
    /// Direction that leaves the grid through this edge.
    #[must_use]
    pub const fn outward(self) -> Direction {
        match self {
            Self::North => Direction::North,
            Self::South => Direction::South,
            Self::West => Direction::West,
            Self::East => Direction::East,
        }
    }
}

/// Cells that count as exits when integrating distances.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExitSpec {
    /// Every walkable cell on the outer ring of the grid.
    Boundary,
    /// Every protected-zone cell.
    ProtectedZone,
    /// An explicit list of exit cells.
    Cells {
        /// Exit cells; out-of-bounds or blocked entries are ignored.
        cells: Vec<CellCoord>,
    },
    /// A virtual exit line one step beyond the given edge.
    ///
    /// Walkable cells touching the edge sit at distance one and step off
    /// the grid through it.
    Edge {
        /// Side of the grid the exit line runs along.
        edge: Edge,
    },
}

/// Entry points and exits that describe a level's routing problem.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    /// Cells agents originate from; each must keep a route to some exit.
    pub entries: Vec<CellCoord>,
    /// Exits agents are routed toward.
    pub exits: ExitSpec,
}

impl Topology {
    /// Creates a topology from entry points and an exit description.
    #[must_use]
    pub fn new(entries: Vec<CellCoord>, exits: ExitSpec) -> Self {
        Self { entries, exits }
    }
}

/// Reasons an obstacle placement is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
pub enum PlacementRejection {
    /// The cell lies outside the grid.
    #[error("cell is outside the grid")]
    OutOfBounds,
    /// The cell already holds an obstacle.
    #[error("cell already holds an obstacle")]
    Occupied,
    /// The cell belongs to a protected zone.
    #[error("cell belongs to a protected zone")]
    Protected,
    /// The obstacle would cut the given entry point off from every exit.
    #[error("obstacle would seal entry point ({}, {})", .0.column(), .0.row())]
    SealsEntry(CellCoord),
}

/// Errors raised when constructing a grid.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum GridError {
    /// Width or height was zero.
    #[error("grid dimensions must be non-zero, got {columns}x{rows}")]
    EmptyDimensions {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// The cell count does not fit in memory addressing.
    #[error("grid of {columns}x{rows} cells is too large")]
    TooLarge {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
    /// Cell size was zero, negative or not finite.
    #[error("cell size must be positive and finite, got {0}")]
    InvalidCellSize(f32),
    /// The top-left corner is not a finite world position.
    #[error("grid origin must be finite, got {0}")]
    InvalidOrigin(Vec2),
    /// The far corner of the grid does not fit in finite world coordinates.
    #[error("grid of {columns}x{rows} cells does not fit in world space")]
    UnboundedExtent {
        /// Requested column count.
        columns: u32,
        /// Requested row count.
        rows: u32,
    },
}

/// Errors raised when constructing a spatial index.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum SpatialIndexError {
    /// Bucket size was zero, negative or not finite.
    #[error("bucket size must be positive and finite, got {0}")]
    InvalidBucketSize(f32),
}

/// Unique identifier assigned to a mobile enemy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Immutable representation of a single enemy used for targeting queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EntityId,
    /// Continuous world position of the enemy.
    pub position: Vec2,
    /// Inactive enemies are never returned as targets.
    pub active: bool,
}

/// Read-only snapshot describing every enemy known to the tick driver.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view from the provided snapshots.
    ///
    /// Snapshots are sorted by identifier; later duplicates are dropped.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EnemySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        snapshots.dedup_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the active snapshots in identifier order.
    pub fn active(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter().filter(|snapshot| snapshot.active)
    }

    /// Snapshot recorded for the identifier, if any.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EnemySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Reports whether the identifier names an active enemy.
    #[must_use]
    pub fn is_active(&self, id: EntityId) -> bool {
        self.get(id).is_some_and(|snapshot| snapshot.active)
    }

    /// Number of snapshots in the view.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view holds no snapshots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Immutable representation of a single tower used for targeting queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower.
    pub id: TowerId,
    /// Continuous world position of the tower's centre.
    pub position: Vec2,
    /// Targeting radius in world units.
    pub range: f32,
}

/// Read-only snapshot describing every tower that may attack this tick.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }
}

/// Target selected for a tower during a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetAssignment {
    /// Tower that will attack.
    pub tower: TowerId,
    /// Enemy chosen as the target.
    pub enemy: EntityId,
    /// Squared world distance between tower and enemy.
    pub distance_sq: f32,
}
