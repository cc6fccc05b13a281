//! Level description loaded from TOML.

use std::{fs, path::Path};

use anyhow::{ensure, Context, Result};
use serde::Deserialize;
use wave_defence_core::{CellCoord, CellRect, ExitSpec, Topology};
use wave_defence_system_pathfinding::{Adjacency, FlowFieldOptions};
use wave_defence_world::Grid;

const BUILTIN_LEVEL: &str = include_str!("../levels/default.toml");

/// Complete description of a playable level.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct LevelConfig {
    pub(crate) grid: GridConfig,
    pub(crate) exits: ExitSpec,
    pub(crate) entries: Vec<CellCoord>,
    #[serde(default)]
    pub(crate) protected: Vec<CellRect>,
    #[serde(default)]
    pub(crate) obstacles: Vec<CellRect>,
    #[serde(default)]
    pub(crate) towers: Vec<TowerConfig>,
    #[serde(default)]
    pub(crate) simulation: SimulationConfig,
}

/// Grid dimensions and routing options.
#[derive(Clone, Copy, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct GridConfig {
    pub(crate) columns: u32,
    pub(crate) rows: u32,
    pub(crate) cell_size: f32,
    #[serde(default)]
    pub(crate) adjacency: AdjacencyConfig,
}

/// Neighbourhood used by the flow field.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum AdjacencyConfig {
    #[default]
    Cardinal,
    Octile,
}

/// Tower placed on the grid as an obstacle.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TowerConfig {
    pub(crate) cell: CellCoord,
    pub(crate) range: f32,
    pub(crate) damage: u32,
    #[serde(default)]
    pub(crate) multipliers: Vec<f32>,
}

/// Parameters of the headless tick loop.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct SimulationConfig {
    pub(crate) ticks: u32,
    pub(crate) enemies: u32,
    pub(crate) spawn_interval: u32,
    pub(crate) seed: u64,
    pub(crate) enemy_health: u32,
    pub(crate) bucket_size: f32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            ticks: 120,
            enemies: 10,
            spawn_interval: 4,
            seed: 0,
            enemy_health: 10,
            bucket_size: 64.0,
        }
    }
}

impl LevelConfig {
    /// Level bundled with the binary.
    pub(crate) fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_LEVEL).context("built-in level is malformed")
    }

    /// Reads and validates a level file.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read level file: {}", path.display()))?;
        Self::parse(&text)
            .with_context(|| format!("failed to load level file: {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        let level: Self = toml::from_str(text).context("invalid level description")?;
        level.validate()?;
        Ok(level)
    }

    fn validate(&self) -> Result<()> {
        ensure!(!self.entries.is_empty(), "level declares no entry points");
        ensure!(
            self.simulation.spawn_interval > 0,
            "simulation.spawn_interval must be at least one tick"
        );
        for entry in &self.entries {
            ensure!(
                entry.column() < self.grid.columns && entry.row() < self.grid.rows,
                "entry point ({}, {}) lies outside the {}x{} grid",
                entry.column(),
                entry.row(),
                self.grid.columns,
                self.grid.rows
            );
        }
        Ok(())
    }

    /// Empty grid with the level's protected zones applied.
    pub(crate) fn build_grid(&self) -> Result<Grid> {
        let mut grid = Grid::new(self.grid.columns, self.grid.rows, self.grid.cell_size)
            .context("invalid grid dimensions")?;
        for rect in &self.protected {
            let _ = grid.mark_protected_rect(*rect);
        }
        Ok(grid)
    }

    pub(crate) fn topology(&self) -> Topology {
        Topology::new(self.entries.clone(), self.exits.clone())
    }

    pub(crate) fn flow_options(&self) -> FlowFieldOptions {
        let adjacency = match self.grid.adjacency {
            AdjacencyConfig::Cardinal => Adjacency::Cardinal,
            AdjacencyConfig::Octile => Adjacency::Octile,
        };
        FlowFieldOptions { adjacency }
    }
}
