//! Deterministic headless tick loop.

use std::fmt;

use anyhow::{Context, Result};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, trace, warn};
use wave_defence_core::{
    CellCoord, EnemySnapshot, EnemyView, EntityId, Route, TargetAssignment, TowerId,
    TowerSnapshot, TowerView,
};
use wave_defence_system_pathfinding::Navigator;
use wave_defence_system_targeting::{apply_damage, Combat};

use crate::config::{LevelConfig, SimulationConfig};

#[derive(Clone, Debug)]
struct Tower {
    snapshot: TowerSnapshot,
    damage: u32,
    multipliers: Vec<f32>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Status {
    Marching,
    Escaped,
    Defeated,
}

#[derive(Clone, Copy, Debug)]
struct Enemy {
    id: EntityId,
    cell: CellCoord,
    position: Vec2,
    health: u32,
    status: Status,
}

impl Enemy {
    fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            position: self.position,
            active: self.status == Status::Marching,
        }
    }
}

/// Totals reported once the tick loop finishes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) ticks: u32,
    pub(crate) spawned: u32,
    pub(crate) escaped: u32,
    pub(crate) defeated: u32,
    pub(crate) stranded: u32,
    pub(crate) shots: u64,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ticks: {}, spawned: {}, escaped: {}, defeated: {}, stranded: {}, shots: {}",
            self.ticks, self.spawned, self.escaped, self.defeated, self.stranded, self.shots
        )
    }
}

/// Level state advanced one tick at a time.
#[derive(Debug)]
pub(crate) struct Simulation {
    navigator: Navigator,
    combat: Combat,
    towers: Vec<Tower>,
    tower_view: TowerView,
    enemies: Vec<Enemy>,
    settings: SimulationConfig,
    rng: ChaCha8Rng,
    targets: Vec<TargetAssignment>,
    summary: Summary,
}

impl Simulation {
    /// Builds the grid, commits obstacles and towers, and prepares combat.
    ///
    /// Obstacles and towers that would seal an entry point are skipped with a
    /// warning rather than failing the level.
    pub(crate) fn new(level: &LevelConfig) -> Result<Self> {
        let grid = level.build_grid()?;
        let mut navigator = Navigator::new(grid, level.topology(), level.flow_options());

        for cell in level.obstacles.iter().flat_map(|rect| rect.cells()) {
            if let Err(reason) = navigator.try_place(cell) {
                warn!(column = cell.column(), row = cell.row(), %reason, "obstacle skipped");
            }
        }

        let mut towers = Vec::with_capacity(level.towers.len());
        for config in &level.towers {
            let cell = config.cell;
            if let Err(reason) = navigator.try_place(cell) {
                warn!(column = cell.column(), row = cell.row(), %reason, "tower skipped");
                continue;
            }

            let id = u32::try_from(towers.len()).context("too many towers")?;
            towers.push(Tower {
                snapshot: TowerSnapshot {
                    id: TowerId::new(id),
                    position: navigator.grid().grid_to_world(cell),
                    range: config.range,
                },
                damage: config.damage,
                multipliers: config.multipliers.clone(),
            });
        }

        let stranded = level
            .entries
            .len()
            .saturating_sub(navigator.reachable_entries().len());
        if stranded > 0 {
            warn!(stranded, "some entry points have no route to an exit");
        }

        let combat = Combat::new(level.simulation.bucket_size)
            .context("invalid simulation.bucket_size")?;
        let tower_view =
            TowerView::from_snapshots(towers.iter().map(|tower| tower.snapshot).collect());

        Ok(Self {
            navigator,
            combat,
            towers,
            tower_view,
            enemies: Vec::new(),
            settings: level.simulation,
            rng: ChaCha8Rng::seed_from_u64(level.simulation.seed),
            targets: Vec::new(),
            summary: Summary::default(),
        })
    }

    pub(crate) fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    /// Cells occupied by enemies that are still on the grid.
    pub(crate) fn enemy_cells(&self) -> Vec<CellCoord> {
        self.enemies
            .iter()
            .filter(|enemy| enemy.status == Status::Marching)
            .map(|enemy| enemy.cell)
            .collect()
    }

    /// Runs the configured number of ticks and reports the totals.
    ///
    /// `after_tick` observes the state at the end of every tick.
    pub(crate) fn run<F>(&mut self, mut after_tick: F) -> Summary
    where
        F: FnMut(&Self),
    {
        for _ in 0..self.settings.ticks {
            self.tick();
            after_tick(self);
        }
        self.summary()
    }

    /// Spawns, moves, then resolves combat for one tick.
    fn tick(&mut self) {
        self.spawn();
        self.advance();
        self.fight();
        self.summary.ticks += 1;
    }

    /// Totals so far; enemies without a route count as stranded.
    pub(crate) fn summary(&self) -> Summary {
        let field = self.navigator.field();
        let stranded = self
            .enemies
            .iter()
            .filter(|enemy| enemy.status == Status::Marching && !field.is_reachable(enemy.cell))
            .count();
        Summary {
            stranded: u32::try_from(stranded).unwrap_or(u32::MAX),
            ..self.summary
        }
    }

    fn spawn(&mut self) {
        if self.summary.spawned >= self.settings.enemies
            || self.summary.ticks % self.settings.spawn_interval != 0
        {
            return;
        }

        let entries = &self.navigator.topology().entries;
        if entries.is_empty() {
            return;
        }
        let entry = entries[self.rng.gen_range(0..entries.len())];

        let id = EntityId::new(self.summary.spawned);
        self.enemies.push(Enemy {
            id,
            cell: entry,
            position: self.navigator.grid().grid_to_world(entry),
            health: self.settings.enemy_health,
            status: Status::Marching,
        });
        self.summary.spawned += 1;
        debug!(enemy = id.get(), column = entry.column(), row = entry.row(), "enemy spawned");
    }

    fn advance(&mut self) {
        let grid = self.navigator.grid();
        let field = self.navigator.field();
        let (columns, rows) = grid.dimensions();

        for enemy in &mut self.enemies {
            if enemy.status != Status::Marching {
                continue;
            }

            match field.route_at(enemy.cell) {
                Some(Route::Step(direction)) => match enemy.cell.step(direction, columns, rows) {
                    Some(next) => {
                        enemy.cell = next;
                        enemy.position = grid.grid_to_world(next);
                    }
                    None => escape(enemy, &mut self.summary),
                },
                Some(Route::Arrived) => escape(enemy, &mut self.summary),
                Some(Route::NoRoute) | None => {
                    trace!(enemy = enemy.id.get(), "enemy has no route");
                }
            }
        }
    }

    fn fight(&mut self) {
        let view = EnemyView::from_snapshots(self.enemies.iter().map(Enemy::snapshot).collect());
        self.combat.handle(&self.tower_view, &view, &mut self.targets);

        for target in &self.targets {
            let Some(tower) = self.towers.get(target.tower.get() as usize) else {
                continue;
            };
            let Some(enemy) = self.enemies.get_mut(target.enemy.get() as usize) else {
                continue;
            };
            if enemy.status != Status::Marching {
                continue;
            }

            let damage = apply_damage(tower.damage, &tower.multipliers);
            enemy.health = enemy.health.saturating_sub(damage);
            self.summary.shots += 1;
            trace!(
                tower = target.tower.get(),
                enemy = target.enemy.get(),
                damage,
                health = enemy.health,
                "tower fired"
            );

            if enemy.health == 0 {
                enemy.status = Status::Defeated;
                let _ = self.combat.retire(enemy.id);
                self.summary.defeated += 1;
                debug!(enemy = enemy.id.get(), "enemy defeated");
            }
        }
    }
}

fn escape(enemy: &mut Enemy, summary: &mut Summary) {
    enemy.status = Status::Escaped;
    summary.escaped += 1;
    debug!(enemy = enemy.id.get(), "enemy escaped");
}

#[cfg(test)]
mod tests {
    use super::*;

    const CORRIDOR: &str = r#"
        entries = [{ column = 1, row = 0 }]
        exits = { kind = "edge", edge = "south" }

        [grid]
        columns = 3
        rows = 6
        cell_size = 10.0

        [simulation]
        ticks = 20
        enemies = 3
        spawn_interval = 2
        seed = 1
        enemy_health = 4
        bucket_size = 16.0
    "#;

    fn level(text: &str) -> LevelConfig {
        LevelConfig::parse(text).expect("level")
    }

    #[test]
    fn unopposed_enemies_walk_out_of_the_exit() {
        let mut simulation = Simulation::new(&level(CORRIDOR)).expect("simulation");
        let summary = simulation.run(|_| {});

        assert_eq!(summary.ticks, 20);
        assert_eq!(summary.spawned, 3);
        assert_eq!(summary.escaped, 3);
        assert_eq!(summary.defeated, 0);
        assert_eq!(summary.shots, 0);
        assert!(simulation.enemy_cells().is_empty());
    }

    #[test]
    fn towers_defeat_enemies_in_range() {
        let text = format!(
            "{CORRIDOR}\n[[towers]]\ncell = {{ column = 0, row = 3 }}\nrange = 25.0\ndamage = 2\nmultipliers = [1.0]"
        );
        let mut simulation = Simulation::new(&level(&text)).expect("simulation");
        let summary = simulation.run(|_| {});

        assert_eq!(summary.spawned, 3);
        assert_eq!(summary.defeated + summary.escaped, 3);
        assert!(summary.defeated > 0);
        assert!(summary.shots >= u64::from(summary.defeated) * 2);
    }

    #[test]
    fn sealing_obstacles_are_skipped() {
        let text = format!(
            "obstacles = [{{ origin = {{ column = 0, row = 2 }}, size = {{ width = 3, height = 1 }} }}]\n{CORRIDOR}"
        );
        let simulation = Simulation::new(&level(&text)).expect("simulation");

        assert_eq!(simulation.navigator().grid().obstacle_count(), 2);
        assert_eq!(
            simulation.navigator().reachable_entries(),
            vec![CellCoord::new(1, 0)]
        );
    }

    #[test]
    fn identical_seeds_replay_identically() {
        let text = format!(
            "{CORRIDOR}\n[[towers]]\ncell = {{ column = 2, row = 2 }}\nrange = 30.0\ndamage = 1"
        );
        let first = Simulation::new(&level(&text)).expect("simulation").run(|_| {});
        let second = Simulation::new(&level(&text)).expect("simulation").run(|_| {});
        assert_eq!(first, second);
    }
}
