#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that assigns deterministic tower targets from enemy snapshots.

mod damage;

pub use damage::apply_damage;

use glam::Vec2;
use tracing::trace;
use wave_defence_core::{
    EnemyView, EntityId, SpatialIndexError, TargetAssignment, TowerSnapshot, TowerView,
};
use wave_defence_spatial_index::SpatialIndex;

/// Tower targeting backed by a spatial index rebuilt once per tick.
///
/// Until the first rebuild every query falls back to a linear scan over the
/// enemy view it is given.
#[derive(Clone, Debug)]
pub struct Combat {
    index: SpatialIndex<EntityId>,
    rebuilds: u64,
}

impl Combat {
    /// Creates a combat system whose index uses the given bucket size.
    pub fn new(bucket_size: f32) -> Result<Self, SpatialIndexError> {
        Ok(Self {
            index: SpatialIndex::new(bucket_size)?,
            rebuilds: 0,
        })
    }

    /// Number of index rebuilds performed so far.
    #[must_use]
    pub const fn rebuild_count(&self) -> u64 {
        self.rebuilds
    }

    /// Reports whether queries are answered by the spatial index.
    #[must_use]
    pub const fn is_indexed(&self) -> bool {
        self.rebuilds > 0
    }

    /// Clears the index and reinserts every active enemy.
    pub fn rebuild_spatial_index(&mut self, enemies: &EnemyView) {
        self.index.clear();
        for enemy in enemies.active() {
            self.index.insert(enemy.id, enemy.position);
        }
        self.rebuilds += 1;
        trace!(
            rebuild = self.rebuilds,
            indexed = self.index.len(),
            "spatial index rebuilt"
        );
    }

    /// Drops an enemy from the index before it is marked inactive.
    pub fn retire(&mut self, enemy: EntityId) -> bool {
        self.index.remove(enemy)
    }

    /// Closest active enemy within the tower's range.
    ///
    /// Equal distances resolve to the smaller enemy identifier on both the
    /// indexed and the fallback path.
    #[must_use]
    pub fn find_target(
        &self,
        tower: &TowerSnapshot,
        enemies: &EnemyView,
    ) -> Option<TargetAssignment> {
        if !(tower.range >= 0.0) {
            return None;
        }

        let (enemy, distance_sq) = if self.is_indexed() {
            let nearest = self
                .index
                .query_closest_filtered(tower.position, tower.range, |id| {
                    enemies.is_active(id)
                })?;
            (nearest.handle, nearest.distance_sq)
        } else {
            closest_by_scan(tower.position, tower.range, enemies)?
        };

        Some(TargetAssignment {
            tower: tower.id,
            enemy,
            distance_sq,
        })
    }

    /// Every active enemy within `range` of `center`, sorted by identifier.
    #[must_use]
    pub fn find_all_in_range(
        &self,
        center: Vec2,
        range: f32,
        enemies: &EnemyView,
    ) -> Vec<EntityId> {
        let mut found = if self.is_indexed() {
            self.index
                .query_radius_filtered(center, range, |id| enemies.is_active(id))
        } else if range >= 0.0 {
            let range_sq = range * range;
            enemies
                .active()
                .filter(|enemy| enemy.position.distance_squared(center) <= range_sq)
                .map(|enemy| enemy.id)
                .collect()
        } else {
            Vec::new()
        };

        found.sort_unstable();
        found
    }

    /// Computes tower targets for the provided snapshots.
    ///
    /// The index is rebuilt exactly once before any tower is queried. The
    /// output buffer is cleared before populating it with the latest
    /// assignments.
    pub fn handle(
        &mut self,
        towers: &TowerView,
        enemies: &EnemyView,
        out: &mut Vec<TargetAssignment>,
    ) {
        out.clear();
        self.rebuild_spatial_index(enemies);

        if self.index.is_empty() {
            return;
        }

        out.extend(
            towers
                .iter()
                .filter_map(|tower| self.find_target(tower, enemies)),
        );
    }
}

fn closest_by_scan(center: Vec2, range: f32, enemies: &EnemyView) -> Option<(EntityId, f32)> {
    let range_sq = range * range;
    let mut best: Option<(EntityId, f32)> = None;

    // Views iterate in identifier order, so keeping the first of equal
    // distances keeps the smaller identifier.
    for enemy in enemies.active() {
        let distance_sq = enemy.position.distance_squared(center);
        if distance_sq > range_sq {
            continue;
        }

        match best {
            Some((_, current)) if current <= distance_sq => {}
            _ => best = Some((enemy.id, distance_sq)),
        }
    }

    best
}
