#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Uniform-bucket spatial hash over mobile entities.
//!
//! Entities are keyed by the floor of their position divided by a fixed
//! bucket size. Buckets live in an arena addressed by index, and a reverse
//! map records each handle's `(bucket, slot)` so removal is a swap with the
//! bucket's last slot followed by a fix-up of the moved handle.

use std::hash::Hash;

use glam::Vec2;
use rustc_hash::FxHashMap;
use wave_defence_core::SpatialIndexError;

/// Coarse bucket coordinate derived from a world position.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BucketKey {
    /// Horizontal bucket index.
    pub x: i32,
    /// Vertical bucket index.
    pub y: i32,
}

/// Closest entity found by a proximity query.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nearest<H> {
    /// Handle of the entity.
    pub handle: H,
    /// Squared distance from the query centre.
    pub distance_sq: f32,
}

/// Spatial hash keyed by entity handles of type `H`.
#[derive(Clone, Debug)]
pub struct SpatialIndex<H> {
    bucket_size: f32,
    inverse_size: f32,
    bucket_ids: FxHashMap<BucketKey, usize>,
    buckets: Vec<Bucket<H>>,
    locations: FxHashMap<H, Location>,
}

#[derive(Clone, Debug)]
struct Bucket<H> {
    key: BucketKey,
    slots: Vec<Slot<H>>,
}

#[derive(Clone, Copy, Debug)]
struct Slot<H> {
    handle: H,
    position: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Location {
    bucket: usize,
    slot: usize,
}

impl<H> SpatialIndex<H>
where
    H: Copy + Eq + Hash + Ord,
{
    /// Creates an empty index with the given bucket edge length.
    pub fn new(bucket_size: f32) -> Result<Self, SpatialIndexError> {
        if !bucket_size.is_finite() || bucket_size <= 0.0 {
            return Err(SpatialIndexError::InvalidBucketSize(bucket_size));
        }

        Ok(Self {
            bucket_size,
            inverse_size: bucket_size.recip(),
            bucket_ids: FxHashMap::default(),
            buckets: Vec::new(),
            locations: FxHashMap::default(),
        })
    }

    /// Edge length of a bucket in world units.
    #[must_use]
    pub const fn bucket_size(&self) -> f32 {
        self.bucket_size
    }

    /// Number of entities currently indexed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    /// Reports whether the index holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Reports whether the handle is indexed.
    #[must_use]
    pub fn contains(&self, handle: H) -> bool {
        self.locations.contains_key(&handle)
    }

    /// Position recorded for the handle.
    #[must_use]
    pub fn position_of(&self, handle: H) -> Option<Vec2> {
        let location = self.locations.get(&handle)?;
        Some(self.buckets[location.bucket].slots[location.slot].position)
    }

    /// Bucket that a world position falls into.
    #[must_use]
    pub fn bucket_key(&self, position: Vec2) -> BucketKey {
        let scaled = (position * self.inverse_size).floor();
        BucketKey {
            x: scaled.x as i32,
            y: scaled.y as i32,
        }
    }

    /// Removes every entity and bucket, keeping the arena's capacity for reuse.
    ///
    /// After a rebuild only occupied buckets exist, so the full-scan fallback
    /// in radius queries walks at most one bucket per indexed entity.
    pub fn clear(&mut self) {
        self.buckets.clear();
        self.bucket_ids.clear();
        self.locations.clear();
    }

    /// Indexes the handle at `position`.
    ///
    /// A handle that is already present is moved instead, so it never appears
    /// in two buckets.
    pub fn insert(&mut self, handle: H, position: Vec2) {
        if self.contains(handle) {
            self.update(handle, position);
            return;
        }

        let key = self.bucket_key(position);
        let bucket = self.bucket_for(key);
        let slots = &mut self.buckets[bucket].slots;
        let slot = slots.len();
        slots.push(Slot { handle, position });
        let _ = self.locations.insert(handle, Location { bucket, slot });
    }

    /// Removes the handle, returning whether it was present.
    pub fn remove(&mut self, handle: H) -> bool {
        let Some(location) = self.locations.remove(&handle) else {
            return false;
        };

        let slots = &mut self.buckets[location.bucket].slots;
        let _ = slots.swap_remove(location.slot);
        if let Some(moved) = slots.get(location.slot) {
            if let Some(entry) = self.locations.get_mut(&moved.handle) {
                entry.slot = location.slot;
            }
        }

        true
    }

    /// Records a new position for the handle.
    ///
    /// The handle only changes buckets when its key changes. Unknown handles
    /// are inserted.
    pub fn update(&mut self, handle: H, position: Vec2) {
        let Some(location) = self.locations.get(&handle).copied() else {
            self.insert(handle, position);
            return;
        };

        let key = self.bucket_key(position);
        let bucket = &mut self.buckets[location.bucket];
        if bucket.key == key {
            bucket.slots[location.slot].position = position;
            return;
        }

        let _ = self.remove(handle);
        self.insert(handle, position);
    }

    /// Iterates every indexed handle with its recorded position.
    pub fn iter(&self) -> impl Iterator<Item = (H, Vec2)> + '_ {
        self.buckets
            .iter()
            .flat_map(|bucket| bucket.slots.iter().map(|slot| (slot.handle, slot.position)))
    }

    /// Every handle within `radius` of `center`, in no particular order.
    #[must_use]
    pub fn query_radius(&self, center: Vec2, radius: f32) -> Vec<H> {
        self.query_radius_filtered(center, radius, |_| true)
    }

    /// Every accepted handle within `radius` of `center`.
    ///
    /// `accept` lets callers skip entries that went stale, such as entities
    /// that were deactivated without being removed.
    pub fn query_radius_filtered<F>(&self, center: Vec2, radius: f32, mut accept: F) -> Vec<H>
    where
        F: FnMut(H) -> bool,
    {
        let mut found = Vec::new();
        self.scan(center, radius, |slot, _| {
            if accept(slot.handle) {
                found.push(slot.handle);
            }
        });
        found
    }

    /// Closest handle within `radius` of `center`.
    ///
    /// Equal distances resolve to the smallest handle so repeated queries
    /// against the same state agree.
    #[must_use]
    pub fn query_closest(&self, center: Vec2, radius: f32) -> Option<Nearest<H>> {
        self.query_closest_filtered(center, radius, |_| true)
    }

    /// Closest accepted handle within `radius` of `center`.
    pub fn query_closest_filtered<F>(
        &self,
        center: Vec2,
        radius: f32,
        mut accept: F,
    ) -> Option<Nearest<H>>
    where
        F: FnMut(H) -> bool,
    {
        let mut best: Option<Nearest<H>> = None;
        self.scan(center, radius, |slot, distance_sq| {
            let closer = best.map_or(true, |current| {
                distance_sq < current.distance_sq
                    || (distance_sq == current.distance_sq && slot.handle < current.handle)
            });
            if closer && accept(slot.handle) {
                best = Some(Nearest {
                    handle: slot.handle,
                    distance_sq,
                });
            }
        });
        best
    }

    fn scan<F>(&self, center: Vec2, radius: f32, mut visit: F)
    where
        F: FnMut(&Slot<H>, f32),
    {
        if !(radius >= 0.0) || !center.is_finite() {
            return;
        }

        let radius_sq = radius * radius;
        let mut check = |bucket: &Bucket<H>| {
            for slot in &bucket.slots {
                let distance_sq = slot.position.distance_squared(center);
                if distance_sq <= radius_sq {
                    visit(slot, distance_sq);
                }
            }
        };

        let min = self.bucket_key(center - Vec2::splat(radius));
        let max = self.bucket_key(center + Vec2::splat(radius));
        let span = (i64::from(max.x) - i64::from(min.x) + 1)
            .saturating_mul(i64::from(max.y) - i64::from(min.y) + 1);

        if radius.is_infinite() || span > self.buckets.len() as i64 {
            self.buckets.iter().for_each(&mut check);
            return;
        }

        for y in min.y..=max.y {
            for x in min.x..=max.x {
                if let Some(&bucket) = self.bucket_ids.get(&BucketKey { x, y }) {
                    check(&self.buckets[bucket]);
                }
            }
        }
    }

    fn bucket_for(&mut self, key: BucketKey) -> usize {
        if let Some(&bucket) = self.bucket_ids.get(&key) {
            return bucket;
        }

        let bucket = self.buckets.len();
        self.buckets.push(Bucket {
            key,
            slots: Vec::new(),
        });
        let _ = self.bucket_ids.insert(key, bucket);
        bucket
    }

    #[cfg(test)]
    fn assert_consistent(&self) {
        let mut seen = 0;
        for (bucket_index, bucket) in self.buckets.iter().enumerate() {
            assert_eq!(self.bucket_ids.get(&bucket.key), Some(&bucket_index));
            for (slot_index, slot) in bucket.slots.iter().enumerate() {
                assert_eq!(
                    self.locations.get(&slot.handle),
                    Some(&Location {
                        bucket: bucket_index,
                        slot: slot_index,
                    })
                );
                assert_eq!(self.bucket_key(slot.position), bucket.key);
                seen += 1;
            }
        }
        assert_eq!(seen, self.locations.len());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index() -> SpatialIndex<u32> {
        SpatialIndex::new(100.0).expect("valid bucket size")
    }

    #[test]
    fn rejects_invalid_bucket_sizes() {
        for size in [0.0, -4.0, f32::NAN, f32::INFINITY] {
            assert!(SpatialIndex::<u32>::new(size).is_err());
        }
    }

    #[test]
    fn negative_positions_floor_into_their_own_bucket() {
        let index = index();
        assert_eq!(
            index.bucket_key(Vec2::new(-0.5, 99.9)),
            BucketKey { x: -1, y: 0 }
        );
        assert_eq!(
            index.bucket_key(Vec2::new(100.0, -100.0)),
            BucketKey { x: 1, y: -1 }
        );
    }

    #[test]
    fn closest_prefers_the_nearer_entity() {
        let mut index = index();
        index.insert(1, Vec2::new(0.0, 0.0));
        index.insert(2, Vec2::new(50.0, 0.0));
        index.insert(3, Vec2::new(200.0, 0.0));

        let nearest = index
            .query_closest_filtered(Vec2::ZERO, 60.0, |handle| handle != 1)
            .expect("entity in range");
        assert_eq!(nearest.handle, 2);
        assert_eq!(nearest.distance_sq, 2500.0);
    }

    #[test]
    fn swap_remove_fixes_the_moved_slot() {
        let mut index = index();
        for handle in 0..5 {
            index.insert(handle, Vec2::new(handle as f32, 10.0));
        }

        assert!(index.remove(1));
        assert!(!index.remove(1));
        index.assert_consistent();
        assert_eq!(index.len(), 4);
        assert_eq!(index.position_of(4), Some(Vec2::new(4.0, 10.0)));

        assert!(index.remove(4));
        assert!(index.remove(0));
        index.assert_consistent();
        let mut remaining = index.query_radius(Vec2::ZERO, 50.0);
        remaining.sort_unstable();
        assert_eq!(remaining, vec![2, 3]);
    }

    #[test]
    fn update_moves_between_buckets_only_when_needed() {
        let mut index = index();
        index.insert(7, Vec2::new(10.0, 10.0));
        index.insert(8, Vec2::new(20.0, 10.0));

        index.update(7, Vec2::new(90.0, 10.0));
        index.assert_consistent();
        assert_eq!(index.position_of(7), Some(Vec2::new(90.0, 10.0)));
        assert!(index.query_radius(Vec2::new(90.0, 10.0), 1.0).contains(&7));

        index.update(7, Vec2::new(350.0, -20.0));
        index.assert_consistent();
        assert!(index.query_radius(Vec2::new(90.0, 10.0), 1.0).is_empty());
        assert_eq!(index.query_radius(Vec2::new(350.0, -20.0), 1.0), vec![7]);

        index.update(9, Vec2::new(0.0, 0.0));
        assert!(index.contains(9));
        index.insert(9, Vec2::new(500.0, 500.0));
        index.assert_consistent();
        assert_eq!(index.len(), 3);
    }

    #[test]
    fn clear_drops_buckets_and_entities() {
        let mut index = index();
        index.insert(1, Vec2::new(10.0, 10.0));
        index.insert(2, Vec2::new(310.0, 10.0));
        assert!(index.remove(1));
        index.clear();

        assert!(index.is_empty());
        assert!(index.buckets.is_empty());
        assert!(index.bucket_ids.is_empty());
        assert!(index.query_radius(Vec2::ZERO, f32::INFINITY).is_empty());
        index.insert(2, Vec2::new(310.0, 10.0));
        index.assert_consistent();
        assert_eq!(index.buckets.len(), 1);
        let nearest = index.query_closest(Vec2::ZERO, f32::INFINITY);
        assert_eq!(nearest.map(|found| found.handle), Some(2));
    }

    #[test]
    fn degenerate_radii_find_nothing() {
        let mut index = index();
        index.insert(1, Vec2::ZERO);

        assert!(index.query_radius(Vec2::ZERO, -1.0).is_empty());
        assert!(index.query_radius(Vec2::ZERO, f32::NAN).is_empty());
        assert_eq!(index.query_radius(Vec2::ZERO, 0.0), vec![1]);
        assert!(index.query_closest(Vec2::new(1.0, 0.0), 0.5).is_none());
    }

    #[test]
    fn ties_resolve_to_the_smallest_handle() {
        let mut index = index();
        index.insert(9, Vec2::new(-30.0, 0.0));
        index.insert(4, Vec2::new(30.0, 0.0));
        index.insert(6, Vec2::new(0.0, 30.0));

        for _ in 0..3 {
            let nearest = index.query_closest(Vec2::ZERO, 40.0).expect("in range");
            assert_eq!(nearest.handle, 4);
        }
    }
}
