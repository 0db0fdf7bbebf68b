use std::collections::{HashMap, HashSet};

use hecs::Entity;

use crate::geometry::Aabb;

pub const DEFAULT_CELL_SIZE: f32 = 64.0;

/// Uniform-grid spatial hash over AABBs.
///
/// An entity is bucketed into every cell its box overlaps, so a query for a
/// box returns every entity sharing at least one cell with it: no false
/// negatives, and false positives are the narrow phase's problem. The
/// structure is rebuilt from scratch each frame — at tens to low hundreds of
/// bodies that is cheaper than keeping it incrementally correct.
pub struct SpatialHash {
    cell_size: f32,
    buckets: HashMap<(i32, i32), Vec<Entity>>,
}

impl SpatialHash {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(f32::EPSILON),
            buckets: HashMap::new(),
        }
    }

    pub fn clear(&mut self) {
        self.buckets.clear();
    }

    fn cell_bounds(&self, aabb: &Aabb) -> (i32, i32, i32, i32) {
        let min = aabb.min / self.cell_size;
        let max = aabb.max() / self.cell_size;
        (
            min.x.floor() as i32,
            min.y.floor() as i32,
            max.x.floor() as i32,
            max.y.floor() as i32,
        )
    }

    /// Bucket `entity` into every cell its box overlaps. Degenerate boxes
    /// occupy no cells and therefore never match anything.
    pub fn insert(&mut self, aabb: &Aabb, entity: Entity) {
        if aabb.is_degenerate() {
            return;
        }
        let (x0, y0, x1, y1) = self.cell_bounds(aabb);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.buckets.entry((cx, cy)).or_default().push(entity);
            }
        }
    }

    /// De-duplicated union of all entities sharing a cell with `aabb`, in
    /// first-seen order so downstream pair generation stays deterministic.
    pub fn query(&self, aabb: &Aabb) -> Vec<Entity> {
        let mut out = Vec::new();
        if aabb.is_degenerate() {
            return out;
        }
        let mut seen = HashSet::new();
        let (x0, y0, x1, y1) = self.cell_bounds(aabb);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                if let Some(bucket) = self.buckets.get(&(cx, cy)) {
                    for &entity in bucket {
                        if seen.insert(entity) {
                            out.push(entity);
                        }
                    }
                }
            }
        }
        out
    }
}

impl Default for SpatialHash {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use hecs::World;

    fn boxed(x: f32, y: f32, w: f32, h: f32) -> Aabb {
        Aabb::new(Vec2::new(x, y), Vec2::new(w, h))
    }

    #[test]
    fn query_finds_overlaps_across_cell_boundaries() {
        let mut world = World::new();
        let a = world.spawn(());
        let mut hash = SpatialHash::new(64.0);

        // Straddles four cells around the (64, 64) corner.
        hash.insert(&boxed(48.0, 48.0, 32.0, 32.0), a);

        for probe in [
            boxed(0.0, 0.0, 60.0, 60.0),
            boxed(70.0, 0.0, 30.0, 60.0),
            boxed(0.0, 70.0, 60.0, 30.0),
            boxed(70.0, 70.0, 30.0, 30.0),
        ] {
            assert_eq!(hash.query(&probe), vec![a], "probe {probe:?}");
        }

        // Far away: shares no cell.
        assert!(hash.query(&boxed(500.0, 500.0, 10.0, 10.0)).is_empty());
    }

    #[test]
    fn multi_cell_entities_are_deduplicated() {
        let mut world = World::new();
        let a = world.spawn(());
        let mut hash = SpatialHash::new(64.0);

        // Spans a 3x1 run of cells.
        hash.insert(&boxed(0.0, 0.0, 180.0, 10.0), a);
        let hits = hash.query(&boxed(0.0, 0.0, 180.0, 10.0));
        assert_eq!(hits, vec![a]);
    }

    #[test]
    fn degenerate_boxes_are_ignored() {
        let mut world = World::new();
        let a = world.spawn(());
        let mut hash = SpatialHash::new(64.0);

        hash.insert(&boxed(10.0, 10.0, 0.0, 50.0), a);
        assert!(hash.query(&boxed(0.0, 0.0, 100.0, 100.0)).is_empty());
        assert!(hash.query(&boxed(10.0, 10.0, 0.0, 50.0)).is_empty());
    }

    #[test]
    fn clear_empties_all_buckets() {
        let mut world = World::new();
        let a = world.spawn(());
        let mut hash = SpatialHash::new(64.0);
        hash.insert(&boxed(0.0, 0.0, 10.0, 10.0), a);
        hash.clear();
        assert!(hash.query(&boxed(0.0, 0.0, 64.0, 64.0)).is_empty());
    }
}
