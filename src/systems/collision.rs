use std::collections::{HashMap, HashSet};

use glam::Vec2;
use hecs::{Entity, World};

use super::broadphase::SpatialHash;
use crate::components::{layer, CollisionShape, Contact, LocalTransform, Velocity};
use crate::engine::time::TICK_DT;
use crate::geometry::{collision_info, swept_collision};

struct Entry {
    entity: Entity,
    aabb: crate::geometry::Aabb,
    velocity: Option<Vec2>,
    is_static: bool,
    is_projectile: bool,
}

/// Detect collisions for the current tick.
///
/// Rebuilds the broadphase from every collidable entity's current AABB, then
/// runs the narrow phase over broadphase candidates for each body that is not
/// stationary scenery. Contacts carry the resolved one-axis normal and, for
/// moving bodies, the swept time-of-impact along the next displacement. No
/// resolution is applied here — that is the consuming controller's job.
pub fn collision_system(world: &mut World, hash: &mut SpatialHash) -> Vec<Contact> {
    hash.clear();

    let mut entries: Vec<Entry> = Vec::new();
    let mut index: HashMap<Entity, usize> = HashMap::new();
    for (entity, (transform, shape, velocity)) in world
        .query::<(&LocalTransform, &CollisionShape, Option<&Velocity>)>()
        .iter()
    {
        index.insert(entity, entries.len());
        entries.push(Entry {
            entity,
            aabb: shape.aabb(transform.position),
            velocity: velocity.map(|v| v.0),
            is_static: shape.is_static,
            is_projectile: shape.layer == layer::PROJECTILE,
        });
    }

    for entry in &entries {
        hash.insert(&entry.aabb, entry.entity);
    }

    let mut contacts = Vec::new();
    let mut seen: HashSet<(u64, u64)> = HashSet::new();

    for entry in &entries {
        // Static scenery without a velocity component never initiates a pair.
        if entry.is_static && entry.velocity.is_none() {
            continue;
        }
        for candidate in hash.query(&entry.aabb) {
            if candidate == entry.entity {
                continue;
            }
            if !seen.insert(pair_key(entry.entity, candidate)) {
                continue;
            }
            let other = &entries[index[&candidate]];
            // Projectiles pass through each other.
            if entry.is_projectile && other.is_projectile {
                continue;
            }
            let mut info = collision_info(&entry.aabb, &other.aabb);
            if !info.colliding {
                continue;
            }
            // Keep the moving body in the `entity_a` slot so resolution always
            // sees a correctable mover; the normal flips with the swap.
            let (mover, obstacle) = if entry.velocity.is_none() && other.velocity.is_some() {
                info.normal = -info.normal;
                (other, entry)
            } else {
                (entry, other)
            };
            let swept = mover
                .velocity
                .filter(|v| v.length_squared() > 0.0)
                .map(|v| swept_collision(&mover.aabb, v * TICK_DT, &obstacle.aabb));
            contacts.push(Contact {
                entity_a: mover.entity,
                entity_b: obstacle.entity,
                info,
                swept,
            });
        }
    }

    contacts
}

fn pair_key(a: Entity, b: Entity) -> (u64, u64) {
    let (a, b) = (a.to_bits().get(), b.to_bits().get());
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::layer;

    fn world_with(
        entries: &[(Vec2, Vec2, bool, bool)], // (pos, size, is_static, has_velocity)
    ) -> (World, Vec<Entity>) {
        let mut world = World::new();
        let mut ids = Vec::new();
        for &(pos, size, is_static, has_velocity) in entries {
            let shape = if is_static {
                CollisionShape::fixed(size, layer::TERRAIN)
            } else {
                CollisionShape::solid(size, layer::ENEMY)
            };
            let e = world.spawn((LocalTransform::new(pos), shape));
            if has_velocity {
                world.insert_one(e, Velocity(Vec2::new(10.0, 0.0))).unwrap();
            }
            ids.push(e);
        }
        (world, ids)
    }

    #[test]
    fn overlapping_pair_emits_one_contact() {
        let (mut world, ids) = world_with(&[
            (Vec2::new(0.0, 0.0), Vec2::new(20.0, 20.0), false, true),
            (Vec2::new(10.0, 0.0), Vec2::new(20.0, 20.0), true, false),
        ]);
        let mut hash = SpatialHash::default();
        let contacts = collision_system(&mut world, &mut hash);
        assert_eq!(contacts.len(), 1);
        let contact = &contacts[0];
        assert_eq!(contact.entity_a, ids[0]);
        assert_eq!(contact.entity_b, ids[1]);
        assert_eq!(contact.info.normal, Vec2::new(-1.0, 0.0));
        assert!(contact.swept.is_some(), "moving body carries swept info");
    }

    #[test]
    fn static_pair_is_skipped() {
        let (mut world, _ids) = world_with(&[
            (Vec2::new(0.0, 0.0), Vec2::new(20.0, 20.0), true, false),
            (Vec2::new(10.0, 0.0), Vec2::new(20.0, 20.0), true, false),
        ]);
        let mut hash = SpatialHash::default();
        assert!(collision_system(&mut world, &mut hash).is_empty());
    }

    #[test]
    fn separated_pair_emits_nothing() {
        let (mut world, _ids) = world_with(&[
            (Vec2::new(0.0, 0.0), Vec2::new(20.0, 20.0), false, true),
            (Vec2::new(100.0, 0.0), Vec2::new(20.0, 20.0), true, false),
        ]);
        let mut hash = SpatialHash::default();
        assert!(collision_system(&mut world, &mut hash).is_empty());
    }

    #[test]
    fn dynamic_pair_is_emitted_once_not_twice() {
        let (mut world, _ids) = world_with(&[
            (Vec2::new(0.0, 0.0), Vec2::new(20.0, 20.0), false, true),
            (Vec2::new(10.0, 0.0), Vec2::new(20.0, 20.0), false, true),
        ]);
        let mut hash = SpatialHash::default();
        let contacts = collision_system(&mut world, &mut hash);
        assert_eq!(contacts.len(), 1, "pair dedup keeps one perspective");
    }
}
