use glam::Vec2;
use hecs::{Entity, World};
use rand::Rng;

use crate::components::{
    EnemyAi, Facing, HitEvent, Hitbox, Hurtbox, LocalTransform, MovementState, Velocity,
};
use crate::geometry::Aabb;

/// Invincibility window armed on a successful hit.
pub const HIT_IFRAMES: u32 = 30;

/// Resolve combat overlaps for the tick.
///
/// Upkeep first: hitbox durations advance (deactivating at zero) and
/// owner-following volumes snap to their attacker, offset mirrored by the
/// owner's facing; hurtbox invincibility counts down. Then every active
/// hitbox is tested against every vulnerable, living hurtbox it has not
/// already hit, using the same AABB overlap primitive as the collision
/// engine. A hit rolls crit, floors damage at zero after defense, arms the
/// target's invincibility, records the target in the hitbox's hit-once set
/// and overwrites the target's velocity with knockback.
pub fn combat_system(world: &mut World, rng: &mut impl Rng) -> Vec<HitEvent> {
    tick_hitboxes(world);
    tick_hurtboxes(world);
    resolve_hits(world, rng)
}

fn tick_hitboxes(world: &mut World) {
    let mut syncs: Vec<(Entity, Entity, Vec2)> = Vec::new();
    for (entity, hitbox) in world.query_mut::<&mut Hitbox>() {
        if hitbox.active && hitbox.duration.tick() {
            hitbox.active = false;
        }
        if hitbox.active && hitbox.kind.follows_owner() {
            syncs.push((entity, hitbox.owner, hitbox.offset));
        }
    }

    for (entity, owner, offset) in syncs {
        let anchor = world.get::<&LocalTransform>(owner).map(|t| t.position);
        match anchor {
            Ok(pos) => {
                let facing = owner_facing(world, owner);
                let mirrored = Vec2::new(offset.x * facing.sign(), offset.y);
                if let Ok(mut transform) = world.get::<&mut LocalTransform>(entity) {
                    transform.position = pos + mirrored;
                }
            }
            Err(_) => {
                // Orphaned swing: the attacker is gone, the volume dies too.
                if let Ok(mut hitbox) = world.get::<&mut Hitbox>(entity) {
                    hitbox.active = false;
                }
            }
        }
    }
}

fn owner_facing(world: &World, owner: Entity) -> Facing {
    if let Ok(movement) = world.get::<&MovementState>(owner) {
        return movement.facing;
    }
    if let Ok(ai) = world.get::<&EnemyAi>(owner) {
        return ai.facing;
    }
    Facing::Right
}

fn tick_hurtboxes(world: &mut World) {
    for (_entity, hurtbox) in world.query_mut::<&mut Hurtbox>() {
        hurtbox.invincibility.tick();
    }
}

struct HitboxSnap {
    entity: Entity,
    owner: Entity,
    aabb: Aabb,
    position: Vec2,
    damage: f32,
    knockback: f32,
    crit_chance: f32,
    single_use: bool,
}

struct TargetSnap {
    entity: Entity,
    aabb: Aabb,
    position: Vec2,
}

fn resolve_hits(world: &mut World, rng: &mut impl Rng) -> Vec<HitEvent> {
    let hitboxes: Vec<HitboxSnap> = world
        .query::<(&Hitbox, &LocalTransform)>()
        .iter()
        .filter(|(_, (hitbox, _))| hitbox.active)
        .map(|(entity, (hitbox, transform))| HitboxSnap {
            entity,
            owner: hitbox.owner,
            aabb: hitbox.aabb(transform.position),
            position: transform.position,
            damage: hitbox.damage,
            knockback: hitbox.knockback,
            crit_chance: hitbox.crit_chance,
            single_use: hitbox.kind.single_use(),
        })
        .collect();

    let targets: Vec<TargetSnap> = world
        .query::<(&Hurtbox, &LocalTransform)>()
        .iter()
        .map(|(entity, (hurtbox, transform))| TargetSnap {
            entity,
            aabb: hurtbox.aabb(transform.position),
            position: transform.position,
        })
        .collect();

    let mut events = Vec::new();

    for hb in &hitboxes {
        for target in &targets {
            if target.entity == hb.owner {
                continue;
            }

            // Hitbox state is read live: an earlier pair this tick may have
            // spent a single-use volume or recorded this target already.
            {
                let Ok(hitbox) = world.get::<&Hitbox>(hb.entity) else {
                    break;
                };
                if !hitbox.active {
                    break;
                }
                if hitbox.already_hit.contains(&target.entity) {
                    continue;
                }
            }

            if !hb.aabb.overlaps(&target.aabb) {
                continue;
            }

            // Vulnerability and liveness are live too: a hit earlier this
            // tick arms invincibility against every later hitbox, and a
            // target dropped to zero health stops taking hits immediately.
            let (damage, crit, lethal) = {
                let Ok(mut hurtbox) = world.get::<&mut Hurtbox>(target.entity) else {
                    continue;
                };
                if !hurtbox.vulnerable() || !hurtbox.alive() {
                    continue;
                }
                let crit = hb.crit_chance > 0.0 && rng.random_bool(hb.crit_chance as f64);
                let rolled = if crit { hb.damage * 2.0 } else { hb.damage };
                let damage = (rolled - hurtbox.defense).max(0.0);
                if damage <= 0.0 {
                    // Fully absorbed: not a hit, no window armed, no mark.
                    continue;
                }
                hurtbox.take_damage(damage);
                hurtbox.invincibility.arm(HIT_IFRAMES);
                (damage, crit, !hurtbox.alive())
            };

            // Knockback: away from the attacker, rightward when coincident,
            // assigned outright as the target's velocity.
            let attacker_pos = world
                .get::<&LocalTransform>(hb.owner)
                .map(|t| t.position)
                .unwrap_or(hb.position);
            let delta = target.position - attacker_pos;
            let dir = if delta.length_squared() < f32::EPSILON {
                Vec2::X
            } else {
                delta.normalize()
            };
            if let Ok(mut vel) = world.get::<&mut Velocity>(target.entity) {
                vel.0 = dir * hb.knockback;
            }

            if let Ok(mut hitbox) = world.get::<&mut Hitbox>(hb.entity) {
                hitbox.already_hit.insert(target.entity);
                if hb.single_use {
                    hitbox.active = false;
                }
            }

            log::debug!(
                "hit: {:?} -> {:?} for {damage}{}",
                hb.owner,
                target.entity,
                if crit { " (crit)" } else { "" }
            );
            events.push(HitEvent {
                attacker: hb.owner,
                target: target.entity,
                damage,
                crit,
                lethal,
            });
        }
    }

    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::AttackKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    fn spawn_target(world: &mut World, pos: Vec2, health: f32) -> Entity {
        world.spawn((
            LocalTransform::new(pos),
            Velocity(Vec2::ZERO),
            Hurtbox::new(health, Vec2::new(16.0, 24.0)),
        ))
    }

    fn spawn_attacker(world: &mut World, pos: Vec2) -> Entity {
        world.spawn((LocalTransform::new(pos), MovementState::new(100.0)))
    }

    fn swing(world: &mut World, owner: Entity, pos: Vec2, damage: f32, frames: u32) -> Entity {
        world.spawn((
            LocalTransform::new(pos),
            Hitbox::new(owner, AttackKind::Melee, Vec2::new(20.0, 20.0), damage)
                .with_duration(frames)
                .with_knockback(250.0),
        ))
    }

    #[test]
    fn a_hitbox_instance_hits_a_target_at_most_once() {
        let mut world = World::new();
        let mut rng = rng();
        let attacker = spawn_attacker(&mut world, Vec2::ZERO);
        let target = spawn_target(&mut world, Vec2::new(10.0, 0.0), 50.0);
        swing(&mut world, attacker, Vec2::new(10.0, 0.0), 8.0, 120);

        // Overlapping for far longer than the invincibility window.
        let mut total_hits = 0;
        for _ in 0..80 {
            total_hits += combat_system(&mut world, &mut rng).len();
        }
        assert_eq!(total_hits, 1);
        assert_eq!(world.get::<&Hurtbox>(target).unwrap().health, 42.0);
    }

    #[test]
    fn invincibility_decrements_once_per_tick_until_zero() {
        let mut world = World::new();
        let mut rng = rng();
        let attacker = spawn_attacker(&mut world, Vec2::ZERO);
        let target = spawn_target(&mut world, Vec2::new(10.0, 0.0), 50.0);
        swing(&mut world, attacker, Vec2::new(10.0, 0.0), 8.0, 2);

        let events = combat_system(&mut world, &mut rng);
        assert_eq!(events.len(), 1);

        let mut remaining = world.get::<&Hurtbox>(target).unwrap().invincibility.remaining();
        assert_eq!(remaining, HIT_IFRAMES);
        for _ in 0..HIT_IFRAMES {
            combat_system(&mut world, &mut rng);
            let now = world.get::<&Hurtbox>(target).unwrap();
            assert_eq!(now.invincibility.remaining(), remaining - 1);
            assert_eq!(now.vulnerable(), now.invincibility.remaining() == 0);
            remaining = now.invincibility.remaining();
        }
        assert!(world.get::<&Hurtbox>(target).unwrap().vulnerable());
    }

    #[test]
    fn defense_floors_damage_and_absorbed_blows_are_not_hits() {
        let mut world = World::new();
        let mut rng = rng();
        let attacker = spawn_attacker(&mut world, Vec2::ZERO);
        let target = world.spawn((
            LocalTransform::new(Vec2::new(10.0, 0.0)),
            Velocity(Vec2::ZERO),
            Hurtbox::new(50.0, Vec2::new(16.0, 24.0)).with_defense(20.0),
        ));
        let blade = swing(&mut world, attacker, Vec2::new(10.0, 0.0), 5.0, 4);

        let events = combat_system(&mut world, &mut rng);
        assert!(events.is_empty());
        let hurtbox = world.get::<&Hurtbox>(target).unwrap();
        assert_eq!(hurtbox.health, 50.0);
        assert!(hurtbox.vulnerable(), "no window armed on an absorbed blow");
        assert!(
            !world.get::<&Hitbox>(blade).unwrap().already_hit.contains(&target),
            "absorbed blows don't consume the hit-once slot"
        );
    }

    #[test]
    fn guaranteed_crit_doubles_damage_before_defense() {
        let mut world = World::new();
        let mut rng = rng();
        let attacker = spawn_attacker(&mut world, Vec2::ZERO);
        let target = world.spawn((
            LocalTransform::new(Vec2::new(10.0, 0.0)),
            Velocity(Vec2::ZERO),
            Hurtbox::new(50.0, Vec2::new(16.0, 24.0)).with_defense(4.0),
        ));
        world.spawn((
            LocalTransform::new(Vec2::new(10.0, 0.0)),
            Hitbox::new(attacker, AttackKind::Melee, Vec2::new(20.0, 20.0), 8.0)
                .with_duration(4)
                .with_crit_chance(1.0),
        ));

        let events = combat_system(&mut world, &mut rng);
        assert_eq!(events.len(), 1);
        assert!(events[0].crit);
        assert_eq!(events[0].damage, 12.0); // 8 * 2 - 4
        assert_eq!(world.get::<&Hurtbox>(target).unwrap().health, 38.0);
    }

    #[test]
    fn knockback_overwrites_target_velocity_away_from_attacker() {
        let mut world = World::new();
        let mut rng = rng();
        let attacker = spawn_attacker(&mut world, Vec2::new(2.0, 0.0));
        let target = spawn_target(&mut world, Vec2::new(10.0, 0.0), 50.0);
        world.get::<&mut Velocity>(target).unwrap().0 = Vec2::new(-500.0, 80.0);
        swing(&mut world, attacker, Vec2::new(10.0, 0.0), 8.0, 4);

        combat_system(&mut world, &mut rng);
        assert_eq!(world.get::<&Velocity>(target).unwrap().0, Vec2::new(250.0, 0.0));

        // Coincident positions default to a rightward push.
        let mut world = World::new();
        let attacker = spawn_attacker(&mut world, Vec2::ZERO);
        let target = spawn_target(&mut world, Vec2::ZERO, 50.0);
        swing(&mut world, attacker, Vec2::ZERO, 8.0, 4);
        combat_system(&mut world, &mut rng);
        assert_eq!(world.get::<&Velocity>(target).unwrap().0, Vec2::new(250.0, 0.0));
    }

    #[test]
    fn dead_targets_are_never_hit_again() {
        let mut world = World::new();
        let mut rng = rng();
        let attacker = spawn_attacker(&mut world, Vec2::ZERO);
        let target = spawn_target(&mut world, Vec2::new(10.0, 0.0), 5.0);

        swing(&mut world, attacker, Vec2::new(10.0, 0.0), 8.0, 4);
        let events = combat_system(&mut world, &mut rng);
        assert_eq!(events.len(), 1);
        assert!(events[0].lethal);
        assert_eq!(world.get::<&Hurtbox>(target).unwrap().health, 0.0);

        // A fresh hitbox against the corpse: filtered by the liveness check.
        for _ in 0..HIT_IFRAMES + 1 {
            combat_system(&mut world, &mut rng);
        }
        swing(&mut world, attacker, Vec2::new(10.0, 0.0), 8.0, 4);
        assert!(combat_system(&mut world, &mut rng).is_empty());
    }

    #[test]
    fn projectiles_are_spent_on_the_first_hit() {
        let mut world = World::new();
        let mut rng = rng();
        let attacker = spawn_attacker(&mut world, Vec2::ZERO);
        let near = spawn_target(&mut world, Vec2::new(10.0, 0.0), 50.0);
        let far = spawn_target(&mut world, Vec2::new(14.0, 0.0), 50.0);

        let bolt = world.spawn((
            LocalTransform::new(Vec2::new(12.0, 0.0)),
            Velocity(Vec2::new(400.0, 0.0)),
            Hitbox::new(attacker, AttackKind::Projectile, Vec2::new(8.0, 4.0), 6.0)
                .with_duration(90),
        ));

        let events = combat_system(&mut world, &mut rng);
        assert_eq!(events.len(), 1, "single-use volume stops after one hit");
        assert!(!world.get::<&Hitbox>(bolt).unwrap().active);

        let near_health = world.get::<&Hurtbox>(near).unwrap().health;
        let far_health = world.get::<&Hurtbox>(far).unwrap().health;
        assert_eq!(near_health.min(far_health), 44.0);
        assert_eq!(near_health.max(far_health), 50.0);
    }

    #[test]
    fn melee_volumes_ride_their_owner_with_mirrored_offset() {
        let mut world = World::new();
        let mut rng = rng();
        let attacker = spawn_attacker(&mut world, Vec2::new(100.0, 20.0));
        let blade = world.spawn((
            LocalTransform::new(Vec2::ZERO),
            Hitbox::new(attacker, AttackKind::Melee, Vec2::new(20.0, 12.0), 8.0)
                .with_duration(10)
                .with_offset(Vec2::new(14.0, 2.0)),
        ));

        combat_system(&mut world, &mut rng);
        let pos = world.get::<&LocalTransform>(blade).unwrap().position;
        assert_eq!(pos, Vec2::new(114.0, 22.0));

        // Facing left mirrors the horizontal offset.
        world.get::<&mut MovementState>(attacker).unwrap().facing = Facing::Left;
        combat_system(&mut world, &mut rng);
        let pos = world.get::<&LocalTransform>(blade).unwrap().position;
        assert_eq!(pos, Vec2::new(86.0, 22.0));

        // Losing the owner kills the swing.
        world.despawn(attacker).unwrap();
        combat_system(&mut world, &mut rng);
        assert!(!world.get::<&Hitbox>(blade).unwrap().active);
    }

    #[test]
    fn durations_expire_and_deactivate() {
        let mut world = World::new();
        let mut rng = rng();
        let attacker = spawn_attacker(&mut world, Vec2::ZERO);
        let blade = swing(&mut world, attacker, Vec2::ZERO, 8.0, 3);

        for _ in 0..2 {
            combat_system(&mut world, &mut rng);
            assert!(world.get::<&Hitbox>(blade).unwrap().active);
        }
        combat_system(&mut world, &mut rng);
        assert!(!world.get::<&Hitbox>(blade).unwrap().active);
    }
}
