use std::collections::HashSet;

use glam::Vec2;
use hecs::{Entity, World};

use super::broadphase::SpatialHash;
use super::player::MovementConfig;
use crate::components::{
    CollisionShape, Contact, Facing, Hurtbox, JumpPhase, LocalTransform, MovementState, Velocity,
};
use crate::geometry::{collision_info, Aabb};

/// Extra separation applied on push-out so float error doesn't re-overlap the
/// pair on the next tick.
pub const SKIN_EPSILON: f32 = 0.01;

/// Vertical band under the feet within which a platform top still counts as
/// ground. Without it the skin gap makes the grounded flag flicker every
/// other tick, which reads as spurious fall/jump transitions.
pub const GROUND_TOLERANCE: f32 = 2.0;

/// Platforms tagged with this only resolve against bodies falling onto their
/// top face; jumps pass up through them.
pub const ONE_WAY_TAG: &str = "one_way";

/// Apply the fixed-order resolution protocol to this tick's contacts, then
/// confirm the character's grounded state with the under-feet probe.
///
/// Only moving bodies are corrected; static shapes and triggers are left
/// untouched. Horizontal velocity is zeroed only against solid obstacles —
/// bumping a damageable opponent leaves velocity to the combat knockback, so
/// push-back isn't cancelled by simultaneous wall resolution.
pub fn resolve_contacts(
    world: &mut World,
    contacts: &[Contact],
    hash: &SpatialHash,
    config: &MovementConfig,
) {
    // Wall-touch facts are rebuilt from this tick's contacts.
    for (_entity, movement) in world.query_mut::<&mut MovementState>() {
        movement.wall.touching_left = false;
        movement.wall.touching_right = false;
    }

    let mut ground_contact: HashSet<Entity> = HashSet::new();
    for contact in contacts {
        resolve_one(world, contact, config, &mut ground_contact);
    }

    confirm_grounded(world, hash, &ground_contact, config);
}

fn resolve_one(
    world: &mut World,
    contact: &Contact,
    config: &MovementConfig,
    ground_contact: &mut HashSet<Entity>,
) {
    let a = contact.entity_a;
    let b = contact.entity_b;

    let Ok((a_static, a_trigger)) = world
        .get::<&CollisionShape>(a)
        .map(|s| (s.is_static, s.is_trigger))
    else {
        return;
    };
    let Ok((b_static, b_trigger, b_one_way)) = world
        .get::<&CollisionShape>(b)
        .map(|s| (s.is_static, s.is_trigger, s.has_tag(ONE_WAY_TAG)))
    else {
        return;
    };

    // Triggers detect only; static bodies are never moved.
    if a_trigger || b_trigger || a_static {
        return;
    }
    // Only entities with velocity are corrected.
    let Ok(vel) = world.get::<&Velocity>(a).map(|v| v.0) else {
        return;
    };

    // Earlier corrections this tick may have separated the pair already (two
    // adjacent floor tiles both report the same penetration); recompute from
    // live positions so the second contact doesn't double-push.
    let Some(info) = live_info(world, a, b) else {
        return;
    };
    if !info.colliding {
        return;
    }

    let b_damageable = world.get::<&Hurtbox>(b).is_ok();
    let b_solid = !b_damageable;

    if info.normal.y != 0.0 {
        let landing = info.normal.y > 0.0 && vel.y <= 0.0;
        let bonking = info.normal.y < 0.0 && vel.y >= 0.0;
        if b_one_way && !landing {
            return;
        }
        if !landing && !bonking {
            return;
        }
        push_out(world, a, Vec2::new(0.0, info.normal.y * (info.overlap.y + SKIN_EPSILON)));
        if let Ok(mut v) = world.get::<&mut Velocity>(a) {
            v.0.y = 0.0;
        }
        if landing {
            ground_contact.insert(a);
            if let Ok(mut movement) = world.get::<&mut MovementState>(a) {
                land(&mut movement);
            }
        }
    } else {
        if b_one_way {
            return;
        }
        let moving_in =
            (info.normal.x > 0.0 && vel.x <= 0.0) || (info.normal.x < 0.0 && vel.x >= 0.0);
        if !moving_in {
            return;
        }
        push_out(world, a, Vec2::new(info.normal.x * (info.overlap.x + SKIN_EPSILON), 0.0));
        if b_solid {
            if let Ok(mut v) = world.get::<&mut Velocity>(a) {
                v.0.x = 0.0;
            }
        }
        if b_static && !b_damageable {
            if let Ok(mut movement) = world.get::<&mut MovementState>(a) {
                let side = if info.normal.x > 0.0 {
                    // Pushed rightward: the wall is on the left.
                    movement.wall.touching_left = true;
                    Facing::Left
                } else {
                    movement.wall.touching_right = true;
                    Facing::Right
                };
                // The wall-coyote window is an airborne concept; standing on
                // the ground next to a wall must not suppress ground jumps.
                if !movement.grounded {
                    movement.wall.recent_contact.arm(config.wall_coyote_frames);
                    movement.wall.recent_side = Some(side);
                }
            }
        }
    }
}

/// Narrow-phase info recomputed from current positions.
fn live_info(world: &World, a: Entity, b: Entity) -> Option<crate::geometry::CollisionInfo> {
    let a_aabb = {
        let t = world.get::<&LocalTransform>(a).ok()?;
        let s = world.get::<&CollisionShape>(a).ok()?;
        s.aabb(t.position)
    };
    let b_aabb = {
        let t = world.get::<&LocalTransform>(b).ok()?;
        let s = world.get::<&CollisionShape>(b).ok()?;
        s.aabb(t.position)
    };
    Some(collision_info(&a_aabb, &b_aabb))
}

fn push_out(world: &mut World, entity: Entity, correction: Vec2) {
    if let Ok(mut transform) = world.get::<&mut LocalTransform>(entity) {
        transform.position += correction;
    }
}

fn land(movement: &mut MovementState) {
    movement.jump.coyote.clear();
    movement.jump.has_double_jump = true;
    movement.jump.phase = JumpPhase::Grounded;
    movement.jump.hold_frames = 0;
    movement.wall.sliding = false;
    if !movement.grounded {
        movement.grounded = true;
        log::debug!("landed");
    }
}

/// Grounded hysteresis: losing vertical contact does not immediately clear
/// the flag. A probe band under the feet is checked against static terrain
/// first, so resting on the skin gap stays grounded.
fn confirm_grounded(
    world: &mut World,
    hash: &SpatialHash,
    ground_contact: &HashSet<Entity>,
    config: &MovementConfig,
) {
    let probes: Vec<(Entity, Aabb, f32)> = world
        .query::<(&LocalTransform, &CollisionShape, &Velocity, &MovementState)>()
        .iter()
        .filter(|(entity, (_, _, _, movement))| {
            movement.grounded && !ground_contact.contains(entity)
        })
        .map(|(entity, (transform, shape, vel, _))| {
            let aabb = shape.aabb(transform.position);
            let probe = Aabb::new(
                Vec2::new(aabb.min.x, aabb.min.y - GROUND_TOLERANCE),
                Vec2::new(aabb.size.x, GROUND_TOLERANCE),
            );
            (entity, probe, vel.0.y)
        })
        .collect();

    for (entity, probe, vy) in probes {
        let supported = vy <= 0.0 && probe_hits_static(world, hash, &probe);
        if !supported {
            if let Ok(mut movement) = world.get::<&mut MovementState>(entity) {
                leave_ground(&mut movement, config);
            }
        }
    }
}

fn probe_hits_static(world: &World, hash: &SpatialHash, probe: &Aabb) -> bool {
    for candidate in hash.query(probe) {
        let Ok(shape) = world.get::<&CollisionShape>(candidate) else {
            continue;
        };
        if !shape.is_static || shape.is_trigger {
            continue;
        }
        let Ok(transform) = world.get::<&LocalTransform>(candidate) else {
            continue;
        };
        if shape.aabb(transform.position).overlaps(probe) {
            return true;
        }
    }
    false
}

fn leave_ground(movement: &mut MovementState, config: &MovementConfig) {
    movement.grounded = false;
    if movement.jump.phase == JumpPhase::Grounded {
        // Walked off without jumping: the coyote grace starts now.
        movement.jump.coyote.arm(config.coyote_frames);
        movement.jump.phase = JumpPhase::Airborne;
        log::debug!("left ground, coyote armed");
    }
}
